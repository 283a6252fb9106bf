//! This sub-module contains the basic units of the hex coordinate system:
//! cells and directions. See the parent module documentation for more info on
//! the coordinate system.

use derive_more::{Add, AddAssign, Display, Neg, Sub, SubAssign};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// A point in 3D presentation space. Points produced by this crate always lie
/// on the grid plane, i.e. `y == 0`.
pub type WorldPosition = nalgebra::Point3<f64>;

/// The address of a single cell on the hex grid, in axial coordinates. See
/// the module-level documentation for a description of the coordinate system.
///
/// This is a plain value type: two coordinates are equal iff both components
/// are equal, and hashing follows equality. The derived ordering (by `q`, then
/// `r`) has no geometric meaning, it just makes output deterministic.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Neg,
    Serialize,
    Deserialize,
)]
#[display(fmt = "({}, {})", q, r)]
pub struct AxialCoordinate {
    pub q: i32,
    pub r: i32,
}

impl AxialCoordinate {
    pub const ORIGIN: Self = Self::new(0, 0);

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third cube component. Since `q + r + s = 0` for every
    /// cell, we can always derive it from the other two.
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Calculate the path distance between two cells on an unobstructed grid,
    /// meaning the number of single steps it takes to get from one to the
    /// other. 0 if the cells are equal, 1 if they're adjacent, etc.
    pub fn distance_to(self, other: AxialCoordinate) -> u32 {
        // https://www.redblobgames.com/grids/hexagons/#distances
        let delta = self - other;
        // Every step changes two of the three cube components by one each, so
        // the summed deltas count each step twice
        (delta.q.unsigned_abs()
            + delta.r.unsigned_abs()
            + delta.s().unsigned_abs())
            / 2
    }

    /// Distance from the origin. A cell with length `n` is on the `n`th ring
    /// around the center of the grid.
    pub fn length(self) -> u32 {
        self.distance_to(Self::ORIGIN)
    }

    /// Get the location of the cell adjacent to this one in some direction
    pub fn neighbor(self, direction: HexDirection) -> AxialCoordinate {
        self + direction.offset()
    }

    /// Get an iterator of all the cells directly adjacent to this one. The
    /// iterator always contains exactly 6 values, in [HexDirection::CLOCKWISE]
    /// order. Anything that needs deterministic traversal (flood fill, path
    /// search) relies on this ordering, so don't change it.
    pub fn neighbors(self) -> impl Iterator<Item = AxialCoordinate> {
        HexDirection::iter().map(move |dir| self.neighbor(dir))
    }
}

impl From<(i32, i32)> for AxialCoordinate {
    fn from((q, r): (i32, i32)) -> Self {
        Self::new(q, r)
    }
}

/// Snap a fractional axial coordinate to the closest cell.
///
/// Rounding `q` and `r` independently doesn't work: near a cell boundary the
/// two roundings can disagree about which cell we're in, and the result can
/// be a cell that doesn't even touch the input point. Instead, round all three
/// cube components, then throw away whichever one moved the furthest and
/// re-derive it from the other two. That component is the least trustworthy,
/// and the re-derived value always lands on a valid cell.
///
/// https://www.redblobgames.com/grids/hexagons/#rounding
pub(crate) fn cube_round(q: f64, r: f64) -> AxialCoordinate {
    let s = -q - r;
    let mut q_round = q.round();
    let mut r_round = r.round();
    let s_round = s.round();

    let q_diff = (q_round - q).abs();
    let r_diff = (r_round - r).abs();
    let s_diff = (s_round - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        q_round = -r_round - s_round;
    } else if r_diff > s_diff {
        r_round = -q_round - s_round;
    }
    // Otherwise s had the biggest error, and since we never store s there's
    // nothing to fix

    AxialCoordinate::new(q_round as i32, r_round as i32)
}

/// The 6 directions in which cells line up side-to-side. Each direction
/// points from the center of a cell to the center of one of its neighbors.
///
/// Directions are ordered in 60° steps, starting at east (angle 0). That order
/// is what we call "clockwise" throughout this crate: rotating a direction
/// clockwise by one step moves to the next variant. The enum is declared in
/// that order, so iterating it (via [strum::IntoEnumIterator]) gives the same
/// sequence as [Self::CLOCKWISE].
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    EnumIter,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HexDirection {
    East,
    Northeast,
    Northwest,
    West,
    Southwest,
    Southeast,
}

impl HexDirection {
    /// All directions, in clockwise order starting at east
    pub const CLOCKWISE: [Self; 6] = [
        Self::East,
        Self::Northeast,
        Self::Northwest,
        Self::West,
        Self::Southwest,
        Self::Southeast,
    ];

    /// Index of this direction within [Self::CLOCKWISE]
    pub fn index(self) -> usize {
        match self {
            Self::East => 0,
            Self::Northeast => 1,
            Self::Northwest => 2,
            Self::West => 3,
            Self::Southwest => 4,
            Self::Southeast => 5,
        }
    }

    /// Get the direction at the given index in [Self::CLOCKWISE]. The index
    /// wraps around, so any integer is valid (including negatives).
    pub fn from_index(index: i64) -> Self {
        Self::CLOCKWISE[index.rem_euclid(6) as usize]
    }

    /// Get the axial offset that moves a cell one step in this direction
    pub fn offset(self) -> AxialCoordinate {
        match self {
            Self::East => AxialCoordinate::new(1, 0),
            Self::Northeast => AxialCoordinate::new(1, -1),
            Self::Northwest => AxialCoordinate::new(0, -1),
            Self::West => AxialCoordinate::new(-1, 0),
            Self::Southwest => AxialCoordinate::new(-1, 1),
            Self::Southeast => AxialCoordinate::new(0, 1),
        }
    }

    /// Get the direction that is directly opposite this one (180°)
    pub fn opposite(self) -> Self {
        self.rotate_clockwise(3)
    }

    /// Rotate by some number of 60° steps, in the clockwise sense. Negative
    /// step counts rotate the other way.
    pub fn rotate_clockwise(self, steps: i32) -> Self {
        Self::from_index(self.index() as i64 + steps as i64)
    }

    /// Rotate by some number of 60° steps, in the counter-clockwise sense.
    /// Negative step counts rotate the other way.
    pub fn rotate_counter_clockwise(self, steps: i32) -> Self {
        self.rotate_clockwise(-steps)
    }

    /// The angle of this direction on the grid plane, in degrees. East is 0,
    /// and each subsequent direction adds 60.
    pub fn angle_degrees(self) -> f64 {
        self.index() as f64 * 60.0
    }

    /// Unit vector on the XZ plane pointing the same way as this direction,
    /// in the pointy-top layout. I.e. this points from a cell's world position
    /// towards its neighbor's world position.
    pub fn world_vector(self) -> Vector3<f64> {
        let radians = self.angle_degrees().to_radians();
        Vector3::new(radians.cos(), 0.0, radians.sin())
    }

    /// Find the direction whose [Self::world_vector] is closest to the given
    /// vector. The vector's `y` component is ignored. Returns `None` if the
    /// vector has no extent on the grid plane.
    pub fn nearest_to_world_vector(vector: Vector3<f64>) -> Option<Self> {
        if vector.x == 0.0 && vector.z == 0.0 {
            return None;
        }
        let degrees = vector.z.atan2(vector.x).to_degrees();
        Some(Self::from_index((degrees / 60.0).round() as i64))
    }

    /// Get the direction that leads from one cell to an adjacent cell. Returns
    /// `None` if the two cells aren't adjacent.
    pub fn between(from: AxialCoordinate, to: AxialCoordinate) -> Option<Self> {
        let delta = to - from;
        Self::iter().find(|dir| dir.offset() == delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_test::{assert_tokens, Token};

    #[test]
    fn test_distance_to() {
        let p0 = AxialCoordinate::ORIGIN;
        let p1 = AxialCoordinate::new(-1, 1);
        let p2 = AxialCoordinate::new(2, -1);
        let p3 = AxialCoordinate::new(2, -3);

        assert_eq!(p0.distance_to(p0), 0);
        assert_eq!(p3.distance_to(p3), 0);

        assert_eq!(p0.distance_to(p1), 1);
        assert_eq!(p0.distance_to(p2), 2);
        assert_eq!(p0.distance_to(p3), 3);

        assert_eq!(p1.distance_to(p2), 3);
        assert_eq!(p1.distance_to(p3), 4);
        assert_eq!(p2.distance_to(p3), 2);

        // Symmetric
        assert_eq!(p3.distance_to(p1), p1.distance_to(p3));
    }

    #[test]
    fn test_neighbors() {
        let center = AxialCoordinate::new(3, -7);
        let neighbors: Vec<_> = center.neighbors().collect();
        assert_eq!(
            neighbors,
            vec![
                AxialCoordinate::new(4, -7),
                AxialCoordinate::new(4, -8),
                AxialCoordinate::new(3, -8),
                AxialCoordinate::new(2, -7),
                AxialCoordinate::new(2, -6),
                AxialCoordinate::new(3, -6),
            ]
        );
        for neighbor in neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
        }
    }

    #[test]
    fn test_direction_algebra() {
        for dir in HexDirection::iter() {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
            assert_eq!(dir.rotate_clockwise(6), dir);
            assert_eq!(dir.rotate_clockwise(-6), dir);
            assert_eq!(dir.rotate_counter_clockwise(6), dir);
            assert_eq!(
                dir.rotate_clockwise(2).rotate_counter_clockwise(2),
                dir
            );
            assert_eq!(dir.offset() + dir.opposite().offset(), AxialCoordinate::ORIGIN);
            assert_eq!(HexDirection::from_index(dir.index() as i64), dir);
        }

        let sum = HexDirection::iter()
            .fold(AxialCoordinate::ORIGIN, |acc, dir| acc + dir.offset());
        assert_eq!(sum, AxialCoordinate::ORIGIN);

        assert_eq!(HexDirection::East.opposite(), HexDirection::West);
        assert_eq!(
            HexDirection::Northeast.rotate_clockwise(1),
            HexDirection::Northwest
        );
        assert_eq!(
            HexDirection::East.rotate_counter_clockwise(1),
            HexDirection::Southeast
        );
    }

    #[test]
    fn test_clockwise_matches_iteration() {
        let iterated: Vec<_> = HexDirection::iter().collect();
        assert_eq!(iterated, HexDirection::CLOCKWISE.to_vec());
    }

    #[test]
    fn test_between() {
        let from = AxialCoordinate::new(1, 1);
        for dir in HexDirection::iter() {
            assert_eq!(HexDirection::between(from, from.neighbor(dir)), Some(dir));
        }
        assert_eq!(HexDirection::between(from, from), None);
        assert_eq!(
            HexDirection::between(from, AxialCoordinate::new(3, 1)),
            None
        );
    }

    #[test]
    fn test_nearest_to_world_vector() {
        for dir in HexDirection::iter() {
            assert_eq!(
                HexDirection::nearest_to_world_vector(dir.world_vector()),
                Some(dir)
            );
            // Nudge it a bit, should still snap back
            let nudged = dir.world_vector() + Vector3::new(0.1, 5.0, -0.1);
            assert_eq!(HexDirection::nearest_to_world_vector(nudged), Some(dir));
        }
        assert_eq!(
            HexDirection::nearest_to_world_vector(Vector3::new(0.0, 1.0, 0.0)),
            None
        );
    }

    #[test]
    fn test_world_vector() {
        let east = HexDirection::East.world_vector();
        assert_approx_eq!(east.x, 1.0);
        assert_approx_eq!(east.z, 0.0);
        let west = HexDirection::West.world_vector();
        assert_approx_eq!(west.x, -1.0);
        assert_approx_eq!(west.z, 0.0);
        for dir in HexDirection::iter() {
            assert_approx_eq!(dir.world_vector().norm(), 1.0);
        }
    }

    #[test]
    fn test_cube_round() {
        assert_eq!(cube_round(0.0, 0.0), AxialCoordinate::ORIGIN);
        assert_eq!(cube_round(0.9, 0.05), AxialCoordinate::new(1, 0));
        // Component-wise rounding would give (1, 1), whose implicit s is -2.
        // That cell doesn't even border (0.6, 0.6).
        assert_eq!(cube_round(0.6, 0.6), AxialCoordinate::new(1, 0));
        assert_eq!(cube_round(-0.45, 0.6), AxialCoordinate::new(-1, 1));
    }

    #[test]
    fn test_serde() {
        assert_tokens(
            &AxialCoordinate::new(2, -1),
            &[
                Token::Struct {
                    name: "AxialCoordinate",
                    len: 2,
                },
                Token::Str("q"),
                Token::I32(2),
                Token::Str("r"),
                Token::I32(-1),
                Token::StructEnd,
            ],
        );
        assert_tokens(
            &HexDirection::Southwest,
            &[Token::UnitVariant {
                name: "HexDirection",
                variant: "southwest",
            }],
        );
    }
}
