use crate::hex::AxialCoordinate;
use fnv::FnvBuildHasher;
use indexmap::{IndexMap, IndexSet};
use std::{
    cmp,
    collections::{HashMap, HashSet},
};

/// A set of axial coordinates
pub type AxialSet = HashSet<AxialCoordinate, FnvBuildHasher>;
/// A map of axial coordinates to some `T`
pub type AxialMap<T> = HashMap<AxialCoordinate, T, FnvBuildHasher>;
/// An ORDERED map of axial coordinates to some `T`. This has some extra memory
/// overhead, so we should only use it when we actually need the ordering.
pub type AxialIndexMap<T> = IndexMap<AxialCoordinate, T, FnvBuildHasher>;
/// An ORDERED set of axial coordinates
pub type AxialIndexSet = IndexSet<AxialCoordinate, FnvBuildHasher>;

/// Get an iterator of every cell within `radius` steps of `center`, center
/// included, in a super hexagon pattern. A radius of 0 yields just the center,
/// 1 yields 7 cells, 2 yields 19, etc. Iteration order is deterministic: by
/// `q`, then by `r`.
pub fn cells_within(
    center: AxialCoordinate,
    radius: u32,
) -> impl Iterator<Item = AxialCoordinate> {
    let r = radius as i32;
    (-r..=r).flat_map(move |dq| {
        // If we just do [-r,r] for r as well, then we end up with a diamond
        // pattern instead of a super hexagon
        // https://www.redblobgames.com/grids/hexagons/#range
        let dr_min = cmp::max(-r, -dq - r);
        let dr_max = cmp::min(r, -dq + r);
        (dr_min..=dr_max)
            .map(move |dr| center + AxialCoordinate::new(dq, dr))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::grid_len;

    #[test]
    fn test_cells_within_len() {
        for radius in 0..6 {
            assert_eq!(
                cells_within(AxialCoordinate::ORIGIN, radius).count(),
                grid_len(radius as u16)
            );
        }
    }

    #[test]
    fn test_cells_within_distance() {
        let center = AxialCoordinate::new(4, -9);
        let cells: AxialSet = cells_within(center, 3).collect();
        assert_eq!(cells.len(), 37);
        for cell in &cells {
            assert!(cell.distance_to(center) <= 3, "{} is too far", cell);
        }
        assert!(cells.contains(&center));
    }
}
