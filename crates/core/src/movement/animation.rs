use crate::{
    config::{AnimationConfig, GridConfig},
    grid::OccupantId,
    hex::{axial_to_world, PositionLookup, WorldPosition},
    movement::MovePath,
};
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStatus {
    InProgress,
    Done,
}

/// Plays a unit's movement along its path, for the presentation layer. This
/// only tracks where the unit should be *drawn*. By the time an animation is
/// created, the move has already been committed to the grid, so nothing here
/// affects game state.
///
/// The host calls [Self::advance] once per frame and draws the unit at
/// [Self::displayed_position].
#[derive(Clone, Debug)]
pub struct MoveAnimation {
    unit: OccupantId,
    /// World position of each cell along the path, start to end. Never empty.
    waypoints: Vec<WorldPosition>,
    /// Distance traveled upon reaching each waypoint. Same length as
    /// `waypoints`, starts at 0.
    distances: Vec<f64>,
    /// Total time the animation takes, in seconds
    duration: f64,
    ease: f64,
    elapsed: f64,
    displayed: WorldPosition,
    done: bool,
}

impl MoveAnimation {
    /// Build an animation along a path. World positions come from the lookup
    /// where it has them; any cell it doesn't know falls back to its
    /// computed pointy-top position.
    pub fn new(
        unit: OccupantId,
        path: &MovePath,
        grid: &GridConfig,
        animation: &AnimationConfig,
        lookup: &dyn PositionLookup,
    ) -> Self {
        let waypoints: Vec<WorldPosition> = path
            .cells
            .iter()
            .map(|&cell| {
                lookup
                    .try_get_world_position(cell)
                    .unwrap_or_else(|| axial_to_world(cell, grid.hex_size))
            })
            .collect();

        let mut distances = Vec::with_capacity(waypoints.len());
        let mut total = 0.0;
        distances.push(total);
        for pair in waypoints.windows(2) {
            total += nalgebra::distance(&pair[0], &pair[1]);
            distances.push(total);
        }

        let duration = (total / animation.move_speed.max(0.001))
            .max(animation.min_duration);

        Self {
            unit,
            displayed: waypoints[0],
            waypoints,
            distances,
            duration,
            ease: animation.ease,
            elapsed: 0.0,
            done: false,
        }
    }

    pub fn unit(&self) -> OccupantId {
        self.unit
    }

    /// Where the unit should be drawn right now
    pub fn displayed_position(&self) -> WorldPosition {
        self.displayed
    }

    /// Where the unit will end up
    pub fn destination(&self) -> WorldPosition {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Fraction of the animation's time that has elapsed, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.done {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Step the animation forward by `dt` seconds. Negative steps are
    /// treated as zero.
    pub fn advance(&mut self, dt: f64) -> AnimationStatus {
        if self.done {
            return AnimationStatus::Done;
        }

        self.elapsed += dt.max(0.0);
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        if t >= 1.0 {
            self.finish();
            return AnimationStatus::Done;
        }

        let eased = apply_ease(t, self.ease);
        self.displayed = self.point_at(eased * self.total_distance());
        AnimationStatus::InProgress
    }

    /// Stop immediately, snapping to the destination. The unit's logical
    /// position is already there, so this just catches the visuals up.
    pub fn cancel(&mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.displayed = self.destination();
        self.done = true;
    }

    fn total_distance(&self) -> f64 {
        self.distances[self.distances.len() - 1]
    }

    /// Find the point a given distance along the path
    fn point_at(&self, distance: f64) -> WorldPosition {
        for i in 1..self.waypoints.len() {
            let (start, end) = (self.distances[i - 1], self.distances[i]);
            if distance <= end {
                let length = end - start;
                let fraction = if length > 0.0 {
                    (distance - start) / length
                } else {
                    1.0
                };
                let from = self.waypoints[i - 1];
                return from + (self.waypoints[i] - from) * fraction;
            }
        }
        self.destination()
    }
}

/// Blend between linear motion and smoothstep. An `ease` of 0 is linear, 1
/// is a full smoothstep.
fn apply_ease(x: f64, ease: f64) -> f64 {
    let smooth = x * x * (3.0 - 2.0 * x);
    x + (smooth - x) * ease
}
