use crate::hex::AxialCoordinate;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Opaque identifier for something standing on the grid. Ids are assigned by
/// whoever creates the occupant; the grid only cares that they're unique.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[display(fmt = "#{}", _0)]
#[serde(transparent)]
pub struct OccupantId(pub u32);

/// Something that stands on a single grid cell, e.g. a unit. An occupant has
/// a position and a movement budget, which gets spent as it moves and is
/// restored at the start of each turn.
///
/// Occupants can't be moved directly. Once an occupant is registered with an
/// [OccupancyGrid](crate::OccupancyGrid), the grid owns it and is the only
/// thing that can change its position, so the position stored here always
/// agrees with the grid's own mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    id: OccupantId,

    /// Where this occupant currently stands. Only meaningful once the
    /// occupant has been registered with a grid.
    pub(super) position: AxialCoordinate,

    /// Movement points left this turn. Never exceeds the max.
    pub(super) movement_points: u32,

    /// Movement points restored at the start of each turn
    max_movement_points: u32,
}

impl Occupant {
    /// Create a new occupant with a full movement budget
    pub fn new(id: impl Into<OccupantId>, max_movement_points: u32) -> Self {
        Self {
            id: id.into(),
            position: AxialCoordinate::ORIGIN,
            movement_points: max_movement_points,
            max_movement_points,
        }
    }

    /// Override the remaining movement points, e.g. to spawn a unit that has
    /// already moved this turn. Clamped to the max.
    pub fn with_movement_points(mut self, movement_points: u32) -> Self {
        self.movement_points = movement_points.min(self.max_movement_points);
        self
    }

    pub fn id(&self) -> OccupantId {
        self.id
    }

    pub fn position(&self) -> AxialCoordinate {
        self.position
    }

    pub fn movement_points(&self) -> u32 {
        self.movement_points
    }

    pub fn max_movement_points(&self) -> u32 {
        self.max_movement_points
    }

    /// Restore the movement budget to its max
    pub(super) fn refresh(&mut self) {
        self.movement_points = self.max_movement_points;
    }
}
