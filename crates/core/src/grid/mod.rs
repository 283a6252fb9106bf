//! The occupancy model: which occupant is standing on which cell.

mod occupant;

pub use self::occupant::{Occupant, OccupantId};

use crate::{
    error::MoveError,
    hex::{AxialCoordinate, AxialMap},
};
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use log::debug;

/// The authoritative mapping of cells to the occupants standing on them. At
/// most one occupant can stand on any cell.
///
/// The grid owns its occupants, and every mutation goes through one of the
/// methods here. Each mutation updates both the cell mapping and the
/// occupant's own position in one step, or fails and touches nothing, so the
/// two can never disagree.
///
/// The grid doesn't know about bounds. Callers that care (e.g. the movement
/// coordinator) check [GridConfig::contains](crate::GridConfig::contains)
/// before placing anything.
#[derive(Clone, Debug, Default)]
pub struct OccupancyGrid {
    /// Occupants keyed by ID. Ordered so that iteration is deterministic.
    occupants: IndexMap<OccupantId, Occupant, FnvBuildHasher>,
    /// Reverse lookup, for O(1) "who's here?" queries
    positions: AxialMap<OccupantId>,
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an occupant on a cell. Fails if the cell already holds another
    /// occupant, or if this occupant is already on the grid.
    pub fn register(
        &mut self,
        mut occupant: Occupant,
        at: AxialCoordinate,
    ) -> Result<(), MoveError> {
        let id = occupant.id();
        if self.occupants.contains_key(&id) {
            return Err(MoveError::invalid_state(format!(
                "occupant {} is already on the grid",
                id
            )));
        }
        if let Some(&other) = self.positions.get(&at) {
            return Err(MoveError::Occupied {
                coord: at,
                occupant: other,
            });
        }

        debug!("Registering occupant {} at {}", id, at);
        occupant.position = at;
        self.positions.insert(at, id);
        self.occupants.insert(id, occupant);
        Ok(())
    }

    /// Remove an occupant from the grid, returning it. If the occupant isn't
    /// on the grid, this does nothing.
    pub fn unregister(&mut self, id: OccupantId) -> Option<Occupant> {
        let occupant = self.occupants.shift_remove(&id)?;
        debug!("Unregistering occupant {} from {}", id, occupant.position);
        self.positions.remove(&occupant.position);
        Some(occupant)
    }

    /// Move an occupant from one cell to another. `from` must be the
    /// occupant's current position. Fails if `to` holds a different
    /// occupant. This doesn't check adjacency or movement points, it's a
    /// teleport; the movement engine decides whether the move is legal.
    pub fn move_occupant(
        &mut self,
        id: OccupantId,
        from: AxialCoordinate,
        to: AxialCoordinate,
    ) -> Result<(), MoveError> {
        let current = match self.occupants.get(&id) {
            Some(occupant) => occupant.position,
            None => {
                return Err(MoveError::invalid_state(format!(
                    "occupant {} is not on the grid",
                    id
                )))
            }
        };
        if current != from {
            return Err(MoveError::invalid_state(format!(
                "occupant {} is at {}, not {}",
                id, current, from
            )));
        }
        match self.positions.get(&to) {
            Some(&other) if other != id => {
                return Err(MoveError::Occupied {
                    coord: to,
                    occupant: other,
                })
            }
            Some(_) => return Ok(()), // Already there
            None => {}
        }

        // All checks passed, nothing below here can fail
        self.positions.remove(&from);
        self.positions.insert(to, id);
        if let Some(occupant) = self.occupants.get_mut(&id) {
            occupant.position = to;
        }
        debug!("Moved occupant {} from {} to {}", id, from, to);
        Ok(())
    }

    /// Get the occupant standing on a cell, if any
    pub fn occupant_at(&self, coord: AxialCoordinate) -> Option<&Occupant> {
        self.positions
            .get(&coord)
            .and_then(|id| self.occupants.get(id))
    }

    pub fn occupant_id_at(&self, coord: AxialCoordinate) -> Option<OccupantId> {
        self.positions.get(&coord).copied()
    }

    pub fn is_occupied(&self, coord: AxialCoordinate) -> bool {
        self.positions.contains_key(&coord)
    }

    /// Is this cell held by some occupant other than the given one? An
    /// occupant never blocks itself.
    pub fn is_occupied_by_other(
        &self,
        coord: AxialCoordinate,
        id: OccupantId,
    ) -> bool {
        matches!(self.positions.get(&coord), Some(&other) if other != id)
    }

    pub fn get(&self, id: OccupantId) -> Option<&Occupant> {
        self.occupants.get(&id)
    }

    pub fn contains(&self, id: OccupantId) -> bool {
        self.occupants.contains_key(&id)
    }

    /// Iterate over every occupant, in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Occupant> {
        self.occupants.values()
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Deduct movement points from an occupant. Returns the points left over.
    /// Fails without deducting anything if the occupant can't afford it.
    pub fn spend_movement_points(
        &mut self,
        id: OccupantId,
        cost: u32,
    ) -> Result<u32, MoveError> {
        let occupant = self.occupants.get_mut(&id).ok_or_else(|| {
            MoveError::invalid_state(format!(
                "occupant {} is not on the grid",
                id
            ))
        })?;
        if cost > occupant.movement_points {
            return Err(MoveError::InsufficientBudget {
                required: cost,
                available: occupant.movement_points,
            });
        }
        occupant.movement_points -= cost;
        Ok(occupant.movement_points)
    }

    /// Restore every occupant's movement points to their max. Called at the
    /// start of each turn.
    pub fn refresh_movement_points(&mut self) {
        for occupant in self.occupants.values_mut() {
            occupant.refresh();
        }
    }

    /// Check that the cell mapping and every occupant's own position agree.
    /// This should always be true; it's here so tests can verify it after
    /// arbitrary sequences of operations.
    pub fn is_consistent(&self) -> bool {
        self.positions.len() == self.occupants.len()
            && self.occupants.iter().all(|(id, occupant)| {
                occupant.id() == *id
                    && self.positions.get(&occupant.position) == Some(id)
            })
    }
}
