use crate::{grid::OccupantId, hex::AxialCoordinate};
use derive_more::{Display, Error};

/// Everything that can go wrong when mutating the grid or issuing a movement
/// command. None of these are fatal: whoever gets one should decline the
/// requested action and carry on. The operation that produced the error is
/// guaranteed to have left all state untouched.
///
/// Read-only queries (range, path search) never produce these. "No path" is
/// an expected answer to a question, so those just return `None`.
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The target cell holds a different occupant
    #[display(fmt = "cell {} is occupied by {}", coord, occupant)]
    Occupied {
        coord: AxialCoordinate,
        occupant: OccupantId,
    },

    /// The coordinate is outside the grid radius
    #[display(fmt = "cell {} is outside the grid", coord)]
    OutOfBounds { coord: AxialCoordinate },

    /// The move costs more movement points than the occupant has left
    #[display(
        fmt = "movement costs {} points, but only {} remain",
        required,
        available
    )]
    InsufficientBudget { required: u32, available: u32 },

    /// Path search gave up without reaching the target
    #[display(fmt = "no path from {} to {}", from, to)]
    NoPath {
        from: AxialCoordinate,
        to: AxialCoordinate,
    },

    /// The operation doesn't make sense right now, e.g. executing a move
    /// while no unit is in movement mode
    #[display(fmt = "invalid state: {}", reason)]
    InvalidState { reason: String },
}

impl MoveError {
    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }
}
