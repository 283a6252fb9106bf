//! Hexfleet is the logical core of a turn-based tactics game played on a hex
//! grid. It covers the geometry of the grid, unit movement (range and path
//! queries), and the selection and movement state machines that turn player
//! input into unit commands. Rendering, input capture and animation playback
//! are left to whatever host embeds this crate; the core only needs to be
//! told where a click landed, and tells the host what to draw via events.
//!
//! ```
//! use hexfleet::{AxialCoordinate, OccupantId, SelectionContext, Tactics, TacticsConfig, Unit};
//!
//! let mut tactics = Tactics::new(TacticsConfig::default()).unwrap();
//! tactics
//!     .deploy(OccupantId(1), Unit::new("Frigate", 0), AxialCoordinate::ORIGIN, 2)
//!     .unwrap();
//! tactics.movement_events().subscribe(|event| println!("{:?}", event));
//!
//! tactics.select(OccupantId(1), &SelectionContext::default());
//! tactics.start_movement();
//! let preview = tactics.preview_target(AxialCoordinate::new(1, 1)).unwrap();
//! assert!(preview.executable);
//! ```
//!
//! See [TacticsConfig] for details on how the grid and movement can be
//! customized.

mod config;
mod context;
mod error;
mod events;
mod grid;
pub mod hex;
pub mod movement;
pub mod selection;
mod util;

pub use crate::{
    config::{AnimationConfig, GridConfig, TacticsConfig},
    context::{ClickOutcome, Snapshot, Tactics, Unit, UnitSnapshot},
    error::MoveError,
    events::{EventBus, SubscriptionId},
    grid::{OccupancyGrid, Occupant, OccupantId},
    hex::{AxialCoordinate, HexDirection, WorldPosition},
    selection::{Selectable, SelectionContext, SelectionCoordinator},
    util::grid_len,
};
