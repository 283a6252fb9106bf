//! Conversions between axial space and world space. These are all pure
//! functions of a coordinate and the hex size, so they can be used anywhere
//! without any grid state.

use super::unit::cube_round;
use crate::{
    config::GridConfig,
    hex::{AxialCoordinate, WorldPosition},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// The two ways a hex grid can be laid out in world space. Most of the crate
/// only cares about pointy-top, but some presentation layers ask for flat-top
/// so both are supported.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    #[default]
    PointyTop,
    FlatTop,
}

impl Orientation {
    /// Convert a cell to the world position of its center, in this layout
    pub fn axial_to_world(
        self,
        coord: AxialCoordinate,
        hex_size: f64,
    ) -> WorldPosition {
        match self {
            Self::PointyTop => axial_to_world(coord, hex_size),
            Self::FlatTop => axial_to_world_flat_top(coord, hex_size),
        }
    }

    /// Find the cell that contains a world position, in this layout
    pub fn world_to_axial(
        self,
        position: WorldPosition,
        hex_size: f64,
    ) -> AxialCoordinate {
        match self {
            Self::PointyTop => world_to_axial(position, hex_size),
            Self::FlatTop => world_to_axial_flat_top(position, hex_size),
        }
    }
}

/// Get the world position of a cell's center, using the pointy-top layout.
/// `hex_size` is the distance from a cell's center to any of its corners.
pub fn axial_to_world(coord: AxialCoordinate, hex_size: f64) -> WorldPosition {
    let q = coord.q as f64;
    let r = coord.r as f64;
    WorldPosition::new(
        hex_size * SQRT_3 * (q + r / 2.0),
        0.0,
        -hex_size * 1.5 * r,
    )
}

/// Get the world position of a cell's center, using the flat-top layout.
/// `hex_size` is the distance from a cell's center to any of its corners.
pub fn axial_to_world_flat_top(
    coord: AxialCoordinate,
    hex_size: f64,
) -> WorldPosition {
    let q = coord.q as f64;
    let r = coord.r as f64;
    WorldPosition::new(hex_size * 1.5 * q, 0.0, hex_size * SQRT_3 * (r + q / 2.0))
}

/// Find the pointy-top cell that contains a world position. The `y`
/// component is ignored. This is the exact inverse of [axial_to_world] for
/// every cell center.
pub fn world_to_axial(position: WorldPosition, hex_size: f64) -> AxialCoordinate {
    // z grows in the opposite direction of r, so flip it first
    let flipped_z = -position.z;
    let q = (SQRT_3 / 3.0 * position.x - flipped_z / 3.0) / hex_size;
    let r = (2.0 / 3.0 * flipped_z) / hex_size;
    cube_round(q, r)
}

/// Find the flat-top cell that contains a world position. The `y` component
/// is ignored. This is the exact inverse of [axial_to_world_flat_top] for
/// every cell center.
pub fn world_to_axial_flat_top(
    position: WorldPosition,
    hex_size: f64,
) -> AxialCoordinate {
    let q = (2.0 / 3.0 * position.x) / hex_size;
    let r = (-position.x / 3.0 + SQRT_3 / 3.0 * position.z) / hex_size;
    cube_round(q, r)
}

/// Something that knows which cells actually exist in world space. This is
/// usually implemented by the presentation layer, since that's where cells get
/// spawned. A cell that exists logically (within the grid radius) may still
/// have no world position if the presentation layer never rendered it.
pub trait PositionLookup {
    fn try_get_world_position(
        &self,
        coord: AxialCoordinate,
    ) -> Option<WorldPosition>;
}

/// A [PositionLookup] that answers purely from grid config: every cell within
/// the grid radius exists, at its pointy-top position. Useful for headless
/// hosts and tests.
#[derive(Copy, Clone, Debug)]
pub struct GridLayout {
    config: GridConfig,
    orientation: Orientation,
}

impl GridLayout {
    pub fn new(config: GridConfig) -> Self {
        Self::with_orientation(config, Orientation::PointyTop)
    }

    pub fn with_orientation(config: GridConfig, orientation: Orientation) -> Self {
        Self {
            config,
            orientation,
        }
    }
}

impl PositionLookup for GridLayout {
    fn try_get_world_position(
        &self,
        coord: AxialCoordinate,
    ) -> Option<WorldPosition> {
        if self.config.contains(coord) {
            Some(self.orientation.axial_to_world(coord, self.config.hex_size))
        } else {
            None
        }
    }
}
