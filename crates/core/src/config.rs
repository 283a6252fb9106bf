use crate::hex::AxialCoordinate;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level configuration for a tactics session. This is a plain data
/// struct, so the host application can load it however it likes (the CLI
/// reads it from TOML or JSON). Always run it through [Self::validated]
/// before use.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TacticsConfig {
    /// Shape and scale of the grid
    #[validate]
    pub grid: GridConfig,

    /// Tuning for unit movement animations
    #[validate]
    pub animation: AnimationConfig,

    /// Cost of a single step onto a cell that has no terrain override. Every
    /// traversable step costs at least 1.
    #[validate(range(min = 1))]
    pub default_step_cost: u32,
}

impl TacticsConfig {
    /// Check that every field is in range. The returned error wraps a
    /// [validator::ValidationErrors] for field-level issues, so callers can
    /// downcast it to find out which fields were bad.
    pub fn validated(self) -> anyhow::Result<Self> {
        self.validate().context("invalid config")?;
        self.grid.check_hex_size()?;
        Ok(self)
    }
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            animation: AnimationConfig::default(),
            default_step_cost: 1,
        }
    }
}

/// Immutable description of the grid. The grid is a super hexagon: every
/// cell within `grid_radius` steps of the origin exists, nothing else does.
/// Anything that needs to know the grid bounds or scale takes one of these
/// explicitly.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GridConfig {
    /// Distance from the center of a cell to any of its corners, in world
    /// units. Must be strictly positive.
    #[validate(range(min = 0.0))]
    pub hex_size: f64,

    /// Distance from the center of the grid to the edge (in cells). 0 means
    /// the grid is exactly one cell.
    #[validate(range(min = 0, max = 10000))]
    pub grid_radius: u16,
}

impl GridConfig {
    /// Create a grid config, rejecting invalid values
    pub fn new(hex_size: f64, grid_radius: u16) -> anyhow::Result<Self> {
        let config = Self {
            hex_size,
            grid_radius,
        };
        config.validate().context("invalid grid config")?;
        config.check_hex_size()?;
        Ok(config)
    }

    /// Is the given cell on the grid? This is a pure bounds check on the cube
    /// components, it doesn't care whether anything was ever rendered there.
    pub fn contains(&self, coord: AxialCoordinate) -> bool {
        let radius = self.grid_radius as u32;
        coord.q.unsigned_abs() <= radius
            && coord.r.unsigned_abs() <= radius
            && coord.s().unsigned_abs() <= radius
    }

    /// The validator range check is inclusive, so zero has to be rejected
    /// separately
    fn check_hex_size(&self) -> anyhow::Result<()> {
        ensure!(
            self.hex_size > 0.0 && self.hex_size.is_finite(),
            "hex_size must be a positive number, but was {}",
            self.hex_size
        );
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hex_size: 1.0,
            grid_radius: 5,
        }
    }
}

/// Tuning for the animation that plays when a unit moves. This doesn't affect
/// game logic at all, since logical positions are committed before the
/// animation starts.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnimationConfig {
    /// How fast units travel along their path, in world units per second
    #[validate(range(min = 0.001))]
    pub move_speed: f64,

    /// How much easing to apply at either end of the motion. 0 is linear, 1
    /// is a full smoothstep.
    #[validate(range(min = 0.0, max = 1.0))]
    pub ease: f64,

    /// Shortest time any move animation can take, in seconds. Keeps a
    /// zero-length move from dividing by zero.
    #[validate(range(min = 0.0001))]
    pub min_duration: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            ease: 0.25,
            min_duration: 0.0001,
        }
    }
}
