use crate::{
    config::GridConfig,
    hex::{world_to_axial, AxialCoordinate, PositionLookup, WorldPosition},
};
use derive_more::Display;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Modifier keys held during an input event
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(default)]
pub struct Modifiers {
    /// Add to the current selection instead of replacing it (e.g. shift)
    pub additive: bool,
    /// Alternate action (e.g. ctrl/alt). The core doesn't interpret this,
    /// it's passed through for entities to look at.
    pub alternate: bool,
}

#[derive(
    Copy, Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    #[display(fmt = "Button{}", _0)]
    Other(u8),
}

impl Default for MouseButton {
    fn default() -> Self {
        Self::Left
    }
}

/// Opaque tag identifying whatever produced an input event, e.g. an input
/// router or a player ID. The core carries it around but never reads it.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceTag(pub String);

impl From<&str> for SourceTag {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SourceTag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Everything known about a single input event, as resolved by the input
/// layer. This is handed (by reference) to every entity involved in the
/// resulting selection change, and copied into selection events.
///
/// Built with [Self::new] or [Self::resolve], then customized with the
/// builder-style setters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionContext {
    /// Where the click landed on the grid plane
    pub world_point: WorldPosition,
    /// Where the click landed on screen, in pixels
    pub screen_point: Point2<f64>,
    pub modifiers: Modifiers,
    pub button: MouseButton,
    /// The cell that was clicked, if the click landed on one
    pub axial: Option<AxialCoordinate>,
    /// World position of the clicked cell's center, if any
    pub hex_center: Option<WorldPosition>,
    pub source: Option<SourceTag>,
}

impl SelectionContext {
    /// A plain left click at some world point, not resolved to any cell
    pub fn new(world_point: WorldPosition) -> Self {
        Self {
            world_point,
            screen_point: Point2::origin(),
            modifiers: Modifiers::default(),
            button: MouseButton::default(),
            axial: None,
            hex_center: None,
            source: None,
        }
    }

    /// Build a context for a click at the given world point, resolving it to
    /// a cell. The cell fields are only filled in if the lookup knows about
    /// the cell, so clicks that land off the grid (or on a cell that was
    /// never rendered) carry no cell. Neither do points with a non-finite
    /// `x` or `z`.
    pub fn resolve(
        world_point: WorldPosition,
        config: &GridConfig,
        lookup: &dyn PositionLookup,
    ) -> Self {
        let mut context = Self::new(world_point);
        // NaN or infinite input would round to a real cell
        if !(world_point.x.is_finite() && world_point.z.is_finite()) {
            return context;
        }
        let coord = world_to_axial(world_point, config.hex_size);
        if let Some(center) = lookup.try_get_world_position(coord) {
            context.axial = Some(coord);
            context.hex_center = Some(center);
        }
        context
    }

    pub fn additive(mut self, additive: bool) -> Self {
        self.modifiers.additive = additive;
        self
    }

    pub fn alternate(mut self, alternate: bool) -> Self {
        self.modifiers.alternate = alternate;
        self
    }

    pub fn button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn screen_point(mut self, screen_point: Point2<f64>) -> Self {
        self.screen_point = screen_point;
        self
    }

    pub fn source(mut self, source: impl Into<SourceTag>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_additive(&self) -> bool {
        self.modifiers.additive
    }
}

impl Default for SelectionContext {
    fn default() -> Self {
        Self::new(WorldPosition::origin())
    }
}
