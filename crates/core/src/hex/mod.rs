//! This module holds basic types and data structures related to hexagon grids.
//!
//! ## Coordinate Systems
//!
//! Hexfleet uses two different coordinate systems:
//!
//! ### Axial Coordinates
//!
//! Axial coordinates address cells within the hexagon grid. The system is the
//! [axial coordinate system described by Amit Patel](https://www.redblobgames.com/grids/hexagons/#coordinates-axial).
//! Every cell has two integer components, `q` and `r`. Axial coordinates are a
//! projection of cube coordinates: there is an implicit third component
//! `s = -q - r`, so that `q + r + s = 0` for every cell. We never store `s`,
//! but a lot of the math (distance, rounding, bounds checks) is easiest to
//! express in terms of all three.
//!
//! The grid itself is a "super hexagon" of some radius around the origin. A
//! cell is on the grid iff `|q|`, `|r|` and `|s|` are all at most the radius.
//! See [GridConfig](crate::GridConfig).
//!
//! ### World Coordinates
//!
//! World coordinates are the 3D space that the presentation layer renders
//! into. The grid lies on the `y = 0` plane, and cells are laid out on the XZ
//! plane. Two layouts are supported:
//!
//! - **Pointy-topped** (the default): neighbors sit at multiples of 60°
//!   starting at east (`+x`). Moving `+r` moves towards `-z`.
//! - **Flat-topped**: the same grid rotated by 30°.
//!
//! See [axial_to_world] and [world_to_axial] for the conversion between the
//! two systems. Converting from world space back to axial space requires
//! rounding a fractional coordinate to the closest cell, which is done with
//! cube rounding (rounding component-wise is wrong near cell boundaries).

mod data_structure;
mod projection;
mod unit;

pub use self::{data_structure::*, projection::*, unit::*};
