//! Spatial primitives: the board grid, piece shapes, and wall-kick tables.

pub use self::{board::*, kicks::*, piece::*};

pub(crate) mod board;
pub(crate) mod kicks;
pub(crate) mod piece;
