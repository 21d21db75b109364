//! Hex map debug renderer
//!
//! Rasterizes a hex grid (anything implementing [`grid::GridModel`]) into an
//! RGB image with optional coast, border, river and annotation layers.

pub mod canvas;
pub mod colors;
pub mod error;
pub mod font;
pub mod geometry;
pub mod grid;
pub mod render;
pub mod synthetic;

pub use error::{HexmapError, Result};
pub use grid::{GridModel, HexGrid};
pub use render::{HexMapRenderer, RenderConfig};
