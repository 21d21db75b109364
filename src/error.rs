use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by grid loading and map export.
///
/// Rendering itself never fails; see [`crate::render::HexMapRenderer::render`].
#[derive(Debug, Error)]
pub enum HexmapError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid grid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("cell ({col}, {row}) is outside a grid of size {size}")]
    CellOutOfRange { col: usize, row: usize, size: usize },

    #[error("grid size {size} exceeds the limit of {max}")]
    GridTooLarge { size: usize, max: usize },

    #[error("a {grid_size}x{grid_size} grid with side length {side_length} does not fit in an image")]
    CanvasTooLarge { grid_size: usize, side_length: i32 },

    #[error("grid of size {size} must hold {expected} cells, got {actual}")]
    SizeMismatch {
        size: usize,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, HexmapError>;
