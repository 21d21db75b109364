//! Font resolution for cell annotations
//!
//! A preferred TrueType font is tried first; when it cannot be loaded the
//! built-in 5x7 bitmap font stands in, scaled towards the requested size if
//! possible. Resolution never fails.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_FONT_PATH: &str = "fonts/DejaVuSans.ttf";
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
/// Horizontal distance between glyph origins at scale 1.
pub const GLYPH_ADVANCE: u32 = 6;

/// A font ready to draw with.
pub enum DrawFont {
    Outline { font: FontVec, scale: PxScale },
    /// Built-in bitmap font, each glyph pixel drawn as a `scale` x `scale` block
    Bitmap { scale: u32 },
}

impl DrawFont {
    /// The unsized built-in font, used for the fixed debug numbers.
    pub fn bitmap() -> Self {
        DrawFont::Bitmap { scale: 1 }
    }

    pub fn is_outline(&self) -> bool {
        matches!(self, DrawFont::Outline { .. })
    }
}

impl fmt::Debug for DrawFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawFont::Outline { scale, .. } => f
                .debug_struct("Outline")
                .field("scale", &(scale.x, scale.y))
                .finish_non_exhaustive(),
            DrawFont::Bitmap { scale } => f.debug_struct("Bitmap").field("scale", scale).finish(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("could not read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse font {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: InvalidFont,
    },

    #[error("default font cannot be drawn at {size}pt")]
    Unscalable { size: f32 },
}

/// One way of obtaining a font, tried in [`FontStrategy::CHAIN`] order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontStrategy {
    /// Load the requested TrueType file
    Preferred,
    /// Bitmap font scaled to the nearest whole multiple of the requested size
    SizedDefault,
    /// Bitmap font at its native size; cannot fail
    UnsizedDefault,
}

impl FontStrategy {
    pub const CHAIN: [FontStrategy; 3] = [
        FontStrategy::Preferred,
        FontStrategy::SizedDefault,
        FontStrategy::UnsizedDefault,
    ];

    pub fn attempt(self, path: &Path, size: f32) -> Result<DrawFont, FontError> {
        match self {
            FontStrategy::Preferred => {
                let bytes = fs::read(path).map_err(|source| FontError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let font = FontVec::try_from_vec(bytes).map_err(|source| FontError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(DrawFont::Outline {
                    font,
                    scale: PxScale::from(size),
                })
            }
            FontStrategy::SizedDefault => {
                let scale = (size / GLYPH_HEIGHT as f32).round();
                if !scale.is_finite() || scale < 1.0 {
                    return Err(FontError::Unscalable { size });
                }
                Ok(DrawFont::Bitmap {
                    scale: scale as u32,
                })
            }
            FontStrategy::UnsizedDefault => Ok(DrawFont::bitmap()),
        }
    }
}

/// Resolves the annotation font once per renderer.
#[derive(Clone, Debug)]
pub struct FontResolver {
    path: PathBuf,
    size: f32,
}

impl FontResolver {
    pub fn new(path: impl Into<PathBuf>, size: f32) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn resolve(&self) -> DrawFont {
        self.resolve_with_strategy().1
    }

    /// Walk the fallback chain and report which strategy produced the font.
    pub fn resolve_with_strategy(&self) -> (FontStrategy, DrawFont) {
        for strategy in FontStrategy::CHAIN {
            match strategy.attempt(&self.path, self.size) {
                Ok(font) => {
                    debug!("using {:?} font for annotations", strategy);
                    return (strategy, font);
                }
                Err(e) => warn!("{}, falling back", e),
            }
        }
        (FontStrategy::UnsizedDefault, DrawFont::bitmap())
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE)
    }
}

/// Rows of a 5x7 glyph, high bit on the left. Letters are drawn uppercase;
/// characters without a glyph leave a gap.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01110, 0b10001, 0b10000, 0b01110, 0b00001, 0b10001, 0b01110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        '#' => [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
        _ => return None,
    };
    Some(rows)
}

/// Draw `text` with the bitmap font, clipping at the image border.
pub fn draw_bitmap_text(img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>, scale: u32) {
    let scale = scale.max(1) as i32;
    let (width, height) = (img.width() as i32, img.height() as i32);
    let mut origin_x = x;

    for ch in text.chars() {
        if let Some(rows) = glyph(ch) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH as i32 {
                    if bits & (0b10000 >> col) == 0 {
                        continue;
                    }
                    let px = origin_x + col * scale;
                    let py = y + row as i32 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let (qx, qy) = (px + dx, py + dy);
                            if qx >= 0 && qy >= 0 && qx < width && qy < height {
                                img.put_pixel(qx as u32, qy as u32, color);
                            }
                        }
                    }
                }
            }
        }
        origin_x += GLYPH_ADVANCE as i32 * scale;
    }
}
