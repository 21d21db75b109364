//! Layered hex map renderer
//!
//! Draws a [`GridModel`] into a raster image one cell at a time, row-major.
//! Each cell gets its layers in a fixed order, later layers overwriting
//! earlier ones where they share pixels:
//!
//! 1. fill, coloured by the caller's classifier
//! 2. outline, six separate 1px edges
//! 3. coastlines (land/water edges, only when the grid has a hydrosphere)
//! 4. territory borders
//! 5. river segments
//! 6. debug text

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::{Rgb, RgbImage};
use imageproc::point::Point;
use tracing::{debug, info};

use crate::canvas::Canvas;
use crate::error::{HexmapError, Result};
use crate::font::{DrawFont, FontResolver, DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE};
use crate::geometry::{HexGeometry, HexMetrics, Side};
use crate::grid::{Edge, GridModel, Hex};

pub type ColorFn = Box<dyn Fn(&Hex) -> Rgb<u8>>;
pub type TextFn = Box<dyn Fn(&Hex) -> String>;

pub const OUTLINE_WIDTH: u32 = 1;
pub const COAST_WIDTH: u32 = 4;
pub const BORDER_WIDTH: u32 = 2;
pub const RIVER_WIDTH: u32 = 3;

// Debug text positions relative to the cell anchor
const ALTITUDE_OFFSET: (i32, i32) = (10, 3);
const COLUMN_OFFSET: (i32, i32) = (4, 11);
const ROW_OFFSET: (i32, i32) = (4, 19);
const MOISTURE_OFFSET: (i32, i32) = (18, 11);
const TEMPERATURE_OFFSET: (i32, i32) = (18, 19);
const CUSTOM_TEXT_OFFSET: (i32, i32) = (5, 5);

/// Colours of everything the renderer draws apart from the cell fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb<u8>,
    pub outline: Rgb<u8>,
    pub coast: Rgb<u8>,
    pub border: Rgb<u8>,
    pub river: Rgb<u8>,
    pub text: Rgb<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb([0, 0, 0]),
            outline: Rgb([0, 0, 0]),
            coast: Rgb([0, 0, 0]),
            border: Rgb([0, 0, 0]),
            river: Rgb([200, 200, 200]),
            text: Rgb([200, 200, 200]),
        }
    }
}

/// What to draw and how. Fixed for the lifetime of a renderer.
pub struct RenderConfig {
    pub color_func: ColorFn,
    pub map_name: String,
    pub rivers: bool,
    pub numbers: bool,
    pub show_coasts: bool,
    pub borders: bool,
    /// Extra per-cell label, drawn alongside the debug numbers
    pub text_func: Option<TextFn>,
    pub metrics: HexMetrics,
    pub palette: Palette,
    pub font_path: PathBuf,
    pub font_size: f32,
}

impl RenderConfig {
    /// Rivers on, every other overlay off.
    pub fn new(map_name: impl Into<String>, color_func: impl Fn(&Hex) -> Rgb<u8> + 'static) -> Self {
        Self {
            color_func: Box::new(color_func),
            map_name: map_name.into(),
            rivers: true,
            numbers: false,
            show_coasts: false,
            borders: false,
            text_func: None,
            metrics: HexMetrics::default(),
            palette: Palette::default(),
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    pub fn rivers(mut self, enabled: bool) -> Self {
        self.rivers = enabled;
        self
    }

    pub fn numbers(mut self, enabled: bool) -> Self {
        self.numbers = enabled;
        self
    }

    pub fn show_coasts(mut self, enabled: bool) -> Self {
        self.show_coasts = enabled;
        self
    }

    pub fn borders(mut self, enabled: bool) -> Self {
        self.borders = enabled;
        self
    }

    pub fn text_func(mut self, text_func: impl Fn(&Hex) -> String + 'static) -> Self {
        self.text_func = Some(Box::new(text_func));
        self
    }

    pub fn metrics(mut self, metrics: HexMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>, size: f32) -> Self {
        self.font_path = path.into();
        self.font_size = size;
        self
    }
}

/// Renders one grid with one configuration into a canvas it owns.
pub struct HexMapRenderer<'g, G: GridModel + ?Sized> {
    grid: &'g G,
    config: RenderConfig,
    geometry: HexGeometry,
    canvas: Canvas,
    /// Resolved only when a text function is configured
    label_font: Option<DrawFont>,
    number_font: DrawFont,
}

impl<'g, G: GridModel + ?Sized> HexMapRenderer<'g, G> {
    /// Fails when the grid at the configured cell size does not fit in an image.
    pub fn new(grid: &'g G, config: RenderConfig) -> Result<Self> {
        let geometry = HexGeometry::new(config.metrics);
        let (width, height) = geometry
            .canvas_size(grid.size())
            .ok_or(HexmapError::CanvasTooLarge {
                grid_size: grid.size(),
                side_length: config.metrics.side_length,
            })?;
        let canvas = Canvas::new(width, height, config.palette.background);
        let label_font = config
            .text_func
            .as_ref()
            .map(|_| FontResolver::new(config.font_path.clone(), config.font_size).resolve());

        Ok(Self {
            grid,
            config,
            geometry,
            canvas,
            label_font,
            number_font: DrawFont::bitmap(),
        })
    }

    pub fn geometry(&self) -> &HexGeometry {
        &self.geometry
    }

    pub fn map_name(&self) -> &str {
        &self.config.map_name
    }

    pub fn label_font(&self) -> Option<&DrawFont> {
        self.label_font.as_ref()
    }

    /// Draw every cell and return the map name with the finished image.
    ///
    /// Rendering again redraws onto the same canvas and yields the same pixels.
    pub fn render(&mut self) -> (&str, &RgbImage) {
        let started = Instant::now();
        let size = self.grid.size();
        let coasts = self.config.show_coasts && self.grid.params().hydrosphere();
        if self.config.show_coasts && !coasts {
            debug!("grid has no hydrosphere, skipping coastlines");
        }

        for row in 0..size {
            for col in 0..size {
                self.draw_cell(col, row, coasts);
            }
        }

        info!(
            "Making {}: {}x{} cells in {:.2?}",
            self.config.map_name,
            size,
            size,
            started.elapsed()
        );
        (self.config.map_name.as_str(), self.canvas.image())
    }

    /// Render and take ownership of the result.
    pub fn finish(mut self) -> (String, RgbImage) {
        self.render();
        (self.config.map_name, self.canvas.into_image())
    }

    /// Render and write the image; the format follows the file extension.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (_, image) = self.render();
        image.save(path)?;
        info!("Saved {}", path.display());
        Ok(())
    }

    fn draw_cell(&mut self, col: usize, row: usize, coasts: bool) {
        let grid = self.grid;
        let hex = grid.find_hex(col, row);
        let anchor = self.geometry.anchor(col, row);

        self.draw_hexagon(hex, anchor);
        if coasts {
            self.draw_coasts(hex, anchor);
        }
        if self.config.borders {
            self.draw_borders(hex, anchor);
        }
        if self.config.rivers {
            self.draw_rivers(grid.find_river(col, row), anchor);
        }
        if self.config.numbers {
            self.draw_numbers(hex, anchor);
        }
    }

    fn draw_hexagon(&mut self, hex: &Hex, anchor: Point<i32>) {
        let vertices = self.geometry.vertices(anchor);
        let fill = (self.config.color_func)(hex);
        self.canvas.fill_polygon(&vertices, fill);

        for side in Side::ALL {
            self.draw_edge(anchor, side, self.config.palette.outline, OUTLINE_WIDTH);
        }
    }

    fn draw_coasts(&mut self, hex: &Hex, anchor: Point<i32>) {
        if !hex.is_land() {
            return;
        }
        let grid = self.grid;
        for edge in own_edges(hex) {
            let Some((col, row)) = edge.two else { continue };
            if grid.find_hex(col, row).is_water() {
                self.draw_edge(anchor, edge.side, self.config.palette.coast, COAST_WIDTH);
            }
        }
    }

    fn draw_borders(&mut self, hex: &Hex, anchor: Point<i32>) {
        let grid = self.grid;
        for edge in own_edges(hex) {
            let Some((col, row)) = edge.two else { continue };
            let other = grid.find_hex(col, row);
            if let (Some(a), Some(b)) = (hex.territory, other.territory) {
                if a != b {
                    self.draw_edge(anchor, edge.side, self.config.palette.border, BORDER_WIDTH);
                }
            }
        }
    }

    fn draw_rivers(&mut self, segments: &[Side], anchor: Point<i32>) {
        for &side in segments {
            self.draw_edge(anchor, side, self.config.palette.river, RIVER_WIDTH);
        }
    }

    fn draw_numbers(&mut self, hex: &Hex, anchor: Point<i32>) {
        let color = self.config.palette.text;
        let numbers = [
            (ALTITUDE_OFFSET, hex.altitude.to_string()),
            (COLUMN_OFFSET, hex.col.to_string()),
            (ROW_OFFSET, hex.row.to_string()),
            (MOISTURE_OFFSET, hex.moisture.to_string()),
            (TEMPERATURE_OFFSET, hex.temperature.to_string()),
        ];
        for (offset, text) in &numbers {
            self.canvas
                .text(shifted(anchor, *offset), text, color, &self.number_font);
        }

        if let (Some(text_func), Some(font)) = (&self.config.text_func, &self.label_font) {
            let label = text_func(hex);
            self.canvas
                .text(shifted(anchor, CUSTOM_TEXT_OFFSET), &label, color, font);
        }
    }

    fn draw_edge(&mut self, anchor: Point<i32>, side: Side, color: Rgb<u8>, width: u32) {
        let (from, to) = self.geometry.edge_endpoints(anchor, side);
        self.canvas.line(from, to, color, width);
    }
}

/// Edges that actually start at `hex`; anything else is inconsistent grid
/// data and is left undrawn.
fn own_edges(hex: &Hex) -> impl Iterator<Item = &Edge> {
    let coord = hex.coord();
    hex.edges.iter().filter(move |edge| edge.one == coord)
}

fn shifted(anchor: Point<i32>, (dx, dy): (i32, i32)) -> Point<i32> {
    Point::new(anchor.x + dx, anchor.y + dy)
}
