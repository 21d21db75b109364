//! Ready-made cell classifiers for the CLI
//!
//! Each [`ColorMode`] turns a [`Hex`] into a fill colour. These are simple
//! ramps for eyeballing a grid, nothing more.

use clap::ValueEnum;
use image::Rgb;

use crate::grid::Hex;
use crate::render::ColorFn;

/// Attribute ranges the ramps are stretched over
pub const ALTITUDE_MAX: i32 = 255;
pub const MOISTURE_MAX: i32 = 100;
pub const TEMPERATURE_MIN: i32 = -30;
pub const TEMPERATURE_MAX: i32 = 40;

const LAND: (u8, u8, u8) = (70, 140, 60);
const WATER: (u8, u8, u8) = (40, 80, 160);
const UNOWNED_LAND: (u8, u8, u8) = (120, 120, 120);
const DRY: (u8, u8, u8) = (210, 190, 120);
const WET: (u8, u8, u8) = (30, 120, 60);
const COLD: (u8, u8, u8) = (40, 60, 200);
const HOT: (u8, u8, u8) = (220, 50, 40);

/// Which attribute the fill colour shows
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Land green, water blue
    Terrain,
    /// Greyscale elevation
    Altitude,
    /// Dry-to-wet ramp on land
    Moisture,
    /// Cold-to-hot ramp
    Temperature,
    /// One hue per territory
    Territory,
}

impl ColorMode {
    pub fn name(&self) -> &'static str {
        match self {
            ColorMode::Terrain => "terrain",
            ColorMode::Altitude => "altitude",
            ColorMode::Moisture => "moisture",
            ColorMode::Temperature => "temperature",
            ColorMode::Territory => "territory",
        }
    }

    pub fn all() -> &'static [ColorMode] {
        &[
            ColorMode::Terrain,
            ColorMode::Altitude,
            ColorMode::Moisture,
            ColorMode::Temperature,
            ColorMode::Territory,
        ]
    }

    pub fn classify(&self, hex: &Hex) -> Rgb<u8> {
        let (r, g, b) = match self {
            ColorMode::Terrain => {
                if hex.is_land() {
                    LAND
                } else {
                    WATER
                }
            }
            ColorMode::Altitude => {
                let v = (hex.altitude.clamp(0, ALTITUDE_MAX) * 255 / ALTITUDE_MAX) as u8;
                (v, v, v)
            }
            ColorMode::Moisture => {
                if hex.is_water() {
                    WATER
                } else {
                    blend_colors(DRY, WET, normalize(hex.moisture, 0, MOISTURE_MAX))
                }
            }
            ColorMode::Temperature => blend_colors(
                COLD,
                HOT,
                normalize(hex.temperature, TEMPERATURE_MIN, TEMPERATURE_MAX),
            ),
            ColorMode::Territory => match hex.territory {
                Some(id) => {
                    // Golden-angle hue steps keep neighbouring ids apart
                    let hue = (id.0 as f32 * 137.508) % 360.0;
                    let value = if hex.is_land() { 0.85 } else { 0.55 };
                    hsv_to_rgb(hue, 0.6, value)
                }
                None if hex.is_land() => UNOWNED_LAND,
                None => WATER,
            },
        };
        Rgb([r, g, b])
    }

    /// Boxed classifier suitable for [`crate::render::RenderConfig`].
    pub fn classifier(self) -> ColorFn {
        Box::new(move |hex: &Hex| self.classify(hex))
    }
}

fn normalize(value: i32, min: i32, max: i32) -> f32 {
    ((value - min) as f32 / (max - min) as f32).clamp(0.0, 1.0)
}

/// Convert HSV to RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

/// Blend two colors (0.0 = a, 1.0 = b)
fn blend_colors(a: (u8, u8, u8), b: (u8, u8, u8), ratio: f32) -> (u8, u8, u8) {
    let ratio = ratio.clamp(0.0, 1.0);
    let inv = 1.0 - ratio;
    (
        (a.0 as f32 * inv + b.0 as f32 * ratio) as u8,
        (a.1 as f32 * inv + b.1 as f32 * ratio) as u8,
        (a.2 as f32 * inv + b.2 as f32 * ratio) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridModel, HexGrid, Terrain};

    #[test]
    fn test_terrain_mode() {
        let grid = HexGrid::builder(2).terrain(0, 0, Terrain::Land).build();
        assert_eq!(ColorMode::Terrain.classify(grid.find_hex(0, 0)), Rgb([70, 140, 60]));
        assert_eq!(ColorMode::Terrain.classify(grid.find_hex(1, 0)), Rgb([40, 80, 160]));
    }

    #[test]
    fn test_ramps_clamp() {
        let grid = HexGrid::builder(2)
            .attributes(0, 0, 999, 0, -100)
            .attributes(1, 0, -5, 0, 100)
            .build();
        assert_eq!(ColorMode::Altitude.classify(grid.find_hex(0, 0)), Rgb([255, 255, 255]));
        assert_eq!(ColorMode::Altitude.classify(grid.find_hex(1, 0)), Rgb([0, 0, 0]));
        assert_eq!(ColorMode::Temperature.classify(grid.find_hex(0, 0)), Rgb([40, 60, 200]));
        assert_eq!(ColorMode::Temperature.classify(grid.find_hex(1, 0)), Rgb([220, 50, 40]));
    }

    #[test]
    fn test_territories_get_distinct_colors() {
        let grid = HexGrid::builder(2)
            .fill(Terrain::Land)
            .territory(0, 0, Some(1))
            .territory(1, 0, Some(2))
            .build();
        let a = ColorMode::Territory.classify(grid.find_hex(0, 0));
        let b = ColorMode::Territory.classify(grid.find_hex(1, 0));
        let unowned = ColorMode::Territory.classify(grid.find_hex(0, 1));
        assert_ne!(a, b);
        assert_eq!(unowned, Rgb([120, 120, 120]));
    }

    #[test]
    fn test_names_unique() {
        let names: std::collections::HashSet<_> = ColorMode::all().iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), ColorMode::all().len());
    }
}
