//! Synthetic demo grids
//!
//! Builds a deterministic, plausible-looking grid from a seed so the
//! renderer can be exercised without an external world generator:
//! Perlin altitude and moisture, a latitude temperature band, territories
//! grown from random capitals and rivers traced downhill.

use noise::{NoiseFn, Perlin, Seedable};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::colors::{ALTITUDE_MAX, MOISTURE_MAX, TEMPERATURE_MAX, TEMPERATURE_MIN};
use crate::geometry::{HexGeometry, Side};
use crate::grid::{neighbor_coord, GridParams, HexCoord, HexGrid, Terrain, MAX_GRID_SIZE};

/// Knobs for [`generate_grid`]
#[derive(Clone, Debug)]
pub struct SyntheticParams {
    pub size: usize,
    pub seed: u64,
    /// Cells at or above this altitude are land
    pub sea_level: i32,
    /// Noise frequency per cell
    pub frequency: f64,
    pub territories: usize,
    pub rivers: usize,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            size: 16,
            seed: 42,
            sea_level: 128,
            frequency: 0.13,
            territories: 4,
            rivers: 3,
        }
    }
}

/// Minimum height above sea level for a river source
const RIVER_SOURCE_HEIGHT: i32 = 30;
/// Degrees lost per altitude unit above sea level
const LAPSE_RATE: f32 = 0.1;

/// Panics when `params.size` exceeds [`MAX_GRID_SIZE`].
pub fn generate_grid(params: &SyntheticParams) -> HexGrid {
    let size = params.size;
    assert!(size <= MAX_GRID_SIZE, "grid size {} exceeds {}", size, MAX_GRID_SIZE);
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let terrain_noise = Perlin::new(1).set_seed(params.seed as u32);
    let moisture_noise = Perlin::new(1).set_seed((params.seed as u32).wrapping_add(1111));

    let mut altitude = vec![0i32; size * size];
    let mut moisture = vec![0i32; size * size];
    let mut temperature = vec![0i32; size * size];
    let mid = (size.saturating_sub(1)) as f32 / 2.0;

    for row in 0..size {
        for col in 0..size {
            let idx = row * size + col;
            // Rows run horizontally in pixel space, columns vertically
            let nx = row as f64 * params.frequency;
            let ny = col as f64 * params.frequency;

            let base = terrain_noise.get([nx, ny]) + 0.5 * terrain_noise.get([nx * 2.0, ny * 2.0]);
            let a = ((base / 1.5 + 1.0) / 2.0 * ALTITUDE_MAX as f64) as i32;
            altitude[idx] = a.clamp(0, ALTITUDE_MAX);

            let m = (moisture_noise.get([nx, ny]) + 1.0) / 2.0 * MOISTURE_MAX as f64;
            moisture[idx] = (m as i32).clamp(0, MOISTURE_MAX);

            let latitude = if mid > 0.0 { (col as f32 - mid).abs() / mid } else { 0.0 };
            let band = TEMPERATURE_MAX as f32 - latitude * (TEMPERATURE_MAX - TEMPERATURE_MIN) as f32;
            let lapse = (altitude[idx] - params.sea_level).max(0) as f32 * LAPSE_RATE;
            temperature[idx] = (band - lapse).round() as i32;
        }
    }

    let land: Vec<HexCoord> = (0..size)
        .flat_map(|row| (0..size).map(move |col| (col, row)))
        .filter(|&(col, row)| altitude[row * size + col] >= params.sea_level)
        .collect();

    let territory = assign_territories(&land, size, params.territories, &mut rng);
    let rivers = trace_rivers(&land, &altitude, size, params, &mut rng);

    let mut builder = HexGrid::builder(size).param(GridParams::HYDROSPHERE, true);
    for row in 0..size {
        for col in 0..size {
            let idx = row * size + col;
            let terrain = if altitude[idx] >= params.sea_level {
                Terrain::Land
            } else {
                Terrain::Water
            };
            builder = builder
                .attributes(col, row, altitude[idx], moisture[idx], temperature[idx])
                .terrain(col, row, terrain)
                .territory(col, row, territory[idx]);
        }
    }
    for (col, row, side) in rivers {
        builder = builder.river(col, row, side);
    }

    builder.build()
}

/// Give every land cell the id of its nearest capital (in pixel distance).
fn assign_territories(
    land: &[HexCoord],
    size: usize,
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Option<u32>> {
    let mut territory = vec![None; size * size];
    let capitals: Vec<HexCoord> = land.choose_multiple(rng, count).copied().collect();
    if capitals.is_empty() {
        return territory;
    }

    let geometry = HexGeometry::default();
    let distance = |a: HexCoord, b: HexCoord| {
        let pa = geometry.anchor(a.0, a.1);
        let pb = geometry.anchor(b.0, b.1);
        let (dx, dy) = ((pa.x - pb.x) as i64, (pa.y - pb.y) as i64);
        dx * dx + dy * dy
    };

    for &cell in land {
        let nearest = capitals
            .iter()
            .enumerate()
            .min_by_key(|(_, &capital)| distance(cell, capital))
            .map(|(i, _)| i as u32 + 1);
        territory[cell.1 * size + cell.0] = nearest;
    }
    territory
}

/// Follow steepest descent from a few high land cells until the flow
/// reaches water, a pit or an earlier river. Each step marks the side the
/// water leaves through.
fn trace_rivers(
    land: &[HexCoord],
    altitude: &[i32],
    size: usize,
    params: &SyntheticParams,
    rng: &mut ChaCha8Rng,
) -> Vec<(usize, usize, Side)> {
    let sources: Vec<HexCoord> = land
        .iter()
        .copied()
        .filter(|&(col, row)| altitude[row * size + col] >= params.sea_level + RIVER_SOURCE_HEIGHT)
        .collect();

    let mut visited = vec![false; size * size];
    let mut segments = Vec::new();

    for &(mut col, mut row) in sources.choose_multiple(rng, params.rivers) {
        loop {
            let idx = row * size + col;
            if visited[idx] || altitude[idx] < params.sea_level {
                break;
            }
            visited[idx] = true;

            let lowest = Side::ALL
                .into_iter()
                .filter_map(|side| neighbor_coord(col, row, side, size).map(|n| (side, n)))
                .min_by_key(|&(_, (n_col, n_row))| altitude[n_row * size + n_col]);

            let Some((side, (n_col, n_row))) = lowest else { break };
            if altitude[n_row * size + n_col] >= altitude[idx] {
                break;
            }
            segments.push((col, row, side));
            col = n_col;
            row = n_row;
        }
    }
    segments
}
