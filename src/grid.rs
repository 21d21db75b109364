//! Hex grid model consumed by the renderer
//!
//! The renderer only ever reads a grid through [`GridModel`]. [`HexGrid`] is
//! the in-memory implementation used by the CLI and tests; it can be built
//! programmatically or loaded from a JSON grid document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HexmapError, Result};
use crate::geometry::Side;

/// Largest grid edge accepted from documents and the builder.
pub const MAX_GRID_SIZE: usize = 4096;

/// Logical `(col, row)` address of a cell.
pub type HexCoord = (usize, usize);

/// Identifier of a territory (ownership group).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerritoryId(pub u32);

/// Land/water classification of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Land,
    #[default]
    Water,
}

/// Boundary between a cell (`one`) and its neighbour across `side` (`two`).
///
/// `two` is `None` where the neighbour would fall off the top or bottom of
/// the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub side: Side,
    pub one: HexCoord,
    pub two: Option<HexCoord>,
}

/// One logical grid cell.
#[derive(Clone, Debug)]
pub struct Hex {
    pub col: usize,
    pub row: usize,
    pub altitude: i32,
    pub moisture: i32,
    pub temperature: i32,
    pub terrain: Terrain,
    pub territory: Option<TerritoryId>,
    pub edges: Vec<Edge>,
}

impl Hex {
    pub fn coord(&self) -> HexCoord {
        (self.col, self.row)
    }

    pub fn is_land(&self) -> bool {
        self.terrain == Terrain::Land
    }

    pub fn is_water(&self) -> bool {
        self.terrain == Terrain::Water
    }

    pub fn is_owned(&self) -> bool {
        self.territory.is_some()
    }
}

/// Named boolean switches describing which generation features are active.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridParams(BTreeMap<String, bool>);

impl GridParams {
    pub const HYDROSPHERE: &'static str = "hydrosphere";

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    /// Missing flags read as disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    pub fn set(&mut self, name: impl Into<String>, value: bool) {
        self.0.insert(name.into(), value);
    }

    pub fn hydrosphere(&self) -> bool {
        self.is_enabled(Self::HYDROSPHERE)
    }
}

/// Read-only view of a square hex grid.
pub trait GridModel {
    /// The grid holds `size * size` cells.
    fn size(&self) -> usize;

    /// Cell at `(col, row)`. Out-of-range coordinates are a caller error
    /// and may panic.
    fn find_hex(&self, col: usize, row: usize) -> &Hex;

    /// Sides of `(col, row)` that carry river flow.
    fn find_river(&self, col: usize, row: usize) -> &[Side];

    fn params(&self) -> &GridParams;
}

/// In-memory square grid. Rows wrap horizontally, columns do not.
#[derive(Clone, Debug)]
pub struct HexGrid {
    size: usize,
    hexes: Vec<Hex>,
    rivers: Vec<Vec<Side>>,
    params: GridParams,
}

/// Cell across `side` of `(col, row)` in a grid of `size`: rows wrap,
/// columns stop at the grid edge.
pub fn neighbor_coord(col: usize, row: usize, side: Side, size: usize) -> Option<HexCoord> {
    let (n_col, n_row) = side.neighbor(col as isize, row as isize);
    if n_col < 0 || n_col as usize >= size {
        return None;
    }
    Some((n_col as usize, n_row.rem_euclid(size as isize) as usize))
}

fn edges_for(col: usize, row: usize, size: usize) -> Vec<Edge> {
    Side::ALL
        .into_iter()
        .map(|side| Edge {
            side,
            one: (col, row),
            two: neighbor_coord(col, row, side, size),
        })
        .collect()
}

impl HexGrid {
    pub fn builder(size: usize) -> HexGridBuilder {
        HexGridBuilder::new(size)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: GridDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| HexmapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Build a grid from a parsed document. Cells the document leaves out
    /// are water with zeroed attributes.
    pub fn from_document(document: GridDocument) -> Result<Self> {
        let size = document.size;
        if size > MAX_GRID_SIZE {
            return Err(HexmapError::GridTooLarge {
                size,
                max: MAX_GRID_SIZE,
            });
        }
        let expected = size * size;
        if document.hexes.len() > expected {
            return Err(HexmapError::SizeMismatch {
                size,
                expected,
                actual: document.hexes.len(),
            });
        }

        let mut builder = HexGridBuilder::new(size);
        builder.params = document.params;

        for record in document.hexes {
            if record.col >= size || record.row >= size {
                return Err(HexmapError::CellOutOfRange {
                    col: record.col,
                    row: record.row,
                    size,
                });
            }
            let (col, row) = (record.col, record.row);
            builder = builder
                .attributes(col, row, record.altitude, record.moisture, record.temperature)
                .terrain(col, row, record.terrain)
                .territory(col, row, record.territory);

            for name in &record.rivers {
                match name.parse::<Side>() {
                    Ok(side) => builder = builder.river(col, row, side),
                    Err(e) => warn!("skipping river segment at ({}, {}): {}", col, row, e),
                }
            }
        }

        Ok(builder.build())
    }

    /// Serializable form of this grid.
    pub fn to_document(&self) -> GridDocument {
        let hexes = self
            .hexes
            .iter()
            .zip(&self.rivers)
            .map(|(hex, rivers)| HexRecord {
                col: hex.col,
                row: hex.row,
                altitude: hex.altitude,
                moisture: hex.moisture,
                temperature: hex.temperature,
                terrain: hex.terrain,
                territory: hex.territory.map(|id| id.0),
                rivers: rivers.iter().map(|side| side.name().to_string()).collect(),
            })
            .collect();

        GridDocument {
            size: self.size,
            params: self.params.clone(),
            hexes,
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_document())?;
        fs::write(path, json).map_err(|source| HexmapError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// All cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.iter()
    }

    fn index(&self, col: usize, row: usize) -> usize {
        row * self.size + col
    }
}

impl GridModel for HexGrid {
    fn size(&self) -> usize {
        self.size
    }

    fn find_hex(&self, col: usize, row: usize) -> &Hex {
        &self.hexes[self.index(col, row)]
    }

    fn find_river(&self, col: usize, row: usize) -> &[Side] {
        &self.rivers[self.index(col, row)]
    }

    fn params(&self) -> &GridParams {
        &self.params
    }
}

/// Incremental construction of a [`HexGrid`]. Setters take `(col, row)` and
/// panic when it is outside the grid; `new` panics above [`MAX_GRID_SIZE`].
pub struct HexGridBuilder {
    size: usize,
    hexes: Vec<Hex>,
    rivers: Vec<Vec<Side>>,
    params: GridParams,
}

impl HexGridBuilder {
    pub fn new(size: usize) -> Self {
        assert!(size <= MAX_GRID_SIZE, "grid size {} exceeds {}", size, MAX_GRID_SIZE);
        let mut hexes = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                hexes.push(Hex {
                    col,
                    row,
                    altitude: 0,
                    moisture: 0,
                    temperature: 0,
                    terrain: Terrain::default(),
                    territory: None,
                    edges: edges_for(col, row, size),
                });
            }
        }

        Self {
            size,
            hexes,
            rivers: vec![Vec::new(); size * size],
            params: GridParams::default(),
        }
    }

    fn hex_mut(&mut self, col: usize, row: usize) -> &mut Hex {
        assert!(col < self.size && row < self.size, "cell ({}, {}) outside grid", col, row);
        let idx = row * self.size + col;
        &mut self.hexes[idx]
    }

    /// Set the terrain of every cell.
    pub fn fill(mut self, terrain: Terrain) -> Self {
        for hex in &mut self.hexes {
            hex.terrain = terrain;
        }
        self
    }

    pub fn terrain(mut self, col: usize, row: usize, terrain: Terrain) -> Self {
        self.hex_mut(col, row).terrain = terrain;
        self
    }

    pub fn territory(mut self, col: usize, row: usize, territory: Option<u32>) -> Self {
        self.hex_mut(col, row).territory = territory.map(TerritoryId);
        self
    }

    pub fn attributes(
        mut self,
        col: usize,
        row: usize,
        altitude: i32,
        moisture: i32,
        temperature: i32,
    ) -> Self {
        let hex = self.hex_mut(col, row);
        hex.altitude = altitude;
        hex.moisture = moisture;
        hex.temperature = temperature;
        self
    }

    /// Add a river segment on one side of a cell. Duplicates are ignored.
    pub fn river(mut self, col: usize, row: usize, side: Side) -> Self {
        assert!(col < self.size && row < self.size, "cell ({}, {}) outside grid", col, row);
        let segments = &mut self.rivers[row * self.size + col];
        if !segments.contains(&side) {
            segments.push(side);
        }
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: bool) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn build(self) -> HexGrid {
        HexGrid {
            size: self.size,
            hexes: self.hexes,
            rivers: self.rivers,
            params: self.params,
        }
    }
}

/// JSON grid document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridDocument {
    pub size: usize,
    #[serde(default)]
    pub params: GridParams,
    #[serde(default)]
    pub hexes: Vec<HexRecord>,
}

/// One cell of a [`GridDocument`]. River sides stay as plain strings so an
/// unknown side only drops that segment instead of the whole document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HexRecord {
    pub col: usize,
    pub row: usize,
    #[serde(default)]
    pub altitude: i32,
    #[serde(default)]
    pub moisture: i32,
    #[serde(default)]
    pub temperature: i32,
    #[serde(default)]
    pub terrain: Terrain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rivers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_hex_has_six_edges() {
        let grid = HexGrid::builder(4).build();
        for hex in grid.iter() {
            assert_eq!(hex.edges.len(), 6);
            let sides: Vec<Side> = hex.edges.iter().map(|e| e.side).collect();
            assert_eq!(sides, Side::ALL.to_vec());
            assert!(hex.edges.iter().all(|e| e.one == hex.coord()));
        }
    }

    #[test]
    fn test_edges_wrap_rows_not_columns() {
        let grid = HexGrid::builder(4).build();

        let corner = grid.find_hex(0, 0);
        let west = corner.edges.iter().find(|e| e.side == Side::West).unwrap();
        assert_eq!(west.two, Some((0, 3)));
        let north_east = corner.edges.iter().find(|e| e.side == Side::NorthEast).unwrap();
        assert_eq!(north_east.two, None);

        let bottom = grid.find_hex(3, 2);
        let south_east = bottom.edges.iter().find(|e| e.side == Side::SouthEast).unwrap();
        assert_eq!(south_east.two, None);
    }

    #[test]
    fn test_neighbor_edges_point_back() {
        let grid = HexGrid::builder(6).build();
        for hex in grid.iter() {
            for edge in &hex.edges {
                let Some((col, row)) = edge.two else { continue };
                let back = grid
                    .find_hex(col, row)
                    .edges
                    .iter()
                    .find(|e| e.side == edge.side.opposite())
                    .unwrap();
                assert_eq!(back.two, Some(hex.coord()));
            }
        }
    }

    #[test]
    fn test_builder_sets_attributes() {
        let grid = HexGrid::builder(3)
            .fill(Terrain::Land)
            .terrain(1, 2, Terrain::Water)
            .territory(0, 1, Some(7))
            .attributes(2, 0, 120, 4, -3)
            .river(1, 1, Side::East)
            .river(1, 1, Side::East)
            .param(GridParams::HYDROSPHERE, true)
            .build();

        assert!(grid.find_hex(0, 0).is_land());
        assert!(grid.find_hex(1, 2).is_water());
        assert_eq!(grid.find_hex(0, 1).territory, Some(TerritoryId(7)));
        assert!(!grid.find_hex(1, 1).is_owned());
        assert_eq!(grid.find_hex(2, 0).altitude, 120);
        assert_eq!(grid.find_hex(2, 0).temperature, -3);
        assert_eq!(grid.find_river(1, 1), &[Side::East]);
        assert!(grid.find_river(0, 0).is_empty());
        assert!(grid.params().hydrosphere());
    }

    #[test]
    fn test_load_document() {
        let json = r#"{
            "size": 2,
            "params": { "hydrosphere": true },
            "hexes": [
                { "col": 0, "row": 0, "altitude": 40, "terrain": "land", "territory": 1,
                  "rivers": ["east", "upstream", "south_west"] },
                { "col": 1, "row": 1, "moisture": 9 }
            ]
        }"#;
        let grid = HexGrid::from_json_str(json).unwrap();

        assert_eq!(grid.size(), 2);
        assert!(grid.params().hydrosphere());
        assert!(grid.find_hex(0, 0).is_land());
        assert_eq!(grid.find_hex(0, 0).altitude, 40);
        assert_eq!(grid.find_river(0, 0), &[Side::East, Side::SouthWest]);
        assert!(grid.find_hex(1, 1).is_water());
        assert_eq!(grid.find_hex(1, 1).moisture, 9);
        assert!(grid.find_hex(1, 0).is_water());
    }

    #[test]
    fn test_load_rejects_out_of_range_cells() {
        let json = r#"{ "size": 2, "hexes": [ { "col": 2, "row": 0 } ] }"#;
        let err = HexGrid::from_json_str(json).unwrap_err();
        assert!(matches!(err, HexmapError::CellOutOfRange { col: 2, row: 0, size: 2 }));
    }

    #[test]
    fn test_load_rejects_oversized_grid() {
        for json in [
            r#"{ "size": 4294967296, "hexes": [] }"#,
            r#"{ "size": 18446744073709551615 }"#,
            r#"{ "size": 4097 }"#,
        ] {
            let err = HexGrid::from_json_str(json).unwrap_err();
            assert!(matches!(err, HexmapError::GridTooLarge { max: MAX_GRID_SIZE, .. }), "{}", json);
        }
        assert_eq!(HexGrid::from_json_str(r#"{ "size": 0 }"#).unwrap().size(), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn test_builder_rejects_oversized_grid() {
        HexGridBuilder::new(MAX_GRID_SIZE + 1);
    }

    #[test]
    fn test_document_round_trip_keeps_rivers() {
        let grid = HexGrid::builder(2)
            .terrain(0, 1, Terrain::Land)
            .territory(0, 1, Some(3))
            .river(0, 1, Side::NorthWest)
            .build();
        let json = serde_json::to_string(&grid.to_document()).unwrap();
        let loaded = HexGrid::from_json_str(&json).unwrap();

        assert!(loaded.find_hex(0, 1).is_land());
        assert_eq!(loaded.find_hex(0, 1).territory, Some(TerritoryId(3)));
        assert_eq!(loaded.find_river(0, 1), &[Side::NorthWest]);
    }

    #[test]
    fn test_missing_params_read_disabled() {
        let params = GridParams::default();
        assert_eq!(params.get("hydrosphere"), None);
        assert!(!params.hydrosphere());
    }

    #[test]
    fn test_sample_document_loads() {
        let grid = HexGrid::from_json_str(include_str!("../demos/sample_grid.json")).unwrap();
        assert_eq!(grid.size(), 4);
        assert!(grid.params().hydrosphere());
        assert_eq!(grid.iter().filter(|hex| hex.is_land()).count(), 8);
        assert_eq!(grid.find_river(1, 2), &[Side::SouthWest]);
    }
}
