//! Hexagon geometry for the offset-column tessellation
//!
//! Maps logical `(col, row)` cell coordinates to pixel anchors and hexagon
//! vertices. Pointy-topped hexagons: the column index drives the vertical
//! step and odd columns are shifted right by half a hex width, giving the
//! staggered "brick" layout.

use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side length used when no explicit metrics are given.
pub const DEFAULT_SIDE_LENGTH: i32 = 12;

/// Integer pixel measurements of one hexagon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexMetrics {
    /// Length of one flat edge
    pub side_length: i32,
    /// Vertical rise of an angled edge (side * sin 30, rounded down)
    pub hex_height: i32,
    /// Half the width of the hexagon (side * cos 30, rounded down)
    pub hex_radius: i32,
    /// Height of the bounding rectangle
    pub rect_height: i32,
    /// Width of the bounding rectangle
    pub rect_width: i32,
}

impl HexMetrics {
    pub fn from_side_length(side_length: i32) -> Self {
        // sin 30 = 1/2 exactly, keep it out of floating point
        let hex_height = side_length / 2;
        let hex_radius = (side_length as f64 * 3f64.sqrt() / 2.0) as i32;
        Self {
            side_length,
            hex_height,
            hex_radius,
            rect_height: side_length + 2 * hex_height,
            rect_width: 2 * hex_radius,
        }
    }

    /// Distance between the anchors of two consecutive columns.
    pub fn column_step(&self) -> i32 {
        self.side_length + self.hex_height
    }
}

impl Default for HexMetrics {
    fn default() -> Self {
        Self::from_side_length(DEFAULT_SIDE_LENGTH)
    }
}

/// The six hexagon vertices, clockwise from the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Corner {
    Top,
    UpperRight,
    LowerRight,
    Bottom,
    LowerLeft,
    UpperLeft,
}

impl Corner {
    /// Position of this corner in the vertex array returned by [`HexGeometry::vertices`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One of the six boundary directions of a hexagon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
}

/// Corner pair bounding each side, indexed by `Side as usize`.
const SIDE_CORNERS: [(Corner, Corner); 6] = [
    (Corner::Top, Corner::UpperRight),
    (Corner::UpperRight, Corner::LowerRight),
    (Corner::LowerRight, Corner::Bottom),
    (Corner::Bottom, Corner::LowerLeft),
    (Corner::LowerLeft, Corner::UpperLeft),
    (Corner::UpperLeft, Corner::Top),
];

/// `(d_col, d_row)` to the neighbour across each side, for even and odd columns.
const NEIGHBOR_OFFSETS: [[(isize, isize); 6]; 2] = [
    [(-1, 0), (0, 1), (1, 0), (1, -1), (0, -1), (-1, -1)],
    [(-1, 1), (0, 1), (1, 1), (1, 0), (0, -1), (-1, 0)],
];

impl Side {
    pub const ALL: [Side; 6] = [
        Side::NorthEast,
        Side::East,
        Side::SouthEast,
        Side::SouthWest,
        Side::West,
        Side::NorthWest,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Side::NorthEast => "north_east",
            Side::East => "east",
            Side::SouthEast => "south_east",
            Side::SouthWest => "south_west",
            Side::West => "west",
            Side::NorthWest => "north_west",
        }
    }

    pub fn corners(self) -> (Corner, Corner) {
        SIDE_CORNERS[self as usize]
    }

    /// The side a neighbour sees when looking back across this one.
    pub fn opposite(self) -> Side {
        Side::ALL[(self as usize + 3) % 6]
    }

    /// Logical coordinate of the cell across this side. May be negative or
    /// beyond the grid; wrapping and bounds are up to the grid model.
    pub fn neighbor(self, col: isize, row: isize) -> (isize, isize) {
        let parity = col.rem_euclid(2) as usize;
        let (d_col, d_row) = NEIGHBOR_OFFSETS[parity][self as usize];
        (col + d_col, row + d_row)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::ALL
            .into_iter()
            .find(|side| side.name() == s)
            .ok_or_else(|| format!("unknown hex side '{}'", s))
    }
}

/// Coordinate math for one set of metrics.
#[derive(Clone, Copy, Debug, Default)]
pub struct HexGeometry {
    metrics: HexMetrics,
}

impl HexGeometry {
    pub fn new(metrics: HexMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &HexMetrics {
        &self.metrics
    }

    /// Top-left pixel anchor of a cell.
    ///
    /// The horizontal position comes from `row` plus a half-hex shift on odd
    /// columns; the vertical position comes from `col` alone.
    pub fn anchor(&self, col: usize, row: usize) -> Point<i32> {
        let m = &self.metrics;
        let cx = row as i32 * m.rect_width + (col % 2) as i32 * m.hex_radius;
        let cy = col as i32 * m.column_step();
        Point::new(cx, cy)
    }

    /// Hexagon boundary clockwise from the top vertex, in [`Corner`] order.
    pub fn vertices(&self, anchor: Point<i32>) -> [Point<i32>; 6] {
        let m = &self.metrics;
        let (cx, cy) = (anchor.x, anchor.y);
        [
            Point::new(cx + m.hex_radius, cy),
            Point::new(cx + m.rect_width, cy + m.hex_height),
            Point::new(cx + m.rect_width, cy + m.hex_height + m.side_length),
            Point::new(cx + m.hex_radius, cy + m.rect_height),
            Point::new(cx, cy + m.side_length + m.hex_height),
            Point::new(cx, cy + m.hex_height),
        ]
    }

    /// The two vertices bounding `side`. Every layer that draws a single
    /// edge goes through here so they all land on the same pixels.
    pub fn edge_endpoints(&self, anchor: Point<i32>, side: Side) -> (Point<i32>, Point<i32>) {
        let vertices = self.vertices(anchor);
        let (a, b) = side.corners();
        (vertices[a.index()], vertices[b.index()])
    }

    /// Raster size needed for a `grid_size` x `grid_size` grid, or `None`
    /// when it would not fit in `i32` pixel coordinates.
    pub fn canvas_size(&self, grid_size: usize) -> Option<(u32, u32)> {
        let rect_width = i64::from(self.metrics.rect_width);
        let size = i64::try_from(grid_size).ok()?;
        // floor(rect_width * (size + 0.6)) without floating point
        let width = rect_width.checked_mul(size.checked_mul(5)?.checked_add(3)?)? / 5;
        let height = rect_width.checked_mul(size)?;
        let fit = |v: i64| i32::try_from(v).ok().and_then(|v| u32::try_from(v).ok());
        Some((fit(width)?, fit(height)?))
    }
}
