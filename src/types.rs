//! Core data types for SurfScan-RS
//!
//! This module contains the fundamental data structures shared by the
//! surface model, the scan order, the streaming engine and the exporters.
//!
//! # Main Types
//!
//! - [`GridCoord`] - A `(row, col)` cell address
//! - [`SampledPoint`] - A coordinate plus an optional height, the unit of delivery
//! - [`HeightField`] - A square grid of optional heights
//!
//! # Present and Absent Cells
//!
//! A cell holds either a finite height (present) or nothing (absent). Absent
//! means "outside the measured domain" in a ground-truth field and "not yet
//! sampled" in a working field that accumulates streamed points. Absent cells
//! are never replaced by zero or any other sentinel.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Address of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    /// Row index (0 = first row)
    pub row: usize,
    /// Column index (0 = first column)
    pub col: usize,
}

impl GridCoord {
    /// Create a new coordinate
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A single measured point as reported by the (synthetic) instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampledPoint {
    /// Where the point was measured
    pub coord: GridCoord,
    /// Measured height, `None` when the instrument got no return
    pub height: Option<f64>,
}

impl SampledPoint {
    /// Create a new sampled point
    pub fn new(coord: GridCoord, height: Option<f64>) -> Self {
        Self { coord, height }
    }
}

/// Square grid of optional heights, stored row-major
///
/// Deserialized fields go through the same checks as [`HeightField::from_rows`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHeightField")]
pub struct HeightField {
    size: usize,
    cells: Vec<Option<f64>>,
}

/// Unchecked wire form of a [`HeightField`]
#[derive(Deserialize)]
struct RawHeightField {
    size: usize,
    cells: Vec<Option<f64>>,
}

impl TryFrom<RawHeightField> for HeightField {
    type Error = ScanError;

    fn try_from(raw: RawHeightField) -> Result<Self> {
        let RawHeightField { size, cells } = raw;
        let expected = match size.checked_mul(size) {
            Some(n) if n > 0 => n,
            _ => return Err(ScanError::InvalidDimension { size }),
        };
        if cells.len() != expected {
            return Err(ScanError::InvalidDimension { size }.with_context(format!(
                "{} cells for a {}x{} grid",
                cells.len(),
                size,
                size
            )));
        }
        if let Some(idx) = cells.iter().position(|v| v.is_some_and(|z| !z.is_finite())) {
            return Err(ScanError::InvalidHeight {
                row: idx / size,
                col: idx % size,
            });
        }
        Ok(Self { size, cells })
    }
}

impl HeightField {
    /// Create a field where every cell is absent
    pub fn absent(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ScanError::InvalidDimension { size });
        }
        Ok(Self {
            size,
            cells: vec![None; size * size],
        })
    }

    /// Build a field from explicit rows
    ///
    /// Rows must form a non-empty square and every present value must be finite.
    pub fn from_rows(rows: Vec<Vec<Option<f64>>>) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(ScanError::InvalidDimension { size });
        }

        let mut cells = Vec::with_capacity(size * size);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(ScanError::DimensionMismatch {
                    expected: size,
                    actual: row.len(),
                }
                .with_context(format!("row {} has the wrong length", row_idx)));
            }
            if let Some(col) = row.iter().position(|v| v.is_some_and(|z| !z.is_finite())) {
                return Err(ScanError::InvalidHeight { row: row_idx, col });
            }
            cells.extend(row);
        }

        Ok(Self { size, cells })
    }

    /// Edge length of the grid
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells (`size * size`)
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether a coordinate lies inside the grid
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    /// Height at a coordinate; `None` for absent cells and out-of-grid coordinates
    pub fn get(&self, coord: GridCoord) -> Option<f64> {
        if !self.contains(coord) {
            return None;
        }
        self.cells[coord.row * self.size + coord.col]
    }

    /// Whether the cell at `coord` holds a height
    pub fn is_present(&self, coord: GridCoord) -> bool {
        self.get(coord).is_some()
    }

    /// Overwrite a single cell
    ///
    /// Non-finite heights are stored as absent.
    pub fn set(&mut self, coord: GridCoord, height: Option<f64>) -> Result<()> {
        if !self.contains(coord) {
            return Err(ScanError::CellOutOfBounds {
                row: coord.row,
                col: coord.col,
                size: self.size,
            });
        }
        self.cells[coord.row * self.size + coord.col] = height.filter(|z| z.is_finite());
        Ok(())
    }

    /// One row of the grid
    pub fn row(&self, row: usize) -> Option<&[Option<f64>]> {
        if row >= self.size {
            return None;
        }
        let start = row * self.size;
        Some(&self.cells[start..start + self.size])
    }

    /// Iterate over all rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[Option<f64>]> {
        self.cells.chunks(self.size)
    }

    /// Iterate over every cell with its coordinate, row-major
    pub fn cells(&self) -> impl Iterator<Item = (GridCoord, Option<f64>)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, v)| (GridCoord::new(idx / size, idx % size), *v))
    }

    /// Number of present cells
    pub fn present_count(&self) -> usize {
        self.cells.iter().filter(|v| v.is_some()).count()
    }

    /// Minimum and maximum present height, if any cell is present
    pub fn height_range(&self) -> Option<(f64, f64)> {
        self.cells.iter().flatten().fold(None, |acc, &z| match acc {
            None => Some((z, z)),
            Some((lo, hi)) => Some((lo.min(z), hi.max(z))),
        })
    }

    /// Apply a per-cell transform to every present cell
    pub(crate) fn map_present(&self, mut f: impl FnMut(f64) -> Option<f64>) -> Self {
        Self {
            size: self.size,
            cells: self.cells.iter().map(|v| v.and_then(&mut f)).collect(),
        }
    }

    /// Accumulate a batch of streamed points into this (working) field
    ///
    /// Returns the number of points written. Points outside the grid are skipped.
    pub fn apply_points(&mut self, points: &[SampledPoint]) -> usize {
        let mut written = 0;
        for point in points {
            if self.contains(point.coord) {
                self.cells[point.coord.row * self.size + point.coord.col] =
                    point.height.filter(|z| z.is_finite());
                written += 1;
            } else {
                tracing::warn!("Dropping point outside the grid at {}", point.coord);
            }
        }
        written
    }
}
