//! Serpentine scan order
//!
//! The instrument sweeps the grid like a raster plotter that never returns
//! to the left margin: row 0 left-to-right, row 1 right-to-left, and so on.
//! The sequence depends only on grid size and, after filtering, on which
//! ground-truth cells are present.

use crate::error::{Result, ScanError};
use crate::types::{GridCoord, HeightField};

/// Deterministic traversal sequence over a grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOrder {
    size: usize,
    coords: Vec<GridCoord>,
}

impl ScanOrder {
    /// Serpentine order over all `size * size` cells
    pub fn build(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ScanError::InvalidDimension { size });
        }

        let mut coords = Vec::with_capacity(size * size);
        for row in 0..size {
            if row % 2 == 0 {
                coords.extend((0..size).map(|col| GridCoord::new(row, col)));
            } else {
                coords.extend((0..size).rev().map(|col| GridCoord::new(row, col)));
            }
        }

        Ok(Self { size, coords })
    }

    /// Drop coordinates whose ground-truth value is absent
    ///
    /// Relative order of the remaining coordinates is preserved.
    pub fn filter(&self, field: &HeightField) -> Result<Self> {
        if field.size() != self.size {
            return Err(ScanError::DimensionMismatch {
                expected: self.size,
                actual: field.size(),
            });
        }

        let coords: Vec<GridCoord> = self
            .coords
            .iter()
            .copied()
            .filter(|coord| field.is_present(*coord))
            .collect();

        tracing::trace!(
            "Filtered scan order {} -> {} coordinates",
            self.coords.len(),
            coords.len()
        );

        Ok(Self {
            size: self.size,
            coords,
        })
    }

    /// Build and filter against `field` in one step
    pub fn for_field(field: &HeightField) -> Result<Self> {
        Self::build(field.size())?.filter(field)
    }

    /// Edge length of the grid this order was built for
    pub fn grid_size(&self) -> usize {
        self.size
    }

    /// Number of coordinates in the order
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Whether the order visits no cells
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinate at position `index`
    pub fn get(&self, index: usize) -> Option<GridCoord> {
        self.coords.get(index).copied()
    }

    /// The full sequence
    pub fn as_slice(&self) -> &[GridCoord] {
        &self.coords
    }

    /// Iterate over the sequence
    pub fn iter(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.coords.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_build_rejects_zero() {
        assert!(matches!(
            ScanOrder::build(0),
            Err(ScanError::InvalidDimension { size: 0 })
        ));
    }

    #[test]
    fn test_serpentine_3x3() {
        let order = ScanOrder::build(3).unwrap();
        let expected: Vec<GridCoord> = [
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 2),
            (1, 1),
            (1, 0),
            (2, 0),
            (2, 1),
            (2, 2),
        ]
        .iter()
        .map(|&(r, c)| GridCoord::new(r, c))
        .collect();
        assert_eq!(order.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_filter_preserves_order() {
        let field = HeightField::from_rows(vec![
            vec![Some(1.0), None, Some(3.0)],
            vec![Some(4.0), Some(5.0), None],
            vec![None, None, Some(9.0)],
        ])
        .unwrap();

        let order = ScanOrder::for_field(&field).unwrap();
        let expected = vec![
            GridCoord::new(0, 0),
            GridCoord::new(0, 2),
            GridCoord::new(1, 1),
            GridCoord::new(1, 0),
            GridCoord::new(2, 2),
        ];
        assert_eq!(order.as_slice(), expected.as_slice());
        assert_eq!(order.len(), field.present_count());
    }

    #[test]
    fn test_filter_size_mismatch() {
        let order = ScanOrder::build(3).unwrap();
        let field = HeightField::absent(2).unwrap();
        assert!(matches!(
            order.filter(&field),
            Err(ScanError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_filter_all_absent() {
        let field = HeightField::absent(4).unwrap();
        let order = ScanOrder::for_field(&field).unwrap();
        assert!(order.is_empty());
        assert_eq!(order.grid_size(), 4);
    }

    proptest! {
        #[test]
        fn test_build_visits_every_cell_once(size in 1usize..40) {
            let order = ScanOrder::build(size).unwrap();
            prop_assert_eq!(order.len(), size * size);

            let unique: HashSet<GridCoord> = order.iter().collect();
            prop_assert_eq!(unique.len(), size * size);
        }

        #[test]
        fn test_adjacent_rows_alternate(size in 2usize..40) {
            let order = ScanOrder::build(size).unwrap();
            for (row, chunk) in order.as_slice().chunks(size).enumerate() {
                prop_assert!(chunk.iter().all(|c| c.row == row));
                let first = chunk[0].col;
                let last = chunk[size - 1].col;
                if row % 2 == 0 {
                    prop_assert_eq!((first, last), (0, size - 1));
                } else {
                    prop_assert_eq!((first, last), (size - 1, 0));
                }
            }
        }

        #[test]
        fn test_filtered_length_matches_present(
            cells in prop::collection::vec(prop::option::of(0.0f64..1.0), 36)
        ) {
            let rows: Vec<Vec<Option<f64>>> = cells.chunks(6).map(|c| c.to_vec()).collect();
            let field = HeightField::from_rows(rows).unwrap();
            let order = ScanOrder::for_field(&field).unwrap();

            prop_assert_eq!(order.len(), field.present_count());
            prop_assert!(order.iter().all(|c| field.is_present(c)));
        }
    }
}
