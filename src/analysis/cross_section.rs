//! Cross-section extraction
//!
//! A cross-section is one row of a height field viewed as a profile over the
//! column index. Absent cells stay absent so a plot can break the line
//! instead of drawing through missing data.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::HeightField;

/// One row of a height field as `(column, height)` pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    /// Row the profile was taken from
    pub row: usize,
    /// One entry per column, in column order
    pub points: Vec<(usize, Option<f64>)>,
}

impl CrossSection {
    /// Number of columns in the profile
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the profile has no columns
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Columns that carry a value
    pub fn present_points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|&(col, height)| height.map(|h| (col, h)))
    }

    /// Minimum and maximum present height
    pub fn height_range(&self) -> Option<(f64, f64)> {
        self.present_points().fold(None, |range, (_, h)| match range {
            None => Some((h, h)),
            Some((lo, hi)) => Some((lo.min(h), hi.max(h))),
        })
    }
}

/// Extract row `row` of `field`
///
/// Works on any snapshot (ground truth or a partially filled working field)
/// and never mutates it.
pub fn extract(field: &HeightField, row: usize) -> Result<CrossSection> {
    let cells = field.row(row).ok_or(ScanError::InvalidRowIndex {
        row,
        size: field.size(),
    })?;

    let points = cells.iter().copied().enumerate().collect();
    Ok(CrossSection { row, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{SurfaceModel, SurfaceProfile};

    fn sample_field() -> HeightField {
        HeightField::from_rows(vec![
            vec![None, Some(0.5), None],
            vec![Some(0.25), Some(1.0), Some(0.75)],
            vec![None, None, None],
        ])
        .unwrap()
    }

    #[test]
    fn test_extract_middle_row() {
        let section = extract(&sample_field(), 1).unwrap();
        assert_eq!(section.row, 1);
        assert_eq!(
            section.points,
            vec![(0, Some(0.25)), (1, Some(1.0)), (2, Some(0.75))]
        );
        assert_eq!(section.height_range(), Some((0.25, 1.0)));
    }

    #[test]
    fn test_extract_preserves_absent() {
        let section = extract(&sample_field(), 0).unwrap();
        assert_eq!(section.len(), 3);
        assert_eq!(section.points[0], (0, None));
        assert_eq!(section.present_points().collect::<Vec<_>>(), vec![(1, 0.5)]);

        let empty_row = extract(&sample_field(), 2).unwrap();
        assert_eq!(empty_row.present_points().count(), 0);
        assert_eq!(empty_row.height_range(), None);
    }

    #[test]
    fn test_extract_out_of_range() {
        let err = extract(&sample_field(), 3).unwrap_err();
        assert!(matches!(err, ScanError::InvalidRowIndex { row: 3, size: 3 }));
        assert!(err.to_string().contains("[0, 2]"));
    }

    #[test]
    fn test_extract_matches_field_row() {
        let field = SurfaceModel::with_seed(SurfaceProfile::Coin, 3)
            .generate(21)
            .unwrap();

        for row in [0, 10, 20] {
            let section = extract(&field, row).unwrap();
            assert_eq!(section.len(), field.size());
            for (col, height) in &section.points {
                assert_eq!(*height, field.row(row).unwrap()[*col]);
            }
        }

        // Centre row of the disk: both ends touch the boundary, middle is present
        let centre = extract(&field, 10).unwrap();
        assert!(centre.points[10].1.is_some());
    }
}
