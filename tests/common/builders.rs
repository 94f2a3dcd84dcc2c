//! Test data builders for creating height fields

use surfscan::HeightField;

/// Builder for hand-made height fields
///
/// Present cells get distinct heights (`base + row * size + col`) so a
/// misplaced point is easy to spot.
pub struct FieldBuilder {
    size: usize,
    base: f64,
    absent: Vec<(usize, usize)>,
}

impl FieldBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            base: 1.0,
            absent: Vec::new(),
        }
    }

    pub fn base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn absent(mut self, row: usize, col: usize) -> Self {
        self.absent.push((row, col));
        self
    }

    /// Mark the four corner cells absent
    pub fn without_corners(self) -> Self {
        let last = self.size - 1;
        self.absent(0, 0)
            .absent(0, last)
            .absent(last, 0)
            .absent(last, last)
    }

    pub fn build(self) -> HeightField {
        let rows = (0..self.size)
            .map(|r| {
                (0..self.size)
                    .map(|c| {
                        if self.absent.contains(&(r, c)) {
                            None
                        } else {
                            Some(self.base + (r * self.size + c) as f64)
                        }
                    })
                    .collect()
            })
            .collect();
        HeightField::from_rows(rows).expect("builder produces a square field")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfscan::GridCoord;

    #[test]
    fn test_field_builder() {
        let field = FieldBuilder::new(4).without_corners().build();

        assert_eq!(field.size(), 4);
        assert_eq!(field.present_count(), 12);
        assert_eq!(field.get(GridCoord::new(0, 0)), None);
        assert_eq!(field.get(GridCoord::new(1, 2)), Some(7.0));
    }
}
