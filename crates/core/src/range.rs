use serde::{Deserialize, Serialize};

use crate::a1::range_to_a1;

/// A rectangular range of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl Range {
    /// Create a new range, automatically normalizing so start <= end.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    /// Create a single-cell range.
    pub fn single(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    /// Range anchored at `(row, col)` spanning `rows` x `cols` cells.
    /// Returns `None` when either dimension is zero.
    pub fn from_origin(row: usize, col: usize, rows: usize, cols: usize) -> Option<Self> {
        if rows == 0 || cols == 0 {
            return None;
        }
        Some(Self::new(row, col, row + rows - 1, col + cols - 1))
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row &&
        col >= self.start_col && col <= self.end_col
    }

    pub fn rows(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn cols(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let start_col = self.start_col;
        let end_col = self.end_col;
        (self.start_row..=self.end_row).flat_map(move |r| {
            (start_col..=end_col).map(move |c| (r, c))
        })
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &Range) -> Range {
        Range {
            start_row: self.start_row.min(other.start_row),
            start_col: self.start_col.min(other.start_col),
            end_row: self.end_row.max(other.end_row),
            end_col: self.end_col.max(other.end_col),
        }
    }

    pub fn to_a1(&self) -> String {
        range_to_a1(self.start_row, self.start_col, self.end_row, self.end_col)
    }
}

/// The host's active selection: a sheet plus origin and extent.
///
/// Extents may be zero (nothing selected); use [`Selection::range`] to get a
/// concrete [`Range`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub sheet: String,
    pub row: usize,
    pub col: usize,
    pub row_count: usize,
    pub col_count: usize,
}

impl Selection {
    pub fn new(sheet: impl Into<String>, row: usize, col: usize, row_count: usize, col_count: usize) -> Self {
        Self { sheet: sheet.into(), row, col, row_count, col_count }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.col_count == 0
    }

    pub fn range(&self) -> Option<Range> {
        Range::from_origin(self.row, self.col, self.row_count, self.col_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes() {
        let r = Range::new(4, 3, 1, 0);
        assert_eq!((r.start_row, r.start_col, r.end_row, r.end_col), (1, 0, 4, 3));
        assert_eq!(r.cell_count(), 16);
    }

    #[test]
    fn test_from_origin_zero_extent() {
        assert!(Range::from_origin(0, 0, 0, 3).is_none());
        assert!(Range::from_origin(0, 0, 2, 0).is_none());
        assert_eq!(Range::from_origin(1, 2, 3, 1), Some(Range::new(1, 2, 3, 2)));
    }

    #[test]
    fn test_cells_row_major() {
        let cells: Vec<_> = Range::new(0, 0, 1, 1).cells().collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_union() {
        let a = Range::new(0, 0, 2, 1);
        let b = Range::new(1, 3, 5, 3);
        assert_eq!(a.union(&b), Range::new(0, 0, 5, 3));
    }

    #[test]
    fn test_selection_range() {
        let sel = Selection::new("Sheet1", 0, 2, 5, 1);
        assert_eq!(sel.range().map(|r| r.to_a1()), Some("C1:C5".to_string()));
        assert!(Selection::new("Sheet1", 0, 0, 0, 1).is_empty());
    }
}
