//! The document host contract.
//!
//! Everything the assistant pipeline does to a document goes through
//! [`Grid`]. Writes may be buffered by the host until [`Grid::sync`].

use std::fmt;

use crate::cell::{CellInput, CellValue, RangeData};
use crate::range::{Range, Selection};

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Sheet does not exist
    MissingSheet(String),
    /// Named table does not exist
    MissingTable(String),
    /// Row index past the end of a table body
    OutOfBounds(String),
    /// Unparseable A1 address
    InvalidAddress(String),
    /// Shape of supplied data does not match the target range
    ShapeMismatch { expected: (usize, usize), got: (usize, usize) },
    /// Anything else the host reports
    Host(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::MissingSheet(name) => write!(f, "sheet '{}' not found", name),
            GridError::MissingTable(name) => write!(f, "table '{}' not found", name),
            GridError::OutOfBounds(msg) => write!(f, "out of bounds: {}", msg),
            GridError::InvalidAddress(addr) => write!(f, "invalid address '{}'", addr),
            GridError::ShapeMismatch { expected, got } => write!(
                f,
                "shape mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, got.0, got.1
            ),
            GridError::Host(msg) => write!(f, "host error: {}", msg),
        }
    }
}

impl std::error::Error for GridError {}

/// Where a table lives: header row plus a contiguous body below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    pub sheet: String,
    pub header_row: usize,
    pub start_col: usize,
    pub width: usize,
    pub body_rows: usize,
}

impl TableLocation {
    /// Body range covering `rows` rows from the first body row.
    pub fn body_span(&self, rows: usize) -> Option<Range> {
        Range::from_origin(self.header_row + 1, self.start_col, rows, self.width)
    }

    pub fn body_range(&self) -> Option<Range> {
        self.body_span(self.body_rows)
    }

    /// Header row and body together.
    pub fn extent(&self) -> Range {
        Range::new(
            self.header_row,
            self.start_col,
            self.header_row + self.body_rows,
            self.start_col + self.width.max(1) - 1,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionalOperator {
    LessThan,
    GreaterThan,
}

/// A cell-value conditional formatting rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFormat {
    pub operator: ConditionalOperator,
    pub threshold: f64,
    pub fill_color: String,
    pub font_color: String,
}

impl ConditionalFormat {
    pub fn matches(&self, value: f64) -> bool {
        match self.operator {
            ConditionalOperator::LessThan => value < self.threshold,
            ConditionalOperator::GreaterThan => value > self.threshold,
        }
    }
}

/// A live tabular document.
pub trait Grid {
    /// Current selection bounds.
    fn selection(&self) -> Result<Selection, GridError>;

    /// Values, formulas and number formats of a block.
    fn read_range(&self, sheet: &str, range: &Range) -> Result<RangeData, GridError>;

    /// Write literals or formulas. `inputs` must match the range shape.
    fn write_cells(&mut self, sheet: &str, range: &Range, inputs: &[Vec<CellInput>]) -> Result<(), GridError>;

    /// Set number formats. `formats` must match the range shape.
    fn write_number_formats(&mut self, sheet: &str, range: &Range, formats: &[Vec<String>]) -> Result<(), GridError>;

    /// Remove values, formulas and number formats from a block.
    fn clear_range(&mut self, sheet: &str, range: &Range) -> Result<(), GridError>;

    /// Bounding box of non-empty cells, `None` for a blank sheet.
    fn used_range(&self, sheet: &str) -> Result<Option<Range>, GridError>;

    fn sheet_exists(&self, sheet: &str) -> bool;

    fn add_sheet(&mut self, sheet: &str) -> Result<(), GridError>;

    fn table_location(&self, table: &str) -> Result<TableLocation, GridError>;

    /// Body rows of a table, top to bottom.
    fn table_rows(&self, table: &str) -> Result<Vec<Vec<CellValue>>, GridError>;

    /// Append rows to the end of a table body.
    fn add_table_rows(&mut self, table: &str, rows: &[Vec<CellValue>]) -> Result<(), GridError>;

    /// Delete one body row; rows below move up.
    fn delete_table_row(&mut self, table: &str, index: usize) -> Result<(), GridError>;

    /// Sort whole rows of `range` by the values in column `key_col`.
    fn sort_range(&mut self, sheet: &str, range: &Range, key_col: usize, ascending: bool) -> Result<(), GridError>;

    fn add_conditional_format(&mut self, sheet: &str, range: &Range, rule: ConditionalFormat) -> Result<(), GridError>;

    /// Commit buffered operations as one batch.
    fn sync(&mut self) -> Result<(), GridError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_extent_includes_header() {
        let location = TableLocation { sheet: "_FX_CNB".into(), header_row: 0, start_col: 0, width: 5, body_rows: 2 };
        assert_eq!(location.extent(), Range::new(0, 0, 2, 4));
        assert_eq!(location.body_range(), Some(Range::new(1, 0, 2, 4)));

        let empty = TableLocation { body_rows: 0, ..location };
        assert_eq!(empty.extent(), Range::new(0, 0, 0, 4));
        assert_eq!(empty.body_range(), None);
    }
}
