//! Core types shared by the host engine and the assistant pipeline.
//!
//! Cells, rectangular ranges, A1 addressing, and the [`Grid`] contract that a
//! document host implements. No IO lives here.

pub mod a1;
pub mod cell;
pub mod grid;
pub mod range;
pub mod tables;

pub use a1::{
    cell_to_a1, col_to_letter, letter_to_col, parse_a1_cell, parse_a1_range, qualified_a1, range_to_a1,
};
pub use cell::{CellInput, CellValue, RangeData, GENERAL_FORMAT};
pub use grid::{ConditionalFormat, ConditionalOperator, Grid, GridError, TableLocation};
pub use range::{Range, Selection};
pub use tables::SupportTable;
