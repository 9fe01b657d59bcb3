//! In-memory workbook that implements [`gridwise_core::Grid`].
//!
//! Formulas are stored verbatim and never evaluated. Tables are a header row
//! on a sheet plus the contiguous non-blank rows directly below it.

pub mod sheet;
pub mod sort;
pub mod workbook;

pub use sheet::{Cell, Sheet};
pub use sort::SortKey;
pub use workbook::Workbook;
