//! Selection Inspector: bounds, header heuristic and a small value sample.

use gridwise_config::Settings;
use gridwise_core::{col_to_letter, CellValue, Grid, Range};

use crate::error::AssistError;
use crate::numbers::parse_czech_numeric;
use crate::payload::TargetRange;

pub(crate) const EMPTY_SELECTION: &str = "Vyber oblast s daty (výběr je prázdný).";

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionInfo {
    pub sheet: String,
    pub row: usize,
    pub col: usize,
    pub row_count: usize,
    pub col_count: usize,
    pub has_header: bool,
    /// Top-left corner of the selection, for display only
    pub sample: Vec<Vec<CellValue>>,
}

impl SelectionInfo {
    pub fn range(&self) -> Range {
        Range::new(
            self.row,
            self.col,
            self.row + self.row_count - 1,
            self.col + self.col_count - 1,
        )
    }

    pub fn address(&self) -> String {
        self.range().to_a1()
    }

    /// Letter of the first selected column.
    pub fn column_letter(&self) -> String {
        col_to_letter(self.col)
    }

    pub fn contains_col(&self, col: usize) -> bool {
        col >= self.col && col < self.col + self.col_count
    }

    pub fn target(&self) -> TargetRange {
        TargetRange {
            sheet: self.sheet.clone(),
            row: self.row,
            col: self.col,
            row_count: self.row_count,
            col_count: self.col_count,
            has_header: self.has_header,
        }
    }
}

/// Header iff there are at least two rows, the first cell is non-numeric and
/// the second is numeric. Header-less columns starting with text are
/// misclassified; this is accepted.
pub fn detect_header(first_column: &[CellValue]) -> bool {
    if first_column.len() <= 1 {
        return false;
    }
    parse_czech_numeric(&first_column[0]).is_none() && parse_czech_numeric(&first_column[1]).is_some()
}

/// Read the active selection. Fails when nothing is selected or the
/// selection has zero rows or columns.
pub fn inspect(grid: &dyn Grid, settings: &Settings) -> Result<SelectionInfo, AssistError> {
    let selection = grid.selection().map_err(|e| {
        log::debug!("no usable selection: {}", e);
        AssistError::input(EMPTY_SELECTION)
    })?;
    let Some(range) = selection.range() else {
        return Err(AssistError::input(EMPTY_SELECTION));
    };

    let second_row = (range.start_row + 1).min(range.end_row);
    let head_range = Range::new(range.start_row, range.start_col, second_row, range.start_col);
    let head = grid.read_range(&selection.sheet, &head_range)?;
    let first_column: Vec<CellValue> = head.values.into_iter().filter_map(|r| r.into_iter().next()).collect();

    let sample_rows = settings.sample_rows.min(range.rows()).max(1);
    let sample_cols = settings.sample_columns.min(range.cols()).max(1);
    let sample_range = Range::new(
        range.start_row,
        range.start_col,
        range.start_row + sample_rows - 1,
        range.start_col + sample_cols - 1,
    );
    let sample = grid.read_range(&selection.sheet, &sample_range)?.values;

    Ok(SelectionInfo {
        sheet: selection.sheet,
        row: selection.row,
        col: selection.col,
        row_count: selection.row_count,
        col_count: selection.col_count,
        has_header: detect_header(&first_column),
        sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwise_engine::Workbook;

    #[test]
    fn test_header_heuristic() {
        assert!(detect_header(&[CellValue::from("Částka"), CellValue::Number(100.0)]));
        assert!(detect_header(&[CellValue::from("Částka"), CellValue::from("1 200,50")]));
        assert!(!detect_header(&[CellValue::Number(1.0), CellValue::Number(2.0)]));
        assert!(!detect_header(&[CellValue::from("a"), CellValue::from("b")]));
        assert!(!detect_header(&[CellValue::from("Částka")]));
        assert!(!detect_header(&[]));
    }

    #[test]
    fn test_inspect_without_selection_is_input_error() {
        let wb = Workbook::with_support_tables();
        let err = inspect(&wb, &Settings::default()).unwrap_err();
        assert_eq!(err, AssistError::input(EMPTY_SELECTION));
    }

    #[test]
    fn test_inspect_reads_header_and_sample() {
        let mut wb = Workbook::with_support_tables();
        wb.set_column("Sheet1", 0, 2, vec![CellValue::from("Částka"), CellValue::Number(100.0)]).unwrap();
        wb.select("Sheet1", "C1:C2").unwrap();
        let info = inspect(&wb, &Settings::default()).unwrap();
        assert_eq!((info.row, info.col, info.row_count, info.col_count), (0, 2, 2, 1));
        assert!(info.has_header);
        assert_eq!(info.sample[1], vec![CellValue::Number(100.0)]);
    }
}
