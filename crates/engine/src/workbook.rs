use gridwise_core::{
    CellInput, CellValue, ConditionalFormat, Grid, GridError, Range, RangeData, Selection,
    SupportTable, TableLocation,
};

use crate::sheet::{Cell, Sheet};
use crate::sort::{self, SortKey};

/// Sheet names compare case-insensitively, ignoring surrounding whitespace.
pub fn normalize_sheet_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone)]
struct TableDef {
    name: String,
    sheet: String,
    header_row: usize,
    start_col: usize,
    width: usize,
}

/// A workbook containing multiple sheets, tables and an active selection.
///
/// Every mutating call counts as a pending operation until [`Grid::sync`]
/// commits the batch.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    tables: Vec<TableDef>,
    selection: Option<Selection>,
    pending_ops: usize,
    flushes: usize,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// A workbook with a single empty `Sheet1`.
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new("Sheet1")],
            tables: Vec::new(),
            selection: None,
            pending_ops: 0,
            flushes: 0,
        }
    }

    /// A workbook with every support table created on its own sheet.
    pub fn with_support_tables() -> Self {
        let mut wb = Self::new();
        for table in SupportTable::ALL {
            wb.create_table(table.name, table.sheet, 0, 0, table.headers);
        }
        wb
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        let key = normalize_sheet_name(name);
        self.sheets.iter().find(|s| normalize_sheet_name(&s.name) == key)
    }

    pub fn sheet_by_name_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        let key = normalize_sheet_name(name);
        self.sheets.iter_mut().find(|s| normalize_sheet_name(&s.name) == key)
    }

    /// Add a sheet, returning its index. `None` if the name is taken or blank.
    pub fn add_sheet_named(&mut self, name: &str) -> Option<usize> {
        if name.trim().is_empty() || self.sheet_by_name(name).is_some() {
            return None;
        }
        self.sheets.push(Sheet::new(name));
        Some(self.sheets.len() - 1)
    }

    /// Define a table with its header row at `(row, col)`; creates the sheet if needed.
    pub fn create_table(&mut self, name: &str, sheet: &str, row: usize, col: usize, headers: &[&str]) {
        if self.sheet_by_name(sheet).is_none() {
            self.sheets.push(Sheet::new(sheet));
        }
        if let Some(s) = self.sheet_by_name_mut(sheet) {
            for (i, header) in headers.iter().enumerate() {
                s.set_value(row, col + i, CellValue::from(*header));
            }
        }
        self.tables.retain(|t| t.name != name);
        self.tables.push(TableDef {
            name: name.to_string(),
            sheet: sheet.to_string(),
            header_row: row,
            start_col: col,
            width: headers.len(),
        });
    }

    /// Make `address` (e.g. `C1:C5`) on `sheet` the active selection.
    pub fn select(&mut self, sheet: &str, address: &str) -> Result<(), GridError> {
        if self.sheet_by_name(sheet).is_none() {
            return Err(GridError::MissingSheet(sheet.to_string()));
        }
        let (_, range) = gridwise_core::parse_a1_range(address)?;
        self.selection = Some(Selection::new(sheet, range.start_row, range.start_col, range.rows(), range.cols()));
        Ok(())
    }

    /// Set the selection verbatim, including zero-sized extents.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn set_value(&mut self, sheet: &str, row: usize, col: usize, value: impl Into<CellValue>) -> Result<(), GridError> {
        self.sheet_mut(sheet)?.set_value(row, col, value.into());
        Ok(())
    }

    /// Fill a column downward from `(row, col)`.
    pub fn set_column(&mut self, sheet: &str, row: usize, col: usize, values: Vec<CellValue>) -> Result<(), GridError> {
        let s = self.sheet_mut(sheet)?;
        for (i, v) in values.into_iter().enumerate() {
            s.set_value(row + i, col, v);
        }
        Ok(())
    }

    pub fn cell(&self, sheet: &str, row: usize, col: usize) -> Cell {
        self.sheet_by_name(sheet)
            .map(|s| s.get_cell(row, col))
            .unwrap_or_default()
    }

    /// Number of committed batches so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Operations issued since the last commit.
    pub fn pending_ops(&self) -> usize {
        self.pending_ops
    }

    fn sheet(&self, name: &str) -> Result<&Sheet, GridError> {
        self.sheet_by_name(name)
            .ok_or_else(|| GridError::MissingSheet(name.to_string()))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet, GridError> {
        self.sheet_by_name_mut(name)
            .ok_or_else(|| GridError::MissingSheet(name.to_string()))
    }

    fn table(&self, name: &str) -> Result<&TableDef, GridError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| GridError::MissingTable(name.to_string()))
    }

    fn body_rows(&self, table: &TableDef) -> Result<usize, GridError> {
        let sheet = self.sheet(&table.sheet)?;
        let mut rows = 0;
        while !sheet.row_is_empty(table.header_row + 1 + rows, table.start_col, table.width) {
            rows += 1;
        }
        Ok(rows)
    }

    fn check_shape<T>(range: &Range, grid: &[Vec<T>]) -> Result<(), GridError> {
        let got = (grid.len(), grid.first().map_or(0, |r| r.len()));
        let ragged = grid.iter().any(|r| r.len() != range.cols());
        if got != (range.rows(), range.cols()) || ragged {
            return Err(GridError::ShapeMismatch {
                expected: (range.rows(), range.cols()),
                got,
            });
        }
        Ok(())
    }
}

impl Grid for Workbook {
    fn selection(&self) -> Result<Selection, GridError> {
        self.selection
            .clone()
            .ok_or_else(|| GridError::Host("no active selection".to_string()))
    }

    fn read_range(&self, sheet: &str, range: &Range) -> Result<RangeData, GridError> {
        let s = self.sheet(sheet)?;
        let mut data = RangeData::default();
        for r in range.start_row..=range.end_row {
            let cells: Vec<Cell> = (range.start_col..=range.end_col)
                .map(|c| s.get_cell(r, c))
                .collect();
            data.values.push(cells.iter().map(|c| c.value.clone()).collect());
            data.formulas.push(cells.iter().map(|c| c.formula.clone()).collect());
            data.number_formats.push(cells.into_iter().map(|c| c.number_format).collect());
        }
        Ok(data)
    }

    fn write_cells(&mut self, sheet: &str, range: &Range, inputs: &[Vec<CellInput>]) -> Result<(), GridError> {
        Self::check_shape(range, inputs)?;
        let s = self.sheet_mut(sheet)?;
        for (i, row) in inputs.iter().enumerate() {
            for (j, input) in row.iter().enumerate() {
                s.set_input(range.start_row + i, range.start_col + j, input);
            }
        }
        self.pending_ops += 1;
        Ok(())
    }

    fn write_number_formats(&mut self, sheet: &str, range: &Range, formats: &[Vec<String>]) -> Result<(), GridError> {
        Self::check_shape(range, formats)?;
        let s = self.sheet_mut(sheet)?;
        for (i, row) in formats.iter().enumerate() {
            for (j, format) in row.iter().enumerate() {
                s.set_number_format(range.start_row + i, range.start_col + j, format);
            }
        }
        self.pending_ops += 1;
        Ok(())
    }

    fn clear_range(&mut self, sheet: &str, range: &Range) -> Result<(), GridError> {
        let s = self.sheet_mut(sheet)?;
        for (r, c) in range.cells() {
            s.clear_cell(r, c);
        }
        self.pending_ops += 1;
        Ok(())
    }

    fn used_range(&self, sheet: &str) -> Result<Option<Range>, GridError> {
        Ok(self.sheet(sheet)?.used_range())
    }

    fn sheet_exists(&self, sheet: &str) -> bool {
        self.sheet_by_name(sheet).is_some()
    }

    fn add_sheet(&mut self, sheet: &str) -> Result<(), GridError> {
        self.add_sheet_named(sheet)
            .ok_or_else(|| GridError::Host(format!("cannot add sheet '{}'", sheet)))?;
        self.pending_ops += 1;
        Ok(())
    }

    fn table_location(&self, table: &str) -> Result<TableLocation, GridError> {
        let def = self.table(table)?;
        Ok(TableLocation {
            sheet: def.sheet.clone(),
            header_row: def.header_row,
            start_col: def.start_col,
            width: def.width,
            body_rows: self.body_rows(def)?,
        })
    }

    fn table_rows(&self, table: &str) -> Result<Vec<Vec<CellValue>>, GridError> {
        let loc = self.table_location(table)?;
        match loc.body_range() {
            Some(range) => Ok(self.read_range(&loc.sheet, &range)?.values),
            None => Ok(Vec::new()),
        }
    }

    fn add_table_rows(&mut self, table: &str, rows: &[Vec<CellValue>]) -> Result<(), GridError> {
        let loc = self.table_location(table)?;
        let s = self.sheet_mut(&loc.sheet)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != loc.width {
                return Err(GridError::ShapeMismatch {
                    expected: (1, loc.width),
                    got: (1, row.len()),
                });
            }
            let r = loc.header_row + 1 + loc.body_rows + i;
            for (j, value) in row.iter().enumerate() {
                s.set_value(r, loc.start_col + j, value.clone());
            }
        }
        self.pending_ops += 1;
        Ok(())
    }

    fn delete_table_row(&mut self, table: &str, index: usize) -> Result<(), GridError> {
        let loc = self.table_location(table)?;
        if index >= loc.body_rows {
            return Err(GridError::OutOfBounds(format!(
                "row {} of table '{}' ({} rows)",
                index, table, loc.body_rows
            )));
        }
        let first = loc.header_row + 1;
        let last = first + loc.body_rows - 1;
        let s = self.sheet_mut(&loc.sheet)?;
        for r in (first + index)..last {
            for c in loc.start_col..loc.start_col + loc.width {
                let below = s.get_cell(r + 1, c);
                s.put_cell(r, c, below);
            }
        }
        for c in loc.start_col..loc.start_col + loc.width {
            s.clear_cell(last, c);
        }
        self.pending_ops += 1;
        Ok(())
    }

    fn sort_range(&mut self, sheet: &str, range: &Range, key_col: usize, ascending: bool) -> Result<(), GridError> {
        if !range.contains(range.start_row, key_col) {
            return Err(GridError::OutOfBounds(format!(
                "sort key column {} outside {}",
                key_col,
                range.to_a1()
            )));
        }
        let s = self.sheet_mut(sheet)?;
        let rows: Vec<Vec<Cell>> = (range.start_row..=range.end_row)
            .map(|r| (range.start_col..=range.end_col).map(|c| s.get_cell(r, c)).collect())
            .collect();
        let keys: Vec<SortKey> = rows
            .iter()
            .map(|row| SortKey::from_value(&row[key_col - range.start_col].value))
            .collect();
        let order = sort::permutation(&keys, ascending);
        for (i, &src) in order.iter().enumerate() {
            for (j, cell) in rows[src].iter().enumerate() {
                s.put_cell(range.start_row + i, range.start_col + j, cell.clone());
            }
        }
        self.pending_ops += 1;
        Ok(())
    }

    fn add_conditional_format(&mut self, sheet: &str, range: &Range, rule: ConditionalFormat) -> Result<(), GridError> {
        self.sheet_mut(sheet)?.add_conditional_format(*range, rule);
        self.pending_ops += 1;
        Ok(())
    }

    fn sync(&mut self) -> Result<(), GridError> {
        log::debug!("sync: committing {} operations", self.pending_ops);
        self.pending_ops = 0;
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwise_core::ConditionalOperator;

    fn numbers(values: &[f64]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::Number(*v)).collect()
    }

    #[test]
    fn test_sheet_lookup_case_insensitive() {
        let mut wb = Workbook::new();
        assert!(wb.sheet_exists("sheet1"));
        assert_eq!(wb.add_sheet_named("Data"), Some(1));
        assert_eq!(wb.add_sheet_named(" data "), None);
    }

    #[test]
    fn test_read_write_roundtrip() {
        let mut wb = Workbook::new();
        let range = Range::new(0, 0, 1, 1);
        wb.write_cells("Sheet1", &range, &[
            vec![CellInput::text("a"), CellInput::number(1.0)],
            vec![CellInput::Formula("=B1*2".into()), CellInput::empty()],
        ]).unwrap();
        wb.write_number_formats("Sheet1", &Range::single(0, 1), &[vec!["0.00".into()]]).unwrap();
        let data = wb.read_range("Sheet1", &range).unwrap();
        assert_eq!(data.values[0], vec![CellValue::from("a"), CellValue::Number(1.0)]);
        assert_eq!(data.formulas[1][0].as_deref(), Some("=B1*2"));
        assert_eq!(data.number_formats[0][1], "0.00");
        assert_eq!(data.number_formats[1][1], "General");
    }

    #[test]
    fn test_write_shape_mismatch() {
        let mut wb = Workbook::new();
        let err = wb.write_cells("Sheet1", &Range::new(0, 0, 1, 0), &[vec![CellInput::empty()]]);
        assert!(matches!(err, Err(GridError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_table_add_and_delete_rows() {
        let mut wb = Workbook::with_support_tables();
        let t = SupportTable::FX_CNB.name;
        wb.add_table_rows(t, &[
            vec!["2026-01-02".into(), "EUR".into(), CellValue::Number(25.0)],
            vec!["2026-01-02".into(), "USD".into(), CellValue::Number(21.0)],
            vec!["2026-01-03".into(), "EUR".into(), CellValue::Number(25.1)],
        ]).unwrap();
        assert_eq!(wb.table_location(t).unwrap().body_rows, 3);

        wb.delete_table_row(t, 1).unwrap();
        let rows = wb.table_rows(t).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], CellValue::from("EUR"));
        assert!(wb.delete_table_row(t, 2).is_err());
    }

    #[test]
    fn test_sort_range_moves_whole_rows() {
        let mut wb = Workbook::new();
        wb.set_column("Sheet1", 0, 0, numbers(&[3.0, 1.0, 2.0])).unwrap();
        wb.set_column("Sheet1", 0, 1, vec!["c".into(), "a".into(), "b".into()]).unwrap();
        wb.sort_range("Sheet1", &Range::new(0, 0, 2, 1), 0, true).unwrap();
        let data = wb.read_range("Sheet1", &Range::new(0, 0, 2, 1)).unwrap();
        assert_eq!(data.values[0], vec![CellValue::Number(1.0), CellValue::from("a")]);
        assert_eq!(data.values[2], vec![CellValue::Number(3.0), CellValue::from("c")]);
    }

    #[test]
    fn test_sync_counts_batches() {
        let mut wb = Workbook::new();
        wb.add_conditional_format("Sheet1", &Range::new(1, 2, 4, 2), ConditionalFormat {
            operator: ConditionalOperator::LessThan,
            threshold: 0.0,
            fill_color: "#fdecea".into(),
            font_color: "#842029".into(),
        }).unwrap();
        assert_eq!(wb.pending_ops(), 1);
        wb.sync().unwrap();
        assert_eq!(wb.pending_ops(), 0);
        assert_eq!(wb.flush_count(), 1);
    }

    #[test]
    fn test_select_rejects_unknown_sheet() {
        let mut wb = Workbook::new();
        assert!(wb.select("Nope", "A1").is_err());
        wb.select("Sheet1", "C1:C5").unwrap();
        assert_eq!(wb.selection().unwrap(), Selection::new("Sheet1", 0, 2, 5, 1));
    }
}
