use rustc_hash::FxHashMap;

use gridwise_core::{CellInput, CellValue, ConditionalFormat, Range, GENERAL_FORMAT};

/// Stored state of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub formula: Option<String>,
    pub number_format: String,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            value: CellValue::Empty,
            formula: None,
            number_format: GENERAL_FORMAT.to_string(),
        }
    }
}

impl Cell {
    /// No value, no formula, default format.
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.formula.is_none() && self.number_format == GENERAL_FORMAT
    }

    /// Holds a value or a formula (format ignored).
    pub fn has_content(&self) -> bool {
        !self.value.is_empty() || self.formula.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    cells: FxHashMap<(usize, usize), Cell>,
    conditional_formats: Vec<(Range, ConditionalFormat)>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: FxHashMap::default(),
            conditional_formats: Vec::new(),
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: usize, col: usize) -> CellValue {
        self.cells.get(&(row, col)).map(|c| c.value.clone()).unwrap_or_default()
    }

    pub fn get_cell(&self, row: usize, col: usize) -> Cell {
        self.cells.get(&(row, col)).cloned().unwrap_or_default()
    }

    /// Replace a whole cell; blank cells are dropped from storage.
    pub fn put_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if cell.is_blank() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), cell);
        }
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: CellValue) {
        let mut cell = self.get_cell(row, col);
        cell.value = value;
        cell.formula = None;
        self.put_cell(row, col, cell);
    }

    pub fn set_input(&mut self, row: usize, col: usize, input: &CellInput) {
        match input {
            CellInput::Value(v) => self.set_value(row, col, v.clone()),
            CellInput::Formula(f) => {
                let mut cell = self.get_cell(row, col);
                cell.value = CellValue::Empty;
                cell.formula = Some(f.clone());
                self.put_cell(row, col, cell);
            }
        }
    }

    pub fn set_number_format(&mut self, row: usize, col: usize, format: &str) {
        let mut cell = self.get_cell(row, col);
        cell.number_format = format.to_string();
        self.put_cell(row, col, cell);
    }

    pub fn clear_cell(&mut self, row: usize, col: usize) {
        self.cells.remove(&(row, col));
    }

    /// True when every cell of `row` within `cols` has no content.
    pub fn row_is_empty(&self, row: usize, start_col: usize, width: usize) -> bool {
        (start_col..start_col + width).all(|c| {
            self.cells.get(&(row, c)).map_or(true, |cell| !cell.has_content())
        })
    }

    /// Bounding box of cells holding a value, formula or explicit format.
    pub fn used_range(&self) -> Option<Range> {
        let mut keys = self.cells.keys();
        let &(r0, c0) = keys.next()?;
        let mut range = Range::single(r0, c0);
        for &(r, c) in keys {
            range = range.union(&Range::single(r, c));
        }
        Some(range)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn add_conditional_format(&mut self, range: Range, rule: ConditionalFormat) {
        self.conditional_formats.push((range, rule));
    }

    pub fn conditional_formats(&self) -> &[(Range, ConditionalFormat)] {
        &self.conditional_formats
    }
}
