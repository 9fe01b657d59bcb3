//! Undo Journal.
//!
//! Two tiers: every snapshot goes on the in-process stack; snapshots of at
//! most `persist_cell_cap` cells are also written to the index/data support
//! tables, linked by an explicit key column, so small edits survive a
//! restart. Undo pops the in-process stack first, then the newest persisted
//! index row. There is no redo.

use chrono::NaiveDateTime;

use gridwise_core::{
    parse_a1_range, CellValue, Grid, Range, RangeData, SupportTable,
};

use crate::error::AssistError;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Immutable capture of a range before mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub sheet: String,
    pub address: String,
    pub row_index: usize,
    pub column_index: usize,
    pub row_count: usize,
    pub column_count: usize,
    pub data: RangeData,
    pub note: String,
    pub persisted: bool,
    /// Always `row_count * column_count`
    pub cell_count: usize,
}

impl Snapshot {
    pub fn range(&self) -> Option<Range> {
        Range::from_origin(self.row_index, self.column_index, self.row_count, self.column_count)
    }
}

/// What [`UndoJournal::capture`] reports back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureReceipt {
    pub id: String,
    pub persisted: bool,
    pub cell_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    Restored { sheet: String, address: String, note: String },
    NothingToUndo,
}

impl UndoOutcome {
    pub fn message(&self) -> String {
        match self {
            UndoOutcome::Restored { note, .. } => format!("Vrácena poslední akce ({}).", note),
            UndoOutcome::NothingToUndo => "Žádná akce k vrácení.".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct UndoJournal {
    transient: Vec<Snapshot>,
    persist_cell_cap: usize,
}

impl UndoJournal {
    pub fn new(persist_cell_cap: usize) -> Self {
        Self { transient: Vec::new(), persist_cell_cap }
    }

    pub fn persist_cell_cap(&self) -> usize {
        self.persist_cell_cap
    }

    /// Snapshots held in process.
    pub fn len(&self) -> usize {
        self.transient.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transient.is_empty()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.transient.last()
    }

    /// Capture `range` on `sheet` before it is overwritten.
    pub fn capture(
        &mut self,
        grid: &mut dyn Grid,
        sheet: &str,
        range: &Range,
        note: &str,
        now: NaiveDateTime,
    ) -> Result<CaptureReceipt, AssistError> {
        let data = grid.read_range(sheet, range)?;
        let cell_count = range.cell_count();
        let id = uuid::Uuid::new_v4().to_string();
        let persisted = cell_count <= self.persist_cell_cap;

        let snapshot = Snapshot {
            id: id.clone(),
            timestamp: now,
            sheet: sheet.to_string(),
            address: range.to_a1(),
            row_index: range.start_row,
            column_index: range.start_col,
            row_count: range.rows(),
            column_count: range.cols(),
            data,
            note: note.to_string(),
            persisted,
            cell_count,
        };

        if persisted {
            write_persisted(grid, &snapshot)?;
        } else {
            log::warn!(
                "snapshot {} of {}!{} has {} cells (cap {}); kept in memory only",
                id, sheet, snapshot.address, cell_count, self.persist_cell_cap
            );
        }
        self.transient.push(snapshot);
        Ok(CaptureReceipt { id, persisted, cell_count })
    }

    /// Restore the most recent snapshot and commit.
    pub fn undo(&mut self, grid: &mut dyn Grid) -> Result<UndoOutcome, AssistError> {
        if let Some(snapshot) = self.transient.pop() {
            restore(grid, &snapshot.sheet, &range_of(&snapshot)?, &snapshot.data)?;
            if snapshot.persisted {
                remove_persisted(grid, &snapshot.id)?;
            }
            grid.sync()?;
            log::info!("undo {} ({}!{})", snapshot.id, snapshot.sheet, snapshot.address);
            return Ok(UndoOutcome::Restored {
                sheet: snapshot.sheet,
                address: snapshot.address,
                note: snapshot.note,
            });
        }

        let Some(record) = newest_persisted(&*grid)? else {
            return Ok(UndoOutcome::NothingToUndo);
        };
        let outcome = match load_data(&*grid, &record.key)? {
            Some((data_index, data)) => {
                restore(grid, &record.sheet, &record.range, &data)?;
                grid.delete_table_row(SupportTable::UNDO_DATA.name, data_index)?;
                grid.delete_table_row(SupportTable::UNDO_INDEX.name, record.index)?;
                grid.sync()?;
                log::info!("undo {} from persistent journal", record.key);
                UndoOutcome::Restored {
                    sheet: record.sheet,
                    address: record.range.to_a1(),
                    note: record.note,
                }
            }
            None => {
                grid.delete_table_row(SupportTable::UNDO_INDEX.name, record.index)?;
                grid.sync()?;
                return Err(AssistError::Internal(format!(
                    "undo data for key {} missing; index row dropped",
                    record.key
                )));
            }
        };
        Ok(outcome)
    }
}

fn range_of(snapshot: &Snapshot) -> Result<Range, AssistError> {
    snapshot
        .range()
        .ok_or_else(|| AssistError::Internal(format!("snapshot {} has no cells", snapshot.id)))
}

/// Write values, formulas (which win over values) and formats back.
fn restore(grid: &mut dyn Grid, sheet: &str, range: &Range, data: &RangeData) -> Result<(), AssistError> {
    if data.rows() != range.rows() || data.cols() != range.cols() {
        return Err(AssistError::Internal(format!(
            "snapshot shape {}x{} does not match {}",
            data.rows(),
            data.cols(),
            range.to_a1()
        )));
    }
    grid.write_cells(sheet, range, &data.to_inputs())?;
    grid.write_number_formats(sheet, range, &data.number_formats)?;
    Ok(())
}

// ── Persistent tier ─────────────────────────────────────────────────

fn write_persisted(grid: &mut dyn Grid, snapshot: &Snapshot) -> Result<(), AssistError> {
    let values = serde_json::to_string(&snapshot.data.values)?;
    let formulas = serde_json::to_string(&snapshot.data.formulas)?;
    let formats = serde_json::to_string(&snapshot.data.number_formats)?;

    grid.add_table_rows(SupportTable::UNDO_INDEX.name, &[vec![
        CellValue::from(snapshot.id.as_str()),
        CellValue::Text(snapshot.timestamp.format(TIME_FORMAT).to_string()),
        CellValue::from(snapshot.sheet.as_str()),
        CellValue::from(snapshot.address.as_str()),
        CellValue::Number(snapshot.row_count as f64),
        CellValue::Number(snapshot.column_count as f64),
        CellValue::from(snapshot.note.as_str()),
    ]])?;
    grid.add_table_rows(SupportTable::UNDO_DATA.name, &[vec![
        CellValue::from(snapshot.id.as_str()),
        CellValue::Text(values),
        CellValue::Text(formulas),
        CellValue::Text(formats),
    ]])?;
    Ok(())
}

fn remove_persisted(grid: &mut dyn Grid, key: &str) -> Result<(), AssistError> {
    let index_rows = grid.table_rows(SupportTable::UNDO_INDEX.name)?;
    if let Some(i) = index_rows.iter().position(|r| key_of(r) == Some(key)) {
        grid.delete_table_row(SupportTable::UNDO_INDEX.name, i)?;
    }
    let data_rows = grid.table_rows(SupportTable::UNDO_DATA.name)?;
    if let Some(i) = data_rows.iter().position(|r| key_of(r) == Some(key)) {
        grid.delete_table_row(SupportTable::UNDO_DATA.name, i)?;
    }
    Ok(())
}

fn key_of(row: &[CellValue]) -> Option<&str> {
    row.first().and_then(|v| v.as_text())
}

struct IndexRecord {
    index: usize,
    key: String,
    sheet: String,
    range: Range,
    note: String,
}

fn newest_persisted(grid: &dyn Grid) -> Result<Option<IndexRecord>, AssistError> {
    let rows = grid.table_rows(SupportTable::UNDO_INDEX.name)?;
    let Some((index, row)) = rows.iter().enumerate().last() else {
        return Ok(None);
    };
    let cell = |name: &str| {
        SupportTable::UNDO_INDEX
            .column(name)
            .and_then(|c| row.get(c))
            .cloned()
            .unwrap_or_default()
    };
    let key = key_of(row)
        .ok_or_else(|| AssistError::Internal(format!("undo index row {} has no key", index)))?
        .to_string();
    let address = cell("Address").to_string();
    let (qualified_sheet, parsed) = parse_a1_range(&address)?;
    let sheet = match cell("Sheet") {
        CellValue::Text(s) if !s.is_empty() => s,
        _ => qualified_sheet.ok_or_else(|| {
            AssistError::Internal(format!("undo index row {} has no sheet", index))
        })?,
    };

    // Stored dimensions win; the address is the fallback.
    let rows_n = cell("Rows").as_number().filter(|n| *n >= 1.0).map(|n| n as usize);
    let cols_n = cell("Cols").as_number().filter(|n| *n >= 1.0).map(|n| n as usize);
    let range = match (rows_n, cols_n) {
        (Some(r), Some(c)) => Range::from_origin(parsed.start_row, parsed.start_col, r, c).unwrap_or(parsed),
        _ => parsed,
    };

    Ok(Some(IndexRecord {
        index,
        key,
        sheet,
        range,
        note: cell("Note").to_string(),
    }))
}

fn load_data(grid: &dyn Grid, key: &str) -> Result<Option<(usize, RangeData)>, AssistError> {
    let rows = grid.table_rows(SupportTable::UNDO_DATA.name)?;
    let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| key_of(r) == Some(key)) else {
        return Ok(None);
    };
    let json = |name: &str| -> String {
        SupportTable::UNDO_DATA
            .column(name)
            .and_then(|c| row.get(c))
            .map(|v| v.to_string())
            .unwrap_or_default()
    };
    let data = RangeData {
        values: serde_json::from_str(&json("ValuesJson"))?,
        formulas: serde_json::from_str(&json("FormulasJson"))?,
        number_formats: serde_json::from_str(&json("FormatsJson"))?,
    };
    Ok(Some((index, data)))
}
