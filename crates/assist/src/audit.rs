//! Append-only record of executed operations, stored in the audit table.

use chrono::NaiveDateTime;

use gridwise_core::{CellValue, Grid, SupportTable};

use crate::error::AssistError;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub timestamp: NaiveDateTime,
    pub intent_type: String,
    pub args_json: String,
    pub range_address: String,
    pub note: String,
}

impl AuditEntry {
    pub fn new(
        timestamp: NaiveDateTime,
        intent_type: &str,
        args: &serde_json::Value,
        range_address: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            intent_type: intent_type.to_string(),
            args_json: args.to_string(),
            range_address: range_address.into(),
            note: note.into(),
        }
    }

    fn to_row(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.timestamp.format(TIME_FORMAT).to_string()),
            CellValue::Text(self.intent_type.clone()),
            CellValue::Text(self.args_json.clone()),
            CellValue::Text(self.range_address.clone()),
            CellValue::Text(self.note.clone()),
        ]
    }

    fn from_row(row: &[CellValue]) -> Option<Self> {
        let text = |i: usize| row.get(i).map(|v| v.to_string()).unwrap_or_default();
        let timestamp = NaiveDateTime::parse_from_str(&text(0), TIME_FORMAT).ok()?;
        Some(Self {
            timestamp,
            intent_type: text(1),
            args_json: text(2),
            range_address: text(3),
            note: text(4),
        })
    }
}

/// Audit log over the host's audit table. There is no delete path.
pub struct AuditLog;

impl AuditLog {
    pub fn append(grid: &mut dyn Grid, entry: &AuditEntry) -> Result<(), AssistError> {
        grid.add_table_rows(SupportTable::AUDIT.name, &[entry.to_row()])?;
        log::debug!("audit: {} {}", entry.intent_type, entry.range_address);
        Ok(())
    }

    /// Entries oldest first. Rows with an unreadable timestamp are skipped.
    pub fn entries(grid: &dyn Grid) -> Result<Vec<AuditEntry>, AssistError> {
        Ok(grid
            .table_rows(SupportTable::AUDIT.name)?
            .iter()
            .filter_map(|row| AuditEntry::from_row(row))
            .collect())
    }
}
