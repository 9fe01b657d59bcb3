//! Best-effort usage events in the telemetry table.
//!
//! Recording never fails the caller: a missing table or a host error is
//! logged and dropped.

use chrono::NaiveDateTime;

use gridwise_core::{CellValue, Grid, SupportTable};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    pub event: String,
    pub intent: Option<String>,
    pub detail: Option<String>,
}

impl TelemetryEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self { event: event.into(), intent: None, detail: None }
    }

    pub fn intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn to_row(&self, time: NaiveDateTime) -> Vec<CellValue> {
        vec![
            CellValue::Text(time.format(TIME_FORMAT).to_string()),
            CellValue::Text(self.event.clone()),
            CellValue::Text(self.intent.clone().unwrap_or_default()),
            CellValue::Text(self.detail.clone().unwrap_or_default()),
        ]
    }
}

/// Append `event` to the telemetry table. Errors are logged, not returned.
pub fn record(grid: &mut dyn Grid, time: NaiveDateTime, event: &TelemetryEvent) {
    match grid.add_table_rows(SupportTable::TELEMETRY.name, &[event.to_row(time)]) {
        Ok(()) => log::debug!("telemetry: {}", event.event),
        Err(e) => log::warn!("telemetry logging failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gridwise_engine::Workbook;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(8, 15, 0).unwrap()
    }

    #[test]
    fn test_record_appends_row() {
        let mut wb = Workbook::with_support_tables();
        record(&mut wb, ts(), &TelemetryEvent::new("apply").intent("vat.add"));

        let rows = wb.table_rows(SupportTable::TELEMETRY.name).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], CellValue::from("2026-03-02T08:15:00"));
        assert_eq!(rows[0][1], CellValue::from("apply"));
        assert_eq!(rows[0][2], CellValue::from("vat.add"));
        assert_eq!(rows[0][3], CellValue::Empty);
    }

    #[test]
    fn test_missing_table_is_swallowed() {
        let mut wb = Workbook::new();
        record(&mut wb, ts(), &TelemetryEvent::new("apply").detail("x"));
        assert_eq!(wb.sheet_names(), vec!["Sheet1"]);
    }
}
