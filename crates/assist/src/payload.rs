//! Resolved, replay-ready instructions for the apply engine.
//!
//! Coordinates are absolute and zero-based; applying a payload never reads
//! the live selection or the request text again.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use gridwise_core::{col_to_letter, CellValue, Grid, Range};

use crate::dates::iso;
use crate::error::AssistError;
use crate::reports::{collect_series, collect_variance, DatedAmount, VarianceRow};
use crate::intent::{Aggregation, IntentType, SortDirection, SummaryPeriod, VatRate};

/// A block on a sheet with an optional header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetRange {
    pub sheet: String,
    pub row: usize,
    pub col: usize,
    pub row_count: usize,
    pub col_count: usize,
    pub has_header: bool,
}

impl TargetRange {
    pub fn range(&self) -> Option<Range> {
        Range::from_origin(self.row, self.col, self.row_count, self.col_count)
    }

    pub fn address(&self) -> String {
        self.range().map(|r| r.to_a1()).unwrap_or_default()
    }

    pub fn data_start(&self) -> usize {
        self.row + usize::from(self.has_header)
    }

    pub fn data_rows(&self) -> usize {
        self.row_count.saturating_sub(usize::from(self.has_header))
    }

    pub fn data_range(&self) -> Option<Range> {
        Range::from_origin(self.data_start(), self.col, self.data_rows(), self.col_count)
    }

    /// Same rows as this block, in column `col`.
    pub fn column_span(&self, col: usize) -> Option<Range> {
        Range::from_origin(self.row, col, self.row_count, 1)
    }

    /// Data rows only, in column `col`.
    pub fn data_column(&self, col: usize) -> Option<Range> {
        Range::from_origin(self.data_start(), col, self.data_rows(), 1)
    }

    pub fn letter(&self) -> String {
        col_to_letter(self.col)
    }
}

/// Dated amounts read from two columns of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSource {
    pub block: TargetRange,
    pub date_col: usize,
    pub amount_col: usize,
}

impl SeriesSource {
    /// Parsed data rows of the block; unparseable rows are skipped.
    pub fn read(&self, grid: &dyn Grid) -> Result<Vec<DatedAmount>, AssistError> {
        let values = read_data_rows(grid, &self.block)?;
        Ok(collect_series(&values, self.date_col - self.block.col, self.amount_col - self.block.col))
    }
}

/// Actual and budget columns, optionally bucketed by a date column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarianceSource {
    pub block: TargetRange,
    pub date_col: Option<usize>,
    pub actual_col: usize,
    pub budget_col: usize,
}

impl VarianceSource {
    pub fn read(&self, grid: &dyn Grid) -> Result<Vec<VarianceRow>, AssistError> {
        let values = read_data_rows(grid, &self.block)?;
        let base = self.block.col;
        Ok(collect_variance(
            &values,
            self.date_col.map(|c| c - base),
            self.actual_col - base,
            self.budget_col - base,
        ))
    }
}

fn read_data_rows(grid: &dyn Grid, block: &TargetRange) -> Result<Vec<Vec<CellValue>>, AssistError> {
    match block.data_range() {
        Some(range) => Ok(grid.read_range(&block.sheet, &range)?.values),
        None => Ok(Vec::new()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyPayload {
    VatAdd { target: TargetRange, rate: VatRate },
    VatRemove { target: TargetRange, rate: VatRate },
    FormatCurrency { target: TargetRange },
    Dedupe { target: TargetRange },
    SortColumn { target: TargetRange, key_col: usize, direction: SortDirection },
    HighlightNegative { target: TargetRange },
    SumColumn { target: TargetRange },
    FetchRate { currency: String, date: NaiveDate },
    FxConvert { target: TargetRange, currency: String, date: NaiveDate },
    MonthlyRunRate { source: SeriesSource, months: u32, output_sheet: String },
    PeriodSummary { source: SeriesSource, period: SummaryPeriod, output_sheet: String },
    RollingWindow { source: SeriesSource, window: u32, aggregation: Aggregation, output_sheet: String },
    VarianceVsBudget { source: VarianceSource, output_sheet: String },
    PeriodComparison { source: SeriesSource, output_sheet: String },
    SeedHolidays { year: i32, jurisdiction: String },
    NetworkdaysDue { start: NaiveDate, days: i32, sheet: String, row: usize, col: usize },
}

impl ApplyPayload {
    pub fn intent_type(&self) -> IntentType {
        match self {
            ApplyPayload::VatAdd { .. } => IntentType::VatAdd,
            ApplyPayload::VatRemove { .. } => IntentType::VatRemove,
            ApplyPayload::FormatCurrency { .. } => IntentType::FormatCurrency,
            ApplyPayload::Dedupe { .. } => IntentType::Dedupe,
            ApplyPayload::SortColumn { .. } => IntentType::SortColumn,
            ApplyPayload::HighlightNegative { .. } => IntentType::HighlightNegative,
            ApplyPayload::SumColumn { .. } => IntentType::SumColumn,
            ApplyPayload::FetchRate { .. } => IntentType::FetchRate,
            ApplyPayload::FxConvert { .. } => IntentType::FxConvert,
            ApplyPayload::MonthlyRunRate { .. } => IntentType::MonthlyRunRate,
            ApplyPayload::PeriodSummary { .. } => IntentType::PeriodSummary,
            ApplyPayload::RollingWindow { .. } => IntentType::RollingWindow,
            ApplyPayload::VarianceVsBudget { .. } => IntentType::VarianceVsBudget,
            ApplyPayload::PeriodComparison { .. } => IntentType::PeriodComparison,
            ApplyPayload::SeedHolidays { .. } => IntentType::SeedHolidays,
            ApplyPayload::NetworkdaysDue { .. } => IntentType::NetworkdaysDue,
        }
    }

    /// Arguments recorded in the audit log.
    pub fn audit_args(&self) -> serde_json::Value {
        match self {
            ApplyPayload::VatAdd { target, rate } | ApplyPayload::VatRemove { target, rate } => json!({
                "rate": rate.fraction(),
                "rateLabel": rate.label(),
                "sourceColumn": target.letter(),
                "hasHeader": target.has_header,
            }),
            ApplyPayload::FormatCurrency { target }
            | ApplyPayload::HighlightNegative { target }
            | ApplyPayload::SumColumn { target } => json!({
                "column": target.letter(),
                "hasHeader": target.has_header,
            }),
            ApplyPayload::Dedupe { target } => json!({
                "columns": target.col_count,
                "hasHeader": target.has_header,
            }),
            ApplyPayload::SortColumn { target, key_col, direction } => json!({
                "column": col_to_letter(*key_col),
                "direction": direction,
                "hasHeader": target.has_header,
            }),
            ApplyPayload::FetchRate { currency, date } => json!({
                "currency": currency,
                "date": iso(*date),
            }),
            ApplyPayload::FxConvert { target, currency, date } => json!({
                "currency": currency,
                "date": iso(*date),
                "sourceColumn": target.letter(),
            }),
            ApplyPayload::MonthlyRunRate { source, months, output_sheet } => json!({
                "months": months,
                "dateColumn": col_to_letter(source.date_col),
                "amountColumn": col_to_letter(source.amount_col),
                "output": output_sheet,
            }),
            ApplyPayload::PeriodSummary { source, period, output_sheet } => json!({
                "period": period,
                "dateColumn": col_to_letter(source.date_col),
                "amountColumn": col_to_letter(source.amount_col),
                "output": output_sheet,
            }),
            ApplyPayload::RollingWindow { source, window, aggregation, output_sheet } => json!({
                "window": window,
                "aggregation": aggregation,
                "dateColumn": col_to_letter(source.date_col),
                "amountColumn": col_to_letter(source.amount_col),
                "output": output_sheet,
            }),
            ApplyPayload::VarianceVsBudget { source, output_sheet } => json!({
                "dateColumn": source.date_col.map(col_to_letter),
                "actualColumn": col_to_letter(source.actual_col),
                "budgetColumn": col_to_letter(source.budget_col),
                "output": output_sheet,
            }),
            ApplyPayload::PeriodComparison { source, output_sheet } => json!({
                "dateColumn": col_to_letter(source.date_col),
                "amountColumn": col_to_letter(source.amount_col),
                "output": output_sheet,
            }),
            ApplyPayload::SeedHolidays { year, jurisdiction } => json!({
                "year": year,
                "jurisdiction": jurisdiction,
            }),
            ApplyPayload::NetworkdaysDue { start, days, .. } => json!({
                "start": iso(*start),
                "days": days,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_c(has_header: bool) -> TargetRange {
        TargetRange { sheet: "Sheet1".into(), row: 0, col: 2, row_count: 5, col_count: 1, has_header }
    }

    #[test]
    fn test_data_rows_skip_header() {
        let t = column_c(true);
        assert_eq!(t.data_start(), 1);
        assert_eq!(t.data_rows(), 4);
        assert_eq!(t.data_range().map(|r| r.to_a1()), Some("C2:C5".to_string()));
        assert_eq!(t.column_span(3).map(|r| r.to_a1()), Some("D1:D5".to_string()));
    }

    #[test]
    fn test_data_rows_without_header() {
        let t = column_c(false);
        assert_eq!(t.data_range().map(|r| r.to_a1()), Some("C1:C5".to_string()));
    }

    #[test]
    fn test_audit_args_vat() {
        let p = ApplyPayload::VatAdd { target: column_c(true), rate: VatRate::STANDARD };
        let args = p.audit_args();
        assert_eq!(args["rateLabel"], "21 %");
        assert_eq!(args["sourceColumn"], "C");
        assert_eq!(p.intent_type(), IntentType::VatAdd);
    }
}
