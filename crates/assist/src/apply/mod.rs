//! Apply Engine.
//!
//! Executes a confirmed [`ApplyPayload`]. Every mutating intent follows the
//! same order: resolve external data, snapshot the target, mutate, append
//! the audit entry and a telemetry event, then commit the whole batch with a
//! single [`Grid::sync`]. A failure before the commit returns the error and leaves
//! the batch uncommitted.

mod reports;
mod schedule;
mod transform;

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use gridwise_config::Settings;
use gridwise_core::{qualified_a1, Grid, Range};

use crate::audit::{AuditEntry, AuditLog};
use crate::error::AssistError;
use crate::holidays::HolidayCalendar;
use crate::journal::{CaptureReceipt, UndoJournal};
use crate::payload::ApplyPayload;
use crate::rates::RateProvider;
use crate::selection::EMPTY_SELECTION;
use crate::telemetry::{self, TelemetryEvent};

pub(crate) const NOT_PERSISTED: &str =
    "Operace příliš velká pro trvalé Zpět; aktuální stav lze vrátit jen pomocí poslední akce Zpět.";

/// Everything an apply may touch.
pub struct ApplyContext<'a> {
    pub grid: &'a mut dyn Grid,
    pub journal: &'a mut UndoJournal,
    pub rates: &'a dyn RateProvider,
    pub calendar: &'a dyn HolidayCalendar,
    pub settings: &'a Settings,
    /// Timestamp for the snapshot and the audit entry
    pub now: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub message: String,
    pub warnings: Vec<String>,
    /// `None` for intents that do not touch the document body
    pub snapshot_id: Option<String>,
}

/// What a per-intent apply did, before it is audited and committed.
struct Applied {
    message: String,
    receipt: Option<CaptureReceipt>,
    /// Range recorded in the audit entry
    address: String,
    note: String,
    /// Merged into the payload's audit arguments
    extra: Map<String, Value>,
    warnings: Vec<String>,
}

impl Applied {
    /// `sheet` and `range` become the sheet-qualified audit address.
    fn new(
        message: impl Into<String>,
        receipt: Option<CaptureReceipt>,
        sheet: &str,
        range: &Range,
        note: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            receipt,
            address: qualified_a1(sheet, range),
            note: note.into(),
            extra: Map::new(),
            warnings: Vec::new(),
        }
    }

    fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    fn warn(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Execute `payload` against the document in `ctx`.
pub fn apply(payload: &ApplyPayload, ctx: &mut ApplyContext) -> Result<ApplyOutcome, AssistError> {
    let applied = match payload {
        ApplyPayload::VatAdd { target, rate } => transform::vat_add(target, *rate, ctx),
        ApplyPayload::VatRemove { target, rate } => transform::vat_remove(target, *rate, ctx),
        ApplyPayload::FormatCurrency { target } => transform::format_currency(target, ctx),
        ApplyPayload::Dedupe { target } => transform::dedupe(target, ctx),
        ApplyPayload::SortColumn { target, key_col, direction } => {
            transform::sort_column(target, *key_col, *direction, ctx)
        }
        ApplyPayload::HighlightNegative { target } => transform::highlight_negative(target, ctx),
        ApplyPayload::SumColumn { target } => transform::sum_column(target, ctx),
        ApplyPayload::FetchRate { currency, date } => transform::fetch_rate(currency, *date, ctx),
        ApplyPayload::FxConvert { target, currency, date } => transform::fx_convert(target, currency, *date, ctx),
        ApplyPayload::MonthlyRunRate { source, months, output_sheet } => {
            reports::run_rate(source, *months, output_sheet, ctx)
        }
        ApplyPayload::PeriodSummary { source, period, output_sheet } => {
            reports::period_summary(source, *period, output_sheet, ctx)
        }
        ApplyPayload::RollingWindow { source, window, aggregation, output_sheet } => {
            reports::rolling_window(source, *window, *aggregation, output_sheet, ctx)
        }
        ApplyPayload::VarianceVsBudget { source, output_sheet } => reports::variance(source, output_sheet, ctx),
        ApplyPayload::PeriodComparison { source, output_sheet } => {
            reports::period_comparison(source, output_sheet, ctx)
        }
        ApplyPayload::SeedHolidays { year, jurisdiction } => schedule::seed_holidays(*year, jurisdiction, ctx),
        ApplyPayload::NetworkdaysDue { start, days, sheet, row, col } => {
            schedule::networkdays_due(*start, *days, sheet, *row, *col, ctx)
        }
    }?;

    let mut args = payload.audit_args();
    if let Value::Object(map) = &mut args {
        map.extend(applied.extra);
    }
    let intent = payload.intent_type();
    let entry = AuditEntry::new(ctx.now, intent.as_str(), &args, applied.address, applied.note);
    AuditLog::append(ctx.grid, &entry)?;
    telemetry::record(ctx.grid, ctx.now, &TelemetryEvent::new("apply").intent(intent.as_str()));
    ctx.grid.sync()?;

    let mut warnings = Vec::new();
    if applied.receipt.as_ref().is_some_and(|r| !r.persisted) {
        warnings.push(NOT_PERSISTED.to_string());
    }
    warnings.extend(applied.warnings);
    log::info!("applied {}: {}", intent.as_str(), applied.message);
    Ok(ApplyOutcome {
        message: applied.message,
        warnings,
        snapshot_id: applied.receipt.map(|r| r.id),
    })
}

// ── Shared helpers ──────────────────────────────────────────────────

fn snapshot(ctx: &mut ApplyContext, sheet: &str, range: &Range, note: &str) -> Result<CaptureReceipt, AssistError> {
    ctx.journal.capture(ctx.grid, sheet, range, note, ctx.now)
}

fn required(range: Option<Range>) -> Result<Range, AssistError> {
    range.ok_or_else(|| AssistError::input(EMPTY_SELECTION))
}

/// `item` repeated down `rows` rows of one column.
fn column_of<T: Clone>(item: T, rows: usize) -> Vec<Vec<T>> {
    vec![vec![item]; rows]
}
