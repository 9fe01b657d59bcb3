//! Preview Builder.
//!
//! Read-only: validates a recognized intent against the live selection,
//! computes a small illustrative sample with the same arithmetic apply uses,
//! and resolves the [`ApplyPayload`]. Nothing here writes to the grid.

mod reports;
mod schedule;
mod transform;

use std::fmt;

use gridwise_config::Settings;
use gridwise_core::{col_to_letter, CellValue, Grid};

use crate::error::AssistError;
use crate::holidays::HolidayCalendar;
use crate::intent::{Intent, IntentKind, Recognition};
use crate::payload::ApplyPayload;
use crate::selection::SelectionInfo;

pub(crate) use transform::direction_label;

/// Illustrative before/after table shown with a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SampleTable {
    fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn with_headers(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    fn row<S: Into<String>>(mut self, cells: impl IntoIterator<Item = S>) -> Self {
        self.push(cells);
        self
    }

    fn push<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }
}

/// A validated, resolved plan awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub intent: Intent,
    /// Ordered steps apply will perform
    pub plan: Vec<String>,
    pub sample: SampleTable,
    /// Non-blocking advisories
    pub issues: Vec<String>,
    pub payload: ApplyPayload,
}

impl Preview {
    /// `1. …\n2. …`
    pub fn plan_text(&self) -> String {
        self.plan
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Why no plan could be prepared. `issues` lists every blocking problem found.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFailure {
    pub error: AssistError,
    pub issues: Vec<String>,
}

impl PreviewFailure {
    fn blocked(summary: &str, issues: Vec<String>) -> Self {
        Self { error: AssistError::input(summary), issues }
    }
}

impl From<AssistError> for PreviewFailure {
    fn from(error: AssistError) -> Self {
        Self { error, issues: Vec::new() }
    }
}

impl fmt::Display for PreviewFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error.user_message())?;
        for issue in &self.issues {
            write!(f, "\n- {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for PreviewFailure {}

/// Read-only collaborators a preview may consult.
pub struct PreviewContext<'a> {
    pub grid: &'a dyn Grid,
    pub settings: &'a Settings,
    pub calendar: &'a dyn HolidayCalendar,
}

/// What a per-intent builder produces; the intent is attached afterwards.
struct Draft {
    plan: Vec<String>,
    sample: SampleTable,
    issues: Vec<String>,
    payload: ApplyPayload,
}

/// Build the preview for a recognized request.
pub fn build_preview(recognition: &Recognition, ctx: &PreviewContext) -> Result<Preview, PreviewFailure> {
    let draft = match &recognition.intent.kind {
        IntentKind::VatAdd { rate, column } => transform::vat_add(*rate, *column, ctx),
        IntentKind::FormatCurrency { column } => transform::format_currency(*column, ctx),
        IntentKind::FetchRate { currency, date } => transform::fetch_rate(currency, *date, ctx),
        IntentKind::FxConvert { currency, date, column } => transform::fx_convert(currency, *date, *column, ctx),
        IntentKind::Dedupe { column } => transform::dedupe(*column, ctx),
        IntentKind::SortColumn { column, direction } => transform::sort_column(*column, *direction, ctx),
        IntentKind::VatRemove { rate, column } => transform::vat_remove(*rate, *column, ctx),
        IntentKind::HighlightNegative { column } => transform::highlight_negative(*column, ctx),
        IntentKind::SumColumn { column } => transform::sum_column(*column, ctx),
        IntentKind::MonthlyRunRate { months, roles } => reports::run_rate(*months, roles, ctx),
        IntentKind::PeriodSummary { period, roles } => reports::period_summary(*period, roles, ctx),
        IntentKind::RollingWindow { window, aggregation, roles } => {
            reports::rolling_window(*window, *aggregation, roles, ctx)
        }
        IntentKind::VarianceVsBudget { roles } => reports::variance(roles, ctx),
        IntentKind::PeriodComparison { roles } => reports::period_comparison(roles, ctx),
        IntentKind::SeedHolidays { year } => schedule::seed_holidays(*year, ctx),
        IntentKind::NetworkdaysDue { days, start } => schedule::networkdays_due(*days, *start, ctx),
    }?;

    let mut issues = recognition.issues.clone();
    issues.extend(draft.issues);
    log::debug!(
        "preview {}: {} steps, {} issues",
        recognition.intent.intent_type().as_str(),
        draft.plan.len(),
        issues.len()
    );
    Ok(Preview {
        intent: recognition.intent.clone(),
        plan: draft.plan,
        sample: draft.sample,
        issues,
        payload: draft.payload,
    })
}

// ── Shared validation ───────────────────────────────────────────────

const SINGLE_COLUMN: &str = "Vyber přesně jeden sloupec včetně hlavičky.";
const NEED_DATA_ROW: &str = "Rozsah musí obsahovat alespoň jeden řádek s daty pod hlavičkou.";
const NEED_TWO_ROWS: &str = "Rozsah musí obsahovat alespoň dva řádky.";

/// Blocking checks shared by the single-column transforms.
fn single_column_issues(info: &SelectionInfo, column: Option<char>) -> Vec<String> {
    let mut issues = Vec::new();
    if info.col_count != 1 {
        issues.push(SINGLE_COLUMN.to_string());
    }
    if let Some(conflict) = column_conflict(info, column) {
        issues.push(conflict);
    }
    issues
}

/// A column named in the request must be the selected one; never auto-corrected.
fn column_conflict(info: &SelectionInfo, column: Option<char>) -> Option<String> {
    let wanted = column?.to_ascii_uppercase();
    let selected = info.column_letter();
    if selected != wanted.to_string() {
        return Some(format!(
            "Během náhledu je aktivní sloupec {}, ale požadavek odkazuje na sloupec {}.",
            selected, wanted
        ));
    }
    None
}

/// First-column sample values below the header, at most `max_rows`.
fn data_sample(info: &SelectionInfo, max_rows: usize) -> Vec<CellValue> {
    info.sample
        .iter()
        .skip(usize::from(info.has_header))
        .take(max_rows)
        .map(|row| row.first().cloned().unwrap_or_default())
        .collect()
}

fn letter(col: usize) -> String {
    col_to_letter(col)
}
