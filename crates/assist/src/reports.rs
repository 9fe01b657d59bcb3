//! Analytic report tables shared by preview and apply.
//!
//! Each builder is a pure function of the parsed rows, so the preview sample
//! and the written output come from the same arithmetic. Rows whose date or
//! amount cannot be parsed are skipped, never counted as zero.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use gridwise_core::{CellInput, CellValue, GENERAL_FORMAT};

use crate::dates::{cell_to_date, czech, date_to_serial, month_index, month_label, quarter_of, serial_to_date};
use crate::intent::{Aggregation, SummaryPeriod};
use crate::numbers::{
    format_czk, format_grouped, format_percent, parse_czech_numeric, CZK_FORMAT, DATE_FORMAT,
    INTEGER_FORMAT, PERCENT_FORMAT,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedAmount {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Parse `(date, amount)` pairs from row-major values.
pub fn collect_series(values: &[Vec<CellValue>], date_idx: usize, amount_idx: usize) -> Vec<DatedAmount> {
    values
        .iter()
        .filter_map(|row| {
            let date = cell_to_date(row.get(date_idx)?)?;
            let amount = parse_czech_numeric(row.get(amount_idx)?)?;
            Some(DatedAmount { date, amount })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceRow {
    pub date: Option<NaiveDate>,
    pub actual: f64,
    pub budget: f64,
}

/// Parse actual/budget pairs. With a date column, rows without a date are skipped.
pub fn collect_variance(
    values: &[Vec<CellValue>],
    date_idx: Option<usize>,
    actual_idx: usize,
    budget_idx: usize,
) -> Vec<VarianceRow> {
    values
        .iter()
        .filter_map(|row| {
            let date = match date_idx {
                Some(i) => Some(cell_to_date(row.get(i)?)?),
                None => None,
            };
            let actual = parse_czech_numeric(row.get(actual_idx)?)?;
            let budget = parse_czech_numeric(row.get(budget_idx)?)?;
            Some(VarianceRow { date, actual, budget })
        })
        .collect()
}

/// A rectangular block of report output with per-cell number formats.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub rows: Vec<Vec<CellValue>>,
    pub formats: Vec<Vec<String>>,
    /// First row holds column titles
    pub has_header: bool,
}

impl ReportTable {
    fn new(has_header: bool) -> Self {
        Self { rows: Vec::new(), formats: Vec::new(), has_header }
    }

    fn push(&mut self, cells: Vec<(CellValue, &str)>) {
        let (values, formats): (Vec<_>, Vec<_>) = cells
            .into_iter()
            .map(|(v, f)| (v, f.to_string()))
            .unzip();
        self.rows.push(values);
        self.formats.push(formats);
    }

    fn push_titles(&mut self, titles: &[&str]) {
        self.push(titles.iter().map(|t| (CellValue::from(*t), GENERAL_FORMAT)).collect());
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Rows padded to full width, ready for `Grid::write_cells`.
    pub fn inputs(&self) -> Vec<Vec<CellInput>> {
        let width = self.width();
        self.rows
            .iter()
            .map(|row| {
                let mut out: Vec<CellInput> = row.iter().cloned().map(CellInput::Value).collect();
                out.resize(width, CellInput::empty());
                out
            })
            .collect()
    }

    /// Formats padded to full width.
    pub fn padded_formats(&self) -> Vec<Vec<String>> {
        let width = self.width();
        self.formats
            .iter()
            .map(|row| {
                let mut out = row.clone();
                out.resize(width, GENERAL_FORMAT.to_string());
                out
            })
            .collect()
    }

    /// Human-readable rendering of one row.
    pub fn render_row(&self, index: usize) -> Vec<String> {
        let Some(row) = self.rows.get(index) else {
            return Vec::new();
        };
        row.iter()
            .enumerate()
            .map(|(c, value)| {
                let format = self.formats[index].get(c).map(String::as_str).unwrap_or(GENERAL_FORMAT);
                render_cell(value, format)
            })
            .collect()
    }
}

pub fn render_cell(value: &CellValue, format: &str) -> String {
    match value {
        CellValue::Number(n) => match format {
            CZK_FORMAT => format_czk(*n),
            PERCENT_FORMAT => format_percent(*n),
            DATE_FORMAT => serial_to_date(*n).map(czech).unwrap_or_else(|| n.to_string()),
            INTEGER_FORMAT => format_grouped(*n, 0),
            _ => format_grouped(*n, 2),
        },
        other => other.to_string(),
    }
}

fn money(v: f64) -> (CellValue, &'static str) {
    (CellValue::Number(v), CZK_FORMAT)
}

fn text(s: impl Into<String>) -> (CellValue, &'static str) {
    (CellValue::Text(s.into()), GENERAL_FORMAT)
}

fn pct_change(current: f64, previous: f64) -> (CellValue, &'static str) {
    if previous == 0.0 {
        (CellValue::Empty, PERCENT_FORMAT)
    } else {
        (CellValue::Number((current - previous) / previous), PERCENT_FORMAT)
    }
}

/// Czech plural for a month count.
pub fn months_label(n: u32) -> String {
    match n {
        1 => "1 měsíc".to_string(),
        2..=4 => format!("{} měsíce", n),
        _ => format!("{} měsíců", n),
    }
}

fn monthly_totals(series: &[DatedAmount]) -> BTreeMap<(i32, u32), f64> {
    let mut buckets = BTreeMap::new();
    for point in series {
        *buckets.entry((point.date.year(), point.date.month())).or_insert(0.0) += point.amount;
    }
    buckets
}

// ── Run-rate ────────────────────────────────────────────────────────

/// Totals over the last `months` months that have data, the monthly average
/// and the annualized run-rate (average x 12).
pub fn run_rate(series: &[DatedAmount], months: u32) -> Option<ReportTable> {
    let buckets = monthly_totals(series);
    let take = (months.max(1) as usize).min(buckets.len());
    if take == 0 {
        return None;
    }
    let recent: Vec<((i32, u32), f64)> = buckets.into_iter().rev().take(take).collect::<Vec<_>>().into_iter().rev().collect();
    let total: f64 = recent.iter().map(|(_, v)| v).sum();
    let average = total / take as f64;

    let mut table = ReportTable::new(false);
    table.push(vec![text("Období"), text(months_label(take as u32))]);
    table.push(vec![text("Součet za období"), money(total)]);
    table.push(vec![text("Průměr měsíčně"), money(average)]);
    table.push(vec![text("Roční run-rate"), money(average * 12.0)]);
    let note = if (take as u32) < months {
        format!("K dispozici jen {} s daty (požadováno {}).", months_label(take as u32), months)
    } else {
        format!("Výpočet z posledních {} s daty.", months_label(take as u32))
    };
    table.push(vec![text("Poznámka"), text(note)]);
    table.push(vec![]);
    table.push(vec![text("Měsíc"), text("Součet")]);
    for ((y, m), v) in recent {
        table.push(vec![text(month_label(y, m)), money(v)]);
    }
    Some(table)
}

// ── Period summary ──────────────────────────────────────────────────

/// Month-, quarter- and year-to-date totals ending at the latest dated row.
pub fn period_summary(series: &[DatedAmount], period: SummaryPeriod) -> Option<ReportTable> {
    let latest = series.iter().map(|p| p.date).max()?;
    let month_start = latest.with_day(1)?;
    let quarter_start = NaiveDate::from_ymd_opt(latest.year(), (quarter_of(latest) - 1) * 3 + 1, 1)?;
    let year_start = NaiveDate::from_ymd_opt(latest.year(), 1, 1)?;

    let wanted: Vec<(&str, NaiveDate)> = match period {
        SummaryPeriod::MonthToDate => vec![("MTD", month_start)],
        SummaryPeriod::QuarterToDate => vec![("QTD", quarter_start)],
        SummaryPeriod::YearToDate => vec![("YTD", year_start)],
        SummaryPeriod::All => vec![("MTD", month_start), ("QTD", quarter_start), ("YTD", year_start)],
    };

    let mut table = ReportTable::new(true);
    table.push_titles(&["Období", "Od", "Do", "Součet", "Počet řádků"]);
    for (label, from) in wanted {
        let in_range: Vec<f64> = series
            .iter()
            .filter(|p| p.date >= from && p.date <= latest)
            .map(|p| p.amount)
            .collect();
        table.push(vec![
            text(label),
            (CellValue::Number(date_to_serial(from)), DATE_FORMAT),
            (CellValue::Number(date_to_serial(latest)), DATE_FORMAT),
            money(in_range.iter().sum()),
            (CellValue::Number(in_range.len() as f64), INTEGER_FORMAT),
        ]);
    }
    Some(table)
}

// ── Rolling window ──────────────────────────────────────────────────

/// Per-month totals with a trailing `window`-month sum or average.
///
/// The window is measured in calendar months; months without data are absent
/// and an average divides by the months present in the window.
pub fn rolling_window(series: &[DatedAmount], window: u32, aggregation: Aggregation) -> Option<ReportTable> {
    let buckets = monthly_totals(series);
    if buckets.is_empty() {
        return None;
    }
    let indexed: Vec<(i32, (i32, u32), f64)> = buckets
        .iter()
        .filter_map(|(&(y, m), &v)| {
            let first = NaiveDate::from_ymd_opt(y, m, 1)?;
            Some((month_index(first), (y, m), v))
        })
        .collect();

    let title = match aggregation {
        Aggregation::Sum => format!("Klouzavý součet ({} m)", window),
        Aggregation::Average => format!("Klouzavý průměr ({} m)", window),
    };
    let mut table = ReportTable::new(true);
    table.push_titles(&["Měsíc", "Součet měsíce", &title]);
    for &(idx, (y, m), v) in &indexed {
        let in_window: Vec<f64> = indexed
            .iter()
            .filter(|(other, _, _)| *other <= idx && *other > idx - window as i32)
            .map(|(_, _, v)| *v)
            .collect();
        let sum: f64 = in_window.iter().sum();
        let value = match aggregation {
            Aggregation::Sum => sum,
            Aggregation::Average => sum / in_window.len() as f64,
        };
        table.push(vec![text(month_label(y, m)), money(v), money(value)]);
    }
    Some(table)
}

// ── Variance vs budget ──────────────────────────────────────────────

/// Actual vs budget per month (when dated) plus a total row.
pub fn variance(rows: &[VarianceRow]) -> Option<ReportTable> {
    if rows.is_empty() {
        return None;
    }
    let mut table = ReportTable::new(true);
    table.push_titles(&["Období", "Skutečnost", "Plán", "Odchylka", "Odchylka %"]);

    let mut months: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for row in rows {
        if let Some(date) = row.date {
            let entry = months.entry((date.year(), date.month())).or_insert((0.0, 0.0));
            entry.0 += row.actual;
            entry.1 += row.budget;
        }
    }
    let mut push_line = |label: String, actual: f64, budget: f64| {
        table.push(vec![
            text(label),
            money(actual),
            money(budget),
            money(actual - budget),
            pct_change(actual, budget),
        ]);
    };
    for ((y, m), (actual, budget)) in months {
        push_line(month_label(y, m), actual, budget);
    }
    let actual: f64 = rows.iter().map(|r| r.actual).sum();
    let budget: f64 = rows.iter().map(|r| r.budget).sum();
    push_line("Celkem".to_string(), actual, budget);
    Some(table)
}

// ── Period comparison ───────────────────────────────────────────────

/// Latest month, quarter and year against the preceding one.
pub fn period_comparison(series: &[DatedAmount]) -> Option<ReportTable> {
    let latest = series.iter().map(|p| p.date).max()?;
    let cur_month = month_index(latest);
    let cur_quarter = latest.year() * 4 + quarter_of(latest) as i32 - 1;
    let cur_year = latest.year();

    let sum_where = |pred: &dyn Fn(NaiveDate) -> bool| -> f64 {
        series.iter().filter(|p| pred(p.date)).map(|p| p.amount).sum()
    };
    let quarter_index = |d: NaiveDate| d.year() * 4 + quarter_of(d) as i32 - 1;

    let lines = [
        (
            format!("Měsíc ({})", month_label(latest.year(), latest.month())),
            sum_where(&|d: NaiveDate| month_index(d) == cur_month),
            sum_where(&|d: NaiveDate| month_index(d) == cur_month - 1),
        ),
        (
            format!("Čtvrtletí ({}-Q{})", latest.year(), quarter_of(latest)),
            sum_where(&|d: NaiveDate| quarter_index(d) == cur_quarter),
            sum_where(&|d: NaiveDate| quarter_index(d) == cur_quarter - 1),
        ),
        (
            format!("Rok ({})", cur_year),
            sum_where(&|d: NaiveDate| d.year() == cur_year),
            sum_where(&|d: NaiveDate| d.year() == cur_year - 1),
        ),
    ];

    let mut table = ReportTable::new(true);
    table.push_titles(&["Období", "Aktuální", "Předchozí", "Δ absolutní", "Δ %"]);
    for (label, current, previous) in lines {
        table.push(vec![
            text(label),
            money(current),
            money(previous),
            money(current - previous),
            pct_change(current, previous),
        ]);
    }
    Some(table)
}
