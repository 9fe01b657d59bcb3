//! Previews for the analytic reports. Each sample is the head of the table
//! apply will write, rendered for display.

use gridwise_core::letter_to_col;

use super::{letter, Draft, PreviewContext, PreviewFailure, SampleTable};
use crate::intent::{Aggregation, RoleColumns, SummaryPeriod};
use crate::payload::{ApplyPayload, SeriesSource, VarianceSource};
use crate::reports::{self as report, months_label, ReportTable};
use crate::selection::{inspect, SelectionInfo};

const NO_DATA: &str = "Ve vybraném rozsahu chybí numerická data nebo datum.";

fn role_col(role: Option<char>) -> Option<usize> {
    role.and_then(|c| letter_to_col(&c.to_string()))
}

/// Check that a role column lies inside the selection.
fn check_role(info: &SelectionInfo, col: usize, label: &str, issues: &mut Vec<String>) {
    if !info.contains_col(col) {
        issues.push(format!("Sloupec {} ({}) není součástí výběru {}.", letter(col), label, info.address()));
    }
}

/// Date and amount columns: explicit roles first, else the first two selected columns.
fn series_source(info: &SelectionInfo, roles: &RoleColumns, summary: &str) -> Result<SeriesSource, PreviewFailure> {
    let mut issues = Vec::new();
    if info.col_count < 2 {
        issues.push("Vyber alespoň dva sloupce: datum a částku.".to_string());
    }
    let date_col = role_col(roles.date).unwrap_or(info.col);
    let amount_col = role_col(roles.amount).unwrap_or(info.col + usize::min(1, info.col_count.saturating_sub(1)));
    check_role(info, date_col, "datum", &mut issues);
    check_role(info, amount_col, "částka", &mut issues);
    if date_col == amount_col && info.col_count >= 2 {
        issues.push("Sloupec s datem a sloupec s částkou musí být různé.".to_string());
    }
    if !issues.is_empty() {
        return Err(PreviewFailure::blocked(summary, issues));
    }
    Ok(SeriesSource { block: info.target(), date_col, amount_col })
}

fn no_data(summary: &str) -> PreviewFailure {
    PreviewFailure::blocked(summary, vec![NO_DATA.to_string()])
}

/// The first rows of a report, rendered.
fn sample_of(table: &ReportTable, max_rows: usize) -> SampleTable {
    let (mut sample, skip) = if table.has_header {
        (SampleTable::with_headers(table.render_row(0)), 1)
    } else {
        (SampleTable::new(&["Ukazatel", "Hodnota"]), 0)
    };
    for i in (skip..table.height()).take(max_rows) {
        let row = table.render_row(i);
        if !row.is_empty() {
            sample.rows.push(row);
        }
    }
    sample
}

fn columns_step(source: &SeriesSource) -> String {
    format!(
        "Vzít částky ve sloupci {} a seskupit je podle měsíců z data ve sloupci {}.",
        letter(source.amount_col),
        letter(source.date_col)
    )
}

fn output_step(sheet: &str) -> String {
    format!("Výsledky zapsat do listu {} (původní obsah listu se nahradí) a zaznamenat akci do auditu.", sheet)
}

// ── Builders ────────────────────────────────────────────────────────

pub(super) fn run_rate(months: u32, roles: &RoleColumns, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    const SUMMARY: &str = "Nelze připravit run-rate náhled.";
    let info = inspect(ctx.grid, ctx.settings)?;
    let source = series_source(&info, roles, SUMMARY)?;
    let series = source.read(ctx.grid)?;
    let table = report::run_rate(&series, months).ok_or_else(|| no_data(SUMMARY))?;

    let sheet = ctx.settings.run_rate_sheet.clone();
    let plan = vec![
        columns_step(&source),
        format!("Spočítat průměr za posledních {} a annualizovat ×12.", months_label(months)),
        output_step(&sheet),
    ];
    Ok(Draft {
        plan,
        sample: sample_of(&table, ctx.settings.preview_max_rows),
        issues: Vec::new(),
        payload: ApplyPayload::MonthlyRunRate { source, months, output_sheet: sheet },
    })
}

pub(super) fn period_summary(period: SummaryPeriod, roles: &RoleColumns, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    const SUMMARY: &str = "Nelze připravit souhrn za období.";
    let info = inspect(ctx.grid, ctx.settings)?;
    let source = series_source(&info, roles, SUMMARY)?;
    let series = source.read(ctx.grid)?;
    let table = report::period_summary(&series, period).ok_or_else(|| no_data(SUMMARY))?;

    let periods = match period {
        SummaryPeriod::MonthToDate => "od začátku měsíce (MTD)",
        SummaryPeriod::QuarterToDate => "od začátku čtvrtletí (QTD)",
        SummaryPeriod::YearToDate => "od začátku roku (YTD)",
        SummaryPeriod::All => "MTD, QTD a YTD",
    };
    let sheet = ctx.settings.period_summary_sheet.clone();
    let plan = vec![
        columns_step(&source),
        format!("Spočítat součty {} k poslednímu datu v datech.", periods),
        output_step(&sheet),
    ];
    Ok(Draft {
        plan,
        sample: sample_of(&table, ctx.settings.preview_max_rows),
        issues: Vec::new(),
        payload: ApplyPayload::PeriodSummary { source, period, output_sheet: sheet },
    })
}

pub(super) fn rolling_window(
    window: u32,
    aggregation: Aggregation,
    roles: &RoleColumns,
    ctx: &PreviewContext,
) -> Result<Draft, PreviewFailure> {
    const SUMMARY: &str = "Nelze připravit klouzavý výpočet.";
    let info = inspect(ctx.grid, ctx.settings)?;
    let source = series_source(&info, roles, SUMMARY)?;
    let series = source.read(ctx.grid)?;
    let table = report::rolling_window(&series, window, aggregation).ok_or_else(|| no_data(SUMMARY))?;

    let what = match aggregation {
        Aggregation::Sum => "klouzavý součet",
        Aggregation::Average => "klouzavý průměr",
    };
    let sheet = ctx.settings.rolling_sheet.clone();
    let plan = vec![
        columns_step(&source),
        format!("Pro každý měsíc spočítat {} za posledních {}.", what, months_label(window)),
        output_step(&sheet),
    ];
    Ok(Draft {
        plan,
        sample: sample_of(&table, ctx.settings.preview_max_rows),
        issues: Vec::new(),
        payload: ApplyPayload::RollingWindow { source, window, aggregation, output_sheet: sheet },
    })
}

pub(super) fn variance(roles: &RoleColumns, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    const SUMMARY: &str = "Nelze připravit porovnání s plánem.";
    let info = inspect(ctx.grid, ctx.settings)?;
    let source = variance_source(&info, roles, SUMMARY)?;
    let rows = source.read(ctx.grid)?;
    let table = report::variance(&rows).ok_or_else(|| no_data(SUMMARY))?;

    let first = match source.date_col {
        Some(date) => format!(
            "Porovnat skutečnost ve sloupci {} s plánem ve sloupci {} po měsících podle sloupce {}.",
            letter(source.actual_col),
            letter(source.budget_col),
            letter(date)
        ),
        None => format!(
            "Porovnat skutečnost ve sloupci {} s plánem ve sloupci {}.",
            letter(source.actual_col),
            letter(source.budget_col)
        ),
    };
    let sheet = ctx.settings.variance_sheet.clone();
    let plan = vec![
        first,
        "Spočítat absolutní a procentní odchylku včetně celkového součtu.".to_string(),
        output_step(&sheet),
    ];
    Ok(Draft {
        plan,
        sample: sample_of(&table, ctx.settings.preview_max_rows),
        issues: Vec::new(),
        payload: ApplyPayload::VarianceVsBudget { source, output_sheet: sheet },
    })
}

/// With three or more columns the first is the date; actual and budget are
/// the next selected columns unless named explicitly.
fn variance_source(info: &SelectionInfo, roles: &RoleColumns, summary: &str) -> Result<VarianceSource, PreviewFailure> {
    let mut issues = Vec::new();
    if info.col_count < 2 {
        issues.push("Vyber alespoň dva sloupce: skutečnost a plán.".to_string());
        return Err(PreviewFailure::blocked(summary, issues));
    }
    let date_col = role_col(roles.date).or((info.col_count >= 3).then_some(info.col));
    let mut free = (info.col..info.col + info.col_count).filter(|c| Some(*c) != date_col);
    let actual_col = match role_col(roles.actual) {
        Some(c) => c,
        None => free.next().unwrap_or(info.col),
    };
    let budget_col = match role_col(roles.budget) {
        Some(c) => c,
        None => free.find(|c| *c != actual_col).unwrap_or(info.col),
    };

    if let Some(date) = date_col {
        check_role(info, date, "datum", &mut issues);
    }
    check_role(info, actual_col, "skutečnost", &mut issues);
    check_role(info, budget_col, "plán", &mut issues);
    if actual_col == budget_col {
        issues.push("Sloupec se skutečností a sloupec s plánem musí být různé.".to_string());
    }
    if !issues.is_empty() {
        return Err(PreviewFailure::blocked(summary, issues));
    }
    Ok(VarianceSource { block: info.target(), date_col, actual_col, budget_col })
}

pub(super) fn period_comparison(roles: &RoleColumns, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    const SUMMARY: &str = "Nelze připravit porovnání období.";
    let info = inspect(ctx.grid, ctx.settings)?;
    let source = series_source(&info, roles, SUMMARY)?;
    let series = source.read(ctx.grid)?;
    let table = report::period_comparison(&series).ok_or_else(|| no_data(SUMMARY))?;

    let sheet = ctx.settings.period_compare_sheet.clone();
    let plan = vec![
        format!(
            "Sečíst částky ze sloupce {} po měsících, čtvrtletích a letech podle sloupce {}.",
            letter(source.amount_col),
            letter(source.date_col)
        ),
        "Porovnat poslední období s předchozím (absolutně i v %).".to_string(),
        output_step(&sheet),
    ];
    Ok(Draft {
        plan,
        sample: sample_of(&table, ctx.settings.preview_max_rows),
        issues: Vec::new(),
        payload: ApplyPayload::PeriodComparison { source, output_sheet: sheet },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gridwise_config::Settings;
    use gridwise_core::CellValue;
    use gridwise_engine::Workbook;

    use crate::holidays::CzechCalendar;
    use crate::intent::Recognizer;
    use crate::preview::{build_preview, Preview};

    fn ledger() -> Workbook {
        let mut wb = Workbook::with_support_tables();
        let rows: [(&str, f64, f64); 4] = [
            ("2026-01-10", 100.0, 120.0),
            ("2026-01-25", 50.0, 0.0),
            ("2026-02-03", 300.0, 250.0),
            ("2026-03-01", 200.0, 200.0),
        ];
        wb.set_value("Sheet1", 0, 0, "Datum").unwrap();
        wb.set_value("Sheet1", 0, 1, "Částka").unwrap();
        wb.set_value("Sheet1", 0, 2, "Plán").unwrap();
        for (i, (d, a, b)) in rows.iter().enumerate() {
            wb.set_value("Sheet1", i + 1, 0, *d).unwrap();
            wb.set_value("Sheet1", i + 1, 1, *a).unwrap();
            wb.set_value("Sheet1", i + 1, 2, *b).unwrap();
        }
        wb
    }

    fn preview(wb: &Workbook, text: &str) -> Result<Preview, PreviewFailure> {
        let recognition = Recognizer::new()
            .unwrap()
            .recognize(text, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .unwrap();
        let settings = Settings::default();
        build_preview(&recognition, &PreviewContext { grid: wb, settings: &settings, calendar: &CzechCalendar })
    }

    #[test]
    fn test_run_rate_defaults_to_first_two_columns() {
        let mut wb = ledger();
        wb.select("Sheet1", "A1:B5").unwrap();
        let p = preview(&wb, "spočítej run rate").unwrap();
        match &p.payload {
            ApplyPayload::MonthlyRunRate { source, months, output_sheet } => {
                assert_eq!((source.date_col, source.amount_col, *months), (0, 1, 3));
                assert_eq!(output_sheet, "_RunRate");
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(p.sample.headers, vec!["Ukazatel", "Hodnota"]);
        assert_eq!(p.sample.rows[1][1], "650,00 Kč");
    }

    #[test]
    fn test_role_outside_selection_blocks() {
        let mut wb = ledger();
        wb.select("Sheet1", "A1:B5").unwrap();
        let err = preview(&wb, "run rate A (datum) C (částka)").unwrap_err();
        assert_eq!(err.issues, vec!["Sloupec C (částka) není součástí výběru A1:B5.".to_string()]);
    }

    #[test]
    fn test_single_column_blocks_report() {
        let mut wb = ledger();
        wb.select("Sheet1", "B1:B5").unwrap();
        let err = preview(&wb, "porovnání období mom").unwrap_err();
        assert!(err.issues.contains(&"Vyber alespoň dva sloupce: datum a částku.".to_string()));
    }

    #[test]
    fn test_variance_three_columns() {
        let mut wb = ledger();
        wb.select("Sheet1", "A1:C5").unwrap();
        let p = preview(&wb, "odchylka vs budget").unwrap();
        match &p.payload {
            ApplyPayload::VarianceVsBudget { source, .. } => {
                assert_eq!((source.date_col, source.actual_col, source.budget_col), (Some(0), 1, 2));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(p.sample.headers[0], "Období");
        assert_eq!(p.sample.rows[0][0], "2026-01");
    }

    #[test]
    fn test_variance_two_columns_has_no_date() {
        let mut wb = ledger();
        wb.select("Sheet1", "B1:C5").unwrap();
        let p = preview(&wb, "odchylka vs budget").unwrap();
        match &p.payload {
            ApplyPayload::VarianceVsBudget { source, .. } => {
                assert_eq!((source.date_col, source.actual_col, source.budget_col), (None, 1, 2));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(p.sample.rows.len(), 1);
    }

    #[test]
    fn test_no_dates_blocks() {
        let mut wb = ledger();
        for r in 1..5 {
            wb.set_value("Sheet1", r, 0, CellValue::from("?")).unwrap();
        }
        wb.select("Sheet1", "A1:B5").unwrap();
        let err = preview(&wb, "run rate").unwrap_err();
        assert_eq!(err.issues, vec![NO_DATA.to_string()]);
    }
}
