//! Holiday table seeding and business-day deadlines.

use chrono::NaiveDate;

use gridwise_core::{CellInput, Range, SupportTable};

use super::{required, snapshot, Applied, ApplyContext};
use crate::dates::{date_to_serial, iso};
use crate::error::AssistError;
use crate::holidays::{business_due_date, holiday_row, holidays_for_year, load_holiday_set, row_in_year};
use crate::numbers::{DATE_FORMAT, INTEGER_FORMAT};

/// Replace the year's rows in the holiday table with a fresh list.
///
/// The snapshot covers the table body as it will be after the rewrite, or
/// before it if that was longer, so undo restores the prior rows exactly.
pub(super) fn seed_holidays(year: i32, jurisdiction: &str, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let entries = holidays_for_year(ctx.calendar, jurisdiction, year)?;
    let table = SupportTable::HOLIDAYS_CZ;
    let note = format!("Svátky {}", year);

    let rows = ctx.grid.table_rows(table.name)?;
    let stale: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row_in_year(row, year))
        .map(|(i, _)| i)
        .collect();
    let after = rows.len() - stale.len() + entries.len();
    let location = ctx.grid.table_location(table.name)?;
    let span = required(location.body_span(rows.len().max(after)))?;
    let receipt = snapshot(ctx, &location.sheet, &span, &note)?;

    for &index in stale.iter().rev() {
        ctx.grid.delete_table_row(table.name, index)?;
    }
    let fresh: Vec<_> = entries.iter().map(holiday_row).collect();
    ctx.grid.add_table_rows(table.name, &fresh)?;

    let location = ctx.grid.table_location(table.name)?;
    let message = format!("Tabulka {} aktualizována pro rok {} ({} záznamů).", table.sheet, year, entries.len());
    Ok(Applied::new(message, Some(receipt), &location.sheet, &location.extent(), note)
        .arg("count", entries.len())
        .arg("replaced", stale.len()))
}

/// Write a 3x2 summary block (label, value) at `(row, col)`.
pub(super) fn networkdays_due(
    start: NaiveDate,
    days: i32,
    sheet: &str,
    row: usize,
    col: usize,
    ctx: &mut ApplyContext,
) -> Result<Applied, AssistError> {
    let holidays = load_holiday_set(&*ctx.grid)?;
    let due = business_due_date(start, days, &holidays, ctx.settings.schedule_max_business_days)
        .ok_or_else(|| AssistError::input("Počet pracovních dní je mimo povolený rozsah."))?;

    let note = format!("SLA {} dní", days);
    let block = Range::new(row, col, row + 2, col + 1);
    let receipt = snapshot(ctx, sheet, &block, &note)?;

    let values = vec![
        vec![CellInput::text("Počet pracovních dní"), CellInput::number(days as f64)],
        vec![CellInput::text("Start"), CellInput::number(date_to_serial(start))],
        vec![CellInput::text("Termín"), CellInput::number(date_to_serial(due))],
    ];
    ctx.grid.write_cells(sheet, &block, &values)?;
    let value_column = Range::new(row, col + 1, row + 2, col + 1);
    let formats = vec![
        vec![INTEGER_FORMAT.to_string()],
        vec![DATE_FORMAT.to_string()],
        vec![DATE_FORMAT.to_string()],
    ];
    ctx.grid.write_number_formats(sheet, &value_column, &formats)?;

    let mut applied = Applied::new(
        format!("Termín posunutý o {} pracovních dní: {}", days, iso(due)),
        Some(receipt),
        sheet,
        &block,
        note,
    )
    .arg("due", iso(due));
    if holidays.is_empty() {
        applied = applied.warn("Upozornění: Tabulka svátků je prázdná, termín nemusí zohledňovat volné dny.");
    }
    Ok(applied)
}
