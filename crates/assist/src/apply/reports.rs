//! Report appliers: recompute from the source block and replace the
//! output sheet's contents, so re-running a report is idempotent.

use gridwise_core::Range;

use super::{snapshot, Applied, ApplyContext};
use crate::error::AssistError;
use crate::intent::{Aggregation, SummaryPeriod};
use crate::payload::{SeriesSource, VarianceSource};
use crate::reports::{self as report, ReportTable};

const NO_DATA: &str = "Ve vybraném rozsahu chybí numerická data nebo datum.";

/// Snapshot the union of the sheet's used range and the output block, clear
/// it and write the table at `A1`. Creates the sheet when missing.
fn write_report(
    ctx: &mut ApplyContext,
    sheet: &str,
    table: Option<ReportTable>,
    note: &str,
    message: String,
) -> Result<Applied, AssistError> {
    let table = table.ok_or_else(|| AssistError::input(NO_DATA))?;
    let block = Range::from_origin(0, 0, table.height(), table.width())
        .ok_or_else(|| AssistError::input(NO_DATA))?;

    if !ctx.grid.sheet_exists(sheet) {
        ctx.grid.add_sheet(sheet)?;
    }
    let span = match ctx.grid.used_range(sheet)? {
        Some(used) => used.union(&block),
        None => block,
    };
    let receipt = snapshot(ctx, sheet, &span, note)?;
    ctx.grid.clear_range(sheet, &span)?;
    ctx.grid.write_cells(sheet, &block, &table.inputs())?;
    ctx.grid.write_number_formats(sheet, &block, &table.padded_formats())?;

    Ok(Applied::new(message, Some(receipt), sheet, &block, note).arg("rows", table.height()))
}

pub(super) fn run_rate(
    source: &SeriesSource,
    months: u32,
    sheet: &str,
    ctx: &mut ApplyContext,
) -> Result<Applied, AssistError> {
    let table = report::run_rate(&source.read(ctx.grid)?, months);
    write_report(ctx, sheet, table, "Run-rate", format!("Run-rate připraven na listu {}.", sheet))
}

pub(super) fn period_summary(
    source: &SeriesSource,
    period: SummaryPeriod,
    sheet: &str,
    ctx: &mut ApplyContext,
) -> Result<Applied, AssistError> {
    let table = report::period_summary(&source.read(ctx.grid)?, period);
    write_report(ctx, sheet, table, "Souhrn za období", format!("Souhrn za období připraven na listu {}.", sheet))
}

pub(super) fn rolling_window(
    source: &SeriesSource,
    window: u32,
    aggregation: Aggregation,
    sheet: &str,
    ctx: &mut ApplyContext,
) -> Result<Applied, AssistError> {
    let table = report::rolling_window(&source.read(ctx.grid)?, window, aggregation);
    let note = format!("Klouzavé okno {} m", window);
    write_report(ctx, sheet, table, &note, format!("Klouzavý výpočet připraven na listu {}.", sheet))
}

pub(super) fn variance(source: &VarianceSource, sheet: &str, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let table = report::variance(&source.read(ctx.grid)?);
    write_report(ctx, sheet, table, "Odchylka vs plán", format!("Porovnání s plánem připraveno na listu {}.", sheet))
}

pub(super) fn period_comparison(
    source: &SeriesSource,
    sheet: &str,
    ctx: &mut ApplyContext,
) -> Result<Applied, AssistError> {
    let table = report::period_comparison(&source.read(ctx.grid)?);
    write_report(ctx, sheet, table, "Porovnání období", format!("Porovnání období připraveno na listu {}.", sheet))
}
