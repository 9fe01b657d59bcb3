//! In-place column transforms and rate lookups.

use chrono::NaiveDate;

use gridwise_core::{col_to_letter, CellInput, ConditionalFormat, ConditionalOperator, Range, SupportTable};

use super::{column_of, required, snapshot, Applied, ApplyContext};
use crate::dates::iso;
use crate::error::AssistError;
use crate::intent::{SortDirection, VatRate};
use crate::numbers::{format_rate, formula_number, CZK_FORMAT, DECIMAL_FORMAT};
use crate::payload::TargetRange;
use crate::preview::direction_label;
use crate::rates::resolve_rate;

const NEGATIVE_FILL: &str = "#fdecea";
const NEGATIVE_FONT: &str = "#842029";

/// Write a header (when the block has one) and one formula per data row
/// into column `col`, all data rows in CZK format.
fn fill_column(
    ctx: &mut ApplyContext,
    target: &TargetRange,
    col: usize,
    header: &str,
    formula: impl Fn(usize) -> String,
) -> Result<(), AssistError> {
    if target.has_header {
        ctx.grid.write_cells(&target.sheet, &Range::single(target.row, col), &[vec![CellInput::text(header)]])?;
    }
    if let Some(data) = target.data_column(col) {
        let formulas: Vec<Vec<CellInput>> = (data.start_row..=data.end_row)
            .map(|r| vec![CellInput::Formula(formula(r + 1))])
            .collect();
        ctx.grid.write_cells(&target.sheet, &data, &formulas)?;
        ctx.grid.write_number_formats(&target.sheet, &data, &column_of(CZK_FORMAT.to_string(), data.rows()))?;
    }
    Ok(())
}

// ── VAT ─────────────────────────────────────────────────────────────

pub(super) fn vat_add(target: &TargetRange, rate: VatRate, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let src = target.letter();
    let dst = col_to_letter(target.col + 1);
    let note = format!("DPH {} pro {}", rate.label(), dst);

    let span = required(target.column_span(target.col + 1))?;
    let receipt = snapshot(ctx, &target.sheet, &span, &note)?;
    let factor = formula_number(rate.fraction());
    fill_column(ctx, target, target.col + 1, &format!("DPH {}", rate.label()), |row| {
        format!("={}{}*{}", src, row, factor)
    })?;

    Ok(Applied::new(
        format!("DPH {} aplikováno: {} → {}", rate.label(), src, dst),
        Some(receipt),
        &target.sheet,
        &span,
        note,
    )
    .arg("targetColumn", dst))
}

pub(super) fn vat_remove(target: &TargetRange, rate: VatRate, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let src = target.letter();
    let base = col_to_letter(target.col + 1);
    let vat = col_to_letter(target.col + 2);
    let note = format!("DPH {} z {}", rate.label(), src);

    let span = required(Range::from_origin(target.row, target.col + 1, target.row_count, 2))?;
    let receipt = snapshot(ctx, &target.sheet, &span, &note)?;
    let factor = formula_number(rate.gross_factor());
    fill_column(ctx, target, target.col + 1, &format!("Bez DPH ({})", rate.label()), |row| {
        format!("={}{}/{}", src, row, factor)
    })?;
    fill_column(ctx, target, target.col + 2, &format!("DPH {}", rate.label()), |row| {
        format!("={}{}-{}{}", src, row, base, row)
    })?;

    Ok(Applied::new(
        format!("Vypočítán základ bez DPH a částka DPH ze sloupce {}.", src),
        Some(receipt),
        &target.sheet,
        &span,
        note,
    )
    .arg("baseColumn", base)
    .arg("vatColumn", vat))
}

// ── Formatting and layout ───────────────────────────────────────────

pub(super) fn format_currency(target: &TargetRange, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let letter = target.letter();
    let note = format!("Formát CZK pro {}", letter);
    let span = required(target.column_span(target.col))?;
    let receipt = snapshot(ctx, &target.sheet, &span, &note)?;
    ctx.grid.write_number_formats(&target.sheet, &span, &column_of(CZK_FORMAT.to_string(), span.rows()))?;

    Ok(Applied::new(format!("Formát CZK nastaven pro sloupec {}", letter), Some(receipt), &target.sheet, &span, note))
}

/// Keep the first occurrence of each data row, pack the survivors upwards
/// and clear the vacated rows.
pub(super) fn dedupe(target: &TargetRange, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let letter = target.letter();
    let note = format!("Odebrat duplicity {}", letter);
    let span = required(target.range())?;
    let receipt = snapshot(ctx, &target.sheet, &span, &note)?;

    let mut removed = 0usize;
    let mut remaining = 0usize;
    if let Some(data) = target.data_range() {
        let block = ctx.grid.read_range(&target.sheet, &data)?;
        let inputs = block.to_inputs();
        let mut seen: Vec<&Vec<_>> = Vec::new();
        let mut kept_inputs = Vec::new();
        let mut kept_formats = Vec::new();
        for (i, row) in block.values.iter().enumerate() {
            if seen.contains(&row) {
                removed += 1;
                continue;
            }
            seen.push(row);
            kept_inputs.push(inputs[i].clone());
            kept_formats.push(block.number_formats[i].clone());
        }
        remaining = kept_inputs.len();
        if removed > 0 {
            ctx.grid.clear_range(&target.sheet, &data)?;
            if let Some(packed) = Range::from_origin(data.start_row, data.start_col, remaining, data.cols()) {
                ctx.grid.write_cells(&target.sheet, &packed, &kept_inputs)?;
                ctx.grid.write_number_formats(&target.sheet, &packed, &kept_formats)?;
            }
        }
    }

    let message = if removed > 0 {
        format!("Odebráno {} duplicitních řádků ve sloupci {}.", removed, letter)
    } else {
        format!("Ve sloupci {} nebyly nalezeny žádné duplicity.", letter)
    };
    Ok(Applied::new(message, Some(receipt), &target.sheet, &span, note)
        .arg("removed", removed)
        .arg("uniqueRemaining", remaining))
}

pub(super) fn sort_column(
    target: &TargetRange,
    key_col: usize,
    direction: SortDirection,
    ctx: &mut ApplyContext,
) -> Result<Applied, AssistError> {
    let letter = col_to_letter(key_col);
    let label = direction_label(direction);
    let note = format!("Seřadit {} {}", letter, label);
    let span = required(target.range())?;
    let receipt = snapshot(ctx, &target.sheet, &span, &note)?;
    if let Some(data) = target.data_range() {
        ctx.grid.sort_range(&target.sheet, &data, key_col, direction == SortDirection::Ascending)?;
    }

    Ok(Applied::new(format!("Sloupec {} seřazen {}.", letter, label), Some(receipt), &target.sheet, &span, note))
}

/// Conditional formatting is not captured by snapshots; undo leaves the rule in place.
pub(super) fn highlight_negative(target: &TargetRange, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let letter = target.letter();
    let note = format!("Zvýraznit záporné hodnoty {}", letter);
    let span = required(target.column_span(target.col))?;
    let receipt = snapshot(ctx, &target.sheet, &span, &note)?;
    let rows = target.data_column(target.col).unwrap_or(span);
    ctx.grid.add_conditional_format(
        &target.sheet,
        &rows,
        ConditionalFormat {
            operator: ConditionalOperator::LessThan,
            threshold: 0.0,
            fill_color: NEGATIVE_FILL.to_string(),
            font_color: NEGATIVE_FONT.to_string(),
        },
    )?;

    Ok(Applied::new(
        format!("Záporné hodnoty ve sloupci {} jsou zvýrazněny.", letter),
        Some(receipt),
        &target.sheet,
        &rows,
        note,
    ))
}

/// `=SUM(..)` over the data rows, written to the first cell below the block.
pub(super) fn sum_column(target: &TargetRange, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let letter = target.letter();
    let note = format!("Součet ve sloupci {}", letter);
    let total = Range::single(target.row + target.row_count, target.col);
    let receipt = snapshot(ctx, &target.sheet, &total, &note)?;

    let summed = format!("{}{}:{}{}", letter, target.data_start() + 1, letter, target.row + target.row_count);
    ctx.grid.write_cells(&target.sheet, &total, &[vec![CellInput::Formula(format!("=SUM({})", summed))]])?;
    ctx.grid.write_number_formats(&target.sheet, &total, &[vec![DECIMAL_FORMAT.to_string()]])?;

    Ok(Applied::new(
        format!("Součet sloupce {} byl zapsán do {}.", letter, total.to_a1()),
        Some(receipt),
        &target.sheet,
        &total,
        note,
    )
    .arg("range", summed))
}

// ── Rates ───────────────────────────────────────────────────────────

/// Cache or fetch a rate. Only the rate cache and the audit log change.
pub(super) fn fetch_rate(currency: &str, date: NaiveDate, ctx: &mut ApplyContext) -> Result<Applied, AssistError> {
    let (rate, source) = resolve_rate(ctx.grid, ctx.rates, currency, date)?;
    let location = ctx.grid.table_location(SupportTable::FX_CNB.name)?;
    Ok(Applied::new(
        format!("Kurz {} k {}: {} CZK ({})", currency, iso(date), format_rate(rate), source.describe()),
        None,
        &location.sheet,
        &location.extent(),
        format!("Kurz {} {}", currency, iso(date)),
    )
    .arg("rate", rate)
    .arg("source", source.as_str()))
}

/// The rate is resolved before the snapshot so a failed lookup leaves the
/// journal untouched.
pub(super) fn fx_convert(
    target: &TargetRange,
    currency: &str,
    date: NaiveDate,
    ctx: &mut ApplyContext,
) -> Result<Applied, AssistError> {
    let (rate, source) = resolve_rate(ctx.grid, ctx.rates, currency, date)?;

    let src = target.letter();
    let dst = col_to_letter(target.col + 1);
    let note = format!("ČNB {} → CZK {}", currency, dst);
    let span = required(target.column_span(target.col + 1))?;
    let receipt = snapshot(ctx, &target.sheet, &span, &note)?;
    let factor = formula_number(rate);
    fill_column(ctx, target, target.col + 1, &format!("CZK ({})", currency), |row| {
        format!("={}{}*{}", src, row, factor)
    })?;

    Ok(Applied::new(
        format!(
            "Sloupec {} přepočten na CZK ({} CZK/{}, {}).",
            src,
            format_rate(rate),
            currency,
            source.describe()
        ),
        Some(receipt),
        &target.sheet,
        &span,
        note,
    )
    .arg("rate", rate)
    .arg("source", source.as_str())
    .arg("targetColumn", dst))
}
