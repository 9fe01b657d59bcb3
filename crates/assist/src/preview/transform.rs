//! Previews for in-place column transforms and rate lookups.

use chrono::NaiveDate;

use gridwise_core::{CellValue, Range};

use super::{
    data_sample, letter, single_column_issues, Draft, PreviewContext, PreviewFailure,
    SampleTable, NEED_DATA_ROW, NEED_TWO_ROWS,
};
use crate::dates::iso;
use crate::error::AssistError;
use crate::intent::{SortDirection, VatRate};
use crate::numbers::{format_czk, format_rate, parse_czech_numeric, vat_add as add_vat, vat_remove as remove_vat};
use crate::payload::ApplyPayload;
use crate::rates::cached_rate;
use crate::selection::{inspect, SelectionInfo};

fn raw_text(value: &CellValue) -> String {
    value.to_string()
}

fn require(info: &SelectionInfo, column: Option<char>, min_rows: Option<&str>, summary: &str) -> Result<(), PreviewFailure> {
    let mut issues = single_column_issues(info, column);
    if let Some(msg) = min_rows {
        if info.row_count <= 1 {
            issues.push(msg.to_string());
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(PreviewFailure::blocked(summary, issues))
    }
}

// ── VAT ─────────────────────────────────────────────────────────────

pub(super) fn vat_add(rate: VatRate, column: Option<char>, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let info = inspect(ctx.grid, ctx.settings)?;
    require(&info, column, Some(NEED_DATA_ROW), "Nelze připravit náhled pro DPH.")?;

    let mut sample = SampleTable::with_headers(vec![
        "Základ".to_string(),
        format!("DPH {}", rate.label()),
        "S DPH".to_string(),
    ]);
    for value in data_sample(&info, ctx.settings.preview_max_rows) {
        if let Some(base) = parse_czech_numeric(&value) {
            let (vat, total) = add_vat(base, rate.fraction());
            sample.push([format_czk(base), format_czk(vat), format_czk(total)]);
        }
    }
    if sample.rows.is_empty() {
        sample.push(["(žádná numerická data)", "-", "-"]);
    }

    let header = if info.has_header { format!("DPH {}", rate.label()) } else { "DPH".to_string() };
    let plan = vec![
        format!("Vypočítat DPH {} pro hodnoty ve sloupci {}.", rate.label(), info.column_letter()),
        format!("Vyplnit sloupec {} výsledky (jen data, hlavička \"{}\").", letter(info.col + 1), header),
        "Nastavit formát měny CZK pro nový sloupec.".to_string(),
    ];
    Ok(Draft {
        plan,
        sample,
        issues: Vec::new(),
        payload: ApplyPayload::VatAdd { target: info.target(), rate },
    })
}

pub(super) fn vat_remove(rate: VatRate, column: Option<char>, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let info = inspect(ctx.grid, ctx.settings)?;
    require(&info, column, Some(NEED_DATA_ROW), "Nelze připravit náhled pro odebrání DPH.")?;

    let mut sample = SampleTable::with_headers(vec![
        "S DPH".to_string(),
        "Bez DPH".to_string(),
        format!("DPH {}", rate.label()),
    ]);
    for value in data_sample(&info, ctx.settings.preview_max_rows) {
        match parse_czech_numeric(&value) {
            Some(gross) => {
                let (base, vat) = remove_vat(gross, rate.fraction());
                sample.push([format_czk(gross), format_czk(base), format_czk(vat)]);
            }
            None => sample.push(["(nenumerické)", "-", "-"]),
        }
    }
    if sample.rows.is_empty() {
        sample.push(["(žádná numerická data)", "-", "-"]);
    }

    let plan = vec![
        format!("Spočítat základ bez DPH {} z hodnot ve sloupci {}.", rate.label(), info.column_letter()),
        format!(
            "Vyplnit sloupec {} hodnotami bez DPH a sloupec {} výší DPH.",
            letter(info.col + 1),
            letter(info.col + 2)
        ),
        "Nastavit formát měny CZK a zapsat akci do auditu.".to_string(),
    ];
    Ok(Draft {
        plan,
        sample,
        issues: Vec::new(),
        payload: ApplyPayload::VatRemove { target: info.target(), rate },
    })
}

// ── Formatting and layout ───────────────────────────────────────────

pub(super) fn format_currency(column: Option<char>, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let info = inspect(ctx.grid, ctx.settings)?;
    require(&info, column, None, "Nelze připravit náhled pro formátování CZK.")?;

    let mut sample = SampleTable::new(&["Původní hodnota", "Formát CZK"]);
    for value in data_sample(&info, ctx.settings.preview_max_rows) {
        let formatted = parse_czech_numeric(&value)
            .map(format_czk)
            .unwrap_or_else(|| "(nenumerické)".to_string());
        sample.push([raw_text(&value), formatted]);
    }
    if sample.rows.is_empty() {
        sample.push(["(prázdný řádek)", "-"]);
    }

    let plan = vec![
        format!("Nastavit formát CZK pro vybraný sloupec {}.", info.column_letter()),
        "Zachovat původní hodnoty buněk, změnit pouze číselný formát.".to_string(),
    ];
    Ok(Draft {
        plan,
        sample,
        issues: Vec::new(),
        payload: ApplyPayload::FormatCurrency { target: info.target() },
    })
}

pub(super) fn dedupe(column: Option<char>, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let info = inspect(ctx.grid, ctx.settings)?;
    require(&info, column, Some(NEED_TWO_ROWS), "Nelze připravit náhled pro odebrání duplicit.")?;

    // Duplicates are looked for in the full selection, not just the sample.
    let target = info.target();
    let values = match target.data_range() {
        Some(range) => ctx.grid.read_range(&info.sheet, &range).map_err(AssistError::from)?.values,
        None => Vec::new(),
    };
    let first_row = target.data_start() + 1;
    let mut seen: Vec<(usize, &Vec<CellValue>)> = Vec::new();
    let mut sample = SampleTable::new(&["Řádky", "Hodnoty"]);
    let mut duplicates = 0usize;
    for (i, row) in values.iter().enumerate() {
        match seen.iter().find(|(_, r)| *r == row) {
            Some((first, _)) => {
                duplicates += 1;
                if sample.rows.len() < ctx.settings.preview_max_rows {
                    let shown: Vec<String> = row.iter().map(dedupe_cell).collect();
                    sample.push([format!("{} ↔ {}", first + first_row, i + first_row), shown.join(" | ")]);
                }
            }
            None => seen.push((i, row)),
        }
    }

    let mut issues = Vec::new();
    if duplicates == 0 {
        sample.push(["-", "Ve výběru nebyly nalezeny duplicitní řádky."]);
        issues.push("Ve výběru nebyly nalezeny duplicitní řádky. Operace proběhne pro jistotu na celém rozsahu.".to_string());
    }

    let plan = vec![
        format!(
            "Analyzovat rozsah {} a identifikovat duplicitní hodnoty{}.",
            info.address(),
            if info.has_header { " (bez hlavičky)" } else { "" }
        ),
        "Odebrat duplicitní řádky a ponechat první výskyt každé hodnoty.".to_string(),
        "Zapsat výsledek a zaznamenat akci do auditu.".to_string(),
    ];
    Ok(Draft {
        plan,
        sample,
        issues,
        payload: ApplyPayload::Dedupe { target },
    })
}

fn dedupe_cell(value: &CellValue) -> String {
    if value.is_empty() {
        "(prázdné)".to_string()
    } else {
        value.to_string()
    }
}

pub(super) fn sort_column(
    column: Option<char>,
    direction: SortDirection,
    ctx: &PreviewContext,
) -> Result<Draft, PreviewFailure> {
    let info = inspect(ctx.grid, ctx.settings)?;
    require(&info, column, Some(NEED_TWO_ROWS), "Nelze připravit náhled pro seřazení.")?;

    let label = direction_label(direction);
    let plan = vec![
        format!("Seřadit hodnoty ve sloupci {} {}.", info.column_letter(), label),
        if info.has_header {
            "Zachovat hlavičku mimo řazení.".to_string()
        } else {
            "Řadit všechny řádky včetně prvního.".to_string()
        },
        "Zapsat informaci o akci do auditu.".to_string(),
    ];
    let sample = SampleTable::new(&["Poznámka"]).row(["Ukázka po seřazení se zobrazí až po provedení akce."]);
    Ok(Draft {
        plan,
        sample,
        issues: Vec::new(),
        payload: ApplyPayload::SortColumn { target: info.target(), key_col: info.col, direction },
    })
}

pub(crate) fn direction_label(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "vzestupně",
        SortDirection::Descending => "sestupně",
    }
}

pub(super) fn highlight_negative(column: Option<char>, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let info = inspect(ctx.grid, ctx.settings)?;
    require(&info, column, None, "Nelze připravit zvýraznění záporných hodnot.")?;

    let negatives = data_sample(&info, usize::MAX)
        .iter()
        .filter_map(parse_czech_numeric)
        .filter(|v| *v < 0.0)
        .count();
    let plan = vec![
        format!("Přidat podmíněné formátování pro záporné hodnoty ve sloupci {}.", info.column_letter()),
        "Zvýraznit buňky červeným pozadím a tmavým písmem.".to_string(),
        "Zapsat akci do auditu.".to_string(),
    ];
    let sample = SampleTable::new(&["Očekávaný efekt"])
        .row(["Záporné hodnoty získají červené pozadí."])
        .row([format!("Záporných hodnot ve vzorku: {}", negatives)]);
    Ok(Draft {
        plan,
        sample,
        issues: Vec::new(),
        payload: ApplyPayload::HighlightNegative { target: info.target() },
    })
}

pub(super) fn sum_column(column: Option<char>, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let info = inspect(ctx.grid, ctx.settings)?;
    require(&info, column, Some("Rozsah musí obsahovat alespoň jeden řádek s daty."), "Nelze připravit součet sloupce.")?;

    let numeric: Vec<f64> = data_sample(&info, ctx.settings.preview_max_rows)
        .iter()
        .filter_map(parse_czech_numeric)
        .collect();
    let shown = if numeric.is_empty() {
        "(není co sčítat)".to_string()
    } else {
        format_czk(numeric.iter().sum())
    };
    let sample = SampleTable::new(&["Náhled součtu"]).row([shown]);

    let below_row = info.row + info.row_count;
    let below = Range::single(below_row, info.col);
    let mut issues = Vec::new();
    let occupied = ctx
        .grid
        .read_range(&info.sheet, &below)
        .map_err(AssistError::from)?
        .values
        .first()
        .and_then(|r| r.first())
        .is_some_and(|v| !v.is_empty());
    if occupied {
        issues.push(format!("Buňka {} není prázdná, součet ji přepíše.", below.to_a1()));
    }

    let plan = vec![
        format!("Spočítat součet všech hodnot ve sloupci {}.", info.column_letter()),
        format!("Výsledek zapsat do buňky {} pod aktuálním výběrem.", below.to_a1()),
        "Součet formátovat jako číslo a zapsat akci do auditu.".to_string(),
    ];
    Ok(Draft {
        plan,
        sample,
        issues,
        payload: ApplyPayload::SumColumn { target: info.target() },
    })
}

// ── Rates ───────────────────────────────────────────────────────────

const NOT_CACHED: &str = "Kurz není v cache, bude nutné online stažení.";

pub(super) fn fetch_rate(currency: &str, date: NaiveDate, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let cached = cached_rate(ctx.grid, currency, date)?;
    let shown = cached.map(format_rate).unwrap_or_else(|| "— (zatím není v cache)".to_string());
    let sample = SampleTable::new(&["Měna", "Datum", "Kurz CZK"]).row([currency.to_string(), iso(date), shown]);

    let plan = vec![
        format!("Zkontrolovat tabulku _FX_CNB pro {} k datu {}.", currency, iso(date)),
        "Pokud není k dispozici, stáhnout kurz z api.cnb.cz (denní kurzy).".to_string(),
        "Zapsat kurz do _FX_CNB a uvést výsledek v panelu.".to_string(),
    ];
    Ok(Draft {
        plan,
        sample,
        issues: if cached.is_none() { vec![NOT_CACHED.to_string()] } else { Vec::new() },
        payload: ApplyPayload::FetchRate { currency: currency.to_string(), date },
    })
}

pub(super) fn fx_convert(
    currency: &str,
    date: NaiveDate,
    column: Option<char>,
    ctx: &PreviewContext,
) -> Result<Draft, PreviewFailure> {
    let info = inspect(ctx.grid, ctx.settings)?;
    require(&info, column, Some(NEED_DATA_ROW), "Nelze připravit náhled pro přepočet pomocí ČNB.")?;

    let cached = cached_rate(ctx.grid, currency, date)?;
    let mut sample = SampleTable::new(&["Původní částka", "CZK podle ČNB"]);
    for value in data_sample(&info, ctx.settings.preview_max_rows) {
        match (parse_czech_numeric(&value), cached) {
            (Some(amount), Some(rate)) => sample.push([format_czk(amount), format_czk(amount * rate)]),
            _ => sample.push([raw_text(&value), "(nelze spočítat)".to_string()]),
        }
    }
    if sample.rows.is_empty() {
        sample.push(["(prázdný řádek)", "-"]);
    }

    let plan = vec![
        format!("Zjistit kurz ČNB pro {} k {} (použít cache, jinak stáhnout).", currency, iso(date)),
        format!("Vyplnit sloupec {} přepočtenými hodnotami z {}.", letter(info.col + 1), info.column_letter()),
        "Nastavit formát CZK a zapsat auditní stopu.".to_string(),
    ];
    Ok(Draft {
        plan,
        sample,
        issues: if cached.is_none() { vec![NOT_CACHED.to_string()] } else { Vec::new() },
        payload: ApplyPayload::FxConvert { target: info.target(), currency: currency.to_string(), date },
    })
}
