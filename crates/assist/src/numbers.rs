//! Czech-locale number parsing and formatting, plus the VAT arithmetic
//! shared by preview and apply.

use gridwise_core::CellValue;

// ── Number formats ──────────────────────────────────────────────────

pub const CZK_FORMAT: &str = "[$-cs-CZ]#,##0.00 \"Kč\"";
pub const DECIMAL_FORMAT: &str = "0.00";
pub const PERCENT_FORMAT: &str = "0.00%";
pub const INTEGER_FORMAT: &str = "0";
pub const DATE_FORMAT: &str = "dd.mm.yyyy";
pub const RATE_FORMAT: &str = "0.0000";

/// Thousands separator used by cs-CZ (no-break space).
const GROUP_SEP: char = '\u{a0}';

/// Parse a cell as a number. Text is read Czech style: whitespace removed,
/// first comma treated as the decimal separator.
pub fn parse_czech_numeric(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_czech_str(s),
        _ => None,
    }
}

pub fn parse_czech_str(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let dotted = compact.replacen(',', ".", 1);
    dotted.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `1234.5` -> `1 234,50` (no-break space grouping, decimal comma).
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEP);
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push(',');
        grouped.push_str(frac);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `1234.5` -> `1 234,50 Kč`
pub fn format_czk(value: f64) -> String {
    format!("{} Kč", format_grouped(value, 2))
}

/// Fraction to percent: `0.125` -> `12,50 %`
pub fn format_percent(fraction: f64) -> String {
    format!("{} %", format_grouped(fraction * 100.0, 2))
}

/// Exchange rate with four decimals: `25.123` -> `25,1230`
pub fn format_rate(rate: f64) -> String {
    format_grouped(rate, 4)
}

/// Shortest decimal text for a factor embedded in a formula (`0.21`, `1.21`).
pub fn formula_number(value: f64) -> String {
    format!("{}", value)
}

// ── VAT arithmetic ──────────────────────────────────────────────────

/// Base plus rate -> (vat, total).
pub fn vat_add(base: f64, rate: f64) -> (f64, f64) {
    (base * rate, base * (1.0 + rate))
}

/// Gross plus rate -> (base, vat). Inverse of [`vat_add`].
pub fn vat_remove(gross: f64, rate: f64) -> (f64, f64) {
    let base = gross / (1.0 + rate);
    (base, gross - base)
}
