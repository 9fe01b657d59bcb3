//! Date phrases in requests and date values in cells.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

use gridwise_core::CellValue;

use crate::text::has_any_word;

/// Day zero of spreadsheet serial dates.
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

pub fn date_to_serial(date: NaiveDate) -> f64 {
    (date - serial_epoch()).num_days() as f64
}

pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Read a date from a cell: serial numbers, ISO text (optionally with a time
/// part) or Czech dotted text (`5.3.2026`, `5. 3. 2026`).
pub fn cell_to_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(s) => parse_date_text(s),
        _ => None,
    }
}

pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let t = text.trim();
    let head = t.split(['T', ' ']).next().unwrap_or(t);
    if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
        return Some(d);
    }
    let compact: String = t.chars().filter(|c| !c.is_whitespace()).collect();
    NaiveDate::parse_from_str(&compact, "%d.%m.%Y").ok()
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn czech(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// `YYYY-MM` label of a month.
pub fn month_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Months since year 0; consecutive months differ by one.
pub fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

pub fn quarter_of(date: NaiveDate) -> u32 {
    date.month0() / 3 + 1
}

/// Extracts dates from request text.
#[derive(Debug, Clone)]
pub struct DatePhrases {
    iso: Regex,
    dotted: Regex,
}

impl DatePhrases {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            iso: Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b")?,
            dotted: Regex::new(r"\b(\d{1,2})\.\s*(\d{1,2})\.(?:\s*(\d{4}|\d{2})\b)?")?,
        })
    }

    /// First date mentioned in `original`, or `None`.
    ///
    /// Relative words are looked up in `normalized`; two-digit years map to
    /// 20yy; a missing year means the year of `today`.
    pub fn find(&self, original: &str, normalized: &str, today: NaiveDate) -> Option<NaiveDate> {
        if has_any_word(normalized, &["dnes", "today"]) {
            return Some(today);
        }
        if normalized.contains("zitra") || normalized.contains("tomorrow") {
            return today.succ_opt();
        }
        if let Some(caps) = self.iso.captures(original) {
            let y = caps[1].parse().ok()?;
            let m = caps[2].parse().ok()?;
            let d = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(y, m, d);
        }
        if let Some(caps) = self.dotted.captures(original) {
            let d = caps[1].parse().ok()?;
            let m = caps[2].parse().ok()?;
            let y = match caps.get(3) {
                Some(y) if y.as_str().len() == 2 => 2000 + y.as_str().parse::<i32>().ok()?,
                Some(y) => y.as_str().parse().ok()?,
                None => today.year(),
            };
            return NaiveDate::from_ymd_opt(y, m, d);
        }
        None
    }

    /// `text` with every absolute date removed, so plain integers can be read safely.
    pub fn strip(&self, text: &str) -> String {
        let without_iso = self.iso.replace_all(text, " ");
        self.dotted.replace_all(&without_iso, " ").into_owned()
    }
}
