//! Public holidays and business-day arithmetic.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use gridwise_core::{CellValue, Grid, SupportTable};

use crate::dates;
use crate::error::{AssistError, RemoteError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

impl Holiday {
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Self { date, name: name.into() }
    }
}

/// Enumerates non-business dates for a jurisdiction and year.
pub trait HolidayCalendar {
    fn list(&self, jurisdiction: &str, year: i32) -> Result<Vec<Holiday>, RemoteError>;
}

/// Fixed-date Czech public holidays. Easter-relative days are added by
/// [`holidays_for_year`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CzechCalendar;

const CZ_FIXED: [(u32, u32, &str); 11] = [
    (1, 1, "Nový rok"),
    (5, 1, "Svátek práce"),
    (5, 8, "Den vítězství"),
    (7, 5, "Den slovanských věrozvěstů"),
    (7, 6, "Den upálení mistra Jana Husa"),
    (9, 28, "Den české státnosti"),
    (10, 28, "Vznik samostatného československého státu"),
    (11, 17, "Den boje za svobodu a demokracii"),
    (12, 24, "Štědrý den"),
    (12, 25, "1. svátek vánoční"),
    (12, 26, "2. svátek vánoční"),
];

impl HolidayCalendar for CzechCalendar {
    fn list(&self, jurisdiction: &str, year: i32) -> Result<Vec<Holiday>, RemoteError> {
        if !jurisdiction.trim().eq_ignore_ascii_case("CZ") {
            return Err(RemoteError::Unsupported(format!(
                "kalendář svátků pro '{}' není k dispozici",
                jurisdiction
            )));
        }
        Ok(CZ_FIXED
            .iter()
            .filter_map(|&(m, d, name)| NaiveDate::from_ymd_opt(year, m, d).map(|date| Holiday::new(date, name)))
            .collect())
    }
}

/// Gregorian Easter Sunday (anonymous algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Calendar entries plus Good Friday and Easter Monday, unique by date, sorted.
pub fn holidays_for_year(
    calendar: &dyn HolidayCalendar,
    jurisdiction: &str,
    year: i32,
) -> Result<Vec<Holiday>, RemoteError> {
    let mut all = calendar.list(jurisdiction, year)?;
    if let Some(easter) = easter_sunday(year) {
        all.push(Holiday::new(easter - Duration::days(2), "Velký pátek"));
        all.push(Holiday::new(easter + Duration::days(1), "Velikonoční pondělí"));
    }
    all.sort_by_key(|h| h.date);
    all.dedup_by_key(|h| h.date);
    Ok(all)
}

// ── Holiday table ───────────────────────────────────────────────────

/// Dates listed in the holiday table. Unparseable rows are ignored.
pub fn load_holiday_set(grid: &dyn Grid) -> Result<BTreeSet<NaiveDate>, AssistError> {
    Ok(grid
        .table_rows(SupportTable::HOLIDAYS_CZ.name)?
        .iter()
        .filter_map(|row| row.first().and_then(dates::cell_to_date))
        .collect())
}

pub fn holiday_row(holiday: &Holiday) -> Vec<CellValue> {
    vec![
        CellValue::Text(dates::iso(holiday.date)),
        CellValue::Text(holiday.name.clone()),
    ]
}

/// Whether a table row belongs to `year`.
pub fn row_in_year(row: &[CellValue], year: i32) -> bool {
    row.first()
        .and_then(dates::cell_to_date)
        .is_some_and(|d| d.year() == year)
}

// ── Business days ───────────────────────────────────────────────────

pub fn is_business_day(date: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(&date)
}

/// Step `days` business days from `start` (backwards when negative). The
/// start date itself is never counted. `None` when `|days|` exceeds `limit`.
pub fn business_due_date(
    start: NaiveDate,
    days: i32,
    holidays: &BTreeSet<NaiveDate>,
    limit: usize,
) -> Option<NaiveDate> {
    let mut remaining = days.unsigned_abs() as usize;
    if remaining > limit {
        return None;
    }
    let step = if days >= 0 { Duration::days(1) } else { Duration::days(-1) };
    let mut current = start;
    while remaining > 0 {
        current = current.checked_add_signed(step)?;
        if is_business_day(current, holidays) {
            remaining -= 1;
        }
    }
    Some(current)
}
