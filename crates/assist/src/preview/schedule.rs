//! Previews for the holiday table and business-day deadlines.

use chrono::NaiveDate;

use gridwise_core::{cell_to_a1, parse_a1_cell, SupportTable};

use super::{Draft, PreviewContext, PreviewFailure, SampleTable};
use crate::dates::iso;
use crate::error::AssistError;
use crate::holidays::{business_due_date, holidays_for_year, load_holiday_set};
use crate::payload::ApplyPayload;

pub(super) fn seed_holidays(year: i32, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let jurisdiction = ctx.settings.holidays_jurisdiction.clone();
    let entries = holidays_for_year(ctx.calendar, &jurisdiction, year).map_err(AssistError::from)?;

    let mut sample = SampleTable::new(&["Datum", "Název"]);
    for holiday in entries.iter().take(ctx.settings.preview_max_rows) {
        sample.push([iso(holiday.date), holiday.name.clone()]);
    }

    let table = SupportTable::HOLIDAYS_CZ.sheet;
    let plan = vec![
        format!("Odstranit existující záznamy roku {} v {}.", year, table),
        "Zapsat nové záznamy včetně Velkého pátku a Velikonočního pondělí.".to_string(),
        "Zpřístupnit je pro výpočty pracovních dní.".to_string(),
    ];
    Ok(Draft {
        plan,
        sample,
        issues: Vec::new(),
        payload: ApplyPayload::SeedHolidays { year, jurisdiction },
    })
}

pub(super) fn networkdays_due(days: i32, start: NaiveDate, ctx: &PreviewContext) -> Result<Draft, PreviewFailure> {
    let sheet = ctx.grid.selection().map_err(AssistError::from)?.sheet;
    let (row, col) = parse_a1_cell(&ctx.settings.schedule_output_cell).map_err(AssistError::from)?;

    let holidays = load_holiday_set(ctx.grid)?;
    let due = business_due_date(start, days, &holidays, ctx.settings.schedule_max_business_days)
        .ok_or_else(|| AssistError::input("Počet pracovních dní je mimo povolený rozsah."))?;

    let sample = SampleTable::new(&["Popis", "Hodnota"])
        .row(["Start".to_string(), iso(start)])
        .row(["Pracovní dny".to_string(), days.to_string()])
        .row(["Termín".to_string(), iso(due)]);

    let block = format!("{}:{}", cell_to_a1(row, col), cell_to_a1(row + 2, col + 1));
    let plan = vec![
        format!("Spočítat termín od {} posunutý o {} pracovních dní.", iso(start), days),
        format!("Využít zapsané svátky v {} a vynechat víkendy.", SupportTable::HOLIDAYS_CZ.sheet),
        format!("Zapsat přehled do buněk {} na aktuálním listu.", block),
    ];
    let issues = if holidays.is_empty() {
        vec!["Varování: tabulka svátků je prázdná.".to_string()]
    } else {
        Vec::new()
    };
    Ok(Draft {
        plan,
        sample,
        issues,
        payload: ApplyPayload::NetworkdaysDue { start, days, sheet, row, col },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwise_config::Settings;
    use gridwise_core::{CellValue, Grid};
    use gridwise_engine::Workbook;

    use crate::holidays::CzechCalendar;
    use crate::intent::Recognizer;
    use crate::preview::{build_preview, Preview};

    fn preview(wb: &Workbook, settings: &Settings, text: &str) -> Result<Preview, PreviewFailure> {
        let recognition = Recognizer::new()
            .unwrap()
            .recognize(text, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .unwrap();
        build_preview(&recognition, &PreviewContext { grid: wb, settings, calendar: &CzechCalendar })
    }

    #[test]
    fn test_seed_sample_is_first_holidays() {
        let wb = Workbook::with_support_tables();
        let p = preview(&wb, &Settings::default(), "Vlož svátky 2026").unwrap();
        assert_eq!(p.sample.headers, vec!["Datum", "Název"]);
        assert_eq!(p.sample.rows.len(), 5);
        assert_eq!(p.sample.rows[0], vec!["2026-01-01", "Nový rok"]);
        assert_eq!(p.sample.rows[1], vec!["2026-04-03", "Velký pátek"]);
        assert_eq!(p.payload, ApplyPayload::SeedHolidays { year: 2026, jurisdiction: "CZ".to_string() });
    }

    #[test]
    fn test_seed_unsupported_jurisdiction() {
        let wb = Workbook::with_support_tables();
        let settings = Settings { holidays_jurisdiction: "SK".to_string(), ..Settings::default() };
        let err = preview(&wb, &settings, "Vlož svátky 2026").unwrap_err();
        assert!(matches!(err.error, AssistError::Remote(_)));
    }

    #[test]
    fn test_due_date_warns_without_holidays() {
        let mut wb = Workbook::with_support_tables();
        wb.select("Sheet1", "A1").unwrap();
        let p = preview(&wb, &Settings::default(), "Termín za 10 pracovních dní od 2.3.2026").unwrap();
        assert_eq!(p.sample.rows[2], vec!["Termín", "2026-03-16"]);
        assert_eq!(p.issues, vec!["Varování: tabulka svátků je prázdná.".to_string()]);
        assert!(p.plan[2].contains("H1:I3"));
        match p.payload {
            ApplyPayload::NetworkdaysDue { sheet, row, col, days, .. } => {
                assert_eq!((sheet.as_str(), row, col, days), ("Sheet1", 0, 7, 10));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_due_date_uses_holiday_table() {
        let mut wb = Workbook::with_support_tables();
        wb.add_table_rows(
            SupportTable::HOLIDAYS_CZ.name,
            &[vec![CellValue::from("2026-04-03"), CellValue::from("Velký pátek")],
              vec![CellValue::from("2026-04-06"), CellValue::from("Velikonoční pondělí")]],
        )
        .unwrap();
        wb.select("Sheet1", "A1").unwrap();
        let p = preview(&wb, &Settings::default(), "Termín za 1 pracovní den od 2.4.2026").unwrap();
        assert_eq!(p.sample.rows[2][1], "2026-04-07");
        assert!(p.issues.is_empty());
    }

    #[test]
    fn test_limit_blocks() {
        let mut wb = Workbook::with_support_tables();
        wb.select("Sheet1", "A1").unwrap();
        let settings = Settings { schedule_max_business_days: 5, ..Settings::default() };
        let err = preview(&wb, &settings, "Termín za 10 pracovních dní od 2.3.2026").unwrap_err();
        assert_eq!(err.error, AssistError::input("Počet pracovních dní je mimo povolený rozsah."));
    }
}
