// Integration tests for in-place column transforms applied through a session.
// Run with: cargo test -p gridwise-assist --test transforms

use chrono::{NaiveDate, NaiveDateTime};
use gridwise_assist::rates::store_rate;
use gridwise_assist::{CzechCalendar, RateProvider, RemoteError, RequestOutcome, Session};
use gridwise_config::Settings;
use gridwise_core::{CellValue, ConditionalOperator, Range};
use gridwise_engine::Workbook;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn now() -> NaiveDateTime {
    day().and_hms_opt(9, 30, 0).unwrap()
}

struct Offline;

impl RateProvider for Offline {
    fn fetch(&self, _currency: &str, _date: NaiveDate) -> Result<f64, RemoteError> {
        Err(RemoteError::Network("offline".to_string()))
    }
}

fn session() -> Session {
    Session::new(Settings::default(), Box::new(Offline), Box::new(CzechCalendar))
        .unwrap()
        .with_clock(now)
}

/// Column C = [Částka, 10, 20, 10, 30, 20], C1:C6 selected.
fn amounts() -> Workbook {
    let mut wb = Workbook::with_support_tables();
    let mut values = vec![CellValue::from("Částka")];
    values.extend([10.0, 20.0, 10.0, 30.0, 20.0].into_iter().map(CellValue::Number));
    wb.set_column("Sheet1", 0, 2, values).unwrap();
    wb.select("Sheet1", "C1:C6").unwrap();
    wb
}

fn run(wb: &mut Workbook, text: &str) -> String {
    let mut s = session();
    match s.handle_request(wb, text) {
        RequestOutcome::Preview(_) => {}
        other => panic!("expected a preview for {:?}, got {:?}", text, other),
    }
    s.apply(wb).unwrap().message
}

fn column_c(wb: &Workbook) -> Vec<CellValue> {
    (1..=5).map(|r| wb.cell("Sheet1", r, 2).value).collect()
}

#[test]
fn dedupe_packs_unique_rows_upwards() {
    let mut wb = amounts();
    let message = run(&mut wb, "Odeber duplicity ve sloupci C");
    assert_eq!(message, "Odebráno 2 duplicitních řádků ve sloupci C.");
    assert_eq!(
        column_c(&wb),
        vec![
            CellValue::Number(10.0),
            CellValue::Number(20.0),
            CellValue::Number(30.0),
            CellValue::Empty,
            CellValue::Empty,
        ]
    );
    assert_eq!(wb.cell("Sheet1", 0, 2).value, CellValue::from("Částka"));
}

#[test]
fn sort_descending_keeps_header() {
    let mut wb = amounts();
    let message = run(&mut wb, "Seřaď sloupec C sestupně");
    assert_eq!(message, "Sloupec C seřazen sestupně.");
    assert_eq!(
        column_c(&wb),
        [30.0, 20.0, 20.0, 10.0, 10.0].into_iter().map(CellValue::Number).collect::<Vec<_>>()
    );
}

#[test]
fn sum_goes_below_the_selection() {
    let mut wb = amounts();
    let message = run(&mut wb, "Sečti sloupec C");
    assert_eq!(message, "Součet sloupce C byl zapsán do C7.");
    let total = wb.cell("Sheet1", 6, 2);
    assert_eq!(total.formula.as_deref(), Some("=SUM(C2:C6)"));
    assert_eq!(total.number_format, "0.00");
}

#[test]
fn highlight_negative_adds_rule_for_data_rows() {
    let mut wb = amounts();
    let message = run(&mut wb, "Zvýrazni záporné hodnoty ve sloupci C");
    assert_eq!(message, "Záporné hodnoty ve sloupci C jsou zvýrazněny.");
    let rules = wb.sheet_by_name("Sheet1").unwrap().conditional_formats();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].0, Range::new(1, 2, 5, 2));
    assert_eq!(rules[0].1.operator, ConditionalOperator::LessThan);
    assert_eq!(rules[0].1.threshold, 0.0);
}

#[test]
fn vat_remove_fills_two_columns() {
    let mut wb = amounts();
    let message = run(&mut wb, "Odeber DPH ze sloupce C");
    assert_eq!(message, "Vypočítán základ bez DPH a částka DPH ze sloupce C.");
    assert_eq!(wb.cell("Sheet1", 0, 3).value, CellValue::from("Bez DPH (21 %)"));
    assert_eq!(wb.cell("Sheet1", 0, 4).value, CellValue::from("DPH 21 %"));
    assert!(wb.cell("Sheet1", 1, 3).formula.unwrap().starts_with("=C2/"));
    assert_eq!(wb.cell("Sheet1", 5, 4).formula.as_deref(), Some("=C6-D6"));
}

#[test]
fn fx_convert_uses_cached_rate() {
    let mut wb = amounts();
    store_rate(&mut wb, "EUR", day(), 25.0).unwrap();
    let message = run(&mut wb, "Převeď sloupec C na CZK podle ČNB EUR");
    assert_eq!(message, "Sloupec C přepočten na CZK (25,0000 CZK/EUR, z cache).");
    assert_eq!(wb.cell("Sheet1", 0, 3).value, CellValue::from("CZK (EUR)"));
    assert_eq!(wb.cell("Sheet1", 1, 3).formula.as_deref(), Some("=C2*25"));
}

#[test]
fn format_currency_keeps_values() {
    let mut wb = amounts();
    let before = column_c(&wb);
    let message = run(&mut wb, "Nastav formát CZK ve sloupci C");
    assert_eq!(message, "Formát CZK nastaven pro sloupec C");
    assert_eq!(column_c(&wb), before);
    assert_eq!(wb.cell("Sheet1", 3, 2).number_format, "[$-cs-CZ]#,##0.00 \"Kč\"");
}
