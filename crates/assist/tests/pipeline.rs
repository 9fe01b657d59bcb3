// Integration tests for the recognize → preview → apply → undo flow.
// Run with: cargo test -p gridwise-assist --test pipeline

use std::cell::Cell as Counter;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use gridwise_assist::{
    AssistError, AuditLog, CzechCalendar, RateProvider, RemoteError, RequestOutcome, Session, UndoOutcome,
};
use gridwise_config::Settings;
use gridwise_core::{CellValue, Grid, Range, Selection, SupportTable};
use gridwise_engine::Workbook;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(10, 0, 0).unwrap()
}

struct Offline;

impl RateProvider for Offline {
    fn fetch(&self, _currency: &str, _date: NaiveDate) -> Result<f64, RemoteError> {
        Err(RemoteError::Network("connection refused".to_string()))
    }
}

struct FixedRate {
    rate: f64,
    calls: Rc<Counter<usize>>,
}

impl RateProvider for FixedRate {
    fn fetch(&self, _currency: &str, _date: NaiveDate) -> Result<f64, RemoteError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.rate)
    }
}

fn session_with(settings: Settings, rates: Box<dyn RateProvider>) -> Session {
    Session::new(settings, rates, Box::new(CzechCalendar)).unwrap().with_clock(now)
}

fn session() -> Session {
    session_with(Settings::default(), Box::new(Offline))
}

/// Column C = [Částka, 100, 200, "abc", 400], C1:C5 selected.
fn scenario_a_book() -> Workbook {
    let mut wb = Workbook::with_support_tables();
    wb.set_column("Sheet1", 0, 2, vec![
        "Částka".into(),
        CellValue::Number(100.0),
        CellValue::Number(200.0),
        "abc".into(),
        CellValue::Number(400.0),
    ])
    .unwrap();
    wb.select("Sheet1", "C1:C5").unwrap();
    wb
}

fn prepare(session: &mut Session, wb: &Workbook, text: &str) {
    match session.handle_request(wb, text) {
        RequestOutcome::Preview(_) => {}
        other => panic!("expected a preview for {:?}, got {:?}", text, other),
    }
}

fn column_d(wb: &Workbook) -> Vec<(CellValue, Option<String>)> {
    (0..5)
        .map(|r| {
            let cell = wb.cell("Sheet1", r, 3);
            (cell.value, cell.formula)
        })
        .collect()
}

// ── Scenario A ──────────────────────────────────────────────────────

#[test]
fn scenario_a_vat_preview_apply_undo() {
    let mut wb = scenario_a_book();
    let mut s = session();

    let preview = match s.handle_request(&wb, "Přidej DPH 21 % do sloupce C") {
        RequestOutcome::Preview(p) => p,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(preview.sample.rows.len(), 3);
    assert_eq!(preview.plan.len(), 3);
    assert!(preview.plan[1].contains("sloupec D"));

    let outcome = s.apply(&mut wb).unwrap();
    assert_eq!(outcome.message, "DPH 21 % aplikováno: C → D");
    assert!(outcome.warnings.is_empty());
    assert_eq!(wb.cell("Sheet1", 0, 3).value, CellValue::from("DPH 21 %"));
    assert_eq!(wb.cell("Sheet1", 1, 3).formula.as_deref(), Some("=C2*0.21"));
    assert_eq!(wb.cell("Sheet1", 4, 3).formula.as_deref(), Some("=C5*0.21"));
    assert_eq!(wb.cell("Sheet1", 4, 3).number_format, "[$-cs-CZ]#,##0.00 \"Kč\"");

    let undone = s.undo(&mut wb).unwrap();
    assert!(matches!(undone, UndoOutcome::Restored { .. }));
    for (value, formula) in column_d(&wb) {
        assert_eq!(value, CellValue::Empty);
        assert_eq!(formula, None);
    }
    assert_eq!(s.undo(&mut wb).unwrap(), UndoOutcome::NothingToUndo);
}

#[test]
fn apply_commits_once_and_audits() {
    let mut wb = scenario_a_book();
    let mut s = session();
    prepare(&mut s, &wb, "Přidej DPH 21 % do sloupce C");
    assert_eq!(wb.flush_count(), 0);

    s.apply(&mut wb).unwrap();
    assert_eq!(wb.flush_count(), 1);
    assert_eq!(wb.pending_ops(), 0);

    let entries = AuditLog::entries(&wb).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].intent_type, "vat.add");
    assert_eq!(entries[0].range_address, "Sheet1!D1:D5");
    assert_eq!(entries[0].note, "DPH 21 % pro D");
    assert_eq!(entries[0].timestamp, now());
    assert!(entries[0].args_json.contains("\"targetColumn\":\"D\""));
}

#[test]
fn apply_records_telemetry() {
    let mut wb = scenario_a_book();
    let mut s = session();
    prepare(&mut s, &wb, "Přidej DPH 21 % do sloupce C");
    s.apply(&mut wb).unwrap();

    let rows = wb.table_rows(SupportTable::TELEMETRY.name).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], CellValue::from("2026-03-02T10:00:00"));
    assert_eq!(rows[0][1], CellValue::from("apply"));
    assert_eq!(rows[0][2], CellValue::from("vat.add"));
}

#[test]
fn missing_telemetry_table_does_not_block_apply() {
    let mut wb = Workbook::new();
    for table in [SupportTable::AUDIT, SupportTable::UNDO_INDEX, SupportTable::UNDO_DATA] {
        wb.create_table(table.name, table.sheet, 0, 0, table.headers);
    }
    wb.set_column("Sheet1", 0, 2, vec!["Částka".into(), CellValue::Number(100.0), CellValue::Number(200.0)])
        .unwrap();
    wb.select("Sheet1", "C1:C3").unwrap();
    let mut s = session();
    prepare(&mut s, &wb, "Přidej DPH 21 % do sloupce C");

    let outcome = s.apply(&mut wb).unwrap();
    assert_eq!(outcome.message, "DPH 21 % aplikováno: C → D");
    assert_eq!(wb.flush_count(), 1);
    assert!(!wb.sheet_exists(SupportTable::TELEMETRY.sheet));
    assert_eq!(AuditLog::entries(&wb).unwrap().len(), 1);
}

// ── Scenario B ──────────────────────────────────────────────────────

#[test]
fn scenario_b_rate_fetched_then_cached() {
    let mut wb = Workbook::with_support_tables();
    let calls = Rc::new(Counter::new(0));
    let mut s = session_with(Settings::default(), Box::new(FixedRate { rate: 25.125, calls: calls.clone() }));

    match s.handle_request(&wb, "Kurz ČNB EUR dnes") {
        RequestOutcome::Preview(p) => {
            assert_eq!(p.issues, vec!["Kurz není v cache, bude nutné online stažení.".to_string()]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let first = s.apply(&mut wb).unwrap();
    assert_eq!(first.message, "Kurz EUR k 2026-03-02: 25,1250 CZK (staženo z ČNB)");
    assert_eq!(first.snapshot_id, None);

    match s.handle_request(&wb, "Kurz ČNB EUR dnes") {
        RequestOutcome::Preview(p) => assert!(p.issues.is_empty()),
        other => panic!("unexpected outcome {:?}", other),
    }
    let second = s.apply(&mut wb).unwrap();
    assert_eq!(second.message, "Kurz EUR k 2026-03-02: 25,1250 CZK (z cache)");
    assert_eq!(calls.get(), 1);
    assert_eq!(wb.table_rows(SupportTable::FX_CNB.name).unwrap().len(), 1);

    let entries = AuditLog::entries(&wb).unwrap();
    assert!(entries[0].args_json.contains("\"source\":\"api\""));
    assert!(entries[1].args_json.contains("\"source\":\"cache\""));
    assert_eq!(entries[1].range_address, "_FX_CNB!A1:C2");
}

#[test]
fn remote_failure_leaves_document_untouched() {
    let mut wb = scenario_a_book();
    let mut s = session();
    prepare(&mut s, &wb, "Převeď sloupec C na CZK podle ČNB EUR");

    let err = s.apply(&mut wb).unwrap_err();
    assert!(matches!(err, AssistError::Remote(RemoteError::Network(_))));
    assert!(s.journal().is_empty());
    assert_eq!(wb.cell("Sheet1", 0, 3).value, CellValue::Empty);
    assert!(AuditLog::entries(&wb).unwrap().is_empty());
}

// ── Undo journal ────────────────────────────────────────────────────

#[test]
fn undo_restores_values_formulas_and_formats() {
    let mut wb = scenario_a_book();
    wb.write_cells("Sheet1", &Range::single(5, 2), &[vec![gridwise_core::CellInput::Formula("=SUM(C2:C5)".into())]])
        .unwrap();
    wb.write_number_formats("Sheet1", &Range::single(1, 2), &[vec!["0.00".to_string()]]).unwrap();
    wb.select("Sheet1", "C1:C6").unwrap();
    let block = Range::new(0, 2, 5, 2);
    let before = wb.read_range("Sheet1", &block).unwrap();

    let mut s = session();
    prepare(&mut s, &wb, "Nastav formát CZK ve sloupci C");
    s.apply(&mut wb).unwrap();
    assert_ne!(wb.read_range("Sheet1", &block).unwrap(), before);

    s.undo(&mut wb).unwrap();
    assert_eq!(wb.read_range("Sheet1", &block).unwrap(), before);
}

#[test]
fn undo_after_restart_uses_persisted_journal() {
    let mut wb = scenario_a_book();
    {
        let mut s = session();
        prepare(&mut s, &wb, "Přidej DPH 21 % do sloupce C");
        s.apply(&mut wb).unwrap();
    }
    assert_eq!(wb.table_rows(SupportTable::UNDO_INDEX.name).unwrap().len(), 1);

    let mut restarted = session();
    match restarted.undo(&mut wb).unwrap() {
        UndoOutcome::Restored { address, note, .. } => {
            assert_eq!(address, "D1:D5");
            assert_eq!(note, "DPH 21 % pro D");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(column_d(&wb).iter().all(|(v, f)| v.is_empty() && f.is_none()));
    assert!(wb.table_rows(SupportTable::UNDO_INDEX.name).unwrap().is_empty());
    assert!(wb.table_rows(SupportTable::UNDO_DATA.name).unwrap().is_empty());
}

#[test]
fn oversized_snapshot_warns_but_undo_still_works() {
    let mut wb = scenario_a_book();
    let settings = Settings { undo_persist_cell_cap: 2, ..Settings::default() };
    let mut s = session_with(settings, Box::new(Offline));
    prepare(&mut s, &wb, "Přidej DPH 21 % do sloupce C");

    let outcome = s.apply(&mut wb).unwrap();
    assert_eq!(
        outcome.warnings,
        vec!["Operace příliš velká pro trvalé Zpět; aktuální stav lze vrátit jen pomocí poslední akce Zpět.".to_string()]
    );
    assert!(wb.table_rows(SupportTable::UNDO_INDEX.name).unwrap().is_empty());

    s.undo(&mut wb).unwrap();
    assert_eq!(wb.cell("Sheet1", 1, 3).formula, None);
}

// ── Boundaries ──────────────────────────────────────────────────────

#[test]
fn single_row_selection_blocks() {
    let mut wb = scenario_a_book();
    wb.select("Sheet1", "C1").unwrap();
    let mut s = session();
    match s.handle_request(&wb, "Přidej DPH 21 % do sloupce C") {
        RequestOutcome::Failed(f) => {
            assert!(matches!(f.error, AssistError::Input(_)));
            assert!(!f.issues.is_empty());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(s.apply(&mut wb).is_err());
}

#[test]
fn zero_sized_selection_fails() {
    let mut wb = scenario_a_book();
    wb.set_selection(Selection::new("Sheet1", 0, 2, 0, 1));
    let mut s = session();
    match s.handle_request(&wb, "Nastav formát CZK ve sloupci C") {
        RequestOutcome::Failed(f) => {
            assert_eq!(f.error, AssistError::input("Vyber oblast s daty (výběr je prázdný)."));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

// ── Reports ─────────────────────────────────────────────────────────

fn ledger() -> Workbook {
    let mut wb = Workbook::with_support_tables();
    let rows: [(&str, f64); 4] = [
        ("2026-01-10", 100.0),
        ("2026-01-25", 50.0),
        ("2026-02-03", 300.0),
        ("2026-03-01", 150.0),
    ];
    wb.set_value("Sheet1", 0, 0, "Datum").unwrap();
    wb.set_value("Sheet1", 0, 1, "Částka").unwrap();
    for (i, (d, a)) in rows.iter().enumerate() {
        wb.set_value("Sheet1", i + 1, 0, *d).unwrap();
        wb.set_value("Sheet1", i + 1, 1, *a).unwrap();
    }
    wb.select("Sheet1", "A1:B5").unwrap();
    wb
}

#[test]
fn run_rate_report_is_idempotent() {
    let mut wb = ledger();
    let mut s = session();

    prepare(&mut s, &wb, "Spočítej run rate za 3 měsíce");
    let outcome = s.apply(&mut wb).unwrap();
    assert_eq!(outcome.message, "Run-rate připraven na listu _RunRate.");
    assert_eq!(wb.cell("_RunRate", 3, 0).value, CellValue::from("Roční run-rate"));
    assert_eq!(wb.cell("_RunRate", 3, 1).value, CellValue::Number(2400.0));
    let area = wb.used_range("_RunRate").unwrap().unwrap();
    let first = wb.read_range("_RunRate", &area).unwrap();

    prepare(&mut s, &wb, "Spočítej run rate za 3 měsíce");
    s.apply(&mut wb).unwrap();
    assert_eq!(wb.used_range("_RunRate").unwrap(), Some(area));
    assert_eq!(wb.read_range("_RunRate", &area).unwrap(), first);

    // Undo of the rerun restores the first run's output exactly
    s.undo(&mut wb).unwrap();
    assert_eq!(wb.read_range("_RunRate", &area).unwrap(), first);
}

#[test]
fn period_comparison_writes_its_own_sheet() {
    let mut wb = ledger();
    let mut s = session();
    prepare(&mut s, &wb, "Porovnej období MoM");
    let outcome = s.apply(&mut wb).unwrap();
    assert_eq!(outcome.message, "Porovnání období připraveno na listu _PeriodCompare.");
    assert!(wb.sheet_exists("_PeriodCompare"));
}

// ── Holidays and deadlines ──────────────────────────────────────────

#[test]
fn seeded_holidays_drive_the_deadline() {
    let mut wb = Workbook::with_support_tables();
    wb.select("Sheet1", "A1").unwrap();
    let mut s = session();

    prepare(&mut s, &wb, "Vlož svátky 2026");
    let outcome = s.apply(&mut wb).unwrap();
    assert_eq!(outcome.message, "Tabulka _HOLIDAYS_CZ aktualizována pro rok 2026 (13 záznamů).");
    assert!(AuditLog::entries(&wb).unwrap()[0].range_address.starts_with("_HOLIDAYS_CZ!A1:"));

    // Re-seeding replaces the year instead of appending duplicates
    prepare(&mut s, &wb, "Vlož svátky 2026");
    s.apply(&mut wb).unwrap();
    assert_eq!(wb.table_rows(SupportTable::HOLIDAYS_CZ.name).unwrap().len(), 13);

    prepare(&mut s, &wb, "Termín za 1 pracovní den od 2.4.2026");
    let due = s.apply(&mut wb).unwrap();
    assert_eq!(due.message, "Termín posunutý o 1 pracovních dní: 2026-04-07");
    assert!(due.warnings.is_empty());
    assert_eq!(wb.cell("Sheet1", 0, 7).value, CellValue::from("Počet pracovních dní"));
    assert_eq!(wb.cell("Sheet1", 2, 8).number_format, "dd.mm.yyyy");
    // 2026-04-07 as a serial date
    assert_eq!(wb.cell("Sheet1", 2, 8).value, CellValue::Number(46119.0));
}

#[test]
fn deadline_without_holidays_warns() {
    let mut wb = Workbook::with_support_tables();
    wb.select("Sheet1", "A1").unwrap();
    let mut s = session();
    prepare(&mut s, &wb, "Termín za 10 pracovních dní od 2.3.2026");
    let outcome = s.apply(&mut wb).unwrap();
    assert_eq!(outcome.message, "Termín posunutý o 10 pracovních dní: 2026-03-16");
    assert_eq!(
        outcome.warnings,
        vec!["Upozornění: Tabulka svátků je prázdná, termín nemusí zohledňovat volné dny.".to_string()]
    );
}
