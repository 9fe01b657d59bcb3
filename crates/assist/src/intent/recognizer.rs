use chrono::{Datelike, NaiveDate};

use crate::error::AssistError;
use crate::intent::{
    Aggregation, Intent, IntentKind, IntentType, Patterns, SortDirection, SummaryPeriod, VatRate,
};
use crate::text::{contains_any, has_any_word, normalize};

// ── Keyword sets (normalized form) ──────────────────────────────────

const VAT_WORDS: &[&str] = &["dph", "vat"];
const VAT_REMOVE: &[&str] = &[
    "bez dph", "odeber dph", "odstran dph", "reverse charge", "vycisti dph", "bez dane",
];
const CZK_STEMS: &[&str] = &["korun"];
const CZK_WORDS: &[&str] = &["czk", "kc"];
const DEDUPE: &[&str] = &["duplic", "duplik", "dedupe"];
const SORT: &[&str] = &["serad", "sort", "usporadej"];
const SORT_DESC: &[&str] = &["sestup", "descending", "dolu"];
const HIGHLIGHT_NEGATIVE: &[&str] = &[
    "zvyrazni zaporn", "highlight negative", "zvyrazni minus", "obarvi zaporn",
];
const SUM_STEMS: &[&str] = &["soucet", "sumuj", "souhrn", "total", "secti"];
const RUN_RATE: &[&str] = &["run rate", "runrate"];
const PERIOD_SUMMARY_WORDS: &[&str] = &["ytd", "mtd", "qtd"];
const PERIOD_SUMMARY: &[&str] = &[
    "year to date", "month to date", "quarter to date", "souhrn z", "aktualni rok",
];
const PERIOD_COMPARE_WORDS: &[&str] = &["mom", "qoq", "yoy", "quarter"];
const PERIOD_COMPARE: &[&str] = &[
    "mezimesic", "mezictvrtlet", "mezirocn", "year over year", "month over month",
    "quarter over quarter", "porovnej obdobi", "srovnani obdobi",
];
const ROLLING: &[&str] = &["rolling", "klouzav"];
const VARIANCE: &[&str] = &["odchylk", "variance", "vs budget", "rozpocet", "skutecnost"];
const FX_CONVERT: &[&str] = &["preved", "prevod", "prepoc"];
const HOLIDAYS: &[&str] = &["svatk"];
const BUSINESS_DAYS_WORDS: &[&str] = &["sla"];
const BUSINESS_DAYS: &[&str] = &["pracovn", "business"];

/// Request text in every form a detector needs.
#[derive(Debug, Clone)]
pub struct RequestText<'a> {
    pub original: &'a str,
    pub normalized: String,
    pub today: NaiveDate,
}

/// A detector hit before it is wrapped into an [`Intent`].
#[derive(Debug, Clone)]
struct Detection {
    kind: IntentKind,
    confidence: f64,
    issues: Vec<String>,
}

impl Detection {
    fn new(kind: IntentKind, confidence: f64) -> Self {
        Self { kind, confidence, issues: Vec::new() }
    }

    fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }
}

type DetectFn = fn(&Patterns, &RequestText<'_>) -> Option<Detection>;

/// One predicate+extractor pair.
#[derive(Clone, Copy)]
pub struct Detector {
    pub intent: IntentType,
    detect: DetectFn,
}

/// Result of a successful recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub intent: Intent,
    pub issues: Vec<String>,
}

/// Ordered rule list; the first detector that matches wins.
///
/// The order is observable: several phrasings match more than one detector,
/// and reordering changes which intent they produce.
pub struct Recognizer {
    patterns: Patterns,
    detectors: Vec<Detector>,
}

impl Recognizer {
    pub fn new() -> Result<Self, AssistError> {
        let detectors = vec![
            Detector { intent: IntentType::VatAdd, detect: detect_vat_add },
            Detector { intent: IntentType::FormatCurrency, detect: detect_format_currency },
            Detector { intent: IntentType::Dedupe, detect: detect_dedupe },
            Detector { intent: IntentType::VatRemove, detect: detect_vat_remove },
            Detector { intent: IntentType::SortColumn, detect: detect_sort },
            Detector { intent: IntentType::HighlightNegative, detect: detect_highlight_negative },
            Detector { intent: IntentType::PeriodSummary, detect: detect_period_summary },
            Detector { intent: IntentType::RollingWindow, detect: detect_rolling_window },
            Detector { intent: IntentType::SumColumn, detect: detect_sum },
            Detector { intent: IntentType::MonthlyRunRate, detect: detect_run_rate },
            Detector { intent: IntentType::VarianceVsBudget, detect: detect_variance },
            Detector { intent: IntentType::PeriodComparison, detect: detect_period_comparison },
            Detector { intent: IntentType::FxConvert, detect: detect_fx_convert },
            Detector { intent: IntentType::FetchRate, detect: detect_fetch_rate },
            Detector { intent: IntentType::SeedHolidays, detect: detect_seed_holidays },
            Detector { intent: IntentType::NetworkdaysDue, detect: detect_networkdays },
        ];
        Ok(Self { patterns: Patterns::new()?, detectors })
    }

    /// Intent types in the order they are tried.
    pub fn order(&self) -> Vec<IntentType> {
        self.detectors.iter().map(|d| d.intent).collect()
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    /// Recognize `text`, or `None` when no rule applies.
    pub fn recognize(&self, text: &str, today: NaiveDate) -> Option<Recognition> {
        let request = RequestText { original: text, normalized: normalize(text), today };
        if request.normalized.is_empty() {
            return None;
        }
        for detector in &self.detectors {
            if let Some(hit) = (detector.detect)(&self.patterns, &request) {
                log::debug!("recognized {} ({:.2})", detector.intent.as_str(), hit.confidence);
                return Some(Recognition {
                    intent: Intent {
                        kind: hit.kind,
                        original_text: text.to_string(),
                        confidence: hit.confidence.clamp(0.0, 1.0),
                    },
                    issues: hit.issues,
                });
            }
        }
        log::debug!("no detector matched {:?}", request.normalized);
        None
    }
}

fn mentions_czk(normalized: &str) -> bool {
    contains_any(normalized, CZK_STEMS) || has_any_word(normalized, CZK_WORDS)
}

fn confidence(column: Option<char>, with: f64, without: f64) -> f64 {
    if column.is_some() { with } else { without }
}

// ── Detectors ───────────────────────────────────────────────────────

fn detect_vat_add(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !has_any_word(n, VAT_WORDS) || contains_any(n, VAT_REMOVE) {
        return None;
    }
    // No stated rate: left to the conversation.
    let rate = VatRate::from_percent(p.vat_rate(n)?)?;
    let column = p.column(n);
    Some(Detection::new(IntentKind::VatAdd { rate, column }, confidence(column, 0.95, 0.85)))
}

fn detect_format_currency(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !n.contains("format") || !mentions_czk(n) {
        return None;
    }
    let column = p.column(n);
    Some(Detection::new(IntentKind::FormatCurrency { column }, confidence(column, 0.9, 0.8)))
}

fn detect_dedupe(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    if !contains_any(&t.normalized, DEDUPE) {
        return None;
    }
    let column = p.column(&t.normalized);
    Some(Detection::new(IntentKind::Dedupe { column }, confidence(column, 0.85, 0.75)))
}

fn detect_vat_remove(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !contains_any(n, VAT_REMOVE) {
        return None;
    }
    let (rate, defaulted) = match p.vat_remove_rate(n) {
        Some(pct) => (VatRate::from_percent(pct)?, false),
        None => (VatRate::STANDARD, true),
    };
    let column = p.column(n);
    let hit = Detection::new(IntentKind::VatRemove { rate, column }, confidence(column, 0.85, 0.7));
    Some(if defaulted {
        hit.with_issue("Sazba DPH nebyla uvedena, použije se 21 %.")
    } else {
        hit
    })
}

fn detect_sort(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !contains_any(n, SORT) {
        return None;
    }
    // Descending wins when both directions are mentioned.
    let direction = if contains_any(n, SORT_DESC) {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let column = p.column(n);
    Some(Detection::new(IntentKind::SortColumn { column, direction }, confidence(column, 0.85, 0.7)))
}

fn detect_highlight_negative(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    if !contains_any(&t.normalized, HIGHLIGHT_NEGATIVE) {
        return None;
    }
    let column = p.column(&t.normalized);
    Some(Detection::new(IntentKind::HighlightNegative { column }, confidence(column, 0.85, 0.75)))
}

fn detect_period_summary(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !(has_any_word(n, PERIOD_SUMMARY_WORDS) || contains_any(n, PERIOD_SUMMARY)) {
        return None;
    }
    let period = if has_any_word(n, &["mtd"]) || n.contains("month to date") {
        SummaryPeriod::MonthToDate
    } else if has_any_word(n, &["qtd"]) || n.contains("quarter to date") {
        SummaryPeriod::QuarterToDate
    } else if has_any_word(n, &["ytd"]) || contains_any(n, &["year to date", "aktualni rok"]) {
        SummaryPeriod::YearToDate
    } else {
        SummaryPeriod::All
    };
    let roles = p.roles(t.original);
    let both = roles.date.is_some() && roles.amount.is_some();
    Some(Detection::new(
        IntentKind::PeriodSummary { period, roles },
        if both { 0.9 } else { 0.65 },
    ))
}

fn detect_rolling_window(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !contains_any(n, ROLLING) {
        return None;
    }
    let aggregation = if has_any_word(n, &["avg", "average"]) || n.contains("prum") {
        Aggregation::Average
    } else {
        Aggregation::Sum
    };
    let mut hit_issues = Vec::new();
    let window = match p.window(n) {
        Some(w) if (1..=120).contains(&w) => w,
        Some(w) => {
            hit_issues.push(format!("Okno {} měsíců je mimo rozsah 1–120, použije se 12.", w));
            12
        }
        None => 12,
    };
    let roles = p.roles(t.original);
    let both = roles.date.is_some() && roles.amount.is_some();
    let mut hit = Detection::new(
        IntentKind::RollingWindow { window, aggregation, roles },
        if both { 0.85 } else { 0.65 },
    );
    hit.issues = hit_issues;
    Some(hit)
}

fn detect_sum(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !(contains_any(n, SUM_STEMS) || has_any_word(n, &["sum"])) {
        return None;
    }
    let column = p.column(n);
    Some(Detection::new(IntentKind::SumColumn { column }, confidence(column, 0.85, 0.75)))
}

fn detect_run_rate(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !contains_any(n, RUN_RATE) {
        return None;
    }
    let months = p.months(n).unwrap_or(3).max(1);
    let roles = p.roles(t.original);
    let both = roles.date.is_some() && roles.amount.is_some();
    Some(Detection::new(
        IntentKind::MonthlyRunRate { months, roles },
        if both { 0.9 } else { 0.6 },
    ))
}

fn detect_variance(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    if !contains_any(&t.normalized, VARIANCE) {
        return None;
    }
    let roles = p.roles(t.original);
    let both = roles.actual.is_some() && roles.budget.is_some();
    Some(Detection::new(
        IntentKind::VarianceVsBudget { roles },
        if both { 0.85 } else { 0.6 },
    ))
}

fn detect_period_comparison(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !(has_any_word(n, PERIOD_COMPARE_WORDS) || contains_any(n, PERIOD_COMPARE)) {
        return None;
    }
    let roles = p.roles(t.original);
    let both = roles.date.is_some() && roles.amount.is_some();
    Some(Detection::new(
        IntentKind::PeriodComparison { roles },
        if both { 0.9 } else { 0.65 },
    ))
}

fn detect_fx_convert(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !contains_any(n, FX_CONVERT) || !mentions_czk(n) || !n.contains("cnb") {
        return None;
    }
    // CZK is never on the allow-list, so "na CZK" alone does not name a source currency.
    let currency = p.currency(n)?;
    let date = p.dates.find(t.original, n, t.today).unwrap_or(t.today);
    let column = p.column(n);
    Some(Detection::new(
        IntentKind::FxConvert { currency, date, column },
        confidence(column, 0.9, 0.8),
    ))
}

fn detect_fetch_rate(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !n.contains("kurz") || !n.contains("cnb") {
        return None;
    }
    let currency = p.currency(n)?;
    let date = p.dates.find(t.original, n, t.today).unwrap_or(t.today);
    Some(Detection::new(IntentKind::FetchRate { currency, date }, 0.85))
}

fn detect_seed_holidays(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !contains_any(n, HOLIDAYS) {
        return None;
    }
    let year = p.year(n).unwrap_or_else(|| t.today.year());
    if !(2000..=2100).contains(&year) {
        return None;
    }
    Some(Detection::new(IntentKind::SeedHolidays { year }, 0.9))
}

fn detect_networkdays(p: &Patterns, t: &RequestText<'_>) -> Option<Detection> {
    let n = &t.normalized;
    if !(contains_any(n, BUSINESS_DAYS) || has_any_word(n, BUSINESS_DAYS_WORDS)) {
        return None;
    }
    let days = p.integer(t.original)?;
    if days == 0 || days.abs() > 365 {
        return None;
    }
    let start = p.dates.find(t.original, n, t.today).unwrap_or(t.today);
    Some(Detection::new(IntentKind::NetworkdaysDue { days: days as i32, start }, 0.8))
}
