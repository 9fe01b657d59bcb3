//! Recognized requests.
//!
//! [`IntentKind`] is closed: every variant has exactly one preview builder
//! and one apply function, matched exhaustively.

mod patterns;
mod recognizer;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use patterns::Patterns;
pub use recognizer::{Detector, Recognition, Recognizer};

/// Stable identifier of an intent, as written to the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentType {
    VatAdd,
    FormatCurrency,
    FetchRate,
    FxConvert,
    Dedupe,
    SortColumn,
    VatRemove,
    HighlightNegative,
    SumColumn,
    MonthlyRunRate,
    PeriodSummary,
    RollingWindow,
    VarianceVsBudget,
    PeriodComparison,
    SeedHolidays,
    NetworkdaysDue,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::VatAdd => "vat.add",
            IntentType::FormatCurrency => "format.currency",
            IntentType::FetchRate => "cnb.fetch_rate",
            IntentType::FxConvert => "cnb.fx_convert",
            IntentType::Dedupe => "finance.dedupe",
            IntentType::SortColumn => "sheet.sort_column",
            IntentType::VatRemove => "vat.remove",
            IntentType::HighlightNegative => "sheet.highlight_negative",
            IntentType::SumColumn => "sheet.sum_column",
            IntentType::MonthlyRunRate => "analysis.monthly_runrate",
            IntentType::PeriodSummary => "analysis.period_summary",
            IntentType::RollingWindow => "analysis.rolling_window",
            IntentType::VarianceVsBudget => "analysis.variance_vs_budget",
            IntentType::PeriodComparison => "analysis.period_comparison",
            IntentType::SeedHolidays => "holidays.seed",
            IntentType::NetworkdaysDue => "schedule.networkdays_due",
        }
    }
}

/// Supported Czech VAT rate, stored as whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate(u8);

impl VatRate {
    pub const STANDARD: VatRate = VatRate(21);

    pub fn from_percent(percent: u32) -> Option<Self> {
        match percent {
            21 | 15 | 12 | 10 => Some(VatRate(percent as u8)),
            _ => None,
        }
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    /// `0.21`
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `1.21`
    pub fn gross_factor(&self) -> f64 {
        (100 + self.0 as u32) as f64 / 100.0
    }

    /// `21 %`
    pub fn label(&self) -> String {
        format!("{} %", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    Sum,
    Average,
}

/// Which to-date totals a period summary reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryPeriod {
    MonthToDate,
    QuarterToDate,
    YearToDate,
    All,
}

/// Column letters tagged with a role in the request, e.g. `A (datum)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleColumns {
    pub date: Option<char>,
    pub amount: Option<char>,
    pub actual: Option<char>,
    pub budget: Option<char>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntentKind {
    VatAdd { rate: VatRate, column: Option<char> },
    FormatCurrency { column: Option<char> },
    FetchRate { currency: String, date: NaiveDate },
    FxConvert { currency: String, date: NaiveDate, column: Option<char> },
    Dedupe { column: Option<char> },
    SortColumn { column: Option<char>, direction: SortDirection },
    VatRemove { rate: VatRate, column: Option<char> },
    HighlightNegative { column: Option<char> },
    SumColumn { column: Option<char> },
    MonthlyRunRate { months: u32, roles: RoleColumns },
    PeriodSummary { period: SummaryPeriod, roles: RoleColumns },
    RollingWindow { window: u32, aggregation: Aggregation, roles: RoleColumns },
    VarianceVsBudget { roles: RoleColumns },
    PeriodComparison { roles: RoleColumns },
    SeedHolidays { year: i32 },
    NetworkdaysDue { days: i32, start: NaiveDate },
}

impl IntentKind {
    pub fn intent_type(&self) -> IntentType {
        match self {
            IntentKind::VatAdd { .. } => IntentType::VatAdd,
            IntentKind::FormatCurrency { .. } => IntentType::FormatCurrency,
            IntentKind::FetchRate { .. } => IntentType::FetchRate,
            IntentKind::FxConvert { .. } => IntentType::FxConvert,
            IntentKind::Dedupe { .. } => IntentType::Dedupe,
            IntentKind::SortColumn { .. } => IntentType::SortColumn,
            IntentKind::VatRemove { .. } => IntentType::VatRemove,
            IntentKind::HighlightNegative { .. } => IntentType::HighlightNegative,
            IntentKind::SumColumn { .. } => IntentType::SumColumn,
            IntentKind::MonthlyRunRate { .. } => IntentType::MonthlyRunRate,
            IntentKind::PeriodSummary { .. } => IntentType::PeriodSummary,
            IntentKind::RollingWindow { .. } => IntentType::RollingWindow,
            IntentKind::VarianceVsBudget { .. } => IntentType::VarianceVsBudget,
            IntentKind::PeriodComparison { .. } => IntentType::PeriodComparison,
            IntentKind::SeedHolidays { .. } => IntentType::SeedHolidays,
            IntentKind::NetworkdaysDue { .. } => IntentType::NetworkdaysDue,
        }
    }
}

/// A recognized request. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub kind: IntentKind,
    pub original_text: String,
    /// In `[0, 1]`
    pub confidence: f64,
}

impl Intent {
    pub fn intent_type(&self) -> IntentType {
        self.kind.intent_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vat_rate_allow_list() {
        assert!(VatRate::from_percent(20).is_none());
        let r = VatRate::from_percent(15).unwrap();
        assert_eq!(r.label(), "15 %");
        assert_eq!(r.fraction(), 0.15);
        assert_eq!(VatRate::STANDARD.gross_factor(), 1.21);
    }

    #[test]
    fn test_type_strings_unique() {
        let all = [
            IntentType::VatAdd, IntentType::FormatCurrency, IntentType::FetchRate,
            IntentType::FxConvert, IntentType::Dedupe, IntentType::SortColumn,
            IntentType::VatRemove, IntentType::HighlightNegative, IntentType::SumColumn,
            IntentType::MonthlyRunRate, IntentType::PeriodSummary, IntentType::RollingWindow,
            IntentType::VarianceVsBudget, IntentType::PeriodComparison, IntentType::SeedHolidays,
            IntentType::NetworkdaysDue,
        ];
        let mut names: Vec<_> = all.iter().map(|t| t.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 16);
    }
}
