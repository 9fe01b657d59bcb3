use regex::Regex;

use crate::dates::DatePhrases;
use crate::intent::RoleColumns;
use crate::text::{contains_any, normalize};

/// Currencies the CNB daily fixing publishes.
pub const CNB_CURRENCIES: [&str; 31] = [
    "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "DKK", "EUR", "GBP", "HKD", "HUF",
    "IDR", "ILS", "INR", "ISK", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP",
    "PLN", "RON", "SEK", "SGD", "THB", "TRY", "USD", "XDR", "ZAR",
];

const DATE_ROLE: &[&str] = &["datum", "date"];
const AMOUNT_ROLE: &[&str] = &["cast", "cena", "hodnot", "amount", "trzb"];
const ACTUAL_ROLE: &[&str] = &["skute", "actual"];
const BUDGET_ROLE: &[&str] = &["plan", "budget"];

/// Compiled extraction patterns. Built once per recognizer.
#[derive(Debug, Clone)]
pub struct Patterns {
    column: Regex,
    role: Regex,
    currency: Regex,
    vat_rate: Regex,
    vat_remove_rate: Regex,
    months: Regex,
    window: Regex,
    year: Regex,
    integer: Regex,
    pub dates: DatePhrases,
}

impl Patterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            column: Regex::new(r"\bsloup(?:ec|ce|ci)\s+([a-z]{1,3}|\w?\d+)\b|\bcolumn\s+([a-z])\b")?,
            role: Regex::new(r"\b([A-Z])\s*\(([^)]+)\)")?,
            currency: Regex::new(r"\b([A-Z]{3})\b")?,
            vat_rate: Regex::new(r"\b(\d{1,2})\b(?:\s*%|\s*procent)?")?,
            vat_remove_rate: Regex::new(r"\b(\d{1,2})\s*(?:%|procent|dph)")?,
            months: Regex::new(r"(\d+)\s*(?:mesic|mes\b|m\b)")?,
            window: Regex::new(r"(\d+)\s*(?:mesi|month|rolling|period|window)")?,
            year: Regex::new(r"\b(20\d{2})\b")?,
            integer: Regex::new(r"-?\d+")?,
            dates: DatePhrases::new()?,
        })
    }

    /// Column letter from "sloupec C" / "column C", uppercased.
    pub fn column(&self, normalized: &str) -> Option<char> {
        let caps = self.column.captures(normalized)?;
        let token = caps.get(1).or_else(|| caps.get(2))?.as_str();
        let first = token.chars().next()?;
        first.is_ascii_alphabetic().then(|| first.to_ascii_uppercase())
    }

    /// `LETTER(label)` pairs matched against per-role keywords.
    pub fn roles(&self, original: &str) -> RoleColumns {
        let upper = original.to_uppercase();
        let mut roles = RoleColumns::default();
        for caps in self.role.captures_iter(&upper) {
            let Some(letter) = caps[1].chars().next() else { continue };
            let label = normalize(&caps[2]);
            if roles.date.is_none() && contains_any(&label, DATE_ROLE) {
                roles.date = Some(letter);
            } else if roles.amount.is_none() && contains_any(&label, AMOUNT_ROLE) {
                roles.amount = Some(letter);
            }
            if roles.actual.is_none() && contains_any(&label, ACTUAL_ROLE) {
                roles.actual = Some(letter);
            } else if roles.budget.is_none() && contains_any(&label, BUDGET_ROLE) {
                roles.budget = Some(letter);
            }
        }
        roles
    }

    /// First three-letter token on the CNB allow-list.
    pub fn currency(&self, normalized: &str) -> Option<String> {
        let upper = normalized.to_uppercase();
        self.currency
            .captures_iter(&upper)
            .map(|c| c[1].to_string())
            .find(|code| CNB_CURRENCIES.contains(&code.as_str()))
    }

    pub fn vat_rate(&self, normalized: &str) -> Option<u32> {
        self.first_number(&self.vat_rate, normalized)
    }

    pub fn vat_remove_rate(&self, normalized: &str) -> Option<u32> {
        self.first_number(&self.vat_remove_rate, normalized)
    }

    pub fn months(&self, normalized: &str) -> Option<u32> {
        self.first_number(&self.months, normalized)
    }

    pub fn window(&self, normalized: &str) -> Option<u32> {
        self.first_number(&self.window, normalized)
    }

    pub fn year(&self, normalized: &str) -> Option<i32> {
        self.year.captures(normalized).and_then(|c| c[1].parse().ok())
    }

    /// First signed integer outside any date in the text.
    pub fn integer(&self, original: &str) -> Option<i64> {
        let stripped = self.dates.strip(original);
        self.integer.find(&stripped).and_then(|m| m.as_str().parse().ok())
    }

    fn first_number(&self, re: &Regex, text: &str) -> Option<u32> {
        re.captures(text).and_then(|c| c[1].parse().ok())
    }
}
