//! Czech National Bank exchange rates.
//!
//! [`RateProvider`] is the remote contract; [`resolve_rate`] layers the
//! workbook cache table on top of it (exact `(date, code)` lookup first,
//! remote fetch second, write-through before use).

use std::time::Duration;

use chrono::NaiveDate;

use gridwise_config::Settings;
use gridwise_core::{CellValue, Grid, SupportTable};

use crate::error::{AssistError, RemoteError};

/// Default CNB API root.
pub const CNB_API_BASE: &str = "https://api.cnb.cz/cnbapi";

/// Resolves the CZK value of one unit of a currency on a date.
pub trait RateProvider {
    fn fetch(&self, currency: &str, date: NaiveDate) -> Result<f64, RemoteError>;
}

/// Where a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Cache,
    Remote,
}

impl RateSource {
    /// Label recorded in audit arguments.
    pub fn as_str(self) -> &'static str {
        match self {
            RateSource::Cache => "cache",
            RateSource::Remote => "api",
        }
    }

    /// Czech phrase used in result messages.
    pub fn describe(self) -> &'static str {
        match self {
            RateSource::Cache => "z cache",
            RateSource::Remote => "staženo z ČNB",
        }
    }
}

// ── CNB client ──────────────────────────────────────────────────────

/// Blocking client for the CNB daily rates endpoint.
pub struct CnbClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl CnbClient {
    pub fn new() -> Result<Self, RemoteError> {
        Self::with_base_url(CNB_API_BASE.to_string(), Duration::from_secs(30))
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("gridwise/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, RemoteError> {
        Self::with_base_url(
            settings.rates_base_url.clone(),
            Duration::from_secs(settings.rates_timeout_secs),
        )
    }

    fn daily(&self, date: NaiveDate) -> Result<serde_json::Value, RemoteError> {
        let url = format!("{}/exrates/daily", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("date", date.format("%Y-%m-%d").to_string()), ("lang", "EN".to_string())])
            .header("Accept", "application/json")
            .send()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Network(format!(
                "ČNB API odpovědělo stavem {}",
                status.as_u16()
            )));
        }
        response
            .json::<serde_json::Value>()
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}

impl RateProvider for CnbClient {
    fn fetch(&self, currency: &str, date: NaiveDate) -> Result<f64, RemoteError> {
        let body = self.daily(date)?;
        let rate = rate_from_body(&body, currency, date)?;
        log::info!("cnb: {} {} = {}", currency, date, rate);
        Ok(rate)
    }
}

/// Pick one currency's per-unit rate out of a daily response body.
fn rate_from_body(body: &serde_json::Value, currency: &str, date: NaiveDate) -> Result<f64, RemoteError> {
    let wanted = normalize_code(currency);
    let entries = body
        .get("rates")
        .or_else(|| body.get("data"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| RemoteError::Malformed("Neočekávaný formát odpovědi ČNB.".to_string()))?;

    let entry = entries
        .iter()
        .find(|e| entry_code(e).map(normalize_code).as_deref() == Some(wanted.as_str()))
        .ok_or_else(|| {
            RemoteError::NotFound(format!("Kurz ČNB pro {} k {} nebyl nalezen.", wanted, date))
        })?;

    let amount = entry.get("amount").map_or(Some(1.0), number_of);
    let rate = ["rate", "mid", "value"]
        .iter()
        .find_map(|k| entry.get(*k))
        .and_then(number_of);
    match (rate, amount) {
        (Some(rate), Some(amount)) if rate.is_finite() && amount.is_finite() && amount != 0.0 => {
            Ok(rate / amount)
        }
        _ => Err(RemoteError::Malformed("ČNB odpověď neobsahovala platný kurz.".to_string())),
    }
}

fn entry_code(entry: &serde_json::Value) -> Option<&str> {
    for key in ["currencyCode", "CurrencyCode", "code", "Code"] {
        if let Some(code) = entry.get(key).and_then(|v| v.as_str()) {
            if !code.trim().is_empty() {
                return Some(code);
            }
        }
    }
    entry
        .get("currency")
        .and_then(|v| v.as_str())
        .filter(|c| c.trim().len() == 3)
}

fn number_of(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

// ── Cache ───────────────────────────────────────────────────────────

/// Exact `(date, code)` lookup in the rate cache table.
pub fn cached_rate(grid: &dyn Grid, currency: &str, date: NaiveDate) -> Result<Option<f64>, AssistError> {
    let iso = date.format("%Y-%m-%d").to_string();
    let code = normalize_code(currency);
    let rows = grid.table_rows(SupportTable::FX_CNB.name)?;
    Ok(rows.iter().find_map(|row| {
        let [d, c, r] = row.as_slice() else {
            return None;
        };
        if d.to_string() != iso || normalize_code(&c.to_string()) != code {
            return None;
        }
        match r {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }))
}

pub fn store_rate(grid: &mut dyn Grid, currency: &str, date: NaiveDate, rate: f64) -> Result<(), AssistError> {
    grid.add_table_rows(SupportTable::FX_CNB.name, &[vec![
        CellValue::Text(date.format("%Y-%m-%d").to_string()),
        CellValue::Text(normalize_code(currency)),
        CellValue::Number(rate),
    ]])?;
    Ok(())
}

/// Cache first, then the provider with write-through. Does not sync.
pub fn resolve_rate(
    grid: &mut dyn Grid,
    provider: &dyn RateProvider,
    currency: &str,
    date: NaiveDate,
) -> Result<(f64, RateSource), AssistError> {
    if let Some(rate) = cached_rate(&*grid, currency, date)? {
        log::debug!("rate cache hit: {} {}", currency, date);
        return Ok((rate, RateSource::Cache));
    }
    let rate = provider.fetch(&normalize_code(currency), date)?;
    store_rate(grid, currency, date, rate)?;
    Ok((rate, RateSource::Remote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwise_engine::Workbook;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::cell::Cell;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn client(server: &MockServer) -> CnbClient {
        CnbClient::with_base_url(server.base_url(), Duration::from_secs(5)).unwrap()
    }

    struct Counting {
        calls: Cell<usize>,
    }

    impl RateProvider for Counting {
        fn fetch(&self, _currency: &str, _date: NaiveDate) -> Result<f64, RemoteError> {
            self.calls.set(self.calls.get() + 1);
            Ok(24.5)
        }
    }

    // ── HTTP ────────────────────────────────────────────────────────

    #[test]
    fn test_fetch_divides_by_amount() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/exrates/daily")
                .query_param("date", "2026-03-02")
                .query_param("lang", "EN");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "rates": [
                        { "currencyCode": "EUR", "amount": 1, "rate": 25.125 },
                        { "currencyCode": "JPY", "amount": 100, "rate": 15.8 }
                    ]
                }));
        });

        let cnb = client(&server);
        assert_eq!(cnb.fetch("EUR", day()).unwrap(), 25.125);
        let jpy = cnb.fetch("jpy", day()).unwrap();
        assert!((jpy - 0.158).abs() < 1e-12);
        mock.assert_hits(2);
    }

    #[test]
    fn test_fetch_accepts_data_key_and_code_alias() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exrates/daily");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "data": [ { "code": "USD", "rate": "22.5" } ] }));
        });
        assert_eq!(client(&server).fetch("USD", day()).unwrap(), 22.5);
    }

    #[test]
    fn test_fetch_missing_currency_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exrates/daily");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "rates": [ { "currencyCode": "EUR", "amount": 1, "rate": 25.0 } ] }));
        });
        let err = client(&server).fetch("XDR", day()).unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(ref m) if m.contains("XDR")));
    }

    #[test]
    fn test_fetch_http_error_is_network() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exrates/daily");
            then.status(503);
        });
        let err = client(&server).fetch("EUR", day()).unwrap_err();
        assert!(matches!(err, RemoteError::Network(ref m) if m.contains("503")));
    }

    #[test]
    fn test_fetch_zero_amount_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exrates/daily");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "rates": [ { "currencyCode": "EUR", "amount": 0, "rate": 25.0 } ] }));
        });
        let err = client(&server).fetch("EUR", day()).unwrap_err();
        assert!(matches!(err, RemoteError::Malformed(_)));
    }

    // ── Cache ───────────────────────────────────────────────────────

    #[test]
    fn test_resolve_writes_through_then_hits_cache() {
        let mut wb = Workbook::with_support_tables();
        let provider = Counting { calls: Cell::new(0) };

        let (rate, source) = resolve_rate(&mut wb, &provider, "eur", day()).unwrap();
        assert_eq!((rate, source), (24.5, RateSource::Remote));
        assert_eq!(
            wb.table_rows(SupportTable::FX_CNB.name).unwrap(),
            vec![vec![CellValue::from("2026-03-02"), CellValue::from("EUR"), CellValue::Number(24.5)]]
        );

        let (_, source) = resolve_rate(&mut wb, &provider, "EUR", day()).unwrap();
        assert_eq!(source, RateSource::Cache);
        assert_eq!(provider.calls.get(), 1);
    }

    #[test]
    fn test_cache_is_keyed_by_date() {
        let mut wb = Workbook::with_support_tables();
        store_rate(&mut wb, "EUR", day(), 25.0).unwrap();
        assert_eq!(cached_rate(&wb, "EUR", day()).unwrap(), Some(25.0));
        assert_eq!(cached_rate(&wb, "EUR", day().succ_opt().unwrap()).unwrap(), None);
        assert_eq!(cached_rate(&wb, "USD", day()).unwrap(), None);
    }
}
