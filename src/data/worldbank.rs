//! World Bank Indicators API (v2) client.
//!
//! `GET {base}/country/{country}/indicator/{indicator}?date=START:END&format=json&per_page=N&page=K`
//!
//! A normal response is a two-element array `[page-meta, rows]` where `rows`
//! may be `null` when nothing matches. Errors come back with status 200 as
//! `[{"message": [{"id": …, "key": …, "value": …}]}]`.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::data::{IndicatorRow, IndicatorSource};
use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";
const PER_PAGE: usize = 1000;
const TIMEOUT_SECS: u64 = 30;

pub struct WorldBankClient {
    client: Client,
    base_url: String,
}

/// Paging information from the first array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u64,
    pub pages: u64,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiRow {
    indicator: ApiRef,
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl WorldBankClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(concat!("co2-arima/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn fetch_indicator(
        &self,
        country: &str,
        indicator: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<IndicatorRow>, AppError> {
        let url = format!("{}/country/{country}/indicator/{indicator}", self.base_url);
        let date = format!("{start_year}:{end_year}");
        let per_page = PER_PAGE.to_string();

        let mut out = Vec::new();
        let mut page = 1u64;
        loop {
            let page_str = page.to_string();
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("date", date.as_str()),
                    ("format", "json"),
                    ("per_page", per_page.as_str()),
                    ("page", page_str.as_str()),
                ])
                .send()
                .map_err(|e| AppError::new(4, format!("World Bank request failed: {e}")))?;

            if !resp.status().is_success() {
                return Err(AppError::new(
                    4,
                    format!("World Bank request for {indicator} failed with status {}.", resp.status()),
                ));
            }

            let body: Value = resp
                .json()
                .map_err(|e| AppError::new(4, format!("Failed to parse World Bank response: {e}")))?;
            let (meta, rows) = parse_page(&body, country)?;
            debug!(indicator, page = meta.page, pages = meta.pages, rows = rows.len(), "page fetched");
            out.extend(rows);

            if meta.pages == 0 || page >= meta.pages {
                break;
            }
            page += 1;
        }

        Ok(out)
    }
}

impl IndicatorSource for WorldBankClient {
    fn fetch(
        &self,
        country: &str,
        indicators: &[String],
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<IndicatorRow>, AppError> {
        let mut rows = Vec::new();
        for indicator in indicators {
            rows.extend(self.fetch_indicator(country, indicator, start_year, end_year)?);
        }
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("World Bank API ({})", self.base_url)
    }
}

/// Parse one page of the API response.
///
/// Rows are labelled with the requested `country` code; the API echoes ISO2
/// and ISO3 codes inconsistently.
pub fn parse_page(body: &Value, country: &str) -> Result<(PageMeta, Vec<IndicatorRow>), AppError> {
    let items = body
        .as_array()
        .ok_or_else(|| AppError::new(4, "World Bank response is not a JSON array."))?;

    let head = items
        .first()
        .ok_or_else(|| AppError::new(4, "World Bank response is empty."))?;

    if let Some(messages) = head.get("message") {
        return Err(AppError::new(4, format!("World Bank API error: {}", format_messages(messages))));
    }

    let meta = PageMeta {
        page: lenient_u64(head.get("page")).unwrap_or(1),
        pages: lenient_u64(head.get("pages")).unwrap_or(1),
        total: lenient_u64(head.get("total")).unwrap_or(0),
    };

    let rows = match items.get(1) {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => {
            let raw: Vec<ApiRow> = serde_json::from_value(v.clone())
                .map_err(|e| AppError::new(4, format!("Malformed World Bank rows: {e}")))?;
            raw.into_iter()
                .map(|r| {
                    let year = r.date.trim().parse::<i32>().map_err(|e| {
                        AppError::new(4, format!("Invalid World Bank date '{}': {e}", r.date))
                    })?;
                    Ok(IndicatorRow {
                        country: country.to_string(),
                        indicator: r.indicator.id,
                        year,
                        value: r.value,
                    })
                })
                .collect::<Result<Vec<_>, AppError>>()?
        }
    };

    Ok((meta, rows))
}

/// Paging fields arrive as numbers or as numeric strings.
fn lenient_u64(v: Option<&Value>) -> Option<u64> {
    match v? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn format_messages(messages: &Value) -> String {
    let parsed: Vec<ApiMessage> = serde_json::from_value(messages.clone()).unwrap_or_default();
    if parsed.is_empty() {
        return messages.to_string();
    }
    parsed
        .iter()
        .map(|m| {
            format!(
                "{} ({})",
                m.value.as_deref().unwrap_or("unknown error"),
                m.id.as_deref().unwrap_or("?")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rows_and_paging() {
        let body = json!([
            {"page": 1, "pages": 2, "per_page": "2", "total": 3, "lastupdated": "2019-01-01"},
            [
                {"indicator": {"id": "EN.ATM.CO2E.GF.KT", "value": "gaseous"},
                 "country": {"id": "US", "value": "United States"},
                 "countryiso3code": "USA", "date": "2016", "value": 1500.5,
                 "unit": "", "obs_status": "", "decimal": 0},
                {"indicator": {"id": "EN.ATM.CO2E.GF.KT", "value": "gaseous"},
                 "country": {"id": "US", "value": "United States"},
                 "countryiso3code": "USA", "date": "2015", "value": null,
                 "unit": "", "obs_status": "", "decimal": 0}
            ]
        ]);
        let (meta, rows) = parse_page(&body, "USA").unwrap();
        assert_eq!(meta, PageMeta { page: 1, pages: 2, total: 3 });
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2016);
        assert_eq!(rows[0].value, Some(1500.5));
        assert_eq!(rows[1].value, None);
        assert_eq!(rows[0].country, "USA");
    }

    #[test]
    fn null_rows_mean_no_data() {
        let body = json!([{"page": "0", "pages": "0", "total": "0"}, null]);
        let (meta, rows) = parse_page(&body, "XYZ").unwrap();
        assert_eq!(meta.pages, 0);
        assert!(rows.is_empty());
    }

    #[test]
    fn error_payload_is_reported() {
        let body = json!([{"message": [{"id": "120", "key": "Invalid value",
                                        "value": "The provided parameter value is not valid"}]}]);
        let err = parse_page(&body, "USA").unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().contains("parameter value is not valid (120)"));
    }

    #[test]
    fn non_array_body_is_malformed() {
        assert!(parse_page(&json!({"oops": true}), "USA").is_err());
    }
}
