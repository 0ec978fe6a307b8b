//! Local CSV source of indicator rows.
//!
//! Long format, one row per `(country, indicator, year)`:
//!
//! ```text
//! country,indicator,year,value
//! USA,EN.ATM.CO2E.GF.KT,1960,293456.7
//! ```
//!
//! Header names are matched case-insensitively and a few aliases used by World
//! Bank bulk downloads are accepted. An empty `value` cell is a null.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use csv::StringRecord;

use crate::data::{IndicatorRow, IndicatorSource};
use crate::error::AppError;

const COUNTRY_ALIASES: [&str; 3] = ["country", "country_code", "country code"];
const INDICATOR_ALIASES: [&str; 3] = ["indicator", "indicator_code", "indicator code"];
const YEAR_ALIASES: [&str; 2] = ["year", "date"];
const VALUE_ALIASES: [&str; 1] = ["value"];

/// Indicator rows read from a CSV file on each fetch.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IndicatorSource for CsvSource {
    fn fetch(
        &self,
        country: &str,
        indicators: &[String],
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<IndicatorRow>, AppError> {
        let file = File::open(&self.path).map_err(|e| {
            AppError::new(2, format!("Failed to open CSV '{}': {e}", self.path.display()))
        })?;
        let rows = read_indicator_rows(file)?;
        Ok(rows
            .into_iter()
            .filter(|r| r.country.eq_ignore_ascii_case(country))
            .filter(|r| indicators.iter().any(|i| i == &r.indicator))
            .filter(|r| (start_year..=end_year).contains(&r.year))
            .collect())
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }
}

/// Parse every row of a long-format indicator CSV.
pub fn read_indicator_rows<R: Read>(input: R) -> Result<Vec<IndicatorRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let columns = Columns {
        country: resolve_column(&header_map, &COUNTRY_ALIASES)?,
        indicator: resolve_column(&header_map, &INDICATOR_ALIASES)?,
        year: resolve_column(&header_map, &YEAR_ALIASES)?,
        value: resolve_column(&header_map, &VALUE_ALIASES)?,
    };

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(4, format!("CSV parse error on line {line}: {e}")))?;
        let row = parse_row(&record, &columns).map_err(|e| AppError::new(4, format!("Line {line}: {e}")))?;
        rows.push(row);
    }
    Ok(rows)
}

struct Columns {
    country: usize,
    indicator: usize,
    year: usize,
    value: usize,
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Result<usize, AppError> {
    aliases
        .iter()
        .find_map(|a| header_map.get(*a).copied())
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{}`", aliases[0])))
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<IndicatorRow, String> {
    let country = get_required(record, columns.country, "country")?;
    let indicator = get_required(record, columns.indicator, "indicator")?;
    let year_raw = get_required(record, columns.year, "year")?;
    let year = year_raw
        .parse::<i32>()
        .map_err(|_| format!("Invalid year '{year_raw}'"))?;
    let value = match get_optional(record, columns.value) {
        None => None,
        Some(raw) => {
            let v = raw
                .parse::<f64>()
                .map_err(|_| format!("Invalid value '{raw}'"))?;
            if !v.is_finite() {
                return Err(format!("Non-finite value '{raw}'"));
            }
            Some(v)
        }
    };

    Ok(IndicatorRow {
        country: country.to_string(),
        indicator: indicator.to_string(),
        year,
        value,
    })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    get_optional(record, idx).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_long_format_with_nulls() {
        let csv = "\u{feff}Country,Indicator,Year,Value\nUSA,A,2000,1.5\nUSA,B,2000,\n";
        let rows = read_indicator_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, Some(1.5));
        assert_eq!(rows[1].value, None);
        assert_eq!(rows[1].indicator, "B");
    }

    #[test]
    fn accepts_bulk_download_aliases() {
        let csv = "Country Code,Indicator Code,date,value\nDEU,X,1999,3\n";
        let rows = read_indicator_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].country, "DEU");
        assert_eq!(rows[0].year, 1999);
    }

    #[test]
    fn missing_column_is_a_usage_error() {
        let err = read_indicator_rows("country,year,value\nUSA,2000,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("indicator"));
    }

    #[test]
    fn malformed_value_reports_line() {
        let err = read_indicator_rows("country,indicator,year,value\nUSA,A,2000,1\nUSA,A,2001,abc\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().starts_with("Line 3"));
    }
}
