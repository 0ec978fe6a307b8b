//! Upstream data: indicator rows and their merge into one annual series.
//!
//! Every source (World Bank API, local CSV, synthetic, in-memory) produces the
//! same long-format rows. The merge step is shared and strict: a missing or
//! null component in any requested year aborts the run.

pub mod sample;
pub mod worldbank;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{RunConfig, TimeSeries};
use crate::error::AppError;

/// One observation of one indicator for one country and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub country: String,
    pub indicator: String,
    pub year: i32,
    /// `None` when the upstream database has no value.
    pub value: Option<f64>,
}

/// Anything that can return indicator rows for a country and year range.
pub trait IndicatorSource {
    fn fetch(
        &self,
        country: &str,
        indicators: &[String],
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<IndicatorRow>, AppError>;

    /// Short label for logs and the report header.
    fn describe(&self) -> String;
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<IndicatorRow>,
}

impl MemorySource {
    pub fn new(rows: Vec<IndicatorRow>) -> Self {
        Self { rows }
    }

    /// One indicator per entry of `components`, all for `country`, starting at
    /// `start_year`.
    pub fn from_components(country: &str, start_year: i32, components: &[(&str, Vec<f64>)]) -> Self {
        let rows = components
            .iter()
            .flat_map(|(indicator, values)| {
                values.iter().enumerate().map(move |(i, &v)| IndicatorRow {
                    country: country.to_string(),
                    indicator: indicator.to_string(),
                    year: start_year + i as i32,
                    value: Some(v),
                })
            })
            .collect();
        Self { rows }
    }
}

impl IndicatorSource for MemorySource {
    fn fetch(
        &self,
        country: &str,
        indicators: &[String],
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<IndicatorRow>, AppError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.country.eq_ignore_ascii_case(country))
            .filter(|r| indicators.iter().any(|i| i == &r.indicator))
            .filter(|r| (start_year..=end_year).contains(&r.year))
            .cloned()
            .collect())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} rows)", self.rows.len())
    }
}

/// Check the requested year range.
pub fn validate_range(start_year: i32, end_year: i32) -> Result<(), AppError> {
    if start_year > end_year {
        return Err(AppError::new(
            2,
            format!("Start year {start_year} is after end year {end_year}."),
        ));
    }
    Ok(())
}

/// Sum the component indicators per year into one series.
///
/// Rows for other countries, other indicators or years outside the range are
/// ignored. A duplicated `(indicator, year)` row is a data error.
pub fn merge_components(
    rows: &[IndicatorRow],
    country: &str,
    indicators: &[String],
    start_year: i32,
    end_year: i32,
) -> Result<TimeSeries, AppError> {
    validate_range(start_year, end_year)?;
    if indicators.is_empty() {
        return Err(AppError::new(2, "At least one indicator is required."));
    }

    let mut cells: HashMap<(&str, i32), Option<f64>> = HashMap::new();
    for row in rows {
        if !row.country.eq_ignore_ascii_case(country)
            || !indicators.iter().any(|i| i == &row.indicator)
            || !(start_year..=end_year).contains(&row.year)
        {
            continue;
        }
        if cells.insert((row.indicator.as_str(), row.year), row.value).is_some() {
            return Err(AppError::new(
                4,
                format!("Duplicate row for {} in {}.", row.indicator, row.year),
            ));
        }
    }

    let mut pairs = Vec::with_capacity((end_year - start_year + 1) as usize);
    for year in start_year..=end_year {
        let mut total = 0.0;
        for indicator in indicators {
            match cells.get(&(indicator.as_str(), year)) {
                Some(Some(v)) if v.is_finite() => total += v,
                Some(_) => {
                    return Err(AppError::new(
                        4,
                        format!("Null value for {indicator} ({country}) in {year}."),
                    ));
                }
                None => {
                    return Err(AppError::new(
                        4,
                        format!("Missing row for {indicator} ({country}) in {year}."),
                    ));
                }
            }
        }
        pairs.push((year, total));
    }

    TimeSeries::from_pairs(&pairs).map_err(|e| AppError::new(4, e.to_string()))
}

/// Fetch the configured indicators and merge them.
pub fn load_series(source: &dyn IndicatorSource, config: &RunConfig) -> Result<TimeSeries, AppError> {
    validate_range(config.start_year, config.end_year)?;
    info!(
        source = %source.describe(),
        country = %config.country,
        start = config.start_year,
        end = config.end_year,
        "loading indicator rows"
    );
    let rows = source.fetch(
        &config.country,
        &config.indicators,
        config.start_year,
        config.end_year,
    )?;
    let series = merge_components(
        &rows,
        &config.country,
        &config.indicators,
        config.start_year,
        config.end_year,
    )?;
    info!(n = series.len(), "series merged");
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicators() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[test]
    fn components_are_summed_per_year() {
        let src = MemorySource::from_components("USA", 2000, &[("A", vec![1.0, 2.0, 3.0]), ("B", vec![10.0, 20.0, 30.0])]);
        let rows = src.fetch("USA", &indicators(), 2000, 2002).unwrap();
        let ts = merge_components(&rows, "USA", &indicators(), 2000, 2002).unwrap();
        assert_eq!(ts.values(), &[11.0, 22.0, 33.0]);
        assert_eq!(ts.start_year(), 2000);
    }

    #[test]
    fn missing_component_year_is_fatal() {
        let src = MemorySource::from_components("USA", 2000, &[("A", vec![1.0, 2.0, 3.0]), ("B", vec![10.0, 20.0])]);
        let rows = src.fetch("USA", &indicators(), 2000, 2002).unwrap();
        let err = merge_components(&rows, "USA", &indicators(), 2000, 2002).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().contains("Missing row for B"));
    }

    #[test]
    fn null_value_is_fatal() {
        let mut rows = MemorySource::from_components("USA", 2000, &[("A", vec![1.0]), ("B", vec![2.0])])
            .fetch("USA", &indicators(), 2000, 2000)
            .unwrap();
        rows[1].value = None;
        let err = merge_components(&rows, "USA", &indicators(), 2000, 2000).unwrap_err();
        assert!(err.message().contains("Null value"));
    }

    #[test]
    fn other_countries_and_indicators_are_ignored() {
        let mut rows = MemorySource::from_components("USA", 2000, &[("A", vec![1.0]), ("B", vec![2.0])])
            .fetch("USA", &indicators(), 2000, 2000)
            .unwrap();
        rows.push(IndicatorRow {
            country: "DEU".to_string(),
            indicator: "A".to_string(),
            year: 2000,
            value: Some(100.0),
        });
        rows.push(IndicatorRow {
            country: "USA".to_string(),
            indicator: "C".to_string(),
            year: 2000,
            value: None,
        });
        let ts = merge_components(&rows, "usa", &indicators(), 2000, 2000).unwrap();
        assert_eq!(ts.values(), &[3.0]);
    }

    #[test]
    fn inverted_range_is_a_usage_error() {
        assert_eq!(validate_range(2010, 2000).unwrap_err().exit_code(), 2);
    }
}
