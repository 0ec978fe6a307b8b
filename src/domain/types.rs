//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages in memory
//! - exported to JSON/CSV for the report layer
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::math::{difference, heads, integrate};

/// Decision threshold shared by every hypothesis test in the pipeline.
pub const SIGNIFICANCE: f64 = 0.05;

/// Fossil-fuel components of CO2 emissions (kt): gaseous, liquid, solid.
pub const DEFAULT_INDICATORS: [&str; 3] = [
    "EN.ATM.CO2E.GF.KT",
    "EN.ATM.CO2E.LF.KT",
    "EN.ATM.CO2E.SF.KT",
];

/// Annual series: one value per consecutive year.
///
/// The year axis is stored as a start year; gaps are impossible by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    start_year: i32,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build from consecutive values starting at `start_year`.
    pub fn new(start_year: i32, values: Vec<f64>) -> StatsResult<Self> {
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(StatsError::InvalidSeries(format!(
                "non-finite value for year {}",
                start_year + idx as i32
            )));
        }
        Ok(Self { start_year, values })
    }

    /// Build from `(year, value)` pairs that must be strictly consecutive.
    pub fn from_pairs(pairs: &[(i32, f64)]) -> StatsResult<Self> {
        let Some(&(start_year, _)) = pairs.first() else {
            return Ok(Self {
                start_year: 0,
                values: Vec::new(),
            });
        };
        for (i, w) in pairs.windows(2).enumerate() {
            let (y0, y1) = (w[0].0, w[1].0);
            if y1 != y0 + 1 {
                return Err(StatsError::InvalidSeries(format!(
                    "years must be consecutive: {y0} followed by {y1} at position {}",
                    i + 1
                )));
            }
        }
        Self::new(start_year, pairs.iter().map(|&(_, v)| v).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// Last observed year (equal to `start_year - 1` for an empty series).
    pub fn end_year(&self) -> i32 {
        self.start_year + self.values.len() as i32 - 1
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.values.len()).map(move |i| self.start_year + i as i32)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.years().zip(self.values.iter().copied())
    }

    /// Natural log of every value; all values must be positive.
    pub fn ln(&self) -> StatsResult<Self> {
        if let Some((year, v)) = self.iter().find(|&(_, v)| v <= 0.0) {
            return Err(StatsError::InvalidSeries(format!(
                "log transform needs positive values, got {v} in {year}"
            )));
        }
        Ok(Self {
            start_year: self.start_year,
            values: self.values.iter().map(|v| v.ln()).collect(),
        })
    }

    /// Apply the difference operator `order` times.
    pub fn difference(&self, order: usize) -> StatsResult<DifferencedSeries> {
        DifferencedSeries::new(self, order)
    }
}

/// A series differenced `order` times, plus what is needed to undo it.
///
/// The year of each differenced value is the year of its later operand, so the
/// differenced series starts `order` years after the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferencedSeries {
    pub order: usize,
    /// First value of each difference level `0..order`.
    pub heads: Vec<f64>,
    pub series: TimeSeries,
}

impl DifferencedSeries {
    pub fn new(original: &TimeSeries, order: usize) -> StatsResult<Self> {
        if original.len() <= order {
            return Err(StatsError::InsufficientData {
                needed: order + 1,
                got: original.len(),
            });
        }
        let values = difference(original.values(), order);
        Ok(Self {
            order,
            heads: heads(original.values(), order),
            series: TimeSeries::new(original.start_year() + order as i32, values)?,
        })
    }

    /// Rebuild the original series by cumulative summation.
    pub fn integrate(&self) -> StatsResult<TimeSeries> {
        TimeSeries::new(
            self.series.start_year() - self.order as i32,
            integrate(self.series.values(), &self.heads),
        )
    }
}

/// Which hypothesis test produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    AugmentedDickeyFuller,
    PhillipsPerron,
    Kpss,
    LjungBox,
}

impl TestKind {
    pub fn display_name(self) -> &'static str {
        match self {
            TestKind::AugmentedDickeyFuller => "ADF",
            TestKind::PhillipsPerron => "Phillips-Perron",
            TestKind::Kpss => "KPSS",
            TestKind::LjungBox => "Ljung-Box",
        }
    }

    /// The null hypothesis the test is built around.
    pub fn null(self) -> NullHypothesis {
        match self {
            TestKind::AugmentedDickeyFuller | TestKind::PhillipsPerron => NullHypothesis::UnitRoot,
            TestKind::Kpss => NullHypothesis::Stationary,
            TestKind::LjungBox => NullHypothesis::WhiteNoise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullHypothesis {
    UnitRoot,
    Stationary,
    WhiteNoise,
}

impl NullHypothesis {
    pub fn label(self) -> &'static str {
        match self {
            NullHypothesis::UnitRoot => "unit root",
            NullHypothesis::Stationary => "stationary",
            NullHypothesis::WhiteNoise => "white noise",
        }
    }
}

/// Statistic and p-value of one hypothesis test, surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    /// Lag order / truncation parameter the test used.
    pub lag: usize,
    pub threshold: f64,
}

impl TestResult {
    pub fn new(test: TestKind, statistic: f64, p_value: f64, lag: usize) -> Self {
        Self {
            test,
            statistic,
            p_value,
            lag,
            threshold: SIGNIFICANCE,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// `p < threshold`.
    pub fn rejects_null(&self) -> bool {
        self.p_value < self.threshold
    }
}

/// `(p, d, q)` orders of an ARIMA model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// `p + q`, the simplicity key used for tie-breaking.
    pub fn arma_terms(&self) -> usize {
        self.p + self.q
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// One fitted candidate from the order search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateModel {
    pub order: ArimaOrder,
    /// AR coefficients `φ_1..φ_p` (sign convention `x_t = Σ φ_i x_{t-i} + …`).
    pub ar: Vec<f64>,
    /// MA coefficients `θ_1..θ_q` (sign convention `… + e_t + Σ θ_j e_{t-j}`).
    pub ma: Vec<f64>,
    /// Mean of the differenced series (only estimated when `d = 0`).
    pub mean: Option<f64>,
    /// Innovation variance.
    pub sigma2: f64,
    pub loglik: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
    /// Observations entering the likelihood (`n - d`).
    pub n_used: usize,
    /// Innovations, one per differenced observation.
    pub residuals: Vec<f64>,
    pub iterations: u64,
}

/// One step of a forecast table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    pub year: i32,
    pub mean: f64,
    pub se: f64,
    pub lower_80: f64,
    pub upper_80: f64,
    pub lower_95: f64,
    pub upper_95: f64,
}

/// Point forecasts and central 80% / 95% prediction intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub horizon: usize,
    pub steps: Vec<ForecastStep>,
}

impl ForecastResult {
    pub fn first_year(&self) -> Option<i32> {
        self.steps.first().map(|s| s.year)
    }

    /// Apply `exp` to every bound (for forecasts made on the log scale).
    ///
    /// Standard errors stay on the log scale.
    pub fn exp(&self) -> Self {
        Self {
            horizon: self.horizon,
            steps: self
                .steps
                .iter()
                .map(|s| ForecastStep {
                    year: s.year,
                    mean: s.mean.exp(),
                    se: s.se,
                    lower_80: s.lower_80.exp(),
                    upper_80: s.upper_80.exp(),
                    lower_95: s.lower_95.exp(),
                    upper_95: s.upper_95.exp(),
                })
                .collect(),
        }
    }
}

/// Information criterion used to rank candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Aic,
    Aicc,
    Bic,
}

impl Criterion {
    pub fn display_name(self) -> &'static str {
        match self {
            Criterion::Aic => "AIC",
            Criterion::Aicc => "AICc",
            Criterion::Bic => "BIC",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Criterion::Aic => Criterion::Aicc,
            Criterion::Aicc => Criterion::Bic,
            Criterion::Bic => Criterion::Aic,
        }
    }
}

/// Null hypothesis of the KPSS test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KpssNull {
    /// Stationary around a constant.
    Level,
    /// Stationary around a linear trend.
    Trend,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, environment and defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub country: String,
    pub indicators: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    /// Read rows from a local CSV instead of the World Bank API.
    pub csv_path: Option<PathBuf>,
    /// Generate a synthetic series from this seed instead of fetching.
    pub synthetic_seed: Option<u64>,
    pub base_url: String,

    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
    /// Operator override for the differencing order.
    pub diff_order: Option<usize>,
    /// Proceed at the capped order when the tests never agree.
    pub allow_unresolved: bool,
    pub criterion: Criterion,
    pub kpss_null: KpssNull,
    pub significance: f64,

    pub lb_lag: usize,
    pub short_horizon: usize,
    pub long_horizon: usize,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_json: Option<PathBuf>,
    pub export_forecast: Option<PathBuf>,
    pub export_candidates: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            country: "USA".to_string(),
            indicators: DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect(),
            start_year: 1960,
            end_year: 2016,
            csv_path: None,
            synthetic_seed: None,
            base_url: crate::data::worldbank::DEFAULT_BASE_URL.to_string(),
            max_p: 5,
            max_q: 5,
            max_d: 2,
            diff_order: None,
            allow_unresolved: false,
            criterion: Criterion::Aic,
            kpss_null: KpssNull::Level,
            significance: SIGNIFICANCE,
            lb_lag: 20,
            short_horizon: 4,
            long_horizon: 14,
            top_n: 10,
            plot: true,
            plot_width: 100,
            plot_height: 25,
            export_json: None,
            export_forecast: None,
            export_candidates: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_rejects_gaps_and_duplicates() {
        assert!(TimeSeries::from_pairs(&[(2000, 1.0), (2002, 2.0)]).is_err());
        assert!(TimeSeries::from_pairs(&[(2000, 1.0), (2000, 2.0)]).is_err());
        assert!(TimeSeries::from_pairs(&[(2001, 1.0), (2000, 2.0)]).is_err());
        assert!(TimeSeries::from_pairs(&[(2000, 1.0), (2001, f64::NAN)]).is_err());
    }

    #[test]
    fn differenced_series_shifts_years_and_round_trips() {
        let ts = TimeSeries::new(1960, vec![10.0, 12.0, 15.0, 19.0, 24.0]).unwrap();
        let d2 = ts.difference(2).unwrap();
        assert_eq!(d2.series.len(), 3);
        assert_eq!(d2.series.start_year(), 1962);
        assert_eq!(d2.series.values(), &[1.0, 1.0, 1.0]);
        assert_eq!(d2.integrate().unwrap(), ts);
    }

    #[test]
    fn difference_beyond_length_is_an_error() {
        let ts = TimeSeries::new(2000, vec![1.0, 2.0]).unwrap();
        assert!(ts.difference(2).is_err());
    }

    #[test]
    fn log_requires_positive_values() {
        let ts = TimeSeries::new(2000, vec![1.0, 0.0]).unwrap();
        assert!(ts.ln().is_err());
    }

    #[test]
    fn test_result_threshold_is_strict() {
        let at = TestResult::new(TestKind::LjungBox, 1.0, SIGNIFICANCE, 20);
        assert!(!at.rejects_null());
        let below = TestResult::new(TestKind::LjungBox, 1.0, 0.049, 20);
        assert!(below.rejects_null());
    }

    #[test]
    fn order_display() {
        assert_eq!(ArimaOrder::new(0, 2, 3).to_string(), "ARIMA(0,2,3)");
    }
}
