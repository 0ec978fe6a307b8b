//! Naive baseline: Holt smoothing on the log series.
//!
//! The comparison with the selected ARIMA model is informal. Both residual
//! series get a Ljung–Box test and the model whose test has the lower p-value
//! is labelled "more informative". This is a heuristic, not a
//! likelihood-ratio test.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::diagnostics::ljung_box;
use crate::domain::{ForecastResult, TestResult, TimeSeries};
use crate::error::StatsResult;
use crate::models::fit_holt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineWinner {
    Arima,
    Holt,
    Tie,
}

impl BaselineWinner {
    pub fn label(self) -> &'static str {
        match self {
            BaselineWinner::Arima => "ARIMA",
            BaselineWinner::Holt => "Holt",
            BaselineWinner::Tie => "neither (equal p-values)",
        }
    }
}

/// Holt forecasts on the log scale and back-transformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineForecast {
    pub log: ForecastResult,
    pub level: ForecastResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineReport {
    pub alpha: f64,
    pub beta: f64,
    /// One-step SSE on the log scale.
    pub sse: f64,
    pub holt_ljung_box: TestResult,
    pub arima_ljung_box: TestResult,
    pub more_informative: BaselineWinner,
    pub short: BaselineForecast,
    pub long: BaselineForecast,
}

/// Lower p-value wins.
pub fn more_informative(arima: &TestResult, holt: &TestResult) -> BaselineWinner {
    if arima.p_value < holt.p_value {
        BaselineWinner::Arima
    } else if holt.p_value < arima.p_value {
        BaselineWinner::Holt
    } else {
        BaselineWinner::Tie
    }
}

/// Fit Holt to `ln(series)`, forecast both horizons, and compare residual
/// autocorrelation with the ARIMA residuals.
pub fn compare_baseline(
    series: &TimeSeries,
    arima_residuals: &[f64],
    lb_lag: usize,
    significance: f64,
    short_horizon: usize,
    long_horizon: usize,
) -> StatsResult<BaselineReport> {
    let log_series = series.ln()?;
    let holt = fit_holt(&log_series)?;

    let holt_ljung_box = ljung_box(&holt.residuals, lb_lag, 0)?.with_threshold(significance);
    let arima_ljung_box = ljung_box(arima_residuals, lb_lag, 0)?.with_threshold(significance);
    let winner = more_informative(&arima_ljung_box, &holt_ljung_box);
    info!(
        alpha = holt.alpha,
        beta = holt.beta,
        holt_p = holt_ljung_box.p_value,
        arima_p = arima_ljung_box.p_value,
        more_informative = winner.label(),
        "baseline compared"
    );

    let forecast = |h: usize| -> StatsResult<BaselineForecast> {
        let log = holt.forecast(h)?;
        let level = log.exp();
        Ok(BaselineForecast { log, level })
    };

    Ok(BaselineReport {
        alpha: holt.alpha,
        beta: holt.beta,
        sse: holt.sse,
        holt_ljung_box,
        arima_ljung_box,
        more_informative: winner,
        short: forecast(short_horizon)?,
        long: forecast(long_horizon)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TestKind;

    #[test]
    fn lower_p_value_is_more_informative() {
        let a = TestResult::new(TestKind::LjungBox, 10.0, 0.02, 20);
        let h = TestResult::new(TestKind::LjungBox, 5.0, 0.40, 20);
        assert_eq!(more_informative(&a, &h), BaselineWinner::Arima);
        assert_eq!(more_informative(&h, &a), BaselineWinner::Holt);
        assert_eq!(more_informative(&a, &a), BaselineWinner::Tie);
    }

    #[test]
    fn back_transformed_bounds_stay_ordered() {
        let values: Vec<f64> = (0..30)
            .map(|t| 100.0 * (1.03f64).powi(t) * if t % 3 == 0 { 1.01 } else { 0.995 })
            .collect();
        let ts = TimeSeries::new(1980, values).unwrap();
        let residuals: Vec<f64> = (0..28).map(|t| if t % 2 == 0 { 0.5 } else { -0.4 }).collect();
        let report = compare_baseline(&ts, &residuals, 10, 0.05, 4, 14).unwrap();
        assert_eq!(report.short.level.steps.len(), 4);
        assert_eq!(report.long.level.steps.len(), 14);
        for s in &report.long.level.steps {
            assert!(s.lower_95 > 0.0);
            assert!(s.lower_95 <= s.lower_80 && s.lower_80 <= s.mean);
            assert!(s.mean <= s.upper_80 && s.upper_80 <= s.upper_95);
        }
        assert_eq!(report.short.log.first_year(), Some(2010));
    }
}
