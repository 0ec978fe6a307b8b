//! Residual diagnostics: autocorrelations and the Ljung–Box test.
//!
//! ```text
//! Q = n (n + 2) Σ_{k=1..h} r_k² / (n - k)      Q ~ χ²(h - fitdf)
//! ```
//!
//! `r_k` is the sample autocorrelation of the demeaned series with the usual
//! `1/n` normalization. The result depends only on the residuals and the lag
//! arguments.

use serde::{Deserialize, Serialize};

use crate::domain::{TestKind, TestResult};
use crate::error::{StatsError, StatsResult};
use crate::math::chi_squared_sf;

/// Sample autocorrelations at lags `1..=max_lag`.
pub fn acf(x: &[f64], max_lag: usize) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = x.iter().sum::<f64>() / n as f64;
    let c0: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    (1..=max_lag.min(n.saturating_sub(1)))
        .map(|k| {
            if c0 == 0.0 {
                return 0.0;
            }
            let ck: f64 = (k..n).map(|t| (x[t] - mean) * (x[t - k] - mean)).sum();
            ck / c0
        })
        .collect()
}

/// Clamp a requested lag to what the series length supports.
pub fn effective_lag(n: usize, requested: usize) -> usize {
    requested.min(n.saturating_sub(1))
}

/// Ljung–Box portmanteau test against the white-noise null.
pub fn ljung_box(x: &[f64], lag: usize, fitdf: usize) -> StatsResult<TestResult> {
    let n = x.len();
    let lag = effective_lag(n, lag);
    if lag == 0 {
        return Err(StatsError::InsufficientData { needed: 2, got: n });
    }
    if fitdf >= lag {
        return Err(StatsError::InvalidParameter(format!(
            "fitdf ({fitdf}) must be below the lag ({lag})"
        )));
    }

    let nf = n as f64;
    let r = acf(x, lag);
    let sum: f64 = r
        .iter()
        .enumerate()
        .map(|(i, rk)| rk * rk / (nf - (i + 1) as f64))
        .sum();
    let statistic = nf * (nf + 2.0) * sum;
    let p_value = chi_squared_sf(statistic, lag - fitdf)?;

    Ok(TestResult::new(TestKind::LjungBox, statistic, p_value, lag))
}

/// Adequacy verdict for a fitted model's residuals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualCheck {
    pub ljung_box: TestResult,
    /// `p ≥ threshold`: no evidence of leftover autocorrelation.
    pub accepted: bool,
    pub acf: Vec<f64>,
    pub mean: f64,
    pub sd: f64,
    pub n: usize,
}

pub fn check_residuals(
    residuals: &[f64],
    lag: usize,
    fitdf: usize,
    significance: f64,
) -> StatsResult<ResidualCheck> {
    let ljung_box = ljung_box(residuals, lag, fitdf)?.with_threshold(significance);
    let n = residuals.len();
    let mean = residuals.iter().sum::<f64>() / n as f64;
    let sd = if n > 1 {
        (residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    Ok(ResidualCheck {
        accepted: !ljung_box.rejects_null(),
        acf: acf(residuals, ljung_box.lag),
        ljung_box,
        mean,
        sd,
        n,
    })
}
