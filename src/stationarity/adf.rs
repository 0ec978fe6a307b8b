//! Augmented Dickey–Fuller test with constant and linear trend.
//!
//! ```text
//! Δy_t = a + b t + γ y_{t-1} + Σ_{j=1..k} δ_j Δy_{t-j} + e_t
//! ```
//!
//! The statistic is the t-ratio of `γ`; small (very negative) values reject
//! the unit-root null. The default lag order is `trunc((n - 1)^(1/3))`.

use nalgebra::{DMatrix, DVector};

use crate::domain::{TestKind, TestResult};
use crate::error::{StatsError, StatsResult};
use crate::math::{difference, ols};
use crate::stationarity::tables::{table_p_value, ADF_TAU};

/// Default lag order for a series of length `n`.
pub fn default_lags(n: usize) -> usize {
    ((n.saturating_sub(1)) as f64).cbrt().trunc() as usize
}

pub fn adf_test(x: &[f64]) -> StatsResult<TestResult> {
    adf_test_with_lags(x, default_lags(x.len()))
}

pub fn adf_test_with_lags(x: &[f64], lags: usize) -> StatsResult<TestResult> {
    let dy = difference(x, 1);
    let n = dy.len();
    // Constant, trend, level and the lagged differences, plus one residual dof.
    let cols = 3 + lags;
    if n < lags + cols + 1 {
        return Err(StatsError::InsufficientData {
            needed: lags + cols + 2,
            got: x.len(),
        });
    }

    let rows = n - lags;
    let mut design = DMatrix::zeros(rows, cols);
    let mut response = DVector::zeros(rows);
    for (r, i) in (lags..n).enumerate() {
        response[r] = dy[i];
        design[(r, 0)] = 1.0;
        design[(r, 1)] = x[i];
        design[(r, 2)] = (i + 1) as f64;
        for j in 1..=lags {
            design[(r, 2 + j)] = dy[i - j];
        }
    }

    let fit = ols(&design, &response)?;
    let statistic = fit.t_ratio(1);
    if !statistic.is_finite() {
        return Err(StatsError::Singular("ADF regression has zero residual variance".to_string()));
    }
    let p_value = table_p_value(&ADF_TAU, n as f64, statistic);

    Ok(TestResult::new(TestKind::AugmentedDickeyFuller, statistic, p_value, lags))
}
