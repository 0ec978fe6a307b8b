//! KPSS test: stationarity around a level (or a linear trend) is the null.

use nalgebra::{DMatrix, DVector};

use crate::domain::{KpssNull, TestKind, TestResult};
use crate::error::{StatsError, StatsResult};
use crate::math::{interpolate_clamped, ols};
use crate::stationarity::pp::long_run_variance;
use crate::stationarity::tables::{KPSS_LEVEL, KPSS_PROBABILITIES, KPSS_TREND};

/// Short truncation lag `trunc(3 sqrt(n) / 13)`.
pub fn kpss_truncation(n: usize) -> usize {
    (3.0 * (n as f64).sqrt() / 13.0).trunc() as usize
}

pub fn kpss_test(x: &[f64], null: KpssNull) -> StatsResult<TestResult> {
    let n = x.len();
    if n < 4 {
        return Err(StatsError::InsufficientData { needed: 4, got: n });
    }
    let nf = n as f64;

    let e: Vec<f64> = match null {
        KpssNull::Level => {
            let mean = x.iter().sum::<f64>() / nf;
            x.iter().map(|v| v - mean).collect()
        }
        KpssNull::Trend => {
            let mut design = DMatrix::zeros(n, 2);
            for i in 0..n {
                design[(i, 0)] = 1.0;
                design[(i, 1)] = (i + 1) as f64;
            }
            ols(&design, &DVector::from_column_slice(x))?
                .residuals
                .iter()
                .copied()
                .collect()
        }
    };

    let mut partial = 0.0;
    let eta = e
        .iter()
        .map(|v| {
            partial += v;
            partial * partial
        })
        .sum::<f64>()
        / (nf * nf);

    let l = kpss_truncation(n);
    let s2 = long_run_variance(&e, l);
    if !(s2.is_finite() && s2 > 0.0) {
        return Err(StatsError::Singular("KPSS long-run variance is zero".to_string()));
    }
    let statistic = eta / s2;

    let table = match null {
        KpssNull::Level => &KPSS_LEVEL,
        KpssNull::Trend => &KPSS_TREND,
    };
    let p_value = interpolate_clamped(table, &KPSS_PROBABILITIES, statistic);

    Ok(TestResult::new(TestKind::Kpss, statistic, p_value, l))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `1, 1, -1, -1, …`: zero mean with small partial sums.
    fn block(t: usize) -> f64 {
        if t % 4 < 2 { 1.0 } else { -1.0 }
    }

    #[test]
    fn truncation_lag() {
        assert_eq!(kpss_truncation(57), 1);
        assert_eq!(kpss_truncation(100), 2);
    }

    #[test]
    fn linear_trend_rejects_level_stationarity() {
        let x: Vec<f64> = (0..60).map(|t| t as f64 + if t % 2 == 0 { 0.3 } else { -0.3 }).collect();
        let r = kpss_test(&x, KpssNull::Level).unwrap();
        assert_eq!(r.p_value, 0.01);
        assert!(r.rejects_null());
    }

    #[test]
    fn block_pattern_is_level_stationary() {
        let x: Vec<f64> = (0..60).map(block).collect();
        let r = kpss_test(&x, KpssNull::Level).unwrap();
        assert_eq!(r.p_value, 0.10);
        assert!(!r.rejects_null());
    }

    #[test]
    fn trend_null_accepts_trend_plus_noise() {
        let x: Vec<f64> = (0..60).map(|t| 2.0 * t as f64 + block(t)).collect();
        let r = kpss_test(&x, KpssNull::Trend).unwrap();
        assert!(!r.rejects_null(), "stat = {}", r.statistic);
    }

    #[test]
    fn constant_series_is_an_error() {
        assert!(kpss_test(&[3.0; 10], KpssNull::Level).is_err());
    }
}
