//! Phillips–Perron Z(α) test with constant and trend, plus the Bartlett
//! long-run variance it shares with KPSS.

use nalgebra::{DMatrix, DVector};

use crate::domain::{TestKind, TestResult};
use crate::error::{StatsError, StatsResult};
use crate::math::ols;
use crate::stationarity::tables::{table_p_value, PP_Z_ALPHA};

/// Newey–West long-run variance of `u` with Bartlett weights.
///
/// `σ̂² = Σu²/n + (2/n) Σ_{i=1..l} (1 - i/(l+1)) Σ_{j=i}^{n-1} u_j u_{j-i}`
pub fn long_run_variance(u: &[f64], l: usize) -> f64 {
    let n = u.len();
    if n == 0 {
        return f64::NAN;
    }
    let short = u.iter().map(|v| v * v).sum::<f64>() / n as f64;
    let mut acc = 0.0;
    for i in 1..=l.min(n.saturating_sub(1)) {
        let cov: f64 = (i..n).map(|j| u[j] * u[j - i]).sum();
        acc += (1.0 - i as f64 / (l as f64 + 1.0)) * cov;
    }
    short + 2.0 * acc / n as f64
}

/// Short truncation lag `trunc(4 (n/100)^0.25)`.
pub fn short_truncation(n: usize) -> usize {
    (4.0 * (n as f64 / 100.0).powf(0.25)).trunc() as usize
}

/// Regress `y_t` on `1, t - n/2, y_{t-1}` and correct `n(α̂ - 1)` for serial
/// correlation in the residuals.
pub fn pp_test(x: &[f64]) -> StatsResult<TestResult> {
    if x.len() < 5 {
        return Err(StatsError::InsufficientData {
            needed: 5,
            got: x.len(),
        });
    }
    let yt = &x[1..];
    let yt1 = &x[..x.len() - 1];
    let n = yt.len();
    let nf = n as f64;

    let mut design = DMatrix::zeros(n, 3);
    for i in 0..n {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = (i + 1) as f64 - nf / 2.0;
        design[(i, 2)] = yt1[i];
    }
    let fit = ols(&design, &DVector::from_column_slice(yt))?;
    let alpha = fit.beta[2];

    let u = fit.residuals.as_slice();
    let l = short_truncation(n);
    let ssqru = u.iter().map(|v| v * v).sum::<f64>() / nf;
    let ssqrtl = long_run_variance(u, l);

    let sum_y: f64 = yt1.iter().sum();
    let sum_y2: f64 = yt1.iter().map(|v| v * v).sum();
    let sum_jy: f64 = yt1.iter().enumerate().map(|(j, v)| (j + 1) as f64 * v).sum();
    let n2 = nf * nf;
    let dx = n2 * (n2 - 1.0) * sum_y2 / 12.0 - nf * sum_jy * sum_jy
        + nf * (nf + 1.0) * sum_jy * sum_y
        - nf * (nf + 1.0) * (2.0 * nf + 1.0) * sum_y * sum_y / 6.0;
    if !(dx.is_finite() && dx != 0.0) {
        return Err(StatsError::Singular("degenerate Phillips-Perron design".to_string()));
    }

    let statistic = nf * (alpha - 1.0) - nf.powi(6) / (24.0 * dx) * (ssqrtl - ssqru);
    if !statistic.is_finite() {
        return Err(StatsError::Singular("non-finite Phillips-Perron statistic".to_string()));
    }
    let p_value = table_p_value(&PP_Z_ALPHA, nf, statistic);

    Ok(TestResult::new(TestKind::PhillipsPerron, statistic, p_value, l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn long_run_variance_without_lags_is_mean_square() {
        let u = [1.0, -1.0, 2.0, -2.0];
        assert!((long_run_variance(&u, 0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn long_run_variance_bartlett_weights() {
        let u = [1.0, 2.0, 3.0];
        // lag 1 cross products: 2 + 6 = 8, weight 1/2 ; 14/3 + 2 * 4 / 3
        let expected = 14.0 / 3.0 + 8.0 / 3.0;
        assert!((long_run_variance(&u, 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn truncation_lags() {
        assert_eq!(short_truncation(56), 3);
        assert_eq!(short_truncation(100), 4);
    }

    #[test]
    fn separates_noise_from_integrated_series() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = Normal::new(0.0, 1.0).unwrap();
        let e: Vec<f64> = (0..200).map(|_| dist.sample(&mut rng)).collect();
        let stationary = pp_test(&e).unwrap();
        assert!(stationary.p_value <= 0.01, "p = {}", stationary.p_value);

        let mut level = 0.0;
        let mut slope = 0.0;
        let integrated: Vec<f64> = e
            .iter()
            .map(|v| {
                slope += v;
                level += slope;
                level
            })
            .collect();
        let unit_root = pp_test(&integrated).unwrap();
        assert!(unit_root.p_value > 0.05, "p = {}", unit_root.p_value);
    }
}
