//! Holt's linear trend exponential smoothing (no seasonal component).
//!
//! Used as the naive baseline the ARIMA forecast is compared against.
//!
//! Recursion, started at `l = x_2`, `b = x_2 - x_1`:
//!
//! ```text
//! ŷ_t  = l_{t-1} + b_{t-1}
//! l_t  = α x_t + (1 - α)(l_{t-1} + b_{t-1})
//! b_t  = β (l_t - l_{t-1}) + (1 - β) b_{t-1}
//! ```
//!
//! `α` and `β` minimize the one-step SSE over `t = 3..n`, both constrained to
//! `[0, 1]`.

use tracing::debug;

use crate::domain::{ForecastResult, ForecastStep, TimeSeries};
use crate::error::{StatsError, StatsResult};
use crate::math::{minimize_with_restart, normal_critical, SimplexOptions};

/// Minimum series length: two points to initialize, one to score.
pub const MIN_OBSERVATIONS: usize = 3;

/// Fitted Holt model.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltModel {
    pub alpha: f64,
    pub beta: f64,
    /// Final smoothed level.
    pub level: f64,
    /// Final smoothed trend.
    pub trend: f64,
    pub sse: f64,
    /// One-step errors for `t = 3..n`.
    pub residuals: Vec<f64>,
    /// Year of the last observation.
    pub end_year: i32,
}

struct Smoothed {
    level: f64,
    trend: f64,
    sse: f64,
    residuals: Vec<f64>,
}

fn smooth(x: &[f64], alpha: f64, beta: f64) -> Smoothed {
    let mut level = x[1];
    let mut trend = x[1] - x[0];
    let mut sse = 0.0;
    let mut residuals = Vec::with_capacity(x.len().saturating_sub(2));
    for &obs in &x[2..] {
        let err = obs - (level + trend);
        residuals.push(err);
        sse += err * err;
        let new_level = alpha * obs + (1.0 - alpha) * (level + trend);
        trend = beta * (new_level - level) + (1.0 - beta) * trend;
        level = new_level;
    }
    Smoothed {
        level,
        trend,
        sse,
        residuals,
    }
}

/// Fit α and β by SSE minimization.
///
/// A coarse grid picks the start point; a simplex search refines it with both
/// parameters clamped into `[0, 1]`.
pub fn fit_holt(series: &TimeSeries) -> StatsResult<HoltModel> {
    let x = series.values();
    if x.len() < MIN_OBSERVATIONS {
        return Err(StatsError::InsufficientData {
            needed: MIN_OBSERVATIONS,
            got: x.len(),
        });
    }

    let mut start = (0.3, 0.1);
    let mut best = f64::INFINITY;
    for i in 1..=10 {
        for j in 0..=10 {
            let (a, b) = (i as f64 / 10.0, j as f64 / 10.0);
            let sse = smooth(x, a, b).sse;
            if sse < best {
                best = sse;
                start = (a, b);
            }
        }
    }

    let objective = |p: &[f64]| smooth(x, p[0].clamp(0.0, 1.0), p[1].clamp(0.0, 1.0)).sse;
    let min = minimize_with_restart(objective, &[start.0, start.1], &SimplexOptions::default())?;

    let (alpha, beta) = if min.cost <= best {
        (min.point[0].clamp(0.0, 1.0), min.point[1].clamp(0.0, 1.0))
    } else {
        start
    };
    let fit = smooth(x, alpha, beta);
    debug!(alpha, beta, sse = fit.sse, "Holt fit");

    Ok(HoltModel {
        alpha,
        beta,
        level: fit.level,
        trend: fit.trend,
        sse: fit.sse,
        residuals: fit.residuals,
        end_year: series.end_year(),
    })
}

impl HoltModel {
    /// Sample variance of the one-step errors.
    pub fn residual_variance(&self) -> f64 {
        let n = self.residuals.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.residuals.iter().sum::<f64>() / n as f64;
        self.residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    }

    /// Point forecasts `l + h b` with normal prediction intervals.
    ///
    /// `Var_h = s² (1 + Σ_{j=1}^{h-1} (α (1 + j β))²)`.
    pub fn forecast(&self, horizon: usize) -> StatsResult<ForecastResult> {
        let z80 = normal_critical(0.80)?;
        let z95 = normal_critical(0.95)?;
        let s2 = self.residual_variance();

        let mut acc = 1.0;
        let steps = (1..=horizon)
            .map(|h| {
                if h > 1 {
                    let j = (h - 1) as f64;
                    acc += (self.alpha * (1.0 + j * self.beta)).powi(2);
                }
                let mean = self.level + h as f64 * self.trend;
                let se = (s2 * acc).sqrt();
                ForecastStep {
                    year: self.end_year + h as i32,
                    mean,
                    se,
                    lower_80: mean - z80 * se,
                    upper_80: mean + z80 * se,
                    lower_95: mean - z95 * se,
                    upper_95: mean + z95 * se,
                }
            })
            .collect();

        Ok(ForecastResult { horizon, steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_has_zero_error() {
        let ts = TimeSeries::new(2000, (0..20).map(|t| 5.0 + 2.0 * t as f64).collect()).unwrap();
        let model = fit_holt(&ts).unwrap();
        assert!(model.sse < 1e-18);
        let fc = model.forecast(3).unwrap();
        assert_eq!(fc.first_year(), Some(2020));
        assert!((fc.steps[0].mean - 45.0).abs() < 1e-9);
        assert!((fc.steps[2].mean - 49.0).abs() < 1e-9);
    }

    #[test]
    fn smoothing_matches_hand_computation() {
        // α = 0.5, β = 0.5 on [1, 2, 4, 5]
        let s = smooth(&[1.0, 2.0, 4.0, 5.0], 0.5, 0.5);
        // t=3: ŷ=3, e=1, l=3.5, b=1.25 ; t=4: ŷ=4.75, e=0.25
        assert_eq!(s.residuals, vec![1.0, 0.25]);
        assert!((s.sse - 1.0625).abs() < 1e-12);
    }

    #[test]
    fn interval_width_grows_with_horizon() {
        let values = [1.0, 2.5, 2.9, 4.2, 5.5, 5.8, 7.4, 8.1, 8.9, 10.4, 11.0, 12.6];
        let ts = TimeSeries::new(1990, values.to_vec()).unwrap();
        let fc = fit_holt(&ts).unwrap().forecast(5).unwrap();
        for w in fc.steps.windows(2) {
            assert!(w[1].upper_95 - w[1].lower_95 >= w[0].upper_95 - w[0].lower_95);
        }
        for s in &fc.steps {
            assert!(s.lower_95 <= s.lower_80 && s.upper_80 <= s.upper_95);
        }
    }

    #[test]
    fn parameters_stay_in_unit_interval() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0];
        let ts = TimeSeries::new(2000, values.to_vec()).unwrap();
        let m = fit_holt(&ts).unwrap();
        assert!((0.0..=1.0).contains(&m.alpha));
        assert!((0.0..=1.0).contains(&m.beta));
    }
}
