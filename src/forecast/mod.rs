//! Point forecasts and prediction intervals from a fitted ARIMA model.
//!
//! Means come from the Kalman filter: the predicted state after the last
//! differenced observation is propagated forward and the result integrated
//! back onto the original scale with the last observed level of each
//! difference order.
//!
//! Standard errors use the ψ-weights of the full operator `φ(B)(1 - B)^d`:
//! `se_h = σ sqrt(Σ_{j<h} ψ_j²)`.

pub mod baseline;

pub use baseline::*;

use crate::domain::{CandidateModel, ForecastResult, ForecastStep, TimeSeries};
use crate::error::{StatsError, StatsResult};
use crate::math::{difference, integrate_forward, normal_critical, tails};
use crate::models::{filter_params, ArmaParams, ArmaStateSpace};

/// Central interval levels reported with every forecast.
pub const INTERVAL_LEVELS: [f64; 2] = [0.80, 0.95];

/// AR coefficients of `φ(B)(1 - B)^d`, written as `x_t = Σ c_i x_{t-i} + …`.
pub fn integrated_ar(ar: &[f64], d: usize) -> Vec<f64> {
    // Polynomial in B with coefficient of B^0 first.
    let mut poly: Vec<f64> = std::iter::once(1.0).chain(ar.iter().map(|c| -c)).collect();
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    poly.iter().skip(1).map(|c| -c).collect()
}

/// First `h` ψ-weights (`ψ_0 = 1`) of the MA(∞) form.
pub fn psi_weights(ar: &[f64], ma: &[f64], d: usize, h: usize) -> Vec<f64> {
    let phi = integrated_ar(ar, d);
    let mut psi = Vec::with_capacity(h);
    for j in 0..h {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut v = ma.get(j - 1).copied().unwrap_or(0.0);
        for i in 1..=j.min(phi.len()) {
            v += phi[i - 1] * psi[j - i];
        }
        psi.push(v);
    }
    psi
}

/// Forecast `horizon` years past the end of `series` with `model`.
pub fn forecast_arima(
    series: &TimeSeries,
    model: &CandidateModel,
    horizon: usize,
) -> StatsResult<ForecastResult> {
    if horizon == 0 {
        return Err(StatsError::InvalidParameter("forecast horizon must be positive".to_string()));
    }
    let d = model.order.d;
    let values = series.values();
    let w = difference(values, d);
    if w.is_empty() {
        return Err(StatsError::InsufficientData {
            needed: d + 1,
            got: values.len(),
        });
    }

    let params = ArmaParams {
        ar: model.ar.clone(),
        ma: model.ma.clone(),
        mean: model.mean.unwrap_or(0.0),
    };
    let filtered = filter_params(&w, &params)?;
    let ss = ArmaStateSpace::new(&params.ar, &params.ma)?;
    let future_w: Vec<f64> = ss
        .project(&filtered.next_state, horizon)
        .into_iter()
        .map(|v| v + params.mean)
        .collect();
    let means = integrate_forward(&future_w, &tails(values, d));

    let psi = psi_weights(&model.ar, &model.ma, d, horizon);
    let z80 = normal_critical(INTERVAL_LEVELS[0])?;
    let z95 = normal_critical(INTERVAL_LEVELS[1])?;

    let mut cum = 0.0;
    let steps = means
        .iter()
        .zip(&psi)
        .enumerate()
        .map(|(i, (&mean, &p))| {
            cum += p * p;
            let se = (model.sigma2 * cum).sqrt();
            ForecastStep {
                year: series.end_year() + i as i32 + 1,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArimaOrder;

    fn model(order: ArimaOrder, ar: Vec<f64>, ma: Vec<f64>, mean: Option<f64>) -> CandidateModel {
        CandidateModel {
            order,
            ar,
            ma,
            mean,
            sigma2: 4.0,
            loglik: 0.0,
            aic: 0.0,
            aicc: 0.0,
            bic: 0.0,
            n_used: 0,
            residuals: Vec::new(),
            iterations: 0,
        }
    }

    #[test]
    fn integrated_operator_expands() {
        // (1 - 0.5B)(1 - B) = 1 - 1.5B + 0.5B²
        assert_eq!(integrated_ar(&[0.5], 1), vec![1.5, -0.5]);
        // (1 - B)² = 1 - 2B + B²
        assert_eq!(integrated_ar(&[], 2), vec![2.0, -1.0]);
    }

    #[test]
    fn psi_weights_of_random_walk_and_ima() {
        assert_eq!(psi_weights(&[], &[], 1, 4), vec![1.0, 1.0, 1.0, 1.0]);
        // ARIMA(0,2,0): ψ_j = j + 1
        assert_eq!(psi_weights(&[], &[], 2, 4), vec![1.0, 2.0, 3.0, 4.0]);
        // ARIMA(0,1,1) θ = 0.5: ψ_j = 1.5 for j ≥ 1
        assert_eq!(psi_weights(&[], &[0.5], 1, 3), vec![1.0, 1.5, 1.5]);
    }

    #[test]
    fn random_walk_forecast_is_flat_with_sqrt_h_errors() {
        let ts = TimeSeries::new(2000, vec![1.0, 3.0, 2.0, 5.0]).unwrap();
        let m = model(ArimaOrder::new(0, 1, 0), Vec::new(), Vec::new(), None);
        let fc = forecast_arima(&ts, &m, 3).unwrap();
        assert_eq!(fc.first_year(), Some(2004));
        for (h, s) in fc.steps.iter().enumerate() {
            assert!((s.mean - 5.0).abs() < 1e-12);
            assert!((s.se - 2.0 * ((h + 1) as f64).sqrt()).abs() < 1e-12);
        }
    }

    #[test]
    fn second_difference_extends_trend() {
        let ts = TimeSeries::new(2000, vec![1.0, 3.0, 5.0, 7.0]).unwrap();
        let m = model(ArimaOrder::new(0, 2, 0), Vec::new(), Vec::new(), None);
        let fc = forecast_arima(&ts, &m, 2).unwrap();
        assert!((fc.steps[0].mean - 9.0).abs() < 1e-12);
        assert!((fc.steps[1].mean - 11.0).abs() < 1e-12);
    }

    #[test]
    fn stationary_ar_reverts_to_mean() {
        let ts = TimeSeries::new(2000, vec![10.0, 12.0, 9.0, 14.0]).unwrap();
        let m = model(ArimaOrder::new(1, 0, 0), vec![0.5], Vec::new(), Some(10.0));
        let fc = forecast_arima(&ts, &m, 2).unwrap();
        assert!((fc.steps[0].mean - 12.0).abs() < 1e-9);
        assert!((fc.steps[1].mean - 11.0).abs() < 1e-9);
    }

    #[test]
    fn intervals_are_nested() {
        let ts = TimeSeries::new(2000, vec![1.0, 2.0, 4.0, 7.0, 11.0]).unwrap();
        let m = model(ArimaOrder::new(1, 1, 1), vec![0.3], vec![0.2], None);
        let fc = forecast_arima(&ts, &m, 5).unwrap();
        for s in &fc.steps {
            assert!(s.lower_95 < s.lower_80 && s.lower_80 < s.mean);
            assert!(s.mean < s.upper_80 && s.upper_80 < s.upper_95);
        }
    }
}
