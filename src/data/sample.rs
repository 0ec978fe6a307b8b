//! Seeded synthetic data: ARIMA simulation and an offline indicator source.
//!
//! Useful for demos without network access and for exercising the whole
//! pipeline in tests.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::{IndicatorRow, IndicatorSource};
use crate::error::AppError;
use crate::math::integrate;

/// Burn-in draws discarded before the ARMA path is kept.
const BURN_IN: usize = 200;

/// Parameters of a simulated ARIMA process.
#[derive(Debug, Clone)]
pub struct SimulationSpec {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub d: usize,
    pub sigma: f64,
    /// Constant added to the differenced process.
    pub drift: f64,
}

/// Simulate `n` values of an ARIMA process.
///
/// The ARMA part runs for a burn-in period first; the result is then
/// integrated `d` times from zero.
pub fn simulate_arima(spec: &SimulationSpec, n: usize, seed: u64) -> Result<Vec<f64>, AppError> {
    if !(spec.sigma.is_finite() && spec.sigma > 0.0) {
        return Err(AppError::new(2, "Simulation sigma must be positive."));
    }
    if n <= spec.d {
        return Err(AppError::new(2, "Simulation length must exceed the differencing order."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, spec.sigma)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let m = n - spec.d;
    let total = m + BURN_IN;
    let mut w = vec![0.0; total];
    let mut e = vec![0.0; total];
    for t in 0..total {
        e[t] = normal.sample(&mut rng);
        let mut v = spec.drift + e[t];
        for (i, phi) in spec.ar.iter().enumerate() {
            if t > i {
                v += phi * (w[t - 1 - i] - spec.drift);
            }
        }
        for (j, theta) in spec.ma.iter().enumerate() {
            if t > j {
                v += theta * e[t - 1 - j];
            }
        }
        w[t] = v;
    }

    let kept = &w[BURN_IN..];
    Ok(integrate(kept, &vec![0.0; spec.d]))
}

/// Offline source producing strictly positive emission-like paths.
///
/// Each component is a linear trend plus twice-integrated MA(2) noise, so
/// the levels are I(2) and their second difference is a stationary MA(2).
/// Each indicator gets its own stream, seeded from the base seed and the
/// indicator's position, so component rows are reproducible.
///
/// With the default settings the stationarity tests settle on d = 2 for the
/// great majority of seeds; [`SyntheticSource::DEMO_SEED`] is one of them.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
}

impl SyntheticSource {
    /// Seed used in the docs: `co2 report --synthetic 42`.
    pub const DEMO_SEED: u64 = 42;

    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn component(&self, idx: usize, n: usize) -> Result<Vec<f64>, AppError> {
        let base = 2.0e5 * (idx as f64 + 1.0);
        let spec = SimulationSpec {
            ar: Vec::new(),
            ma: vec![-0.4, -0.2],
            d: 2,
            sigma: 0.002 * base,
            drift: 0.0,
        };
        let noise = simulate_arima(&spec, n, self.seed.wrapping_add(idx as u64 * 7919))?;
        Ok(noise
            .iter()
            .enumerate()
            .map(|(t, x)| base * (1.0 + 0.03 * t as f64) + x)
            .collect())
    }
}

impl IndicatorSource for SyntheticSource {
    fn fetch(
        &self,
        country: &str,
        indicators: &[String],
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<IndicatorRow>, AppError> {
        if end_year < start_year {
            return Ok(Vec::new());
        }
        let n = (end_year - start_year + 1) as usize;
        let mut rows = Vec::with_capacity(n * indicators.len());
        for (idx, indicator) in indicators.iter().enumerate() {
            let values = self.component(idx, n.max(3))?;
            for (i, v) in values.into_iter().take(n).enumerate() {
                rows.push(IndicatorRow {
                    country: country.to_string(),
                    indicator: indicator.clone(),
                    year: start_year + i as i32,
                    value: Some(v),
                });
            }
        }
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("synthetic (seed {})", self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::difference;

    #[test]
    fn simulation_is_reproducible() {
        let spec = SimulationSpec {
            ar: vec![0.5],
            ma: vec![0.3],
            d: 1,
            sigma: 1.0,
            drift: 0.0,
        };
        let a = simulate_arima(&spec, 50, 42).unwrap();
        let b = simulate_arima(&spec, 50, 42).unwrap();
        let c = simulate_arima(&spec, 50, 43).unwrap();
        assert_eq!(a.len(), 50);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn integrated_order_starts_from_zero() {
        let spec = SimulationSpec {
            ar: Vec::new(),
            ma: Vec::new(),
            d: 2,
            sigma: 1.0,
            drift: 0.5,
        };
        let x = simulate_arima(&spec, 30, 1).unwrap();
        assert_eq!(x[0], 0.0);
        assert_eq!(x[1], 0.0);
        assert_eq!(difference(&x, 2).len(), 28);
    }

    #[test]
    fn synthetic_rows_are_positive_and_complete() {
        let src = SyntheticSource::new(7);
        let indicators = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let rows = src.fetch("USA", &indicators, 1960, 2016).unwrap();
        assert_eq!(rows.len(), 57 * 3);
        assert!(rows.iter().all(|r| r.value.is_some_and(|v| v > 0.0)));
        assert_eq!(rows[0].year, 1960);
        assert_eq!(rows[56].year, 2016);
    }

    #[test]
    fn second_difference_removes_the_trend() {
        let src = SyntheticSource::new(SyntheticSource::DEMO_SEED);
        let noise = simulate_arima(
            &SimulationSpec {
                ar: Vec::new(),
                ma: vec![-0.4, -0.2],
                d: 2,
                sigma: 0.002 * 2.0e5,
                drift: 0.0,
            },
            57,
            SyntheticSource::DEMO_SEED,
        )
        .unwrap();
        let levels = src.component(0, 57).unwrap();
        let lhs = difference(&levels, 2);
        let rhs = difference(&noise, 2);
        assert!(lhs.iter().zip(&rhs).all(|(a, b)| (a - b).abs() < 1e-6));
    }
}
