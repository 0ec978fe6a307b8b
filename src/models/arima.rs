//! ARIMA(p, d, q) estimation by exact Gaussian maximum likelihood.
//!
//! The series is differenced `d` times and an ARMA(p, q) is fitted to the
//! result. A mean is estimated only when `d = 0`.
//!
//! Estimation runs in two stages:
//! - conditional sum of squares (CSS) from a zero start, which is cheap and
//!   lands close to the optimum
//! - exact likelihood via the Kalman filter, started from the CSS optimum
//!
//! AR coefficients are optimized in an unconstrained space (tanh of partial
//! autocorrelations, mapped through Durbin–Levinson) so every trial point is
//! stationary. MA coefficients are optimized directly.

use std::f64::consts::PI;

use tracing::debug;

use crate::domain::{ArimaOrder, CandidateModel, TimeSeries};
use crate::error::{StatsError, StatsResult};
use crate::math::{difference, minimize_with_restart, SimplexOptions};
use crate::models::kalman::ArmaStateSpace;

/// Options for a single ARIMA fit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArimaFitOptions {
    pub simplex: SimplexOptions,
}

/// Unpacked parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmaParams {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub mean: f64,
}

/// Layout of the unconstrained parameter vector `[u_1..u_p, θ_1..θ_q, μ?]`.
#[derive(Debug, Clone, Copy)]
struct Layout {
    p: usize,
    q: usize,
    mean: bool,
}

impl Layout {
    fn len(&self) -> usize {
        self.p + self.q + usize::from(self.mean)
    }

    fn unpack(&self, x: &[f64]) -> ArmaParams {
        let pacf: Vec<f64> = x[..self.p].iter().map(|u| u.tanh()).collect();
        ArmaParams {
            ar: pacf_to_ar(&pacf),
            ma: x[self.p..self.p + self.q].to_vec(),
            mean: if self.mean { x[self.p + self.q] } else { 0.0 },
        }
    }
}

/// Map partial autocorrelations in `(-1, 1)` to stationary AR coefficients.
pub fn pacf_to_ar(pacf: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(pacf.len());
    for (k, &r) in pacf.iter().enumerate() {
        let prev = phi.clone();
        for j in 0..k {
            phi[j] = prev[j] - r * prev[k - 1 - j];
        }
        phi.push(r);
    }
    phi
}

/// Smallest usable length of the differenced series for an order.
pub fn min_observations(order: ArimaOrder) -> usize {
    let mean = usize::from(order.d == 0);
    // Parameters plus variance, with a little room for the likelihood.
    order.p + order.q + mean + 3
}

/// Fit one ARIMA order to `series`.
pub fn fit_arima(
    series: &TimeSeries,
    order: ArimaOrder,
    opts: &ArimaFitOptions,
) -> StatsResult<CandidateModel> {
    let w = difference(series.values(), order.d);
    let needed = min_observations(order);
    if w.len() < needed {
        return Err(StatsError::InsufficientData {
            needed: needed + order.d,
            got: series.len(),
        });
    }

    let layout = Layout {
        p: order.p,
        q: order.q,
        mean: order.d == 0,
    };

    let mut x0 = vec![0.0; layout.len()];
    if layout.mean {
        x0[order.p + order.q] = w.iter().sum::<f64>() / w.len() as f64;
    }

    let css = minimize_with_restart(|x| css_objective(&w, &layout.unpack(x)), &x0, &opts.simplex)?;
    debug!(%order, cost = css.cost, iters = css.iterations, "CSS stage done");

    let start = ml_start(&css.point, order.p);
    let ml = minimize_with_restart(|x| ml_objective(&w, &layout.unpack(x)), &start, &opts.simplex)?;
    if !ml.converged {
        return Err(StatsError::NonConvergence(format!(
            "{order}: likelihood search did not converge"
        )));
    }

    let params = layout.unpack(&ml.point);
    let filtered = filter_params(&w, &params)?;

    let n = w.len() as f64;
    let sigma2 = filtered.ssq / n;
    let objective = 0.5 * (sigma2.ln() + filtered.sumlog / n);
    let neg2_loglik = 2.0 * n * objective + n + n * (2.0 * PI).ln();
    let loglik = -0.5 * neg2_loglik;

    // σ² counts as a parameter.
    let npar = (layout.len() + 1) as f64;
    let aic = neg2_loglik + 2.0 * npar;
    let bic = neg2_loglik + n.ln() * npar;
    let aicc = if n - npar - 1.0 > 0.0 {
        aic + 2.0 * npar * (npar + 1.0) / (n - npar - 1.0)
    } else {
        f64::INFINITY
    };

    let residuals = filtered.standardized();
    if !(sigma2.is_finite() && sigma2 > 0.0 && loglik.is_finite())
        || residuals.iter().any(|r| !r.is_finite())
    {
        return Err(StatsError::NonConvergence(format!(
            "{order}: degenerate likelihood"
        )));
    }

    Ok(CandidateModel {
        order,
        ar: params.ar,
        ma: params.ma,
        mean: layout.mean.then_some(params.mean),
        sigma2,
        loglik,
        aic,
        aicc,
        bic,
        n_used: w.len(),
        residuals,
        iterations: css.iterations + ml.iterations,
    })
}

/// Kalman filter pass for fixed parameters on the differenced series.
/// Bound on the unconstrained AR start of the likelihood stage.
///
/// Past this `tanh` is within 1e-4 of ±1, and it rounds to exactly ±1 long
/// before CSS stops pushing, which would start the filter on a unit root.
const AR_START_BOUND: f64 = 5.0;

/// Likelihood-stage start point: the CSS optimum with AR terms pulled back
/// inside the stationary region.
fn ml_start(css_point: &[f64], p: usize) -> Vec<f64> {
    let mut start = css_point.to_vec();
    for u in &mut start[..p] {
        *u = u.clamp(-AR_START_BOUND, AR_START_BOUND);
    }
    start
}

pub fn filter_params(
    w: &[f64],
    params: &ArmaParams,
) -> StatsResult<crate::models::kalman::FilterOutput> {
    let ss = ArmaStateSpace::new(&params.ar, &params.ma)?;
    let centered: Vec<f64> = w.iter().map(|v| v - params.mean).collect();
    ss.filter(&centered)
}

fn ml_objective(w: &[f64], params: &ArmaParams) -> f64 {
    match filter_params(w, params) {
        Ok(out) => {
            let n = w.len() as f64;
            let s2 = out.ssq / n;
            0.5 * (s2.ln() + out.sumlog / n)
        }
        Err(_) => f64::INFINITY,
    }
}

/// Half log of the mean squared conditional residual.
///
/// The first `p` observations condition the AR part; pre-sample innovations
/// are zero.
fn css_objective(w: &[f64], params: &ArmaParams) -> f64 {
    let p = params.ar.len();
    let n = w.len();
    if n <= p {
        return f64::INFINITY;
    }
    let mut e = vec![0.0; n];
    let mut ssq = 0.0;
    for t in p..n {
        let mut pred = 0.0;
        for (i, phi) in params.ar.iter().enumerate() {
            pred += phi * (w[t - 1 - i] - params.mean);
        }
        for (j, theta) in params.ma.iter().enumerate() {
            if t > j {
                pred += theta * e[t - 1 - j];
            }
        }
        e[t] = (w[t] - params.mean) - pred;
        ssq += e[t] * e[t];
    }
    0.5 * (ssq / (n - p) as f64).ln()
}
