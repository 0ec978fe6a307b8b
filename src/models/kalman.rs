//! State-space form of a zero-mean ARMA(p, q) process and its Kalman filter.
//!
//! Harvey's representation with state dimension `r = max(p, q + 1)`:
//!
//! ```text
//! α_{t+1} = T α_t + R ε_t        y_t = Z α_t,   Z = e₁
//! T = [φ | I_{r-1}; 0]           R = (1, θ_1, …, θ_{r-1})ᵀ
//! ```
//!
//! The filter runs with unit innovation variance so σ² can be concentrated out
//! of the likelihood. The initial covariance is the stationary solution of
//! `P = T P Tᵀ + R Rᵀ`.

use nalgebra::{DMatrix, DVector};

use crate::error::{StatsError, StatsResult};

#[derive(Debug, Clone)]
pub struct ArmaStateSpace {
    transition: DMatrix<f64>,
    /// `R Rᵀ`
    disturbance: DMatrix<f64>,
    initial_cov: DMatrix<f64>,
}

/// Innovations and their variances from one filter pass.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    /// One-step prediction errors `v_t`.
    pub innovations: Vec<f64>,
    /// Prediction-error variances `F_t` (unit σ²).
    pub gains: Vec<f64>,
    /// `Σ v_t² / F_t`
    pub ssq: f64,
    /// `Σ ln F_t`
    pub sumlog: f64,
    /// Predicted state `a_{n+1|n}` after the last observation.
    pub next_state: DVector<f64>,
}

impl FilterOutput {
    /// Innovations scaled to the data's units (`v_t / sqrt(F_t)`).
    pub fn standardized(&self) -> Vec<f64> {
        self.innovations
            .iter()
            .zip(&self.gains)
            .map(|(v, f)| v / f.sqrt())
            .collect()
    }
}

impl ArmaStateSpace {
    pub fn new(phi: &[f64], theta: &[f64]) -> StatsResult<Self> {
        let r = phi.len().max(theta.len() + 1);

        let mut transition = DMatrix::zeros(r, r);
        for (i, &c) in phi.iter().enumerate() {
            transition[(i, 0)] = c;
        }
        for i in 0..r - 1 {
            transition[(i, i + 1)] = 1.0;
        }

        let mut loading = DVector::zeros(r);
        loading[0] = 1.0;
        for (j, &c) in theta.iter().enumerate() {
            loading[j + 1] = c;
        }
        let disturbance = &loading * loading.transpose();

        let initial_cov = stationary_covariance(&transition, &disturbance)?;

        Ok(Self {
            transition,
            disturbance,
            initial_cov,
        })
    }

    pub fn dim(&self) -> usize {
        self.transition.nrows()
    }

    /// Run the filter over zero-mean observations.
    pub fn filter(&self, y: &[f64]) -> StatsResult<FilterOutput> {
        let r = self.dim();
        let mut state = DVector::zeros(r);
        let mut cov = self.initial_cov.clone();

        let mut innovations = Vec::with_capacity(y.len());
        let mut gains = Vec::with_capacity(y.len());
        let mut ssq = 0.0;
        let mut sumlog = 0.0;

        for &obs in y {
            let f = cov[(0, 0)];
            if !(f.is_finite() && f > 0.0) {
                return Err(StatsError::Singular(format!(
                    "non-positive prediction variance {f}"
                )));
            }
            let v = obs - state[0];
            let pz = cov.column(0).clone_owned();

            let state_upd = &state + &pz * (v / f);
            let cov_upd = &cov - (&pz * pz.transpose()) / f;

            innovations.push(v);
            gains.push(f);
            ssq += v * v / f;
            sumlog += f.ln();

            state = &self.transition * state_upd;
            cov = &self.transition * cov_upd * self.transition.transpose() + &self.disturbance;
        }

        Ok(FilterOutput {
            innovations,
            gains,
            ssq,
            sumlog,
            next_state: state,
        })
    }

    /// Propagate a predicted state `h` steps and read off `y`.
    pub fn project(&self, next_state: &DVector<f64>, horizon: usize) -> Vec<f64> {
        let mut state = next_state.clone();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            out.push(state[0]);
            state = &self.transition * state;
        }
        out
    }
}

/// Solve `P = T P Tᵀ + Q` via `vec(P) = (I - T ⊗ T)⁻¹ vec(Q)`.
fn stationary_covariance(t: &DMatrix<f64>, q: &DMatrix<f64>) -> StatsResult<DMatrix<f64>> {
    let r = t.nrows();
    let system = DMatrix::<f64>::identity(r * r, r * r) - t.kronecker(t);
    let rhs = DVector::from_column_slice(q.as_slice());
    let solution = system
        .lu()
        .solve(&rhs)
        .ok_or_else(|| StatsError::Singular("AR part has a unit root".to_string()))?;
    let p = DMatrix::from_column_slice(r, r, solution.as_slice());
    let sym = (&p + p.transpose()) * 0.5;
    if sym.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::Singular("non-finite initial covariance".to_string()));
    }
    Ok(sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ar1_initial_variance_is_stationary_variance() {
        let ss = ArmaStateSpace::new(&[0.5], &[]).unwrap();
        // Var = 1 / (1 - φ²)
        let out = ss.filter(&[0.0]).unwrap();
        assert!((out.gains[0] - 1.0 / 0.75).abs() < 1e-12);
    }

    #[test]
    fn ma1_gains_converge_to_one() {
        let ss = ArmaStateSpace::new(&[], &[0.4]).unwrap();
        let y = vec![0.0; 200];
        let out = ss.filter(&y).unwrap();
        assert!((out.gains[0] - 1.16).abs() < 1e-12);
        assert!((out.gains[199] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn white_noise_filter_is_identity() {
        let ss = ArmaStateSpace::new(&[], &[]).unwrap();
        let y = [1.0, -2.0, 3.0];
        let out = ss.filter(&y).unwrap();
        assert_eq!(out.innovations, y.to_vec());
        assert!((out.ssq - 14.0).abs() < 1e-12);
        assert_eq!(out.sumlog, 0.0);
    }

    #[test]
    fn ar1_projection_decays_geometrically() {
        let ss = ArmaStateSpace::new(&[0.5], &[]).unwrap();
        let out = ss.filter(&[0.0, 0.0, 4.0]).unwrap();
        let proj = ss.project(&out.next_state, 3);
        assert!((proj[0] - 2.0).abs() < 1e-12);
        assert!((proj[1] - 1.0).abs() < 1e-12);
        assert!((proj[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn unit_root_is_rejected() {
        assert!(ArmaStateSpace::new(&[1.0], &[]).is_err());
    }
}
