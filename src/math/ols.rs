//! Ordinary least squares for the unit-root test regressions.
//!
//! The ADF and Phillips–Perron statistics are built from tiny regressions
//! (3–8 columns, a few dozen rows):
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - β is solved via SVD so tall, mildly collinear design matrices still solve.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Standard errors need `(XᵀX)⁻¹`, which we get from a Cholesky factorization
//!   of the normal matrix. A non-positive-definite normal matrix means the
//!   regressors are exactly collinear and no t-ratio exists.

use nalgebra::{DMatrix, DVector};

use crate::error::{StatsError, StatsResult};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// A fitted linear regression.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub beta: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Standard error of each coefficient.
    pub std_errors: DVector<f64>,
    /// Residual sum of squares.
    pub rss: f64,
}

impl OlsFit {
    /// t-ratio of coefficient `idx`.
    pub fn t_ratio(&self, idx: usize) -> f64 {
        self.beta[idx] / self.std_errors[idx]
    }
}

/// Fit `y = Xβ + u` and return coefficients, residuals and standard errors.
pub fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> StatsResult<OlsFit> {
    let (n, k) = x.shape();
    if y.len() != n {
        return Err(StatsError::InvalidParameter(format!(
            "design has {n} rows but response has {}",
            y.len()
        )));
    }
    if n <= k {
        return Err(StatsError::InsufficientData { needed: k + 1, got: n });
    }

    let beta = solve_least_squares(x, y)
        .ok_or_else(|| StatsError::Singular("least squares solve failed".to_string()))?;
    let residuals = y - x * &beta;
    let rss = residuals.norm_squared();
    let sigma2 = rss / (n - k) as f64;

    let xtx = x.transpose() * x;
    let xtx_inv = xtx
        .cholesky()
        .ok_or_else(|| StatsError::Singular("collinear regressors".to_string()))?
        .inverse();

    let std_errors = DVector::from_iterator(k, (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).sqrt()));

    Ok(OlsFit {
        beta,
        residuals,
        std_errors,
        rss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn ols_standard_errors_match_closed_form() {
        // Simple regression: se(slope) = sqrt(s² / Σ(x - x̄)²).
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [1.1, 1.9, 3.2, 3.9, 5.1];
        let mut rows = Vec::new();
        for &x in &xs {
            rows.push(1.0);
            rows.push(x);
        }
        let x = DMatrix::from_row_slice(5, 2, &rows);
        let y = DVector::from_row_slice(&ys);
        let fit = ols(&x, &y).unwrap();

        let sxx: f64 = xs.iter().map(|x| (x - 3.0) * (x - 3.0)).sum();
        let s2 = fit.rss / 3.0;
        let expected = (s2 / sxx).sqrt();
        assert!((fit.std_errors[1] - expected).abs() < 1e-10);
        assert!(fit.t_ratio(1) > 10.0);
    }

    #[test]
    fn ols_rejects_collinear_design() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert!(ols(&x, &y).is_err());
    }
}
