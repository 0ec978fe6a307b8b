//! Parallel fitting of a candidate grid.
//!
//! Every order is fitted independently against the same immutable series, so
//! the grid maps cleanly onto `rayon`. Results are collected in grid order.
//!
//! A failed fit (too few observations, non-convergence, degenerate
//! likelihood) is not an error for the run: it is logged and recorded as
//! skipped.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{ArimaOrder, CandidateModel, TimeSeries};
use crate::models::{fit_arima, ArimaFitOptions};

/// A grid entry that produced no usable model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub order: ArimaOrder,
    pub reason: String,
}

/// Fitted and skipped candidates, both in grid order.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub fits: Vec<CandidateModel>,
    pub skipped: Vec<SkippedCandidate>,
}

/// Fit every order in `grid` to `series`.
pub fn fit_candidates(series: &TimeSeries, grid: &[ArimaOrder], opts: &ArimaFitOptions) -> FitOutcome {
    let results: Vec<_> = grid
        .par_iter()
        .map(|&order| (order, fit_arima(series, order, opts)))
        .collect();

    let mut fits = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (order, result) in results {
        match result {
            Ok(model) => {
                debug!(%order, aic = model.aic, loglik = model.loglik, "candidate fitted");
                fits.push(model);
            }
            Err(err) => {
                warn!(%order, error = %err, "candidate skipped");
                skipped.push(SkippedCandidate {
                    order,
                    reason: err.to_string(),
                });
            }
        }
    }

    FitOutcome { fits, skipped }
}
