//! Candidate ranking and model selection.
//!
//! The score of a candidate comes from a [`ScoringFn`]. The built-in criteria
//! are AIC, AICc and BIC, but any closure over a [`CandidateModel`] works, so
//! the ranking rules can be tested without fitting anything.
//!
//! Selection rules:
//! 1. Lowest score wins.
//! 2. Ties go to the simpler model: lower `p + q`, then lower `p`.
//! 3. Non-finite scores rank last.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{CandidateModel, Criterion, TimeSeries};
use crate::error::AppError;
use crate::fit::fitter::{fit_candidates, SkippedCandidate};
use crate::fit::grid::order_grid;
use crate::models::ArimaFitOptions;

/// Scores a fitted candidate; lower is better.
pub trait ScoringFn {
    fn score(&self, model: &CandidateModel) -> f64;

    fn label(&self) -> &str {
        "score"
    }
}

impl ScoringFn for Criterion {
    fn score(&self, model: &CandidateModel) -> f64 {
        match self {
            Criterion::Aic => model.aic,
            Criterion::Aicc => model.aicc,
            Criterion::Bic => model.bic,
        }
    }

    fn label(&self) -> &str {
        self.display_name()
    }
}

impl<F> ScoringFn for F
where
    F: Fn(&CandidateModel) -> f64,
{
    fn score(&self, model: &CandidateModel) -> f64 {
        self(model)
    }
}

/// A candidate with its position in the ranking (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub score: f64,
    pub model: CandidateModel,
}

/// Output of fitting + selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSelection {
    pub criterion: Criterion,
    pub best: CandidateModel,
    /// All fitted candidates, best first.
    pub ranked: Vec<RankedCandidate>,
    /// Grid entries that produced no usable model and why.
    pub skipped: Vec<SkippedCandidate>,
}

impl FitSelection {
    /// Re-rank the same fits under another criterion.
    pub fn rerank(&self, criterion: Criterion) -> Self {
        let fits: Vec<CandidateModel> = self.ranked.iter().map(|r| r.model.clone()).collect();
        let ranked = rank_candidates(&fits, &criterion);
        let best = ranked
            .first()
            .map(|r| r.model.clone())
            .unwrap_or_else(|| self.best.clone());
        Self {
            criterion,
            best,
            ranked,
            skipped: self.skipped.clone(),
        }
    }
}

fn compare(a: (f64, &CandidateModel), b: (f64, &CandidateModel)) -> Ordering {
    let finite = |s: f64| s.is_finite();
    match (finite(a.0), finite(b.0)) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    a.0.total_cmp(&b.0)
        .then_with(|| a.1.order.arma_terms().cmp(&b.1.order.arma_terms()))
        .then_with(|| a.1.order.p.cmp(&b.1.order.p))
}

/// Rank `fits` by `scorer` with the simplicity tie-break.
///
/// The sort is stable and every key is deterministic, so equal inputs give
/// identical rankings.
pub fn rank_candidates(fits: &[CandidateModel], scorer: &dyn ScoringFn) -> Vec<RankedCandidate> {
    let mut scored: Vec<(f64, &CandidateModel)> =
        fits.iter().map(|m| (scorer.score(m), m)).collect();
    scored.sort_by(|a, b| compare(*a, *b));
    scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, model))| RankedCandidate {
            rank: i + 1,
            score,
            model: model.clone(),
        })
        .collect()
}

/// Fit the `(p, q)` grid at the fixed `d` and pick the winner.
///
/// `d` comes from the stationarity stage and is never revisited here.
pub fn fit_and_select(
    series: &TimeSeries,
    d: usize,
    max_p: usize,
    max_q: usize,
    criterion: Criterion,
    opts: &ArimaFitOptions,
) -> Result<FitSelection, AppError> {
    let grid = order_grid(max_p, max_q, d)?;
    info!(d, candidates = grid.len(), "fitting candidate grid");

    let outcome = fit_candidates(series, &grid, opts);
    let ranked = rank_candidates(&outcome.fits, &criterion);

    let Some(first) = ranked.first() else {
        return Err(AppError::new(
            3,
            format!(
                "No ARIMA candidate could be fitted at d={d} ({} skipped).",
                outcome.skipped.len()
            ),
        ));
    };
    let best = first.model.clone();
    info!(
        order = %best.order,
        criterion = criterion.display_name(),
        score = first.score,
        skipped = outcome.skipped.len(),
        "model selected"
    );

    Ok(FitSelection {
        criterion,
        best,
        ranked,
        skipped: outcome.skipped,
    })
}
