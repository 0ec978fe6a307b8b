//! Derivative-free minimization via `argmin`'s Nelder–Mead solver.
//!
//! Both the ARIMA likelihood and the Holt SSE are cheap to evaluate and have
//! only a handful of parameters, so a simplex search is adequate. Objectives
//! that return a non-finite value are mapped to a large penalty; the simplex
//! ordering in `argmin` assumes comparable costs.

use argmin::core::{CostFunction, Error as ArgminError, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;

use crate::error::{StatsError, StatsResult};

/// Cost returned in place of `NaN`/`inf`.
pub const PENALTY: f64 = 1e100;

/// Solver settings.
#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions {
    pub max_iters: u64,
    /// Stop when the std-dev of simplex costs falls below this.
    pub sd_tolerance: f64,
    /// Relative size of the initial simplex around the start point.
    pub step: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iters: 4000,
            sd_tolerance: 1e-10,
            step: 0.1,
        }
    }
}

/// Outcome of a minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub cost: f64,
    pub iterations: u64,
    /// `false` when the iteration budget ran out before the tolerance was met,
    /// or when no finite cost was ever seen.
    pub converged: bool,
}

struct Objective<F> {
    f: F,
}

impl<F> CostFunction for Objective<F>
where
    F: Fn(&[f64]) -> f64,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, ArgminError> {
        let v = (self.f)(param.as_slice());
        Ok(if v.is_finite() { v } else { PENALTY })
    }
}

/// Minimize `f` starting at `x0`.
///
/// A zero-dimensional problem is evaluated once and returned as converged.
pub fn minimize<F>(f: F, x0: &[f64], opts: &SimplexOptions) -> StatsResult<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    if x0.is_empty() {
        let cost = f(x0);
        return Ok(Minimum {
            point: Vec::new(),
            cost: if cost.is_finite() { cost } else { PENALTY },
            iterations: 0,
            converged: cost.is_finite(),
        });
    }

    let solver = NelderMead::new(initial_simplex(x0, opts.step))
        .with_sd_tolerance(opts.sd_tolerance)
        .map_err(|e| StatsError::InvalidParameter(format!("simplex setup: {e}")))?;

    let result = Executor::new(Objective { f }, solver)
        .configure(|state| state.max_iters(opts.max_iters))
        .run()
        .map_err(|e| StatsError::NonConvergence(e.to_string()))?;

    let state = result.state();
    let point = state
        .get_best_param()
        .cloned()
        .ok_or_else(|| StatsError::NonConvergence("solver returned no parameters".to_string()))?;
    let cost = state.get_best_cost();
    // A simplex that never left the penalty plateau has zero spread but no optimum.
    let converged = !matches!(
        state.get_termination_status(),
        TerminationStatus::Terminated(TerminationReason::MaxItersReached)
    ) && cost < PENALTY;

    Ok(Minimum {
        point,
        cost,
        iterations: state.get_iter(),
        converged,
    })
}

/// Minimize, then restart once from the optimum with a fresh simplex.
///
/// Nelder–Mead can stall on a collapsed simplex; a restart is the usual fix.
pub fn minimize_with_restart<F>(f: F, x0: &[f64], opts: &SimplexOptions) -> StatsResult<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let first = minimize(&f, x0, opts)?;
    let second = minimize(&f, &first.point, opts)?;
    if second.cost <= first.cost {
        Ok(Minimum {
            iterations: first.iterations + second.iterations,
            ..second
        })
    } else {
        Ok(Minimum {
            iterations: first.iterations + second.iterations,
            ..first
        })
    }
}

fn initial_simplex(x0: &[f64], step: f64) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(x0.len() + 1);
    simplex.push(x0.to_vec());
    for i in 0..x0.len() {
        let mut v = x0.to_vec();
        let delta = if x0[i].abs() > 1e-8 { step * x0[i].abs() } else { step };
        v[i] += delta;
        simplex.push(v);
    }
    simplex
}
