//! Stationarity testing and the choice of differencing order.
//!
//! Each difference level is checked with three tests:
//!
//! - ADF and Phillips–Perron (unit-root null)
//! - KPSS (stationary null)
//!
//! A level is accepted once both unit-root tests reject and KPSS does not.
//! Otherwise the series is differenced again, up to `max_d`.

pub mod adf;
pub mod kpss;
pub mod pp;
pub mod tables;

pub use adf::*;
pub use kpss::*;
pub use pp::*;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{KpssNull, TestResult, TimeSeries, SIGNIFICANCE};
use crate::error::StatsResult;

/// How the three tests read together at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Both unit-root tests reject and KPSS does not.
    Stationary,
    /// Neither unit-root test rejects and KPSS rejects.
    NonStationary,
    /// The tests disagree.
    Mixed,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Stationary => "stationary",
            Verdict::NonStationary => "non-stationary",
            Verdict::Mixed => "mixed",
        }
    }
}

/// Test results for the series differenced `order` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub order: usize,
    /// Length of the differenced series.
    pub n: usize,
    pub adf: TestResult,
    pub pp: TestResult,
    pub kpss: TestResult,
    pub verdict: Verdict,
}

impl LevelReport {
    pub fn tests(&self) -> [&TestResult; 3] {
        [&self.adf, &self.pp, &self.kpss]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StationarityOptions {
    pub max_d: usize,
    pub kpss_null: KpssNull,
    pub significance: f64,
}

impl Default for StationarityOptions {
    fn default() -> Self {
        Self {
            max_d: 2,
            kpss_null: KpssNull::Level,
            significance: SIGNIFICANCE,
        }
    }
}

/// Outcome of the differencing search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferencingDecision {
    /// Order the model search will use.
    pub order: usize,
    /// `true` when the tests agreed at `order` (or at the tested level the
    /// override replaced).
    pub resolved: bool,
    /// Set when the operator fixed the order.
    pub overridden: bool,
    /// Every level tested, `0..=` the last one examined.
    pub levels: Vec<LevelReport>,
}

impl DifferencingDecision {
    pub fn level(&self, order: usize) -> Option<&LevelReport> {
        self.levels.iter().find(|l| l.order == order)
    }

    /// Replace the order with an operator choice, keeping the evidence.
    pub fn with_override(mut self, order: usize) -> Self {
        self.overridden = true;
        self.order = order;
        self
    }
}

/// Run the three tests on `series` differenced `order` times.
pub fn test_level(
    series: &TimeSeries,
    order: usize,
    opts: &StationarityOptions,
) -> StatsResult<LevelReport> {
    let diffed = series.difference(order)?;
    let x = diffed.series.values();

    let adf = adf_test(x)?.with_threshold(opts.significance);
    let pp = pp_test(x)?.with_threshold(opts.significance);
    let kpss = kpss_test(x, opts.kpss_null)?.with_threshold(opts.significance);

    let verdict = match (adf.rejects_null(), pp.rejects_null(), kpss.rejects_null()) {
        (true, true, false) => Verdict::Stationary,
        (false, false, true) => Verdict::NonStationary,
        _ => Verdict::Mixed,
    };

    Ok(LevelReport {
        order,
        n: x.len(),
        adf,
        pp,
        kpss,
        verdict,
    })
}

/// Difference until the tests agree on stationarity, capped at `max_d`.
///
/// If the cap is reached without agreement the decision is returned with
/// `resolved = false` at `order = max_d`; the caller decides whether to go on.
pub fn decide_order(
    series: &TimeSeries,
    opts: &StationarityOptions,
) -> StatsResult<DifferencingDecision> {
    let mut levels = Vec::with_capacity(opts.max_d + 1);
    for order in 0..=opts.max_d {
        let report = test_level(series, order, opts)?;
        info!(
            order,
            adf_p = report.adf.p_value,
            pp_p = report.pp.p_value,
            kpss_p = report.kpss.p_value,
            verdict = report.verdict.label(),
            "stationarity tests"
        );
        let stationary = report.verdict == Verdict::Stationary;
        levels.push(report);
        if stationary {
            return Ok(DifferencingDecision {
                order,
                resolved: true,
                overridden: false,
                levels,
            });
        }
    }

    warn!(
        max_d = opts.max_d,
        "stationarity unresolved at the maximum differencing order"
    );
    Ok(DifferencingDecision {
        order: opts.max_d,
        resolved: false,
        overridden: false,
        levels,
    })
}
