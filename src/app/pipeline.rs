//! Shared pipeline logic used by both CLI and TUI front-ends.
//!
//! load -> stationarity / d -> (p, q) search -> residual check -> forecasts -> baseline
//!
//! Every stage returns structured values; printing, plotting and exports are
//! separate passes over [`RunOutput`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::sample::SyntheticSource;
use crate::data::worldbank::WorldBankClient;
use crate::data::{load_series, IndicatorSource};
use crate::diagnostics::{check_residuals, ResidualCheck};
use crate::domain::{Criterion, DifferencedSeries, ForecastResult, RunConfig, TimeSeries};
use crate::error::AppError;
use crate::fit::{fit_and_select, FitSelection};
use crate::forecast::{compare_baseline, forecast_arima, BaselineReport};
use crate::io::CsvSource;
use crate::models::ArimaFitOptions;
use crate::stationarity::{decide_order, DifferencingDecision, StationarityOptions};

/// All computed outputs of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// Where the rows came from.
    pub source: String,
    pub country: String,
    pub indicators: Vec<String>,
    pub series: TimeSeries,
    /// The series differenced `0..=max_d` times, fewer when it is too short.
    #[serde(default)]
    pub differences: Vec<DifferencedSeries>,
    pub decision: DifferencingDecision,
    pub selection: FitSelection,
    pub residual_check: ResidualCheck,
    pub short: ForecastResult,
    pub long: ForecastResult,
    /// `None` when the baseline could not be fitted (e.g. non-positive values).
    pub baseline: Option<BaselineReport>,
}

/// Pick the data source implied by the configuration.
pub fn source_for(config: &RunConfig) -> Result<Box<dyn IndicatorSource>, AppError> {
    if let Some(seed) = config.synthetic_seed {
        return Ok(Box::new(SyntheticSource::new(seed)));
    }
    if let Some(path) = &config.csv_path {
        return Ok(Box::new(CsvSource::new(path.clone())));
    }
    Ok(Box::new(WorldBankClient::new(config.base_url.clone())?))
}

/// Execute the full pipeline against the configured source.
pub fn run_pipeline(config: &RunConfig) -> Result<RunOutput, AppError> {
    let source = source_for(config)?;
    run_with_source(source.as_ref(), config)
}

/// Execute the pipeline with an explicit source.
pub fn run_with_source(source: &dyn IndicatorSource, config: &RunConfig) -> Result<RunOutput, AppError> {
    let series = load_series(source, config)?;
    run_with_series(series, source.describe(), config)
}

/// Execute every stage after loading.
///
/// This is useful for the TUI and tests, where the series is already in memory.
pub fn run_with_series(
    series: TimeSeries,
    source: String,
    config: &RunConfig,
) -> Result<RunOutput, AppError> {
    validate_config(config)?;

    // 1) Differencing order.
    let stationarity = StationarityOptions {
        max_d: config.max_d,
        kpss_null: config.kpss_null,
        significance: config.significance,
    };
    let mut decision = decide_order(&series, &stationarity)?;
    if let Some(d) = config.diff_order {
        info!(tested = decision.order, chosen = d, "differencing order set by operator");
        decision = decision.with_override(d);
    } else if !decision.resolved {
        if config.allow_unresolved {
            warn!(d = decision.order, "proceeding with unresolved stationarity");
        } else {
            return Err(AppError::new(
                3,
                format!(
                    "Stationarity tests still disagree after {} differences. \
                     Re-run with --diff-order N to choose d or --allow-unresolved to continue at d={}.",
                    decision.order, decision.order
                ),
            ));
        }
    }

    // 2) Candidate search at fixed d.
    let selection = fit_and_select(
        &series,
        decision.order,
        config.max_p,
        config.max_q,
        config.criterion,
        &ArimaFitOptions::default(),
    )?;

    finish_run(series, source, config, decision, selection)
}

/// Re-rank an existing run under another criterion.
///
/// No model is refitted; the residual check, forecasts and baseline are
/// recomputed for the new best candidate.
pub fn with_criterion(run: &RunOutput, criterion: Criterion, config: &RunConfig) -> Result<RunOutput, AppError> {
    let selection = run.selection.rerank(criterion);
    let mut out = finish_run(
        run.series.clone(),
        run.source.clone(),
        config,
        run.decision.clone(),
        selection,
    )?;
    out.country = run.country.clone();
    out.indicators = run.indicators.clone();
    Ok(out)
}

/// Difference levels `0..=max_d`, stopping at the first one the series is
/// too short for.
pub fn difference_levels(series: &TimeSeries, max_d: usize) -> Vec<DifferencedSeries> {
    (0..=max_d).map_while(|d| series.difference(d).ok()).collect()
}

fn finish_run(
    series: TimeSeries,
    source: String,
    config: &RunConfig,
    decision: DifferencingDecision,
    selection: FitSelection,
) -> Result<RunOutput, AppError> {
    let best = &selection.best;

    // 3) Residual adequacy.
    let residual_check = check_residuals(&best.residuals, config.lb_lag, 0, config.significance)?;
    if residual_check.accepted {
        info!(order = %best.order, p = residual_check.ljung_box.p_value, "residuals pass Ljung-Box");
    } else {
        warn!(order = %best.order, p = residual_check.ljung_box.p_value, "residuals fail Ljung-Box");
    }

    // 4) Forecasts.
    let short = forecast_arima(&series, best, config.short_horizon)?;
    let long = forecast_arima(&series, best, config.long_horizon)?;

    // 5) Baseline comparison (informative only; failures do not abort the run).
    let baseline = match compare_baseline(
        &series,
        &best.residuals,
        config.lb_lag,
        config.significance,
        config.short_horizon,
        config.long_horizon,
    ) {
        Ok(report) => Some(report),
        Err(err) => {
            warn!(error = %err, "baseline comparison skipped");
            None
        }
    };

    let differences = difference_levels(&series, config.max_d);

    Ok(RunOutput {
        source,
        country: config.country.clone(),
        indicators: config.indicators.clone(),
        series,
        differences,
        decision,
        selection,
        residual_check,
        short,
        long,
        baseline,
    })
}

fn validate_config(config: &RunConfig) -> Result<(), AppError> {
    if !(config.significance > 0.0 && config.significance < 1.0) {
        return Err(AppError::new(2, "Significance level must be in (0, 1)."));
    }
    if config.short_horizon == 0 || config.long_horizon == 0 {
        return Err(AppError::new(2, "Forecast horizons must be positive."));
    }
    if config.lb_lag == 0 {
        return Err(AppError::new(2, "Ljung-Box lag must be positive."));
    }
    if let Some(d) = config.diff_order {
        if d > config.max_d {
            return Err(AppError::new(
                2,
                format!("--diff-order {d} exceeds --max-d {}.", config.max_d),
            ));
        }
    }
    Ok(())
}
