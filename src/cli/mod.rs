//! Command-line parsing for the CO2 ARIMA pipeline.
//!
//! Argument parsing and command dispatch stay separate from the statistics
//! code; flags are resolved into a [`RunConfig`] in one place.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::worldbank::DEFAULT_BASE_URL;
use crate::domain::{Criterion, KpssNull, RunConfig, DEFAULT_INDICATORS, SIGNIFICANCE};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "co2", version, about = "ARIMA modelling and forecasting of annual CO2 emissions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline and print the report, plot and optional exports.
    Report(RunArgs),
    /// Print the ranked candidate table only (useful for scripting).
    Rank(RunArgs),
    /// Plot a previously exported report JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// Runs the same pipeline as `co2 report`, then renders the result with
    /// Ratatui.
    Tui(RunArgs),
}

/// Options shared by every command that runs the pipeline.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Country code (ISO3 or ISO2) as understood by the World Bank API.
    #[arg(long, env = "CO2_COUNTRY", default_value = "USA")]
    pub country: String,

    /// First year of the series.
    #[arg(long, default_value_t = 1960)]
    pub start: i32,

    /// Last year of the series.
    #[arg(long, default_value_t = 2016)]
    pub end: i32,

    /// Indicator code to sum into the series (repeatable). Defaults to the
    /// gaseous, liquid and solid fuel components.
    #[arg(long = "indicator", value_name = "CODE")]
    pub indicators: Vec<String>,

    /// Read long-format rows (country,indicator,year,value) from a CSV file.
    #[arg(long, value_name = "FILE", conflicts_with = "synthetic")]
    pub csv: Option<PathBuf>,

    /// Generate a synthetic series from this seed instead of fetching.
    #[arg(long, value_name = "SEED")]
    pub synthetic: Option<u64>,

    /// World Bank API base URL.
    #[arg(long, env = "WORLD_BANK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Largest AR order in the candidate grid.
    #[arg(long, default_value_t = 5)]
    pub max_p: usize,

    /// Largest MA order in the candidate grid.
    #[arg(long, default_value_t = 5)]
    pub max_q: usize,

    /// Largest differencing order tried by the stationarity tests.
    #[arg(long, default_value_t = 2)]
    pub max_d: usize,

    /// Use this differencing order instead of the tested one.
    #[arg(long, value_name = "D")]
    pub diff_order: Option<usize>,

    /// Continue at the maximum order when the tests still disagree.
    #[arg(long)]
    pub allow_unresolved: bool,

    /// Information criterion for ranking candidates.
    #[arg(long, value_enum, default_value_t = Criterion::Aic)]
    pub criterion: Criterion,

    /// KPSS null hypothesis.
    #[arg(long, value_enum, default_value_t = KpssNull::Level)]
    pub kpss_null: KpssNull,

    /// Significance level for every test.
    #[arg(long, default_value_t = SIGNIFICANCE)]
    pub alpha: f64,

    /// Ljung-Box lag (clamped to the residual length).
    #[arg(long, default_value_t = 20)]
    pub lb_lag: usize,

    /// Short forecast horizon (years).
    #[arg(long, default_value_t = 4)]
    pub short: usize,

    /// Long forecast horizon (years).
    #[arg(long, default_value_t = 14)]
    pub long: usize,

    /// Show the top-N candidates.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the full run to a report JSON file.
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Export both forecast tables to CSV.
    #[arg(long, value_name = "FILE")]
    pub export_forecast: Option<PathBuf>,

    /// Export the candidate table to CSV.
    #[arg(long, value_name = "FILE")]
    pub export_candidates: Option<PathBuf>,
}

/// Options for plotting a saved report.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Report JSON file produced by `co2 report --export-json`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Plot the long horizon instead of the short one.
    #[arg(long)]
    pub long: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Resolve parsed flags into the pipeline configuration.
pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    let indicators = if args.indicators.is_empty() {
        DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect()
    } else {
        args.indicators.clone()
    };
    RunConfig {
        country: args.country.trim().to_string(),
        indicators,
        start_year: args.start,
        end_year: args.end,
        csv_path: args.csv.clone(),
        synthetic_seed: args.synthetic,
        base_url: args.base_url.clone(),
        max_p: args.max_p,
        max_q: args.max_q,
        max_d: args.max_d,
        diff_order: args.diff_order,
        allow_unresolved: args.allow_unresolved,
        criterion: args.criterion,
        kpss_null: args.kpss_null,
        significance: args.alpha,
        lb_lag: args.lb_lag,
        short_horizon: args.short,
        long_horizon: args.long,
        top_n: args.top,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_json: args.export_json.clone(),
        export_forecast: args.export_forecast.clone(),
        export_candidates: args.export_candidates.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_match_run_config_defaults() {
        let Command::Report(args) = parse(&["co2", "report", "--country", "USA"]).command else {
            panic!("expected report");
        };
        let cfg = run_config_from_args(&args);
        let def = RunConfig::default();
        assert_eq!(cfg.indicators, def.indicators);
        assert_eq!((cfg.start_year, cfg.end_year), (1960, 2016));
        assert_eq!((cfg.max_p, cfg.max_q, cfg.max_d), (5, 5, 2));
        assert_eq!((cfg.short_horizon, cfg.long_horizon, cfg.lb_lag), (4, 14, 20));
        assert!(cfg.plot);
    }

    #[test]
    fn repeated_indicators_and_overrides() {
        let Command::Rank(args) = parse(&[
            "co2", "rank", "--country", "DEU", "--indicator", "A", "--indicator", "B",
            "--diff-order", "1", "--criterion", "bic", "--no-plot",
        ])
        .command
        else {
            panic!("expected rank");
        };
        let cfg = run_config_from_args(&args);
        assert_eq!(cfg.indicators, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(cfg.diff_order, Some(1));
        assert_eq!(cfg.criterion, Criterion::Bic);
        assert!(!cfg.plot);
    }

    #[test]
    fn csv_and_synthetic_conflict() {
        assert!(Cli::try_parse_from(["co2", "report", "--csv", "a.csv", "--synthetic", "1"]).is_err());
    }
}
