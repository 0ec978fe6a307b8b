//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{run_config_from_args, Command, PlotArgs, RunArgs};
use crate::error::AppError;
use crate::plot::PlotHorizon;

pub mod pipeline;

/// Entry point for the `co2` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `co2` and `co2 --country DEU` behave like `co2 report ...`. Clap requires
    // a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The TUI owns the terminal; log lines would corrupt the screen.
    if !matches!(cli.command, Command::Tui(_)) {
        init_tracing();
    }

    match cli.command {
        Command::Report(args) => handle_run(args, OutputMode::Full),
        Command::Rank(args) => handle_run(args, OutputMode::RankOnly),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    RankOnly,
}

fn handle_run(args: RunArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_pipeline(&config)?;

    match mode {
        OutputMode::Full => {
            println!("{}", crate::report::format_full_report(&run, config.top_n));
            if config.plot {
                let plot = crate::plot::render_run_plot(
                    &run,
                    PlotHorizon::Long,
                    config.plot_width,
                    config.plot_height,
                );
                println!("{plot}");
            }
        }
        OutputMode::RankOnly => {
            println!("{}", crate::report::format_candidates(&run.selection, config.top_n));
        }
    }

    if let Some(path) = &config.export_candidates {
        crate::io::export_candidates(path, &run.selection)?;
    }
    if let Some(path) = &config.export_forecast {
        crate::io::export_forecasts(path, &run)?;
    }
    if let Some(path) = &config.export_json {
        let report = crate::io::ReportFile::new(run, &config);
        crate::io::write_report_json(path, &report)?;
    }

    Ok(())
}

fn handle_tui(args: RunArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let report = crate::io::read_report_json(&args.report)?;
    let horizon = if args.long { PlotHorizon::Long } else { PlotHorizon::Short };
    let plot = crate::plot::render_from_report(&report, horizon, args.width, args.height);
    println!("{plot}");
    Ok(())
}

/// Rewrite argv so `co2` defaults to `co2 report`.
///
/// Rules:
/// - `co2`                       -> `co2 report`
/// - `co2 --country DEU ...`     -> `co2 report --country DEU ...`
/// - `co2 --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "rank" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
        return argv;
    }

    argv
}
