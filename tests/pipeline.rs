//! End-to-end runs of the pipeline against offline sources.

use co2_arima::app::pipeline::{run_with_series, run_with_source, with_criterion, RunOutput};
use co2_arima::data::sample::SyntheticSource;
use co2_arima::data::{IndicatorRow, MemorySource};
use co2_arima::diagnostics::ljung_box;
use co2_arima::domain::{Criterion, RunConfig, TimeSeries};
use co2_arima::io::{read_report_json, write_candidates_csv, write_report_json, ReportFile};

fn small_config() -> RunConfig {
    RunConfig {
        max_p: 2,
        max_q: 2,
        ..RunConfig::default()
    }
}

fn synthetic_run(seed: u64) -> RunOutput {
    run_with_source(&SyntheticSource::new(seed), &small_config()).unwrap()
}

#[test]
fn synthetic_run_produces_every_section() {
    let run = synthetic_run(11);
    assert_eq!(run.series.len(), 57);
    assert_eq!(run.series.start_year(), 1960);
    assert_eq!(run.indicators.len(), 3);

    let d = run.decision.order;
    assert_eq!(d, 2);
    assert!(run.decision.resolved);
    assert_eq!(run.decision.levels.len(), d + 1);
    assert_eq!(run.selection.best.order.d, d);
    assert_eq!(run.selection.ranked[0].model.order, run.selection.best.order);
    assert_eq!(run.selection.ranked.len() + run.selection.skipped.len(), 9);
    assert_eq!(run.selection.best.residuals.len(), 57 - d);

    assert_eq!(run.short.steps.len(), 4);
    assert_eq!(run.long.steps.len(), 14);
    assert_eq!(run.short.first_year(), Some(2017));
    assert_eq!(run.long.steps.last().map(|s| s.year), Some(2030));
    assert!(run.baseline.is_some());
}

#[test]
fn demo_seed_resolves_at_second_difference() {
    let config = RunConfig::default();
    assert!(!config.allow_unresolved && config.diff_order.is_none());
    let run = run_with_source(&SyntheticSource::new(SyntheticSource::DEMO_SEED), &config).unwrap();
    assert!(run.decision.resolved);
    assert_eq!(run.decision.order, 2);
    assert!(!run.decision.overridden);
    assert_eq!(run.selection.best.order.d, 2);
}

#[test]
fn selection_is_deterministic() {
    let a = synthetic_run(5);
    let b = synthetic_run(5);
    let orders = |r: &RunOutput| r.selection.ranked.iter().map(|c| c.model.order).collect::<Vec<_>>();
    assert_eq!(orders(&a), orders(&b));
    assert_eq!(a.selection.best.aic.to_bits(), b.selection.best.aic.to_bits());
    assert_eq!(a.long, b.long);
}

#[test]
fn forecast_intervals_are_nested() {
    let run = synthetic_run(3);
    for fc in [&run.short, &run.long] {
        for s in &fc.steps {
            assert!(s.se > 0.0);
            assert!(s.lower_95 < s.lower_80, "{s:?}");
            assert!(s.lower_80 < s.mean);
            assert!(s.mean < s.upper_80);
            assert!(s.upper_80 < s.upper_95);
        }
    }
    // Uncertainty grows with the horizon.
    let se: Vec<f64> = run.long.steps.iter().map(|s| s.se).collect();
    assert!(se.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn ljung_box_recomputes_from_residuals_alone() {
    let run = synthetic_run(8);
    let config = small_config();
    let again = ljung_box(&run.selection.best.residuals, config.lb_lag, 0).unwrap();
    assert_eq!(again.statistic.to_bits(), run.residual_check.ljung_box.statistic.to_bits());
    assert_eq!(again.p_value.to_bits(), run.residual_check.ljung_box.p_value.to_bits());
    assert_eq!(again.lag, 20);
    assert_eq!(run.residual_check.accepted, run.residual_check.ljung_box.p_value >= 0.05);
}

#[test]
fn reranking_keeps_the_fitted_candidates() {
    let run = synthetic_run(2);
    let config = small_config();
    let bic = with_criterion(&run, Criterion::Bic, &config).unwrap();
    assert_eq!(bic.selection.criterion, Criterion::Bic);
    assert_eq!(bic.selection.ranked.len(), run.selection.ranked.len());
    let best_bic = bic
        .selection
        .ranked
        .iter()
        .map(|c| c.model.bic)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(bic.selection.best.bic, best_bic);
    assert_eq!(bic.series, run.series);
}

#[test]
fn operator_override_sets_d() {
    let series = SyntheticSource::new(4);
    let config = RunConfig {
        diff_order: Some(1),
        allow_unresolved: false,
        ..small_config()
    };
    let run = run_with_source(&series, &config).unwrap();
    assert!(run.decision.overridden);
    assert_eq!(run.decision.order, 1);
    assert!(run.selection.ranked.iter().all(|c| c.model.order.d == 1));
}

#[test]
fn missing_component_year_is_a_data_error() {
    let mut rows = Vec::new();
    for (indicator, skip) in [("A", None), ("B", Some(1975))] {
        for year in 1970..1990 {
            if Some(year) == skip {
                continue;
            }
            rows.push(IndicatorRow {
                country: "USA".to_string(),
                indicator: indicator.to_string(),
                year,
                value: Some(100.0 + year as f64),
            });
        }
    }
    let config = RunConfig {
        indicators: vec!["A".to_string(), "B".to_string()],
        start_year: 1970,
        end_year: 1989,
        ..small_config()
    };
    let err = run_with_source(&MemorySource::new(rows), &config).unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(err.message().contains("1975"), "{}", err.message());
}

#[test]
fn invalid_horizon_is_a_usage_error() {
    let series = TimeSeries::new(1960, (0..30).map(|t| 10.0 + t as f64).collect()).unwrap();
    let config = RunConfig {
        short_horizon: 0,
        ..small_config()
    };
    let err = run_with_series(series, "memory".to_string(), &config).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn report_json_and_candidate_csv_exports() {
    let run = synthetic_run(21);
    let config = small_config();

    let dir = std::env::temp_dir().join(format!("co2-arima-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("report.json");
    write_report_json(&path, &ReportFile::new(run.clone(), &config)).unwrap();
    let back = read_report_json(&path).unwrap();
    assert_eq!(back.tool, "co2");
    assert_eq!(back.run.selection.best.order, run.selection.best.order);
    assert_eq!(back.run.long.steps.len(), 14);
    assert_eq!(back.run.series.values().len(), 57);
    let orders: Vec<usize> = back.run.differences.iter().map(|d| d.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(back.run.differences[0].series.len(), 57);
    assert_eq!(back.run.differences[2].series.len(), 55);
    assert_eq!(back.run.differences[2].series.start_year(), 1962);
    std::fs::remove_dir_all(&dir).ok();

    let mut buf = Vec::new();
    write_candidates_csv(&mut buf, &run.selection).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("status,rank,p,d,q"));
    assert_eq!(lines.len(), 1 + run.selection.ranked.len() + run.selection.skipped.len());
}
