//! Text sections of the run report.

use crate::app::pipeline::RunOutput;
use crate::diagnostics::ResidualCheck;
use crate::domain::{CandidateModel, ForecastResult, TestResult};
use crate::fit::FitSelection;
use crate::forecast::BaselineReport;
use crate::stationarity::DifferencingDecision;

/// Format the full run summary: data, stationarity, chosen model, diagnostics.
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== co2 - ARIMA pipeline for annual CO2 emissions ===\n");
    out.push_str(&format!("Source: {}\n", run.source));
    out.push_str(&format!("Country: {}\n", run.country));
    out.push_str(&format!("Indicators: {}\n", run.indicators.join(" + ")));
    let (lo, hi) = min_max(run.series.values());
    out.push_str(&format!(
        "Series: n={} | years=[{}, {}] | value=[{:.1}, {:.1}]\n",
        run.series.len(),
        run.series.start_year(),
        run.series.end_year(),
        lo,
        hi
    ));

    out.push('\n');
    out.push_str(&format_stationarity(&run.decision));

    out.push_str("\nChosen model:\n");
    out.push_str(&format_model(&run.selection.best));

    out.push('\n');
    out.push_str(&format_residual_check(&run.residual_check));

    out
}

/// Per-level test table and the resulting differencing decision.
pub fn format_stationarity(decision: &DifferencingDecision) -> String {
    let mut out = String::new();
    out.push_str("Stationarity tests:\n");
    out.push_str(
        format!(
            "{:<3} {:>4} {:>10} {:>8} {:>10} {:>8} {:>10} {:>8} {:<15}\n",
            "d", "n", "ADF", "p", "PP", "p", "KPSS", "p", "verdict"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<3} {:-<4} {:-<10} {:-<8} {:-<10} {:-<8} {:-<10} {:-<8} {:-<15}\n",
            "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');
    for level in &decision.levels {
        out.push_str(
            format!(
                "{:<3} {:>4} {:>10.4} {:>8} {:>10.4} {:>8} {:>10.4} {:>8} {:<15}\n",
                level.order,
                level.n,
                level.adf.statistic,
                fmt_p(&level.adf),
                level.pp.statistic,
                fmt_p(&level.pp),
                level.kpss.statistic,
                fmt_p(&level.kpss),
                level.verdict.label(),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if let Some(level) = decision.levels.first() {
        let nulls: Vec<String> = level
            .tests()
            .iter()
            .map(|t| format!("{} {}", t.test.display_name(), t.test.null().label()))
            .collect();
        out.push_str(&format!("H0: {} (* = rejected)\n", nulls.join(", ")));
    }

    let status = match (decision.overridden, decision.resolved) {
        (true, _) => "set by operator",
        (false, true) => "tests agree",
        (false, false) => "UNRESOLVED at the maximum order",
    };
    out.push_str(&format!("Differencing order: d={} ({status})\n", decision.order));
    out
}

/// Coefficients and fit statistics of one model.
pub fn format_model(m: &CandidateModel) -> String {
    let mut out = String::new();
    out.push_str(&format!("- {}\n", m.order));
    if !m.ar.is_empty() {
        out.push_str(&format!("- ar   : {}\n", fmt_vec(&m.ar)));
    }
    if !m.ma.is_empty() {
        out.push_str(&format!("- ma   : {}\n", fmt_vec(&m.ma)));
    }
    if let Some(mean) = m.mean {
        out.push_str(&format!("- mean : {mean:.6}\n"));
    }
    out.push_str(&format!("- sigma^2={:.4} loglik={:.2}\n", m.sigma2, m.loglik));
    out.push_str(&format!("- AIC={:.2} AICc={:.2} BIC={:.2}\n", m.aic, m.aicc, m.bic));
    out
}

/// Ljung-Box verdict and residual summary.
pub fn format_residual_check(check: &ResidualCheck) -> String {
    let lb = &check.ljung_box;
    let mut out = String::new();
    out.push_str("Residual diagnostics:\n");
    out.push_str(&format!(
        "- Ljung-Box Q={:.4} lag={} p={:.4} -> {}\n",
        lb.statistic,
        lb.lag,
        lb.p_value,
        if check.accepted {
            "accepted (no residual autocorrelation)"
        } else {
            "INADEQUATE (residual autocorrelation)"
        }
    ));
    out.push_str(&format!(
        "- residuals: n={} mean={:.4} sd={:.4}\n",
        check.n, check.mean, check.sd
    ));
    let shown: Vec<String> = check.acf.iter().take(10).map(|r| format!("{r:+.3}")).collect();
    out.push_str(&format!("- acf[1..{}]: {}\n", shown.len(), shown.join(" ")));
    out
}

/// The ranked candidate table (top `top_n`) plus skipped entries.
pub fn format_candidates(selection: &FitSelection, top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Candidates by {} (lower is better):\n",
        selection.criterion.display_name()
    ));
    out.push_str(
        format!(
            "{:<4} {:<14} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            "rank", "model", "score", "loglik", "AIC", "AICc", "BIC"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<4} {:-<14} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');
    for r in selection.ranked.iter().take(top_n) {
        let m = &r.model;
        let chosen = if m.order == selection.best.order { "*" } else { " " };
        out.push_str(
            format!(
                "{:<4} {:<14} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {chosen}\n",
                r.rank,
                m.order.to_string(),
                r.score,
                m.loglik,
                m.aic,
                m.aicc,
                m.bic,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if selection.ranked.len() > top_n {
        out.push_str(&format!("  ... {} more\n", selection.ranked.len() - top_n));
    }
    for s in &selection.skipped {
        out.push_str(&format!("  (skipped {}) {}\n", s.order, s.reason));
    }
    out
}

/// One forecast table.
pub fn format_forecast(title: &str, fc: &ForecastResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title} ({} steps):\n", fc.horizon));
    out.push_str(
        format!(
            "{:<6} {:>14} {:>12} {:>14} {:>14} {:>14} {:>14}\n",
            "year", "forecast", "se", "lo80", "hi80", "lo95", "hi95"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<6} {:-<14} {:-<12} {:-<14} {:-<14} {:-<14} {:-<14}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');
    for s in &fc.steps {
        out.push_str(
            format!(
                "{:<6} {:>14} {:>12} {:>14} {:>14} {:>14} {:>14}\n",
                s.year,
                fmt_num(s.mean),
                fmt_num(s.se),
                fmt_num(s.lower_80),
                fmt_num(s.upper_80),
                fmt_num(s.lower_95),
                fmt_num(s.upper_95),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Holt baseline parameters, the Ljung-Box comparison and its forecasts.
pub fn format_baseline(b: &BaselineReport) -> String {
    let mut out = String::new();
    out.push_str("Baseline (Holt linear trend on ln series):\n");
    out.push_str(&format!(
        "- alpha={:.4} beta={:.4} SSE(log)={:.6}\n",
        b.alpha, b.beta, b.sse
    ));
    out.push_str(&format!(
        "- Ljung-Box ARIMA: Q={:.4} p={:.4} | Holt: Q={:.4} p={:.4}\n",
        b.arima_ljung_box.statistic,
        b.arima_ljung_box.p_value,
        b.holt_ljung_box.statistic,
        b.holt_ljung_box.p_value
    ));
    out.push_str(&format!(
        "- more informative (lower p-value, informal): {}\n",
        b.more_informative.label()
    ));
    out.push('\n');
    out.push_str(&format_forecast("Holt forecast, original scale (short)", &b.short.level));
    out.push('\n');
    out.push_str(&format_forecast("Holt forecast, original scale (long)", &b.long.level));
    out
}

/// Everything `co2 report` prints, in order.
pub fn format_full_report(run: &RunOutput, top_n: usize) -> String {
    let mut out = format_run_summary(run);
    out.push('\n');
    out.push_str(&format_candidates(&run.selection, top_n));
    out.push('\n');
    out.push_str(&format_forecast(
        &format!("{} forecast (short)", run.selection.best.order),
        &run.short,
    ));
    out.push('\n');
    out.push_str(&format_forecast(
        &format!("{} forecast (long)", run.selection.best.order),
        &run.long,
    ));
    if let Some(b) = &run.baseline {
        out.push('\n');
        out.push_str(&format_baseline(b));
    }
    out
}

fn fmt_p(t: &TestResult) -> String {
    let mark = if t.rejects_null() { "*" } else { "" };
    format!("{:.4}{mark}", t.p_value)
}

fn fmt_num(v: f64) -> String {
    if v.abs() >= 1e4 {
        format!("{v:.1}")
    } else {
        format!("{v:.4}")
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArimaOrder, ForecastStep, TestKind};
    use crate::stationarity::{LevelReport, Verdict};

    fn level(order: usize, verdict: Verdict) -> LevelReport {
        LevelReport {
            order,
            n: 57 - order,
            adf: TestResult::new(TestKind::AugmentedDickeyFuller, -1.2, 0.9, 3),
            pp: TestResult::new(TestKind::PhillipsPerron, -3.0, 0.01, 3),
            kpss: TestResult::new(TestKind::Kpss, 0.2, 0.1, 1),
            verdict,
        }
    }

    #[test]
    fn stationarity_table_marks_rejections_and_status() {
        let decision = DifferencingDecision {
            order: 1,
            resolved: true,
            overridden: false,
            levels: vec![level(0, Verdict::Mixed), level(1, Verdict::Stationary)],
        };
        let text = format_stationarity(&decision);
        assert!(text.contains("0.0100*"));
        assert!(text.contains("0.9000 "));
        assert!(text.contains("d=1 (tests agree)"));
        assert!(text.contains("H0: ADF unit root, Phillips-Perron unit root, KPSS stationary"));
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn forecast_table_has_one_row_per_step() {
        let fc = ForecastResult {
            horizon: 2,
            steps: (0..2)
                .map(|i| ForecastStep {
                    year: 2017 + i,
                    mean: 5.0e6,
                    se: 1.0e5,
                    lower_80: 4.8e6,
                    upper_80: 5.2e6,
                    lower_95: 4.7e6,
                    upper_95: 5.3e6,
                })
                .collect(),
        };
        let text = format_forecast("ARIMA(0,2,3) forecast (short)", &fc);
        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().nth(3).unwrap().starts_with("2017"));
        assert!(text.contains("5000000.0"));
    }

    #[test]
    fn model_summary_omits_absent_terms() {
        let m = CandidateModel {
            order: ArimaOrder::new(0, 2, 1),
            ar: Vec::new(),
            ma: vec![-0.5],
            mean: None,
            sigma2: 1.0,
            loglik: -5.0,
            aic: 14.0,
            aicc: 14.5,
            bic: 15.0,
            n_used: 10,
            residuals: Vec::new(),
            iterations: 1,
        };
        let text = format_model(&m);
        assert!(text.contains("ARIMA(0,2,1)"));
        assert!(!text.contains("ar   :"));
        assert!(text.contains("ma   : [-0.500000]"));
    }
}
