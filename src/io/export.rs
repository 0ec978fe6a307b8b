//! CSV exports of the candidate table and forecast tables.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::RunOutput;
use crate::domain::ForecastResult;
use crate::error::AppError;
use crate::fit::FitSelection;

#[derive(Debug, Serialize)]
struct CandidateRecord {
    status: &'static str,
    rank: Option<usize>,
    p: usize,
    d: usize,
    q: usize,
    score: Option<f64>,
    loglik: Option<f64>,
    aic: Option<f64>,
    aicc: Option<f64>,
    bic: Option<f64>,
    sigma2: Option<f64>,
    note: String,
}

#[derive(Debug, Serialize)]
struct ForecastRecord<'a> {
    model: &'a str,
    scale: &'a str,
    horizon: usize,
    step: usize,
    year: i32,
    mean: f64,
    se: f64,
    lower_80: f64,
    upper_80: f64,
    lower_95: f64,
    upper_95: f64,
}

/// Ranked candidates followed by skipped grid entries.
pub fn write_candidates_csv<W: Write>(out: W, selection: &FitSelection) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for r in &selection.ranked {
        let m = &r.model;
        writer
            .serialize(CandidateRecord {
                status: "fitted",
                rank: Some(r.rank),
                p: m.order.p,
                d: m.order.d,
                q: m.order.q,
                score: Some(r.score),
                loglik: Some(m.loglik),
                aic: Some(m.aic),
                aicc: Some(m.aicc),
                bic: Some(m.bic),
                sigma2: Some(m.sigma2),
                note: String::new(),
            })
            .map_err(|e| AppError::new(2, format!("Failed to write candidate row: {e}")))?;
    }
    for s in &selection.skipped {
        writer
            .serialize(CandidateRecord {
                status: "skipped",
                rank: None,
                p: s.order.p,
                d: s.order.d,
                q: s.order.q,
                score: None,
                loglik: None,
                aic: None,
                aicc: None,
                bic: None,
                sigma2: None,
                note: s.reason.clone(),
            })
            .map_err(|e| AppError::new(2, format!("Failed to write candidate row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush candidate CSV: {e}")))?;
    Ok(())
}

/// ARIMA and baseline forecasts for both horizons, one row per step.
pub fn write_forecast_csv<W: Write>(out: W, run: &RunOutput) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    let mut tables: Vec<(&str, &str, &ForecastResult)> = vec![
        ("arima", "level", &run.short),
        ("arima", "level", &run.long),
    ];
    if let Some(b) = &run.baseline {
        tables.push(("holt", "log", &b.short.log));
        tables.push(("holt", "level", &b.short.level));
        tables.push(("holt", "log", &b.long.log));
        tables.push(("holt", "level", &b.long.level));
    }

    for (model, scale, fc) in tables {
        for (i, s) in fc.steps.iter().enumerate() {
            writer
                .serialize(ForecastRecord {
                    model,
                    scale,
                    horizon: fc.horizon,
                    step: i + 1,
                    year: s.year,
                    mean: s.mean,
                    se: s.se,
                    lower_80: s.lower_80,
                    upper_80: s.upper_80,
                    lower_95: s.lower_95,
                    upper_95: s.upper_95,
                })
                .map_err(|e| AppError::new(2, format!("Failed to write forecast row: {e}")))?;
        }
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush forecast CSV: {e}")))?;
    Ok(())
}

pub fn export_candidates(path: &Path, selection: &FitSelection) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_candidates_csv(file, selection)
}

pub fn export_forecasts(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_forecast_csv(file, run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArimaOrder, CandidateModel, Criterion};
    use crate::fit::{rank_candidates, SkippedCandidate};

    #[test]
    fn candidate_csv_lists_fitted_then_skipped() {
        let model = CandidateModel {
            order: ArimaOrder::new(0, 2, 1),
            ar: Vec::new(),
            ma: vec![0.3],
            mean: None,
            sigma2: 2.0,
            loglik: -10.0,
            aic: 24.0,
            aicc: 24.5,
            bic: 26.0,
            n_used: 20,
            residuals: Vec::new(),
            iterations: 5,
        };
        let ranked = rank_candidates(std::slice::from_ref(&model), &Criterion::Aic);
        let selection = FitSelection {
            criterion: Criterion::Aic,
            best: model,
            ranked,
            skipped: vec![SkippedCandidate {
                order: ArimaOrder::new(5, 2, 5),
                reason: "insufficient data".to_string(),
            }],
        };

        let mut buf = Vec::new();
        write_candidates_csv(&mut buf, &selection).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "status,rank,p,d,q,score,loglik,aic,aicc,bic,sigma2,note");
        assert!(lines[1].starts_with("fitted,1,0,2,1,24.0,"));
        assert!(lines[2].starts_with("skipped,,5,2,5,,"));
        assert!(lines[2].ends_with("insufficient data"));
    }
}
