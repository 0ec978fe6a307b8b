//! Read/write the JSON report file.
//!
//! The report file is the portable form of a run: the full [`RunOutput`] plus
//! enough metadata to re-render plots without refitting.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::RunConfig;
use crate::error::AppError;

pub const TOOL_NAME: &str = "co2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub start_year: i32,
    pub end_year: i32,
    pub max_p: usize,
    pub max_q: usize,
    pub run: RunOutput,
}

impl ReportFile {
    pub fn new(run: RunOutput, config: &RunConfig) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            start_year: config.start_year,
            end_year: config.end_year,
            max_p: config.max_p,
            max_q: config.max_q,
            run,
        }
    }
}

/// Write a report JSON file.
pub fn write_report_json(path: &Path, report: &ReportFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: ReportFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))?;
    if report.tool != TOOL_NAME {
        return Err(AppError::new(
            2,
            format!("'{}' was written by '{}', not '{TOOL_NAME}'.", path.display(), report.tool),
        ));
    }
    Ok(report)
}
