//! Domain model: series, test results, candidate models, forecasts, config.

pub mod types;

pub use types::*;
