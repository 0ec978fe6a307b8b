//! Forecasting models.
//!
//! - ARIMA estimation by exact likelihood (`arima`)
//! - the ARMA state-space form and its Kalman filter (`kalman`)
//! - Holt's linear trend smoothing, the naive baseline (`holt`)

pub mod arima;
pub mod holt;
pub mod kalman;

pub use arima::*;
pub use holt::*;
pub use kalman::*;
