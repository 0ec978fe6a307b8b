//! `co2-arima` library crate.
//!
//! Box-Jenkins modelling of annual CO2 emissions: fetch and merge the fuel
//! components, pick the differencing order with unit-root and stationarity
//! tests, search the ARIMA(p,d,q) grid by exact likelihood, check the
//! residuals and forecast with prediction intervals.
//!
//! The binary (`co2`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - sources and renderers can be swapped without touching the statistics

pub mod app;
pub mod cli;
pub mod data;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod stationarity;
pub mod tui;
