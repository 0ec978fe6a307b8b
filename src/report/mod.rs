//! Reporting utilities: formatted terminal output for a run.
//!
//! Formatting lives here so the numerical code stays free of presentation and
//! output changes are localized.

pub mod format;

pub use format::*;
