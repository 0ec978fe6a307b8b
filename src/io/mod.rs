//! Input/output helpers.
//!
//! - CSV source of indicator rows (`ingest`)
//! - candidate/forecast CSV exports (`export`)
//! - report JSON read/write (`report_file`)

pub mod export;
pub mod ingest;
pub mod report_file;

pub use export::*;
pub use ingest::*;
pub use report_file::*;
