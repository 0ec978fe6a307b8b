//! Model search orchestration.
//!
//! Responsibilities:
//!
//! - enumerate the `(p, q)` grid at the chosen `d`
//! - fit each candidate (parallel)
//! - rank by an injectable score and pick the winner

pub mod fitter;
pub mod grid;
pub mod selection;

pub use fitter::*;
pub use grid::*;
pub use selection::*;
