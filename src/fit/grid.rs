//! Candidate order grid.
//!
//! The search is an explicit, bounded enumeration of `(p, q)` at a fixed `d`,
//! in row-major order (`p` outer, `q` inner). Downstream ranking relies on
//! this order being stable.

use crate::domain::ArimaOrder;
use crate::error::AppError;

/// Largest AR or MA order accepted on the command line.
pub const MAX_ARMA_ORDER: usize = 10;

/// All orders `(p, d, q)` with `p ≤ max_p`, `q ≤ max_q`.
pub fn order_grid(max_p: usize, max_q: usize, d: usize) -> Result<Vec<ArimaOrder>, AppError> {
    if max_p > MAX_ARMA_ORDER || max_q > MAX_ARMA_ORDER {
        return Err(AppError::new(
            2,
            format!("AR/MA orders must be <= {MAX_ARMA_ORDER} (got max_p={max_p}, max_q={max_q})."),
        ));
    }

    let mut out = Vec::with_capacity((max_p + 1) * (max_q + 1));
    for p in 0..=max_p {
        for q in 0..=max_q {
            out.push(ArimaOrder::new(p, d, q));
        }
    }
    Ok(out)
}
