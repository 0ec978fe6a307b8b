//! Numerical building blocks: differencing, least squares, interpolation,
//! distributions and simplex minimization.

pub mod diff;
pub mod dist;
pub mod interp;
pub mod ols;
pub mod optim;

pub use diff::*;
pub use dist::*;
pub use interp::*;
pub use ols::*;
pub use optim::*;
