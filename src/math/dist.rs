//! Thin wrappers over `statrs` distributions used across the crate.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use crate::error::{StatsError, StatsResult};

/// Two-sided standard-normal critical value for a central interval.
///
/// `level = 0.95` gives ≈ 1.96.
pub fn normal_critical(level: f64) -> StatsResult<f64> {
    if !(level.is_finite() && level > 0.0 && level < 1.0) {
        return Err(StatsError::InvalidParameter(format!(
            "interval level must be in (0, 1), got {level}"
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| StatsError::InvalidParameter(format!("normal distribution: {e}")))?;
    Ok(normal.inverse_cdf(0.5 + level / 2.0))
}

/// Upper-tail probability `P(X > x)` for `X ~ χ²(df)`.
pub fn chi_squared_sf(x: f64, df: usize) -> StatsResult<f64> {
    if df == 0 {
        return Err(StatsError::InvalidParameter(
            "chi-squared degrees of freedom must be positive".to_string(),
        ));
    }
    let chi = ChiSquared::new(df as f64)
        .map_err(|e| StatsError::InvalidParameter(format!("chi-squared distribution: {e}")))?;
    Ok(chi.sf(x))
}
