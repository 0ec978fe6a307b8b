//! Critical-value tables for the unit-root and stationarity tests.
//!
//! Rows are indexed by tail probability, columns by sample size. p-values are
//! read off by interpolating first across sample size, then across the
//! statistic; both steps clamp at the table edges.

use crate::math::interpolate_clamped;

/// Sample sizes of the table columns (the last stands in for ∞).
pub const SAMPLE_SIZES: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 100_000.0];

/// Tail probabilities of the table rows.
pub const PROBABILITIES: [f64; 8] = [0.01, 0.025, 0.05, 0.10, 0.90, 0.95, 0.975, 0.99];

/// Dickey–Fuller τ with constant and trend (Banerjee et al. 1993).
pub const ADF_TAU: [[f64; 6]; 8] = [
    [-4.38, -4.15, -4.04, -3.99, -3.98, -3.96],
    [-3.95, -3.80, -3.73, -3.69, -3.68, -3.66],
    [-3.60, -3.50, -3.45, -3.43, -3.42, -3.41],
    [-3.24, -3.18, -3.15, -3.13, -3.13, -3.12],
    [-1.14, -1.19, -1.22, -1.23, -1.24, -1.25],
    [-0.80, -0.87, -0.90, -0.92, -0.93, -0.94],
    [-0.50, -0.58, -0.62, -0.64, -0.65, -0.66],
    [-0.15, -0.24, -0.28, -0.31, -0.32, -0.33],
];

/// Phillips–Perron Z(α) with constant and trend.
pub const PP_Z_ALPHA: [[f64; 6]; 8] = [
    [-22.5, -25.7, -27.4, -28.4, -28.9, -29.5],
    [-19.9, -22.4, -23.6, -24.4, -24.8, -25.1],
    [-17.9, -19.8, -20.7, -21.3, -21.5, -21.8],
    [-15.6, -16.8, -17.5, -18.0, -18.1, -18.3],
    [-3.66, -3.71, -3.74, -3.75, -3.76, -3.77],
    [-2.51, -2.60, -2.62, -2.64, -2.65, -2.66],
    [-1.53, -1.66, -1.73, -1.78, -1.78, -1.79],
    [-0.43, -0.65, -0.75, -0.82, -0.84, -0.87],
];

/// Upper-tail probabilities of the KPSS table.
pub const KPSS_PROBABILITIES: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
pub const KPSS_LEVEL: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
pub const KPSS_TREND: [f64; 4] = [0.119, 0.146, 0.176, 0.216];

/// p-value of `stat` for a sample of size `n` from a two-way table.
pub fn table_p_value(table: &[[f64; 6]; 8], n: f64, stat: f64) -> f64 {
    let at_n: Vec<f64> = table
        .iter()
        .map(|row| interpolate_clamped(&SAMPLE_SIZES, row, n))
        .collect();
    interpolate_clamped(&at_n, &PROBABILITIES, stat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_table_entries_map_to_their_probability() {
        assert!((table_p_value(&ADF_TAU, 100.0, -3.45) - 0.05).abs() < 1e-12);
        assert!((table_p_value(&PP_Z_ALPHA, 25.0, -15.6) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn statistics_outside_the_table_saturate() {
        assert_eq!(table_p_value(&ADF_TAU, 56.0, -10.0), 0.01);
        assert_eq!(table_p_value(&ADF_TAU, 56.0, 2.0), 0.99);
    }

    #[test]
    fn sample_size_is_interpolated() {
        // Halfway between n=25 (-3.60) and n=50 (-3.50) at p=0.05.
        let p = table_p_value(&ADF_TAU, 37.5, -3.55);
        assert!((p - 0.05).abs() < 1e-12);
    }
}
