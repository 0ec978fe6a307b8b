//! Piecewise-linear interpolation with flat extrapolation.
//!
//! The unit-root tests read p-values off small critical-value tables. Outside
//! the tabulated range the nearest edge value is returned, so reported p-values
//! saturate at the table bounds (e.g. "0.01" really means "≤ 0.01").

/// Interpolate `y(x)` through the points `(xs[i], ys[i])`.
///
/// `xs` need not be sorted. Returns `NaN` for empty input or non-finite `x`.
pub fn interpolate_clamped(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 || !x.is_finite() {
        return f64::NAN;
    }

    let mut pts: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).take(n).collect();
    pts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let (x_lo, y_lo) = pts[0];
    let (x_hi, y_hi) = pts[n - 1];
    if x <= x_lo {
        return y_lo;
    }
    if x >= x_hi {
        return y_hi;
    }

    for w in pts.windows(2) {
        let (x0, y0) = w[0];
        let (x1, y1) = w[1];
        if x >= x0 && x <= x1 {
            if x1 == x0 {
                return y0;
            }
            let u = (x - x0) / (x1 - x0);
            return y0 + u * (y1 - y0);
        }
    }

    y_hi
}
