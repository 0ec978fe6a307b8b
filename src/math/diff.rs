//! Difference operator and its inverse.
//!
//! `difference(x, k)` applies `Δ` k times. The inverse needs one initial value
//! per level: `heads[j]` is the first element of the j-times differenced series.
//! With those, `integrate` rebuilds the original by cumulative sums.

/// Apply the difference operator `k` times.
///
/// The result has `x.len() - k` elements (empty if `k >= x.len()`).
pub fn difference(x: &[f64], k: usize) -> Vec<f64> {
    let mut out = x.to_vec();
    for _ in 0..k {
        if out.len() < 2 {
            return Vec::new();
        }
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

/// First element of each of the `0..k` difference levels.
pub fn heads(x: &[f64], k: usize) -> Vec<f64> {
    (0..k)
        .filter_map(|j| difference(x, j).first().copied())
        .collect()
}

/// Last element of each of the `0..k` difference levels.
pub fn tails(x: &[f64], k: usize) -> Vec<f64> {
    (0..k)
        .filter_map(|j| difference(x, j).last().copied())
        .collect()
}

/// Invert `difference` given the per-level initial values.
///
/// `heads.len()` is the number of differencing steps to undo.
pub fn integrate(diffed: &[f64], heads: &[f64]) -> Vec<f64> {
    let mut out = diffed.to_vec();
    for &head in heads.iter().rev() {
        let mut level = Vec::with_capacity(out.len() + 1);
        let mut acc = head;
        level.push(acc);
        for &d in &out {
            acc += d;
            level.push(acc);
        }
        out = level;
    }
    out
}

/// Integrate future differences forward from the last observed levels.
///
/// `tails[j]` is the last element of the j-times differenced history. The
/// output has the same length as `future` and lives on the original scale.
pub fn integrate_forward(future: &[f64], tails: &[f64]) -> Vec<f64> {
    let mut out = future.to_vec();
    for &tail in tails.iter().rev() {
        let mut acc = tail;
        for v in out.iter_mut() {
            acc += *v;
            *v = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_difference_of_quadratic_is_constant() {
        let x: Vec<f64> = (0..8).map(|t| (t * t) as f64).collect();
        let d2 = difference(&x, 2);
        assert_eq!(d2.len(), 6);
        assert!(d2.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn integrate_undoes_difference() {
        let x = [3.0, 7.0, 4.0, 10.0, 12.0, 11.0];
        for k in 0..=2 {
            let d = difference(&x, k);
            let back = integrate(&d, &heads(&x, k));
            assert_eq!(back, x.to_vec(), "k={k}");
        }
    }

    #[test]
    fn integrate_forward_continues_linear_trend() {
        // x = 1, 3, 5, 7 ; second differences are zero, so continuing with zeros
        // extends the line.
        let x = [1.0, 3.0, 5.0, 7.0];
        let out = integrate_forward(&[0.0, 0.0, 0.0], &tails(&x, 2));
        assert_eq!(out, vec![9.0, 11.0, 13.0]);
    }

    #[test]
    fn difference_too_short_is_empty() {
        assert!(difference(&[1.0], 1).is_empty());
        assert!(difference(&[1.0, 2.0], 3).is_empty());
    }
}
