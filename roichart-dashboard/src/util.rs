//! Numeric conversion and sampling helpers.

/// Convert usize to f64 with allowed precision loss.
#[allow(clippy::cast_precision_loss)]
pub fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

/// Convert f64 to usize with bounds checking.
///
/// Returns `None` if the value is not finite, negative, or >= `max_exclusive`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f64_to_usize_bounded(value: f64, max_exclusive: usize) -> Option<usize> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if value >= usize_to_f64(max_exclusive) {
        return None;
    }
    Some(value as usize)
}

/// `count` evenly spaced samples from `min` to `max` inclusive.
#[must_use]
pub fn linspace(min: f64, max: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / usize_to_f64(count - 1);
            (0..count).map(|i| min + step * usize_to_f64(i)).collect()
        }
    }
}

/// Finite `(x, y)` pairs.
#[must_use]
pub fn finite_pairs(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect()
}

/// Mean and sample standard deviation.
#[must_use]
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = usize_to_f64(values.len());
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, var.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_bounded_cast() {
        assert_eq!(f64_to_usize_bounded(2.7, 10), Some(2));
        assert_eq!(f64_to_usize_bounded(10.0, 10), None);
        assert_eq!(f64_to_usize_bounded(f64::NAN, 10), None);
        assert_eq!(f64_to_usize_bounded(-1.0, 10), None);
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(std, (32.0_f64 / 7.0).sqrt());
        assert!(mean_std(&[1.0]).is_none());
    }
}
