//! Kernel density estimates for distribution plots.

use crate::util::{mean_std, usize_to_f64};

/// Scott's rule bandwidth: `1.06 * sd * n^(-1/5)`.
#[must_use]
pub fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    let (_, sd) = mean_std(values)?;
    let bw = 1.06 * sd * usize_to_f64(values.len()).powf(-0.2);
    (bw > 0.0).then_some(bw)
}

/// Gaussian kernel density of `values` sampled at `grid`.
///
/// Returns `None` for fewer than two finite values or zero spread.
#[must_use]
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<[f64; 2]>> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let bw = scott_bandwidth(&finite)?;
    let norm = 1.0 / (usize_to_f64(finite.len()) * bw * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        grid.iter()
            .map(|&x| {
                let density: f64 = finite
                    .iter()
                    .map(|&v| {
                        let z = (x - v) / bw;
                        (-0.5 * z * z).exp()
                    })
                    .sum();
                [x, density * norm]
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::linspace;
    use approx::assert_relative_eq;

    #[test]
    fn test_kde_integrates_to_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.0];
        let grid = linspace(-10.0, 15.0, 2001);
        let density = gaussian_kde(&values, &grid).unwrap();
        let step = grid[1] - grid[0];
        let area: f64 = density.iter().map(|p| p[1] * step).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_kde_needs_spread() {
        assert!(gaussian_kde(&[3.0, 3.0], &[3.0]).is_none());
        assert!(gaussian_kde(&[3.0], &[3.0]).is_none());
    }
}
