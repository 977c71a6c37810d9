//! Trend fits for scatter plots.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::util::{f64_to_usize_bounded, usize_to_f64};

/// Upper tail probability of the two-sided 95 % band.
const BAND_QUANTILE: f64 = 0.975;

/// Robustifying passes of the smoothed trend.
pub const LOWESS_ITERATIONS: usize = 2;

/// Ordinary least squares line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    n: usize,
    x_mean: f64,
    sxx: f64,
    /// Residual standard error.
    residual_se: f64,
    /// Student-t quantile with `n - 2` degrees of freedom.
    t_quantile: f64,
}

impl LinearFit {
    /// Fits `points`.
    ///
    /// Returns `None` for fewer than two points or constant x.
    #[must_use]
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        let n = points.len();
        if n < 2 {
            return None;
        }
        let nf = usize_to_f64(n);
        let x_mean = points.iter().map(|p| p.0).sum::<f64>() / nf;
        let y_mean = points.iter().map(|p| p.1).sum::<f64>() / nf;
        let sxx: f64 = points.iter().map(|p| (p.0 - x_mean).powi(2)).sum();
        if sxx <= 0.0 {
            return None;
        }
        let sxy: f64 = points
            .iter()
            .map(|p| (p.0 - x_mean) * (p.1 - y_mean))
            .sum();
        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;
        let sse: f64 = points
            .iter()
            .map(|p| (p.1 - (intercept + slope * p.0)).powi(2))
            .sum();
        let (residual_se, t_quantile) = if n > 2 {
            let t = StudentsT::new(0.0, 1.0, nf - 2.0).ok()?;
            ((sse / (nf - 2.0)).sqrt(), t.inverse_cdf(BAND_QUANTILE))
        } else {
            (0.0, 0.0)
        };
        Some(Self {
            slope,
            intercept,
            n,
            x_mean,
            sxx,
            residual_se,
            t_quantile,
        })
    }

    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Half width of the 95 % confidence band of the mean response at `x`.
    #[must_use]
    pub fn confidence_half_width(&self, x: f64) -> f64 {
        let leverage = 1.0 / usize_to_f64(self.n) + (x - self.x_mean).powi(2) / self.sxx;
        self.t_quantile * self.residual_se * leverage.sqrt()
    }

    /// Lower and upper band curves over `grid`.
    #[must_use]
    pub fn confidence_band(&self, grid: &[f64]) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
        grid.iter()
            .map(|&x| {
                let y = self.predict(x);
                let h = self.confidence_half_width(x);
                ([x, y - h], [x, y + h])
            })
            .unzip()
    }
}

fn tricube(u: f64) -> f64 {
    if u >= 1.0 {
        0.0
    } else {
        (1.0 - u.powi(3)).powi(3)
    }
}

fn bisquare(u: f64) -> f64 {
    if u.abs() >= 1.0 {
        0.0
    } else {
        (1.0 - u * u).powi(2)
    }
}

fn median(values: &mut [f64]) -> f64 {
    let len = values.len();
    let (lower, mid, _) = values.select_nth_unstable_by(len / 2, f64::total_cmp);
    if len % 2 == 0 {
        let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (below + *mid) / 2.0
    } else {
        *mid
    }
}

/// Weighted local line over the window `lo..lo + width` of sorted `xs`,
/// evaluated at `x0`.
fn local_fit(
    xs: &[f64],
    ys: &[f64],
    robustness: &[f64],
    lo: usize,
    width: usize,
    x0: f64,
) -> Option<f64> {
    let hi = lo + width;
    let h = (x0 - xs[lo]).max(xs[hi - 1] - x0);
    let (mut sw, mut swx, mut swy, mut swxx, mut swxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for ((&x, &y), &r) in xs[lo..hi].iter().zip(&ys[lo..hi]).zip(&robustness[lo..hi]) {
        let d = (x - x0).abs();
        let local = if h > 0.0 {
            tricube(d / h)
        } else if d == 0.0 {
            1.0
        } else {
            0.0
        };
        let w = local * r;
        sw += w;
        swx += w * x;
        swy += w * y;
        swxx += w * x * x;
        swxy += w * x * y;
    }
    if sw <= 0.0 {
        return None;
    }
    let denom = sw * swxx - swx * swx;
    if denom.abs() <= f64::EPSILON * sw * swxx.abs().max(1.0) {
        return Some(swy / sw);
    }
    let slope = (sw * swxy - swx * swy) / denom;
    let intercept = (swy - slope * swx) / sw;
    Some(intercept + slope * x0)
}

/// Fits the local lines at every `grid` position.
///
/// The `width` nearest samples of an ascending `x0` form a window that only
/// moves right, so it is found by sliding rather than sorting distances.
fn fit_grid(
    xs: &[f64],
    ys: &[f64],
    robustness: &[f64],
    width: usize,
    grid: &[f64],
) -> Vec<[f64; 2]> {
    let n = xs.len();
    let mut lo = 0;
    let mut curve = Vec::with_capacity(grid.len());
    for &x0 in grid {
        while lo + width < n && x0 - xs[lo] > xs[lo + width] - x0 {
            lo += 1;
        }
        if let Some(y) = local_fit(xs, ys, robustness, lo, width, x0) {
            curve.push([x0, y]);
        }
    }
    curve
}

/// Linear interpolation of an ascending curve, flat beyond its ends.
fn interpolate(curve: &[[f64; 2]], x: f64) -> Option<f64> {
    let (first, last) = (curve.first()?, curve.last()?);
    if x <= first[0] {
        return Some(first[1]);
    }
    if x >= last[0] {
        return Some(last[1]);
    }
    let i = curve.partition_point(|p| p[0] <= x);
    let ([x0, y0], [x1, y1]) = (curve[i - 1], curve[i]);
    if x1 == x0 {
        return Some(y0);
    }
    Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
}

/// Locally weighted regression (LOWESS).
///
/// # Arguments
///
/// * `points` - Finite `(x, y)` samples in any order
/// * `frac` - Fraction of the samples in each local window
/// * `iterations` - Robustifying passes after the initial fit
/// * `grid` - Ascending x positions the curve is evaluated at
///
/// Residuals for the robustifying passes are read off the grid curve by
/// linear interpolation, so each pass costs `grid.len()` local fits.
#[must_use]
pub fn lowess(
    points: &[(f64, f64)],
    frac: f64,
    iterations: usize,
    grid: &[f64],
) -> Vec<[f64; 2]> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    let n = sorted.len();
    if n < 2 || grid.is_empty() {
        return Vec::new();
    }
    let xs: Vec<f64> = sorted.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = sorted.iter().map(|p| p.1).collect();

    let width = f64_to_usize_bounded((frac * usize_to_f64(n)).ceil(), n + 1)
        .unwrap_or(n)
        .clamp(2, n);

    let mut robustness = vec![1.0; n];
    let mut curve = fit_grid(&xs, &ys, &robustness, width, grid);
    let magnitude = ys.iter().map(|y| y.abs()).sum::<f64>() / usize_to_f64(n);

    for _ in 0..iterations {
        let residuals: Vec<f64> = xs
            .iter()
            .zip(&ys)
            .map(|(&x, &y)| interpolate(&curve, x).map_or(0.0, |fitted| y - fitted))
            .collect();
        let mut abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
        let scale = 6.0 * median(&mut abs);
        if scale <= 1e-7 * magnitude {
            break;
        }
        for (r, res) in robustness.iter_mut().zip(&residuals) {
            *r = bisquare(res / scale);
        }
        curve = fit_grid(&xs, &ys, &robustness, width, grid);
    }
    curve
}
