//! 1D/2D histograms and bin-count selection.
//!
//! Binning follows numpy conventions: `n` equal-width bins over `[min, max]`,
//! every bin half-open except the last one, which also includes `max`.

use tracing::{debug, warn};

use crate::math::stats::{min_max, std_dev};

/// Bin count used when the requested or derived binning is unusable.
pub const FALLBACK_BINS: usize = 50;

/// Upper bound on Scott's rule counts; beyond this the data is treated as
/// pathological and the fallback is used. Explicit requests are not capped.
pub const MAX_BINS: usize = 10_000;

/// Scott's rule bin width: `3.5·σ·n^(-1/3)`.
pub fn scott_bin_width(values: &[f64]) -> Option<f64> {
    let sigma = std_dev(values)?;
    Some(3.5 * sigma / (values.len() as f64).cbrt())
}

/// Resolve the number of bins for `values`.
///
/// An explicit positive request wins. Otherwise the count is derived from the
/// Scott's rule width; any invalid derivation (zero width, non-finite values,
/// absurd counts) falls back to [`FALLBACK_BINS`] instead of failing.
pub fn resolve_bin_count(values: &[f64], requested: Option<usize>) -> usize {
    if let Some(n) = requested {
        if n > 0 {
            return n;
        }
        warn!(requested = n, fallback = FALLBACK_BINS, "invalid bin request, using fallback");
        return FALLBACK_BINS;
    }

    let derived = scott_bin_width(values)
        .zip(min_max(values))
        .and_then(|(width, (lo, hi))| {
            if !(width.is_finite() && width > 0.0) {
                return None;
            }
            let count = ((hi - lo) / width).ceil();
            if count.is_finite() && count >= 1.0 && count <= MAX_BINS as f64 {
                Some(count as usize)
            } else {
                None
            }
        });

    derived.unwrap_or_else(|| {
        debug!("Scott's rule produced invalid bin edges, using fallback");
        FALLBACK_BINS
    })
}

/// Range used for binning. A degenerate range is widened by ±0.5.
pub fn bin_range(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) }
}

/// Index of the bin containing `v`, or `None` when `v` is outside the edges.
fn bin_index(v: f64, lo: f64, hi: f64, n: usize) -> Option<usize> {
    if !(v >= lo && v <= hi) || n == 0 {
        return None;
    }
    if v == hi {
        return Some(n - 1);
    }
    let idx = ((v - lo) / (hi - lo) * n as f64).floor() as usize;
    Some(idx.min(n - 1))
}

pub fn edges(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    crate::domain::linspace(lo, hi, n + 1)
}

/// 1D histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1d {
    pub edges: Vec<f64>,
    pub counts: Vec<f64>,
}

impl Histogram1d {
    pub fn new(values: &[f64], bins: usize, range: (f64, f64)) -> Self {
        let (lo, hi) = bin_range(range.0, range.1);
        let bins = bins.max(1);
        let mut counts = vec![0.0; bins];
        for &v in values {
            if let Some(i) = bin_index(v, lo, hi, bins) {
                counts[i] += 1.0;
            }
        }
        Self {
            edges: edges(lo, hi, bins),
            counts,
        }
    }

}

/// 2D histogram, `counts[ix][iy]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2d {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    pub counts: Vec<Vec<f64>>,
}

impl Histogram2d {
    pub fn new(
        x: &[f64],
        y: &[f64],
        bins: (usize, usize),
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Self {
        let (x_lo, x_hi) = bin_range(x_range.0, x_range.1);
        let (y_lo, y_hi) = bin_range(y_range.0, y_range.1);
        let nx = bins.0.max(1);
        let ny = bins.1.max(1);
        let mut counts = vec![vec![0.0; ny]; nx];
        for (&xv, &yv) in x.iter().zip(y.iter()) {
            if let (Some(i), Some(j)) = (bin_index(xv, x_lo, x_hi, nx), bin_index(yv, y_lo, y_hi, ny)) {
                counts[i][j] += 1.0;
            }
        }
        Self {
            x_edges: edges(x_lo, x_hi, nx),
            y_edges: edges(y_lo, y_hi, ny),
            counts,
        }
    }

    pub fn x_centers(&self) -> Vec<f64> {
        centers(&self.x_edges)
    }

    pub fn y_centers(&self) -> Vec<f64> {
        centers(&self.y_edges)
    }

    /// Min-max normalized counts in `[0, 1]`, transposed to `[iy][ix]` so rows
    /// follow the vertical axis. A flat histogram normalizes to zeros.
    pub fn normalized_rows(&self) -> Vec<Vec<f64>> {
        let flat: Vec<f64> = self.counts.iter().flatten().copied().collect();
        let (lo, hi) = min_max(&flat).unwrap_or((0.0, 0.0));
        let span = hi - lo;
        let nx = self.counts.len();
        let ny = self.counts.first().map_or(0, Vec::len);
        (0..ny)
            .map(|iy| {
                (0..nx)
                    .map(|ix| {
                        if span > 0.0 {
                            (self.counts[ix][iy] - lo) / span
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

fn centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    #[test]
    fn scott_width_for_normal_sample() {
        let mut rng = StdRng::seed_from_u64(11);
        let sigma = 3.0;
        let normal = Normal::new(0.0, sigma).unwrap();
        let n = 8000;
        let sample: Vec<f64> = (0..n).map(|_| normal.sample(&mut rng)).collect();

        let width = scott_bin_width(&sample).unwrap();
        let expected = 3.5 * sigma * (n as f64).powf(-1.0 / 3.0);
        assert!((width / expected - 1.0).abs() < 0.05, "width={width} expected={expected}");

        let bins = resolve_bin_count(&sample, None);
        assert!(bins > 1 && bins < FALLBACK_BINS * 4);
    }

    #[test]
    fn constant_data_falls_back_to_default_bins() {
        let sample = vec![1.5; 100];
        assert_eq!(resolve_bin_count(&sample, None), FALLBACK_BINS);
    }

    #[test]
    fn explicit_requests_win_and_zero_falls_back() {
        let sample = vec![1.0, 2.0, 3.0];
        assert_eq!(resolve_bin_count(&sample, Some(0)), FALLBACK_BINS);
        assert_eq!(resolve_bin_count(&sample, Some(MAX_BINS + 1)), MAX_BINS + 1);
        assert_eq!(resolve_bin_count(&sample, Some(7)), 7);
        assert_eq!(resolve_bin_count(&[], None), FALLBACK_BINS);
    }

    #[test]
    fn histogram_includes_right_edge() {
        let h = Histogram1d::new(&[0.0, 0.5, 1.0, 2.0, 2.0], 2, (0.0, 2.0));
        assert_eq!(h.counts, vec![2.0, 3.0]);
        assert_eq!(h.edges, vec![0.0, 1.0, 2.0]);
        assert_eq!(h.counts.iter().sum::<f64>(), 5.0);
    }

    #[test]
    fn histogram2d_drops_out_of_range_points() {
        let x = [0.1, 0.9, 0.9, 5.0];
        let y = [0.1, 0.9, 0.8, 0.5];
        let h = Histogram2d::new(&x, &y, (2, 2), (0.0, 1.0), (0.0, 1.0));
        assert_eq!(h.counts[0][0], 1.0);
        assert_eq!(h.counts[1][1], 2.0);
        let total: f64 = h.counts.iter().flatten().sum();
        assert_eq!(total, 3.0);

        let rows = h.normalized_rows();
        assert_eq!(rows[1][1], 1.0);
        assert_eq!(rows[0][1], 0.0);
        assert_eq!(h.x_centers(), vec![0.25, 0.75]);
    }
}
