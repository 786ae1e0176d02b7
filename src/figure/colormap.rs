//! Discrete palettes and boundary-based color mapping for filled contours.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 8-bit RGB color, independent of any rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GRAY: Rgb = Rgb(128, 128, 128);
    /// Accent used for reference lines (interval markers).
    pub const ACCENT: Rgb = Rgb(0x00, 0x93, 0xe6);
}

/// Confidence-band colors, ordered from the outermost (3σ) to the innermost
/// (1σ) band.
pub const SIGMA_COLORS: [Rgb; 6] = [
    Rgb(0x7a, 0xcf, 0xff),
    Rgb(0xff, 0xf4, 0x66),
    Rgb(0x00, 0xc4, 0x8f),
    Rgb(0xff, 0x86, 0x26),
    Rgb(0xff, 0x9c, 0xd3),
    Rgb(0x00, 0x93, 0xe6),
];

/// Listed colormap with explicit under/over colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: Vec<Rgb>,
    pub under: Rgb,
    pub over: Rgb,
}

impl Palette {
    /// Palette for confidence bands; out-of-range values clip to the end colors.
    pub fn sigma() -> Self {
        Self {
            colors: SIGMA_COLORS.to_vec(),
            under: SIGMA_COLORS[0],
            over: SIGMA_COLORS[SIGMA_COLORS.len() - 1],
        }
    }
}

/// Maps values into discrete bands delimited by `boundaries`.
///
/// With `B` boundaries there are `R = B - 1` bands. Band `b` uses palette
/// entry `floor(b·(N-1)/(R-1))` so the bands spread over the whole palette.
/// Values below the first boundary take the under color, values above the
/// last one the over color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandNorm {
    boundaries: Vec<f64>,
    palette: Palette,
}

impl BandNorm {
    pub fn new(boundaries: Vec<f64>, palette: Palette) -> Result<Self, AppError> {
        if boundaries.len() < 2 {
            return Err(AppError::numeric("A band norm needs at least two boundaries."));
        }
        if boundaries.iter().any(|b| !b.is_finite()) || boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AppError::numeric(format!(
                "Band boundaries must be finite and strictly increasing: {boundaries:?}"
            )));
        }
        if palette.colors.is_empty() {
            return Err(AppError::numeric("Palette has no colors."));
        }
        Ok(Self { boundaries, palette })
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn n_bands(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn band_color(&self, band: usize) -> Rgb {
        let n_colors = self.palette.colors.len();
        let n_bands = self.n_bands();
        let idx = if n_bands == 1 {
            (n_colors - 1) / 2
        } else {
            band.min(n_bands - 1) * (n_colors - 1) / (n_bands - 1)
        };
        self.palette.colors[idx]
    }

    /// Band containing `v`, `Err(Ordering)` when it lies outside all bands.
    pub fn band(&self, v: f64) -> Option<Result<usize, std::cmp::Ordering>> {
        if v.is_nan() {
            return None;
        }
        let first = self.boundaries[0];
        let last = self.boundaries[self.boundaries.len() - 1];
        if v < first {
            return Some(Err(std::cmp::Ordering::Less));
        }
        if v > last {
            return Some(Err(std::cmp::Ordering::Greater));
        }
        // The top boundary belongs to the last band.
        let idx = self.boundaries.partition_point(|&b| b <= v);
        Some(Ok(idx.saturating_sub(1).min(self.n_bands() - 1)))
    }

    pub fn color_for(&self, v: f64) -> Option<Rgb> {
        Some(match self.band(v)? {
            Ok(band) => self.band_color(band),
            Err(std::cmp::Ordering::Less) => self.palette.under,
            Err(_) => self.palette.over,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_bands_spread_over_palette() {
        let norm = BandNorm::new(vec![-9.0, -4.0, -1.0, 0.0], Palette::sigma()).unwrap();
        assert_eq!(norm.n_bands(), 3);
        assert_eq!(norm.band_color(0), SIGMA_COLORS[0]);
        assert_eq!(norm.band_color(1), SIGMA_COLORS[2]);
        assert_eq!(norm.band_color(2), SIGMA_COLORS[5]);
    }

    #[test]
    fn values_map_to_bands_with_clipping() {
        let norm = BandNorm::new(vec![-9.0, -4.0, -1.0, 0.0], Palette::sigma()).unwrap();
        assert_eq!(norm.band(-0.5), Some(Ok(2)));
        assert_eq!(norm.band(0.0), Some(Ok(2)));
        assert_eq!(norm.band(-4.0), Some(Ok(1)));
        assert_eq!(norm.band(-20.0), Some(Err(std::cmp::Ordering::Less)));
        assert_eq!(norm.color_for(-20.0), Some(SIGMA_COLORS[0]));
        assert_eq!(norm.color_for(3.0), Some(SIGMA_COLORS[5]));
        assert_eq!(norm.color_for(f64::NAN), None);
    }

    #[test]
    fn single_band_uses_middle_color() {
        let norm = BandNorm::new(vec![0.2, 1.0], Palette::sigma()).unwrap();
        assert_eq!(norm.band_color(0), SIGMA_COLORS[2]);
    }

    #[test]
    fn rejects_unsorted_boundaries() {
        assert!(BandNorm::new(vec![1.0, 0.0], Palette::sigma()).is_err());
        assert!(BandNorm::new(vec![1.0], Palette::sigma()).is_err());
    }
}
