//! Value normalization ahead of colorization.
//!
//! Two modes:
//! - percentile stretch for reflectance bands (truecolor composites)
//! - fixed value domain for scalar fields (pollutant concentrations)
//!
//! No-data pixels (NaN, or magnitude above 1e10) never contribute to
//! statistics. Callers fold any extra masking (declared fill values,
//! clipping) into the band as NaN before calling in.

use map_common::grid::NODATA_MAGNITUDE;
use serde::{Deserialize, Serialize};

/// True for NaN and for fill values of absurd magnitude.
#[inline]
pub fn is_nodata(value: f32) -> bool {
    value.is_nan() || value.abs() > NODATA_MAGNITUDE
}

/// Per-pixel no-data flags.
pub fn nodata_mask(data: &[f32]) -> Vec<bool> {
    data.iter().map(|v| is_nodata(*v)).collect()
}

/// Percentile of already-sorted values with linear interpolation between
/// the two nearest ranks. `p` is in percent.
pub fn percentile(sorted: &[f32], p: f32) -> Option<f32> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) as f64 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    let lo = sorted[lower] as f64;
    let hi = sorted[upper] as f64;
    Some((lo + (hi - lo) * frac) as f32)
}

/// Settings for the reflectance stretch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchParams {
    /// Lower clip percentile
    pub low_percentile: f32,
    /// Upper clip percentile
    pub high_percentile: f32,
    /// Exponent applied after rescaling; below 1 brightens
    pub gamma: f32,
}

impl Default for StretchParams {
    fn default() -> Self {
        Self {
            low_percentile: 2.0,
            high_percentile: 98.0,
            gamma: 0.75,
        }
    }
}

impl StretchParams {
    pub fn validate(&self) -> Result<(), String> {
        let valid = 0.0..=100.0;
        if !valid.contains(&self.low_percentile) || !valid.contains(&self.high_percentile) {
            return Err("percentiles must be between 0 and 100".to_string());
        }
        if self.low_percentile >= self.high_percentile {
            return Err("low_percentile must be below high_percentile".to_string());
        }
        if !(self.gamma > 0.0 && self.gamma.is_finite()) {
            return Err("gamma must be positive".to_string());
        }
        Ok(())
    }
}

/// Stretch one band to 8 bits.
///
/// Clips to the configured percentiles of the valid pixels, rescales to
/// [0, 1], applies gamma, converts to u8 (truncating), then rescales again
/// so that the brightest pixel is 255. A band whose percentiles coincide,
/// or that has no valid pixel, comes out as all zeros. No-data pixels are
/// written as 0.
pub fn percentile_stretch(band: &[f32], params: &StretchParams) -> Vec<u8> {
    let mut valid: Vec<f32> = band.iter().copied().filter(|v| !is_nodata(*v)).collect();
    valid.sort_by(|a, b| a.total_cmp(b));

    let (Some(lo), Some(hi)) = (
        percentile(&valid, params.low_percentile),
        percentile(&valid, params.high_percentile),
    ) else {
        return vec![0; band.len()];
    };
    if hi <= lo {
        return vec![0; band.len()];
    }

    let range = hi - lo;
    let mut out: Vec<u8> = band
        .iter()
        .map(|v| {
            if is_nodata(*v) {
                return 0;
            }
            let mut n = ((v - lo) / range).clamp(0.0, 1.0);
            if params.gamma != 1.0 {
                n = n.powf(params.gamma);
            }
            (n * 255.0) as u8
        })
        .collect();

    let max = out.iter().copied().max().unwrap_or(0);
    if max > 0 && max < 255 {
        let scale = 255.0 / max as f32;
        for v in out.iter_mut() {
            *v = (*v as f32 * scale) as u8;
        }
    }
    out
}

/// Display range of a scalar quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueDomain {
    pub vmin: f64,
    pub vmax: f64,
}

impl ValueDomain {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.vmin.is_finite() && self.vmax.is_finite()) {
            return Err(format!("domain [{}, {}] is not finite", self.vmin, self.vmax));
        }
        if self.vmin >= self.vmax {
            return Err(format!("vmin {} must be below vmax {}", self.vmin, self.vmax));
        }
        Ok(())
    }

    /// Map a value into [0, 1]; None for no-data.
    pub fn normalize(&self, value: f32) -> Option<f32> {
        if is_nodata(value) {
            return None;
        }
        let range = self.vmax - self.vmin;
        if range <= 0.0 {
            return Some(0.0);
        }
        Some((((value as f64) - self.vmin) / range).clamp(0.0, 1.0) as f32)
    }
}

/// Normalize a scalar band into [0, 1] over `domain`; no-data becomes NaN.
pub fn normalize_to_domain(band: &[f32], domain: &ValueDomain) -> Vec<f32> {
    band.iter()
        .map(|v| domain.normalize(*v).unwrap_or(f32::NAN))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_linear_interpolation() {
        let sorted: Vec<f32> = (0..=100).map(|v| v as f32).collect();
        assert_eq!(percentile(&sorted, 2.0), Some(2.0));
        assert_eq!(percentile(&sorted, 98.0), Some(98.0));

        let four = [10.0, 20.0, 30.0, 40.0];
        // rank = 0.5 * 3 = 1.5
        assert_eq!(percentile(&four, 50.0), Some(25.0));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_stretch_spans_full_range() {
        let band: Vec<f32> = (0..100).map(|v| v as f32 * 3.0 + 100.0).collect();
        let out = percentile_stretch(&band, &StretchParams::default());
        assert_eq!(out.iter().copied().min(), Some(0));
        assert_eq!(out.iter().copied().max(), Some(255));
    }

    #[test]
    fn test_stretch_constant_band_is_zero() {
        let out = percentile_stretch(&[7.0; 16], &StretchParams::default());
        assert!(out.iter().all(|v| *v == 0));
    }

    #[test]
    fn test_stretch_ignores_nodata_in_statistics() {
        let mut band: Vec<f32> = (0..50).map(|v| v as f32).collect();
        let reference = percentile_stretch(&band, &StretchParams::default());

        band.push(f32::NAN);
        band.push(1e20);
        let out = percentile_stretch(&band, &StretchParams::default());
        assert_eq!(&out[..50], reference.as_slice());
        assert_eq!(out[50], 0);
        assert_eq!(out[51], 0);
    }

    #[test]
    fn test_gamma_brightens_midtones() {
        let band: Vec<f32> = (0..=100).map(|v| v as f32).collect();
        let linear = percentile_stretch(
            &band,
            &StretchParams {
                gamma: 1.0,
                ..Default::default()
            },
        );
        let bright = percentile_stretch(&band, &StretchParams::default());
        assert!(bright[50] > linear[50]);
    }

    #[test]
    fn test_domain_normalize() {
        let domain = ValueDomain::new(20.0, 80.0);
        assert_eq!(domain.normalize(20.0), Some(0.0));
        assert_eq!(domain.normalize(50.0), Some(0.5));
        assert_eq!(domain.normalize(-5.0), Some(0.0));
        assert_eq!(domain.normalize(500.0), Some(1.0));
        assert_eq!(domain.normalize(f32::NAN), None);
        assert_eq!(domain.normalize(-3.4e38), None);
    }

    #[test]
    fn test_domain_validate() {
        assert!(ValueDomain::new(0.0, 50.0).validate().is_ok());
        assert!(ValueDomain::new(5.0, 5.0).validate().is_err());
        assert!(ValueDomain::new(f64::NAN, 5.0).validate().is_err());
    }

    #[test]
    fn test_nodata_mask() {
        assert_eq!(
            nodata_mask(&[0.0, f32::NAN, 2e10, -1e9]),
            vec![false, true, true, false]
        );
    }
}
