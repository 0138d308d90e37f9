//! In-memory raster grids.

use crate::{AffineTransform, RasterCrs};

/// Values with a larger magnitude are treated as no-data.
pub const NODATA_MAGNITUDE: f32 = 1e10;

/// A georeferenced multi-band raster.
///
/// Bands are stored row-major, `width * height` values each. The
/// dimensions are fixed at construction; clipping works on views.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    width: usize,
    height: usize,
    bands: Vec<Vec<f32>>,
    /// CRS of the transform's output coordinates
    pub crs: RasterCrs,
    /// Pixel corner to map coordinates
    pub transform: AffineTransform,
    /// Fill value declared by the file, if any
    pub nodata: Option<f64>,
}

impl RasterGrid {
    /// Build a grid, checking that every band holds `width * height` values.
    pub fn new(
        width: usize,
        height: usize,
        bands: Vec<Vec<f32>>,
        crs: RasterCrs,
        transform: AffineTransform,
    ) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("empty raster ({}x{})", width, height));
        }
        if bands.is_empty() {
            return Err("raster has no bands".to_string());
        }
        let expected = width * height;
        if let Some((index, band)) = bands.iter().enumerate().find(|(_, b)| b.len() != expected) {
            return Err(format!(
                "band {} has {} values, expected {}",
                index + 1,
                band.len(),
                expected
            ));
        }

        Ok(Self {
            width,
            height,
            bands,
            crs,
            transform,
            nodata: None,
        })
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Zero-based band access.
    pub fn band(&self, index: usize) -> Option<&[f32]> {
        self.bands.get(index).map(|b| b.as_slice())
    }

    /// Value of a band at (col, row); None when out of range.
    pub fn value(&self, band: usize, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.band(band).map(|b| b[row * self.width + col])
    }

    /// No-data test: NaN, huge magnitude, or the declared fill value.
    pub fn is_nodata(&self, value: f32) -> bool {
        if value.is_nan() || value.abs() > NODATA_MAGNITUDE {
            return true;
        }
        match self.nodata {
            Some(fill) if fill.is_nan() => false,
            Some(fill) => (value as f64 - fill).abs() < f64::EPSILON.max(fill.abs() * 1e-7),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_2x2() -> RasterGrid {
        RasterGrid::new(
            2,
            2,
            vec![vec![1.0, 2.0, 3.0, 4.0]],
            RasterCrs::geographic(),
            AffineTransform::north_up(0.0, 2.0, 1.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_value_lookup() {
        let grid = grid_2x2();
        assert_eq!(grid.value(0, 1, 0), Some(2.0));
        assert_eq!(grid.value(0, 0, 1), Some(3.0));
        assert_eq!(grid.value(0, 2, 0), None);
        assert_eq!(grid.value(1, 0, 0), None);
    }

    #[test]
    fn test_band_length_checked() {
        let result = RasterGrid::new(
            2,
            2,
            vec![vec![0.0; 4], vec![0.0; 3]],
            RasterCrs::geographic(),
            AffineTransform::north_up(0.0, 0.0, 1.0, 1.0),
        );
        assert!(result.unwrap_err().contains("band 2"));
    }

    #[test]
    fn test_nodata_rules() {
        let grid = grid_2x2().with_nodata(Some(-9999.0));
        assert!(grid.is_nodata(f32::NAN));
        assert!(grid.is_nodata(3.0e38));
        assert!(grid.is_nodata(-2.0e10));
        assert!(grid.is_nodata(-9999.0));
        assert!(!grid.is_nodata(0.0));
        assert!(!grid.is_nodata(1.0e9));
    }
}
