//! Synthetic raster generators.
//!
//! These produce predictable, verifiable grids that can be used across the
//! test suite.

use map_common::{AffineTransform, RasterCrs, RasterGrid, UtmZone};

/// Creates a test band with predictable values.
///
/// Each cell value is `col * 1000 + row`, so `band[row * width + col]`
/// identifies its own position.
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// A band rising linearly from `min` at the top-left pixel to `max` at the
/// bottom-right pixel.
pub fn create_ramp_grid(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let steps = (width + height).saturating_sub(2).max(1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(min + (max - min) * (col + row) as f32 / steps);
        }
    }
    data
}

/// A band filled with a single value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Sentinel-2-like reflectance bands: band `b` holds `base * (b + 1)` plus
/// a per-pixel ramp, so every band has distinct percentiles.
pub fn create_reflectance_bands(width: usize, height: usize, bands: usize, base: f32) -> Vec<Vec<f32>> {
    (0..bands)
        .map(|b| {
            let lo = base * (b + 1) as f32;
            create_ramp_grid(width, height, lo, lo + 1000.0)
        })
        .collect()
}

/// Single-band UTM raster with 10 m pixels and its top-left corner at
/// `(origin_e, origin_n)`.
pub fn utm_grid(
    zone: UtmZone,
    origin_e: f64,
    origin_n: f64,
    width: usize,
    height: usize,
    data: Vec<f32>,
) -> RasterGrid {
    RasterGrid::new(
        width,
        height,
        vec![data],
        RasterCrs::utm(zone),
        AffineTransform::north_up(origin_e, origin_n, 10.0, 10.0),
    )
    .expect("synthetic grid dimensions must match")
}

/// The 4x4 zone 12N raster at the origin, values 0..=50 rising from the
/// top-left corner (0) to the bottom-right corner (50).
pub fn origin_ramp_grid() -> RasterGrid {
    utm_grid(
        UtmZone::north(12),
        0.0,
        0.0,
        4,
        4,
        create_ramp_grid(4, 4, 0.0, 50.0),
    )
}
