//! Clipping a raster to a boundary.
//!
//! The grid itself is never modified. A [`RasterView`] holds the pixel
//! window covering the boundary, the transform re-originated at the window
//! corner, and a mask of pixels whose centres fall outside the boundary.

use map_common::{AffineTransform, BoundingBox, MapError, MapResult, RasterGrid};
use projection::Reprojector;

use crate::boundary::BoundaryPolygon;

/// Read-only window over a [`RasterGrid`].
#[derive(Debug, Clone)]
pub struct RasterView<'a> {
    grid: &'a RasterGrid,
    col_off: usize,
    row_off: usize,
    width: usize,
    height: usize,
    transform: AffineTransform,
    /// `true` marks pixels outside the boundary
    outside: Option<Vec<bool>>,
}

impl<'a> RasterView<'a> {
    /// The whole grid, unmasked.
    pub fn full(grid: &'a RasterGrid) -> Self {
        Self {
            grid,
            col_off: 0,
            row_off: 0,
            width: grid.width(),
            height: grid.height(),
            transform: grid.transform,
            outside: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Window position inside the grid, (col, row).
    pub fn offset(&self) -> (usize, usize) {
        (self.col_off, self.row_off)
    }

    /// Transform of the window; pixel (0, 0) is the window's corner.
    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn is_clipped(&self) -> bool {
        self.outside.is_some()
    }

    /// Pixels inside the boundary (all pixels for an unclipped view).
    pub fn inside_count(&self) -> usize {
        match &self.outside {
            Some(mask) => mask.iter().filter(|m| !**m).count(),
            None => self.width * self.height,
        }
    }

    /// Copy of one band restricted to the window.
    pub fn band(&self, index: usize) -> Option<Vec<f32>> {
        let data = self.grid.band(index)?;
        let grid_width = self.grid.width();
        let mut out = Vec::with_capacity(self.width * self.height);
        for row in self.row_off..self.row_off + self.height {
            let start = row * grid_width + self.col_off;
            out.extend_from_slice(&data[start..start + self.width]);
        }
        Some(out)
    }

    /// Window value at (col, row).
    pub fn value(&self, band: usize, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.grid.value(band, self.col_off + col, self.row_off + row)
    }

    /// No-data flags over the window: clip-masked pixels, plus pixels that
    /// are no-data in any of `bands`.
    pub fn nodata_mask(&self, bands: &[usize]) -> Vec<bool> {
        let mut mask = self
            .outside
            .clone()
            .unwrap_or_else(|| vec![false; self.width * self.height]);
        for &band in bands {
            if let Some(values) = self.band(band) {
                for (m, v) in mask.iter_mut().zip(&values) {
                    *m = *m || self.grid.is_nodata(*v);
                }
            }
        }
        mask
    }
}

/// Clip `grid` to `boundary`.
///
/// Boundary vertices are moved into the raster's CRS first. Fails with
/// [`MapError::ClipFailure`] when the transform is singular, a reprojected
/// vertex is not finite, the boundary misses the raster, or no pixel centre
/// falls inside it.
pub fn clip_to_boundary<'a>(
    grid: &'a RasterGrid,
    boundary: &BoundaryPolygon,
) -> MapResult<RasterView<'a>> {
    let reprojector = Reprojector::for_crs(&grid.crs);
    let inverse = grid
        .transform
        .inverse()
        .ok_or_else(|| MapError::ClipFailure("raster transform is singular".to_string()))?;

    // polygons -> rings -> native vertices
    let mut native: Vec<Vec<Vec<(f64, f64)>>> = Vec::with_capacity(boundary.polygons.len());
    for polygon in &boundary.polygons {
        let rings: Vec<Vec<(f64, f64)>> = polygon
            .rings()
            .map(|ring| reprojector.ring_to_native(ring))
            .collect();
        if rings.iter().flatten().any(|(x, y)| !(x.is_finite() && y.is_finite())) {
            return Err(MapError::ClipFailure(format!(
                "boundary '{}' has vertices that cannot be projected",
                boundary.name
            )));
        }
        native.push(rings);
    }

    let pixel_bbox = BoundingBox::enclosing(
        native
            .iter()
            .filter_map(|rings| rings.first())
            .flatten()
            .map(|(x, y)| inverse.forward(*x, *y)),
    )
    .ok_or_else(|| MapError::ClipFailure("boundary has no vertices".to_string()))?;

    let (width, height) = (grid.width() as f64, grid.height() as f64);
    let col_min = pixel_bbox.min_x.floor().max(0.0);
    let row_min = pixel_bbox.min_y.floor().max(0.0);
    let col_max = pixel_bbox.max_x.ceil().min(width);
    let row_max = pixel_bbox.max_y.ceil().min(height);
    if col_min >= col_max || row_min >= row_max {
        return Err(MapError::ClipFailure(format!(
            "boundary '{}' does not overlap the raster",
            boundary.name
        )));
    }
    let (col_off, row_off) = (col_min as usize, row_min as usize);
    let (win_w, win_h) = (col_max as usize - col_off, row_max as usize - row_off);

    let mut outside = Vec::with_capacity(win_w * win_h);
    for row in row_off..row_off + win_h {
        for col in col_off..col_off + win_w {
            let (x, y) = grid.transform.pixel_center(col, row);
            outside.push(!native.iter().any(|rings| polygon_contains(rings, x, y)));
        }
    }
    if outside.iter().all(|o| *o) {
        return Err(MapError::ClipFailure(format!(
            "no pixel centre lies inside boundary '{}'",
            boundary.name
        )));
    }

    Ok(RasterView {
        grid,
        col_off,
        row_off,
        width: win_w,
        height: win_h,
        transform: grid.transform.translated_to(col_off, row_off),
        outside: Some(outside),
    })
}

/// Inside the first ring and outside every following ring.
fn polygon_contains(rings: &[Vec<(f64, f64)>], x: f64, y: f64) -> bool {
    match rings.split_first() {
        Some((exterior, holes)) => {
            ring_contains(exterior, x, y) && !holes.iter().any(|h| ring_contains(h, x, y))
        }
        None => false,
    }
}

/// Even-odd ray casting.
fn ring_contains(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];

        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}
