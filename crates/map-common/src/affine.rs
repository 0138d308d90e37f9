//! Affine pixel-to-map transform.

use serde::{Deserialize, Serialize};

/// Six-coefficient affine transform from pixel space to map space.
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// Pixel coordinates refer to pixel corners: (0, 0) is the outer corner of
/// the first pixel and (width, height) the opposite corner of the last one.
/// A north-up raster has `b == d == 0` and a negative `e`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform with the given top-left corner and pixel size.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height, origin_y)
    }

    /// (col, row) -> (x, y)
    pub fn forward(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.a * col + self.b * row + self.c;
        let y = self.d * col + self.e * row + self.f;
        (x, y)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Inverse transform, or None when the matrix is singular.
    pub fn inverse(&self) -> Option<AffineTransform> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(AffineTransform {
            a: self.e * inv_det,
            b: -self.b * inv_det,
            c: (self.b * self.f - self.e * self.c) * inv_det,
            d: -self.d * inv_det,
            e: self.a * inv_det,
            f: (self.d * self.c - self.a * self.f) * inv_det,
        })
    }

    /// (x, y) -> fractional (col, row). None when the transform is singular.
    pub fn pixel_of(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.inverse().map(|inv| inv.forward(x, y))
    }

    /// Map coordinates of the centre of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.forward(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Transform of a window whose top-left pixel is (col_off, row_off).
    pub fn translated_to(&self, col_off: usize, row_off: usize) -> AffineTransform {
        let (c, f) = self.forward(col_off as f64, row_off as f64);
        AffineTransform { c, f, ..*self }
    }

    /// Corner positions of a `width` x `height` grid in map space, in the
    /// order top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self, width: usize, height: usize) -> [(f64, f64); 4] {
        let (w, h) = (width as f64, height as f64);
        [
            self.forward(0.0, 0.0),
            self.forward(w, 0.0),
            self.forward(w, h),
            self.forward(0.0, h),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_north_up() {
        let t = AffineTransform::north_up(500_000.0, 4_000_000.0, 10.0, 10.0);
        assert_eq!(t.forward(0.0, 0.0), (500_000.0, 4_000_000.0));
        assert_eq!(t.forward(100.0, 100.0), (501_000.0, 3_999_000.0));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = AffineTransform::new(10.0, 0.5, 500_000.0, -0.25, -10.0, 6_000_000.0);
        let (x, y) = t.forward(37.0, 12.0);
        let (col, row) = t.pixel_of(x, y).unwrap();
        assert!((col - 37.0).abs() < 1e-9);
        assert!((row - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular() {
        let t = AffineTransform::new(0.0, 0.0, 1.0, 0.0, 0.0, 1.0);
        assert!(t.inverse().is_none());
        assert!(t.pixel_of(1.0, 1.0).is_none());
    }

    #[test]
    fn test_translated_to_moves_origin_only() {
        let t = AffineTransform::north_up(1000.0, 2000.0, 30.0, 30.0);
        let w = t.translated_to(4, 2);
        assert_eq!((w.c, w.f), (1120.0, 1940.0));
        assert_eq!((w.a, w.e), (t.a, t.e));
        assert_eq!(w.forward(0.0, 0.0), t.forward(4.0, 2.0));
    }

    #[test]
    fn test_corner_order() {
        let t = AffineTransform::north_up(0.0, 0.0, 10.0, 10.0);
        let [tl, tr, br, bl] = t.corners(4, 4);
        assert_eq!(tl, (0.0, 0.0));
        assert_eq!(tr, (40.0, 0.0));
        assert_eq!(br, (40.0, -40.0));
        assert_eq!(bl, (0.0, -40.0));
    }
}
