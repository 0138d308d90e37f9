//! 8-bit images ready for encoding.

use crate::gradient::{render_normalized, Colormap};
use crate::normalize::{normalize_to_domain, percentile_stretch, StretchParams, ValueDomain};

/// Channel layout of a [`RenderedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// Interleaved 8-bit pixels, row-major from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl RenderedImage {
    pub fn new(width: usize, height: usize, format: PixelFormat, pixels: Vec<u8>) -> Result<Self, String> {
        let expected = width * height * format.channels();
        if pixels.len() != expected {
            return Err(format!(
                "pixel buffer holds {} bytes, {}x{} {:?} needs {}",
                pixels.len(),
                width,
                height,
                format,
                expected
            ));
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// Pixel at (col, row) as a channel slice.
    pub fn pixel(&self, col: usize, row: usize) -> Option<&[u8]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let n = self.format.channels();
        let start = (row * self.width + col) * n;
        self.pixels.get(start..start + n)
    }

    /// RGBA copy of the pixels; RGB input gains an opaque alpha channel.
    pub fn to_rgba(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba => self.pixels.clone(),
            PixelFormat::Rgb => {
                let mut out = Vec::with_capacity(self.width * self.height * 4);
                for px in self.pixels.chunks_exact(3) {
                    out.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                out
            }
        }
    }
}

/// Stack three bands into an RGB composite.
///
/// Each band is percentile-stretched on its own. `mask` flags no-data
/// pixels; when any is set the result is RGBA with those pixels fully
/// transparent.
pub fn compose_truecolor(
    red: &[f32],
    green: &[f32],
    blue: &[f32],
    mask: &[bool],
    width: usize,
    height: usize,
    params: &StretchParams,
) -> Result<RenderedImage, String> {
    let n = width * height;
    if [red.len(), green.len(), blue.len(), mask.len()].iter().any(|len| *len != n) {
        return Err(format!("band sizes do not match {}x{}", width, height));
    }

    let masked = |band: &[f32]| -> Vec<f32> {
        band.iter()
            .zip(mask)
            .map(|(v, m)| if *m { f32::NAN } else { *v })
            .collect()
    };
    let r = percentile_stretch(&masked(red), params);
    let g = percentile_stretch(&masked(green), params);
    let b = percentile_stretch(&masked(blue), params);

    if mask.iter().any(|m| *m) {
        let mut pixels = Vec::with_capacity(n * 4);
        for i in 0..n {
            if mask[i] {
                pixels.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                pixels.extend_from_slice(&[r[i], g[i], b[i], 255]);
            }
        }
        RenderedImage::new(width, height, PixelFormat::Rgba, pixels)
    } else {
        let mut pixels = Vec::with_capacity(n * 3);
        for i in 0..n {
            pixels.extend_from_slice(&[r[i], g[i], b[i]]);
        }
        RenderedImage::new(width, height, PixelFormat::Rgb, pixels)
    }
}

/// Colorize a scalar band through `colormap` over `domain`.
///
/// Masked pixels are transparent.
pub fn compose_scalar(
    band: &[f32],
    mask: &[bool],
    width: usize,
    height: usize,
    domain: &ValueDomain,
    colormap: &Colormap,
) -> Result<RenderedImage, String> {
    let n = width * height;
    if band.len() != n || mask.len() != n {
        return Err(format!("band size does not match {}x{}", width, height));
    }

    let mut normalized = normalize_to_domain(band, domain);
    for (v, m) in normalized.iter_mut().zip(mask) {
        if *m {
            *v = f32::NAN;
        }
    }
    RenderedImage::new(width, height, PixelFormat::Rgba, render_normalized(&normalized, colormap))
}
