//! Color ramps for normalized scalar grids.

use serde::{Deserialize, Serialize};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.max(0.0).min(1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)) as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)) as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)) as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)) as u8,
    )
}

/// Inferno, sampled at ten evenly spaced stops: black through purple and
/// orange to pale yellow.
const INFERNO_STOPS: [(u8, u8, u8); 10] = [
    (0x00, 0x00, 0x04),
    (0x1B, 0x0C, 0x42),
    (0x4B, 0x0C, 0x6B),
    (0x78, 0x1C, 0x6D),
    (0xA5, 0x2C, 0x60),
    (0xCF, 0x44, 0x46),
    (0xED, 0x69, 0x25),
    (0xFB, 0x9A, 0x06),
    (0xF7, 0xD0, 0x3C),
    (0xFC, 0xFF, 0xA4),
];

/// Named color ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Inferno,
}

impl Colormap {
    pub fn name(&self) -> &'static str {
        match self {
            Colormap::Inferno => "inferno",
        }
    }

    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            Colormap::Inferno => &INFERNO_STOPS,
        }
    }

    /// Opaque color at position `t` in [0, 1]; `t` is clamped.
    pub fn color_at(&self, t: f32) -> Color {
        let stops = self.stops();
        let last = stops.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let pos = t * last as f32;
        let i = (pos.floor() as usize).min(last);
        if i == last {
            let (r, g, b) = stops[last];
            return Color::opaque(r, g, b);
        }
        let (r0, g0, b0) = stops[i];
        let (r1, g1, b1) = stops[i + 1];
        interpolate_color(
            Color::opaque(r0, g0, b0),
            Color::opaque(r1, g1, b1),
            pos - i as f32,
        )
    }

    pub fn first(&self) -> Color {
        self.color_at(0.0)
    }

    pub fn last(&self) -> Color {
        self.color_at(1.0)
    }
}

impl std::str::FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inferno" => Ok(Colormap::Inferno),
            other => Err(format!("unknown colormap '{}'", other)),
        }
    }
}

/// Colorize normalized values into RGBA pixels.
///
/// NaN marks no-data and renders fully transparent.
pub fn render_normalized(normalized: &[f32], colormap: &Colormap) -> Vec<u8> {
    let mut pixels = vec![0u8; normalized.len() * 4];
    for (value, pixel) in normalized.iter().zip(pixels.chunks_exact_mut(4)) {
        let color = if value.is_nan() {
            Color::transparent()
        } else {
            colormap.color_at(*value)
        };
        pixel[0] = color.r;
        pixel[1] = color.g;
        pixel[2] = color.b;
        pixel[3] = color.a;
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inferno_endpoints() {
        let cmap = Colormap::Inferno;
        assert_eq!(cmap.first(), Color::opaque(0x00, 0x00, 0x04));
        assert_eq!(cmap.last(), Color::opaque(0xFC, 0xFF, 0xA4));
    }

    #[test]
    fn test_inferno_hits_stops() {
        let cmap = Colormap::Inferno;
        for (i, (r, g, b)) in INFERNO_STOPS.iter().enumerate() {
            let t = i as f32 / 9.0;
            let c = cmap.color_at(t);
            // Float rounding may land just below a stop
            assert!((c.r as i32 - *r as i32).abs() <= 1, "stop {}", i);
            assert!((c.g as i32 - *g as i32).abs() <= 1, "stop {}", i);
            assert!((c.b as i32 - *b as i32).abs() <= 1, "stop {}", i);
        }
    }

    #[test]
    fn test_clamping() {
        let cmap = Colormap::Inferno;
        assert_eq!(cmap.color_at(-3.0), cmap.first());
        assert_eq!(cmap.color_at(7.0), cmap.last());
    }

    #[test]
    fn test_render_normalized_nodata_transparent() {
        let pixels = render_normalized(&[0.0, f32::NAN, 1.0], &Colormap::Inferno);
        assert_eq!(&pixels[0..4], &[0, 0, 4, 255]);
        assert_eq!(&pixels[4..8], &[0, 0, 0, 0]);
        assert_eq!(&pixels[8..12], &[252, 255, 164, 255]);
    }
}
