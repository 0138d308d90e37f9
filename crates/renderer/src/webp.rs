//! WebP encoding.
//!
//! Lossy WebP with the alpha channel kept.

use crate::image::RenderedImage;

/// Quality used when none is configured.
pub const DEFAULT_WEBP_QUALITY: f32 = 85.0;

/// Encode a rendered image as lossy WebP. `quality` is clamped to 0-100.
pub fn encode_webp(image: &RenderedImage, quality: f32) -> Result<Vec<u8>, String> {
    if image.width == 0 || image.height == 0 {
        return Err("cannot encode an empty image".to_string());
    }
    let rgba = image.to_rgba();
    let encoder = webp::Encoder::from_rgba(&rgba, image.width as u32, image.height as u32);
    Ok(encoder.encode(quality.clamp(0.0, 100.0)).to_vec())
}

/// Convert PNG image data to lossy WebP.
pub fn convert_png_to_webp(png_data: &[u8], quality: f32) -> Result<Vec<u8>, String> {
    use ::image::ImageFormat;

    let img = ::image::load_from_memory_with_format(png_data, ImageFormat::Png)
        .map_err(|e| format!("Failed to decode PNG: {}", e))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
    Ok(encoder.encode(quality.clamp(0.0, 100.0)).to_vec())
}
