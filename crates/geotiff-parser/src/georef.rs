//! Affine transform from GeoTIFF model tags.

use map_common::AffineTransform;

use crate::error::{GeoTiffError, GeoTiffResult};

/// Build the pixel-to-model transform.
///
/// ModelTransformationTag (a row-major 4x4 matrix) wins when present;
/// otherwise the first tie point and the pixel scale define a north-up
/// transform. With `pixel_is_point` the tie point refers to a pixel centre
/// and the origin is moved back by half a pixel.
pub fn affine_from_tags(
    model_transformation: Option<&[f64]>,
    tie_points: Option<&[f64]>,
    pixel_scale: Option<&[f64]>,
    pixel_is_point: bool,
) -> GeoTiffResult<AffineTransform> {
    let transform = if let Some(m) = model_transformation {
        if m.len() < 8 {
            return Err(GeoTiffError::InvalidFormat(format!(
                "ModelTransformation has {} values, expected 16",
                m.len()
            )));
        }
        AffineTransform::new(m[0], m[1], m[3], m[4], m[5], m[7])
    } else {
        let tie = tie_points
            .ok_or_else(|| GeoTiffError::MissingData("ModelTiepoint or ModelTransformation".into()))?;
        let scale =
            pixel_scale.ok_or_else(|| GeoTiffError::MissingData("ModelPixelScale".into()))?;
        if tie.len() < 6 {
            return Err(GeoTiffError::InvalidFormat(format!(
                "ModelTiepoint has {} values, expected 6",
                tie.len()
            )));
        }
        if scale.len() < 2 || scale[0] == 0.0 || scale[1] == 0.0 {
            return Err(GeoTiffError::InvalidFormat(
                "ModelPixelScale needs two non-zero values".into(),
            ));
        }

        let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
        let (sx, sy) = (scale[0], scale[1]);
        AffineTransform::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy)
    };

    if !pixel_is_point {
        return Ok(transform);
    }
    let (c, f) = transform.forward(-0.5, -0.5);
    Ok(AffineTransform { c, f, ..transform })
}
