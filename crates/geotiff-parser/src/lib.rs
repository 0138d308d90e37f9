//! GeoTIFF reader producing [`RasterGrid`]s.
//!
//! Decoding is done by the `tiff` crate; this crate interprets the GeoTIFF
//! tags on top of it:
//!
//! - ModelTransformation, or ModelTiepoint + ModelPixelScale, for the
//!   affine transform
//! - the GeoKey directory for the CRS label
//! - GDAL_NODATA for the fill value
//!
//! Samples may be any integer or float type and are widened to `f32`.
//! Only pixel-interleaved (chunky) multi-band files are supported.

pub mod error;
pub mod geokeys;
pub mod georef;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use map_common::{MapError, MapResult, RasterGrid};

pub use error::{GeoTiffError, GeoTiffResult};
pub use geokeys::GeoKeys;
pub use georef::affine_from_tags;

const PLANAR_CHUNKY: u16 = 1;

/// Read a GeoTIFF file into memory.
pub fn read_geotiff(path: &Path) -> GeoTiffResult<RasterGrid> {
    let file = File::open(path)?;
    let grid = decode_geotiff(BufReader::new(file))?;
    debug!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        bands = grid.band_count(),
        crs = %grid.crs,
        "Read GeoTIFF"
    );
    Ok(grid)
}

/// Read a GeoTIFF, mapping every failure to [`MapError::InputRead`].
pub fn load_raster(path: &Path) -> MapResult<RasterGrid> {
    if !path.exists() {
        return Err(MapError::input_read(path, "file does not exist"));
    }
    read_geotiff(path).map_err(|e| MapError::input_read(path, e.to_string()))
}

/// Decode a GeoTIFF from any seekable stream.
pub fn decode_geotiff<R: Read + Seek>(stream: R) -> GeoTiffResult<RasterGrid> {
    let mut decoder = Decoder::new(stream)?.with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let samples = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
        .unwrap_or(1) as usize;
    let planar = decoder
        .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
        .unwrap_or(PLANAR_CHUNKY);
    if samples > 1 && planar != PLANAR_CHUNKY {
        return Err(GeoTiffError::Unsupported(
            "band-sequential (planar) sample layout".into(),
        ));
    }

    let keys = read_geokeys(&mut decoder)?;
    let transform = {
        let model_transformation = read_f64_tag(&mut decoder, Tag::ModelTransformationTag)?;
        let tie_points = read_f64_tag(&mut decoder, Tag::ModelTiepointTag)?;
        let pixel_scale = read_f64_tag(&mut decoder, Tag::ModelPixelScaleTag)?;
        affine_from_tags(
            model_transformation.as_deref(),
            tie_points.as_deref(),
            pixel_scale.as_deref(),
            keys.is_pixel_is_point(),
        )?
    };
    let nodata = read_nodata(&mut decoder)?;
    let crs = projection::resolve_crs(&keys.crs_label());

    let bands = split_bands(decoder.read_image()?, samples)?;
    let expected = width * height;
    if bands.iter().any(|b| b.len() != expected) {
        return Err(GeoTiffError::InvalidFormat(format!(
            "decoded {} values per band, expected {}x{}",
            bands.first().map_or(0, Vec::len),
            width,
            height
        )));
    }

    RasterGrid::new(width, height, bands, crs, transform)
        .map(|grid| grid.with_nodata(nodata))
        .map_err(GeoTiffError::InvalidFormat)
}

fn read_f64_tag<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> GeoTiffResult<Option<Vec<f64>>> {
    Ok(decoder.find_tag(tag)?.map(|v| v.into_f64_vec()).transpose()?)
}

fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> GeoTiffResult<GeoKeys> {
    let Some(directory) = decoder
        .find_tag(Tag::GeoKeyDirectoryTag)?
        .map(|v| v.into_u16_vec())
        .transpose()?
    else {
        return Ok(GeoKeys::default());
    };
    let ascii = decoder
        .find_tag(Tag::GeoAsciiParamsTag)?
        .map(|v| v.into_string())
        .transpose()?;
    GeoKeys::parse(&directory, ascii.as_deref())
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> GeoTiffResult<Option<f64>> {
    let raw = decoder
        .find_tag(Tag::GdalNodata)?
        .map(|v| v.into_string())
        .transpose()?;
    Ok(raw.and_then(|s| s.trim_end_matches('\0').trim().parse::<f64>().ok()))
}

/// De-interleave decoded samples into one `f32` vector per band.
fn split_bands(decoded: DecodingResult, samples: usize) -> GeoTiffResult<Vec<Vec<f32>>> {
    let samples = samples.max(1);
    let bands = match decoded {
        DecodingResult::U8(v) => deinterleave(&v, samples, |x| x as f32),
        DecodingResult::U16(v) => deinterleave(&v, samples, |x| x as f32),
        DecodingResult::U32(v) => deinterleave(&v, samples, |x| x as f32),
        DecodingResult::U64(v) => deinterleave(&v, samples, |x| x as f32),
        DecodingResult::I8(v) => deinterleave(&v, samples, |x| x as f32),
        DecodingResult::I16(v) => deinterleave(&v, samples, |x| x as f32),
        DecodingResult::I32(v) => deinterleave(&v, samples, |x| x as f32),
        DecodingResult::I64(v) => deinterleave(&v, samples, |x| x as f32),
        DecodingResult::F32(v) => deinterleave(&v, samples, |x| x),
        DecodingResult::F64(v) => deinterleave(&v, samples, |x| x as f32),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(GeoTiffError::Unsupported("sample format".into()));
        }
    };
    Ok(bands)
}

fn deinterleave<T: Copy>(data: &[T], samples: usize, to_f32: impl Fn(T) -> f32) -> Vec<Vec<f32>> {
    let pixels = data.len() / samples;
    let mut bands = vec![Vec::with_capacity(pixels); samples];
    for pixel in data.chunks_exact(samples) {
        for (band, value) in bands.iter_mut().zip(pixel) {
            band.push(to_f32(*value));
        }
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave_three_bands() {
        let data: Vec<u16> = vec![1, 2, 3, 4, 5, 6];
        let bands = deinterleave(&data, 3, |x| x as f32);
        assert_eq!(bands, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
    }

    #[test]
    fn test_split_single_band() {
        let bands = split_bands(DecodingResult::F32(vec![0.5, 1.5]), 1).unwrap();
        assert_eq!(bands, vec![vec![0.5, 1.5]]);
    }

    #[test]
    fn test_missing_file_is_input_read_error() {
        let err = load_raster(Path::new("/nonexistent/raster.tif")).unwrap_err();
        assert!(matches!(err, MapError::InputRead { .. }));
    }

    #[test]
    fn test_not_a_tiff() {
        let err = decode_geotiff(std::io::Cursor::new(b"definitely not a tiff".to_vec()));
        assert!(err.is_err());
    }
}
