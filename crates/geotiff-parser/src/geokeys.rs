//! GeoKey directory decoding.
//!
//! The GeoKeyDirectoryTag is a list of u16 quadruples after a four-value
//! header `[version, revision, minor, key_count]`. Each entry is
//! `[key_id, location, count, value]`: location 0 means `value` is the
//! short itself, location 34737 means `count` characters of
//! GeoAsciiParamsTag starting at offset `value`.

use crate::error::{GeoTiffError, GeoTiffResult};

pub const GT_MODEL_TYPE: u16 = 1024;
pub const GT_RASTER_TYPE: u16 = 1025;
pub const GT_CITATION: u16 = 1026;
pub const GEOGRAPHIC_TYPE: u16 = 2048;
pub const GEOG_CITATION: u16 = 2049;
pub const PROJECTED_CS_TYPE: u16 = 3072;
pub const PCS_CITATION: u16 = 3073;

const GEO_ASCII_PARAMS_TAG: u16 = 34737;
const USER_DEFINED: u16 = 32767;

pub const MODEL_TYPE_PROJECTED: u16 = 1;
pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
pub const RASTER_PIXEL_IS_AREA: u16 = 1;
pub const RASTER_PIXEL_IS_POINT: u16 = 2;

/// The GeoKeys that matter for locating a raster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoKeys {
    pub model_type: Option<u16>,
    pub raster_type: Option<u16>,
    pub geographic_type: Option<u16>,
    pub projected_cs_type: Option<u16>,
    pub citation: Option<String>,
    pub pcs_citation: Option<String>,
    pub geog_citation: Option<String>,
}

impl GeoKeys {
    /// Decode a key directory. `ascii_params` is the GeoAsciiParamsTag
    /// contents, if the file has one.
    pub fn parse(directory: &[u16], ascii_params: Option<&str>) -> GeoTiffResult<Self> {
        if directory.len() < 4 {
            return Err(GeoTiffError::InvalidFormat(format!(
                "GeoKey directory too short ({} values)",
                directory.len()
            )));
        }
        if directory[0] != 1 {
            return Err(GeoTiffError::InvalidFormat(format!(
                "unexpected GeoKey directory version {}",
                directory[0]
            )));
        }

        let declared = directory[3] as usize;
        let mut keys = GeoKeys::default();

        for entry in directory[4..].chunks_exact(4).take(declared) {
            let (key_id, location, count, value) = (entry[0], entry[1], entry[2], entry[3]);
            match (key_id, location) {
                (GT_MODEL_TYPE, 0) => keys.model_type = Some(value),
                (GT_RASTER_TYPE, 0) => keys.raster_type = Some(value),
                (GEOGRAPHIC_TYPE, 0) => keys.geographic_type = Some(value),
                (PROJECTED_CS_TYPE, 0) => keys.projected_cs_type = Some(value),
                (GT_CITATION, GEO_ASCII_PARAMS_TAG) => {
                    keys.citation = ascii_value(ascii_params, value, count)
                }
                (PCS_CITATION, GEO_ASCII_PARAMS_TAG) => {
                    keys.pcs_citation = ascii_value(ascii_params, value, count)
                }
                (GEOG_CITATION, GEO_ASCII_PARAMS_TAG) => {
                    keys.geog_citation = ascii_value(ascii_params, value, count)
                }
                _ => {}
            }
        }

        Ok(keys)
    }

    pub fn is_pixel_is_point(&self) -> bool {
        self.raster_type == Some(RASTER_PIXEL_IS_POINT)
    }

    /// Projected model, or a projected CS key without a geographic model.
    pub fn is_projected(&self) -> bool {
        match self.model_type {
            Some(MODEL_TYPE_PROJECTED) => true,
            Some(MODEL_TYPE_GEOGRAPHIC) => false,
            _ => self.projected_cs_type.is_some(),
        }
    }

    /// Best CRS label available. Empty when none is present.
    ///
    /// Projected rasters use the projected EPSG code, then a citation; the
    /// geographic keys describe only their datum and are never used.
    /// Geographic rasters use the geographic EPSG code, then a citation.
    pub fn crs_label(&self) -> String {
        let (code, citation) = if self.is_projected() {
            (
                self.projected_cs_type,
                self.pcs_citation.as_ref().or(self.citation.as_ref()),
            )
        } else {
            (
                self.geographic_type,
                self.geog_citation.as_ref().or(self.citation.as_ref()),
            )
        };
        match (code.filter(|c| *c != USER_DEFINED), citation) {
            (Some(code), _) => format!("EPSG:{}", code),
            (None, Some(citation)) => citation.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Slice of the ASCII params; GeoTIFF terminates each value with `|`.
fn ascii_value(ascii_params: Option<&str>, offset: u16, count: u16) -> Option<String> {
    let params = ascii_params?;
    let start = offset as usize;
    let end = (start + count as usize).min(params.len());
    let raw = params.get(start..end)?;
    let value = raw.trim_end_matches(&['|', '\0'][..]).trim();
    (!value.is_empty()).then(|| value.to_string())
}
