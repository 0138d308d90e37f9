//! Coordinate transformations between WGS84 and UTM.
//!
//! Implements the transverse Mercator series directly, without a
//! projection database. Only WGS84-based UTM zones are supported.

pub mod crs_label;
pub mod reproject;
pub mod utm;

pub use crs_label::{extract_zone_from_crs_label, is_wgs84_label, resolve_crs};
pub use reproject::Reprojector;
pub use utm::{geo_to_utm, transform_bounds_rect, utm_to_geo, zone_for_longitude};
