//! Coordinate Reference System types.
//!
//! Only two families are understood: WGS84 geographic coordinates and the
//! 120 WGS84 UTM zones. Anything else is carried as an opaque label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of WGS84 geographic coordinates.
pub const WGS84_EPSG: &str = "EPSG:4326";

/// A UTM zone and hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    /// Zone number, 1 to 60
    pub number: u8,
    /// True for the northern hemisphere (EPSG:326xx), false for southern (EPSG:327xx)
    pub northern: bool,
}

impl UtmZone {
    pub fn new(number: u8, northern: bool) -> Self {
        Self { number, northern }
    }

    pub fn north(number: u8) -> Self {
        Self::new(number, true)
    }

    pub fn south(number: u8) -> Self {
        Self::new(number, false)
    }

    /// Whether the zone number is in 1..=60.
    pub fn is_valid(&self) -> bool {
        (1..=60).contains(&self.number)
    }

    /// Longitude of the zone's central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        (self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }

    /// WGS84 / UTM EPSG code: 326xx north, 327xx south.
    pub fn epsg_code(&self) -> u32 {
        let base = if self.northern { 32600 } else { 32700 };
        base + self.number as u32
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hemisphere = if self.northern { 'N' } else { 'S' };
        write!(f, "UTM zone {}{}", self.number, hemisphere)
    }
}

/// What a raster's CRS label resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrsKind {
    /// Coordinates are already WGS84 lon/lat
    Geographic,
    /// Coordinates are UTM easting/northing
    Utm(UtmZone),
    /// Label could not be resolved; coordinates are passed through unchanged
    Unknown,
}

/// The CRS attached to a raster: the label as read from the file plus the
/// resolved kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterCrs {
    pub label: String,
    pub kind: CrsKind,
}

impl RasterCrs {
    pub fn new(label: impl Into<String>, kind: CrsKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }

    pub fn geographic() -> Self {
        Self::new(WGS84_EPSG, CrsKind::Geographic)
    }

    pub fn utm(zone: UtmZone) -> Self {
        Self::new(format!("EPSG:{}", zone.epsg_code()), CrsKind::Utm(zone))
    }

    pub fn utm_zone(&self) -> Option<UtmZone> {
        match self.kind {
            CrsKind::Utm(zone) => Some(zone),
            _ => None,
        }
    }

    /// True when points can be converted exactly to WGS84.
    pub fn is_resolved(&self) -> bool {
        !matches!(self.kind, CrsKind::Unknown)
    }
}

impl fmt::Display for RasterCrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "unknown")
        } else {
            write!(f, "{}", self.label)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_meridian() {
        assert_eq!(UtmZone::north(1).central_meridian(), -177.0);
        assert_eq!(UtmZone::north(12).central_meridian(), -111.0);
        assert_eq!(UtmZone::south(33).central_meridian(), 15.0);
        assert_eq!(UtmZone::north(60).central_meridian(), 177.0);
    }

    #[test]
    fn test_epsg_code() {
        assert_eq!(UtmZone::north(12).epsg_code(), 32612);
        assert_eq!(UtmZone::south(33).epsg_code(), 32733);
    }

    #[test]
    fn test_zone_validity() {
        assert!(UtmZone::north(1).is_valid());
        assert!(UtmZone::north(60).is_valid());
        assert!(!UtmZone::north(0).is_valid());
        assert!(!UtmZone::south(61).is_valid());
    }

    #[test]
    fn test_raster_crs_display() {
        assert_eq!(RasterCrs::utm(UtmZone::north(32)).to_string(), "EPSG:32632");
        assert_eq!(RasterCrs::geographic().to_string(), "EPSG:4326");
        assert_eq!(RasterCrs::new("", CrsKind::Unknown).to_string(), "unknown");
        assert_eq!(UtmZone::south(56).to_string(), "UTM zone 56S");
    }
}
