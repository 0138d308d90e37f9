//! Moving points between WGS84 and a raster's native CRS.

use map_common::{CrsKind, GeographicPoint, RasterCrs};

use crate::utm::{geo_to_utm, utm_to_geo};

/// Converts coordinates between WGS84 and one raster CRS.
///
/// Geographic and unresolved CRSs pass coordinates through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reprojector {
    kind: CrsKind,
}

impl Reprojector {
    pub fn new(kind: CrsKind) -> Self {
        Self { kind }
    }

    pub fn for_crs(crs: &RasterCrs) -> Self {
        Self::new(crs.kind)
    }

    /// False only when coordinates pass through an unresolved CRS.
    pub fn is_exact(&self) -> bool {
        !matches!(self.kind, CrsKind::Unknown)
    }

    /// WGS84 -> native (x, y).
    pub fn to_native(&self, point: GeographicPoint) -> (f64, f64) {
        match self.kind {
            CrsKind::Utm(zone) => {
                let p = geo_to_utm(point.lon, point.lat, zone.number, zone.northern);
                (p.easting, p.northing)
            }
            CrsKind::Geographic | CrsKind::Unknown => (point.lon, point.lat),
        }
    }

    /// Native (x, y) -> WGS84.
    pub fn to_geographic(&self, x: f64, y: f64) -> GeographicPoint {
        match self.kind {
            CrsKind::Utm(zone) => utm_to_geo(x, y, zone.number, zone.northern),
            CrsKind::Geographic | CrsKind::Unknown => GeographicPoint::new(x, y),
        }
    }

    /// Reproject a ring vertex by vertex.
    pub fn ring_to_native(&self, ring: &[GeographicPoint]) -> Vec<(f64, f64)> {
        ring.iter().map(|p| self.to_native(*p)).collect()
    }
}
