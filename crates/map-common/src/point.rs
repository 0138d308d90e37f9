//! Geographic and projected point types.

use serde::{Deserialize, Serialize};

use crate::crs::UtmZone;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeographicPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check that longitude is in [-180, 180] and latitude in [-90, 90].
    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon) && (-90.0..=90.0).contains(&self.lat)
    }

    /// GeoJSON position order: `[lon, lat]`.
    pub fn to_position(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// A UTM position in meters.
///
/// Easting carries the 500 000 m false easting; in the southern hemisphere
/// northing carries the 10 000 000 m false northing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub easting: f64,
    pub northing: f64,
    pub zone: UtmZone,
}

impl ProjectedPoint {
    pub fn new(easting: f64, northing: f64, zone: UtmZone) -> Self {
        Self {
            easting,
            northing,
            zone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_validity() {
        assert!(GeographicPoint::new(-180.0, 90.0).is_valid());
        assert!(GeographicPoint::new(12.5, -45.0).is_valid());
        assert!(!GeographicPoint::new(181.0, 0.0).is_valid());
        assert!(!GeographicPoint::new(0.0, -90.5).is_valid());
    }

    #[test]
    fn test_position_order() {
        assert_eq!(GeographicPoint::new(12.7, 41.8).to_position(), [12.7, 41.8]);
    }
}
