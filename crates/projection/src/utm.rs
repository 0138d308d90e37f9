//! Universal Transverse Mercator on the WGS84 ellipsoid.
//!
//! Closed-form series (Snyder, "Map Projections: A Working Manual",
//! pp. 61-64): the forward transform expands the meridional arc to four
//! terms and the easting/northing corrections through the sixth power of
//! the longitude offset; the inverse goes through the footprint latitude.
//!
//! Both directions always return a number. Points far outside the zone
//! (more than a few degrees from the central meridian) lose accuracy but
//! nothing fails; choosing a sensible zone is the caller's job.

use std::f64::consts::PI;

use map_common::{BoundingBox, GeographicPoint, ProjectedPoint, UtmZone};

/// WGS84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = 0.00669438;
/// UTM scale factor on the central meridian
pub const UTM_K0: f64 = 0.9996;
/// Added to every easting
pub const FALSE_EASTING: f64 = 500_000.0;
/// Added to southern-hemisphere northings
pub const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Second eccentricity squared, e'^2 = e^2 / (1 - e^2).
fn second_eccentricity_squared() -> f64 {
    WGS84_E2 / (1.0 - WGS84_E2)
}

/// Coefficient of latitude in the meridional arc series; also the divisor
/// that turns an arc length into the rectifying latitude.
fn arc_coefficient() -> f64 {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0
}

/// Meridional arc length from the equator to latitude `phi` (radians).
fn meridional_arc(phi: f64) -> f64 {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    WGS84_A
        * (arc_coefficient() * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Project a WGS84 position into the given UTM zone.
///
/// `northern` controls only the false northing: southern-hemisphere
/// northings get 10 000 000 m added.
pub fn geo_to_utm(lon: f64, lat: f64, zone: u8, northern: bool) -> ProjectedPoint {
    let to_rad = PI / 180.0;
    let utm_zone = UtmZone::new(zone, northern);
    let ep2 = second_eccentricity_squared();

    let phi = lat * to_rad;
    let lambda = lon * to_rad;
    let lambda0 = utm_zone.central_meridian() * to_rad;

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = WGS84_A / (1.0 - WGS84_E2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = (lambda - lambda0) * cos_phi;
    let m = meridional_arc(phi);

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let easting = UTM_K0
        * n
        * (a + (1.0 - t + c) * a3 / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
        + FALSE_EASTING;

    let mut northing = UTM_K0
        * (m + n
            * tan_phi
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

    if !northern {
        northing += FALSE_NORTHING_SOUTH;
    }

    ProjectedPoint::new(easting, northing, utm_zone)
}

/// Unproject a UTM position back to WGS84.
pub fn utm_to_geo(easting: f64, northing: f64, zone: u8, northern: bool) -> GeographicPoint {
    let to_deg = 180.0 / PI;
    let utm_zone = UtmZone::new(zone, northern);
    let ep2 = second_eccentricity_squared();

    let x = easting - FALSE_EASTING;
    let y = if northern {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    // Footprint latitude
    let sqrt_1_e2 = (1.0 - WGS84_E2).sqrt();
    let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    let m = y / UTM_K0;
    let mu = m / (WGS84_A * arc_coefficient());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();
    let w = 1.0 - WGS84_E2 * sin_phi1 * sin_phi1;

    let n1 = WGS84_A / w.sqrt();
    let t1 = tan_phi1 * tan_phi1;
    let c1 = ep2 * cos_phi1 * cos_phi1;
    let r1 = WGS84_A * (1.0 - WGS84_E2) / w.powf(1.5);
    let d = x / (n1 * UTM_K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lon = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5 / 120.0)
        / cos_phi1;

    GeographicPoint::new(utm_zone.central_meridian() + lon * to_deg, lat * to_deg)
}

/// Convert a UTM rectangle to a WGS84 one using its two diagonal corners.
///
/// The result is only an approximation of the true footprint: grid
/// convergence rotates the rectangle, which this ignores.
pub fn transform_bounds_rect(
    min_e: f64,
    min_n: f64,
    max_e: f64,
    max_n: f64,
    zone: u8,
    northern: bool,
) -> BoundingBox {
    let lower_left = utm_to_geo(min_e, min_n, zone, northern);
    let upper_right = utm_to_geo(max_e, max_n, zone, northern);
    BoundingBox::new(lower_left.lon, lower_left.lat, upper_right.lon, upper_right.lat)
}

/// Standard 6-degree zone number containing `lon`, ignoring the Norway and
/// Svalbard exceptions.
pub fn zone_for_longitude(lon: f64) -> u8 {
    let wrapped = (lon + 180.0).rem_euclid(360.0);
    ((wrapped / 6.0).floor() as u8 + 1).min(60)
}
