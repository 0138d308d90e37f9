//! Common test fixtures.
//!
//! A small UTM zone 33N raster around Frascati (south-east of Rome) plus
//! boundary and station GeoJSON documents that overlap it or miss it.

use serde_json::{json, Value};

/// Raster fixture around Frascati: 20x20 pixels of 100 m, zone 33N.
pub mod frascati {
    pub const ZONE: u8 = 33;
    pub const ORIGIN_E: f64 = 305_000.0;
    pub const ORIGIN_N: f64 = 4_632_000.0;
    pub const PIXEL_SIZE: f64 = 100.0;
    pub const SIZE: usize = 20;

    /// Approximate WGS84 extent (min_lon, min_lat, max_lon, max_lat).
    pub const EXTENT: (f64, f64, f64, f64) = (12.6522, 41.7979, 12.6770, 41.8164);

    /// A square well inside the raster.
    pub const INNER_SQUARE: [(f64, f64); 5] = [
        (12.658, 41.812),
        (12.670, 41.812),
        (12.670, 41.802),
        (12.658, 41.802),
        (12.658, 41.812),
    ];

    /// A square that does not touch the raster.
    pub const FAR_SQUARE: [(f64, f64); 5] = [
        (13.50, 42.60),
        (13.60, 42.60),
        (13.60, 42.50),
        (13.50, 42.50),
        (13.50, 42.60),
    ];
}

fn ring(points: &[(f64, f64)]) -> Value {
    Value::Array(points.iter().map(|(x, y)| json!([x, y])).collect())
}

/// FeatureCollection with one Polygon feature per `(name, ring)`, using the
/// lowercase `name` property.
pub fn boundary_collection(features: &[(&str, &[(f64, f64)])]) -> Value {
    let features: Vec<Value> = features
        .iter()
        .map(|(name, points)| {
            json!({
                "type": "Feature",
                "properties": { "name": name },
                "geometry": { "type": "Polygon", "coordinates": [ring(points)] }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

/// The municipality boundaries used across the converter tests: Frascati
/// (overlapping the fixture raster), Faraway (disjoint), Roadway (a
/// LineString), and Monte Porzio (only an uppercase `NAME` property).
pub fn municipalities() -> Value {
    let mut collection = boundary_collection(&[
        ("Frascati", &frascati::INNER_SQUARE[..]),
        ("Faraway", &frascati::FAR_SQUARE[..]),
    ]);
    if let Some(features) = collection["features"].as_array_mut() {
        features.push(json!({
            "type": "Feature",
            "properties": { "name": "Roadway" },
            "geometry": {
                "type": "LineString",
                "coordinates": [[12.66, 41.80], [12.67, 41.81]]
            }
        }));
        features.push(json!({
            "type": "Feature",
            "properties": { "NAME": "Monte Porzio" },
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [[ring(&frascati::INNER_SQUARE)]]
            }
        }));
    }
    collection
}

/// Station FeatureCollection: two inside the Frascati raster, one far away.
pub fn stations() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [12.660, 41.810] },
                "properties": { "station_id": "IT001", "ground_truth_value": 21.5 }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [12.672, 41.800] },
                "properties": { "station_id": "IT002", "ground_truth_value": 18.0 }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [9.19, 45.46] },
                "properties": { "station_id": "IT999", "ground_truth_value": 40.0 }
            }
        ]
    })
}
