//! Named region boundaries from GeoJSON.
//!
//! Features are matched on their `name` property, or `NAME` when `name` is
//! absent or empty, ignoring case. Only Polygon and MultiPolygon geometries
//! can be used for clipping.

use std::path::Path;

use map_common::{GeographicPoint, MapError, MapResult};
use serde_json::Value;
use tracing::debug;

/// One polygon: an exterior ring plus optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<GeographicPoint>,
    pub holes: Vec<Vec<GeographicPoint>>,
}

impl Polygon {
    pub fn rings(&self) -> impl Iterator<Item = &Vec<GeographicPoint>> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }
}

/// A region boundary; several polygons form a union.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    pub name: String,
    pub polygons: Vec<Polygon>,
}

impl BoundaryPolygon {
    pub fn vertex_count(&self) -> usize {
        self.polygons
            .iter()
            .flat_map(|p| p.rings())
            .map(|r| r.len())
            .sum()
    }
}

/// Where to find a boundary: a GeoJSON file and a feature name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryRef {
    pub path: std::path::PathBuf,
    pub name: String,
}

impl BoundaryRef {
    pub fn new(path: impl Into<std::path::PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn load(&self) -> MapResult<BoundaryPolygon> {
        load_boundary(&self.path, &self.name)
    }
}

/// Load the boundary called `name` from a GeoJSON FeatureCollection file.
pub fn load_boundary(path: &Path, name: &str) -> MapResult<BoundaryPolygon> {
    let content =
        std::fs::read_to_string(path).map_err(|e| MapError::input_read(path, e.to_string()))?;
    let collection: Value =
        serde_json::from_str(&content).map_err(|e| MapError::input_read(path, e.to_string()))?;
    let boundary = find_boundary(&collection, name)?;
    debug!(
        path = %path.display(),
        name = %boundary.name,
        polygons = boundary.polygons.len(),
        vertices = boundary.vertex_count(),
        "Loaded boundary"
    );
    Ok(boundary)
}

/// Name of a feature: `name`, or `NAME` when `name` is missing or empty.
pub fn feature_name(feature: &Value) -> Option<&str> {
    let props = feature.get("properties")?;
    let name = props.get("name").and_then(Value::as_str).filter(|s| !s.is_empty());
    name.or_else(|| props.get("NAME").and_then(Value::as_str))
}

/// Find the boundary called `name` in a parsed FeatureCollection.
pub fn find_boundary(collection: &Value, name: &str) -> MapResult<BoundaryPolygon> {
    let features = collection
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| MapError::ClipFailure("boundary file has no features array".to_string()))?;

    let feature = features
        .iter()
        .find(|f| feature_name(f).is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .ok_or_else(|| MapError::BoundaryNotFound(name.to_string()))?;

    let geometry = feature
        .get("geometry")
        .ok_or_else(|| MapError::UnsupportedGeometry("null".to_string()))?;
    let geometry_type = geometry.get("type").and_then(Value::as_str).unwrap_or("unknown");
    let coordinates = geometry.get("coordinates");

    let polygons = match (geometry_type, coordinates) {
        ("Polygon", Some(coords)) => vec![parse_polygon(coords)?],
        ("MultiPolygon", Some(coords)) => coords
            .as_array()
            .ok_or_else(|| malformed("MultiPolygon coordinates are not an array"))?
            .iter()
            .map(parse_polygon)
            .collect::<MapResult<Vec<_>>>()?,
        ("Polygon" | "MultiPolygon", None) => return Err(malformed("geometry has no coordinates")),
        (other, _) => return Err(MapError::UnsupportedGeometry(other.to_string())),
    };
    if polygons.is_empty() {
        return Err(malformed("MultiPolygon has no polygons"));
    }

    Ok(BoundaryPolygon {
        name: feature_name(feature).unwrap_or(name).to_string(),
        polygons,
    })
}

fn malformed(message: &str) -> MapError {
    MapError::ClipFailure(format!("malformed boundary: {}", message))
}

fn parse_polygon(value: &Value) -> MapResult<Polygon> {
    let rings = value
        .as_array()
        .ok_or_else(|| malformed("polygon is not an array of rings"))?;
    let mut parsed = rings.iter().map(parse_ring);
    let exterior = parsed
        .next()
        .ok_or_else(|| malformed("polygon has no exterior ring"))??;
    let holes = parsed.collect::<MapResult<Vec<_>>>()?;
    Ok(Polygon { exterior, holes })
}

fn parse_ring(value: &Value) -> MapResult<Vec<GeographicPoint>> {
    let positions = value
        .as_array()
        .ok_or_else(|| malformed("ring is not an array of positions"))?;

    let mut ring = Vec::with_capacity(positions.len());
    for position in positions {
        let coords = position
            .as_array()
            .filter(|c| c.len() >= 2)
            .ok_or_else(|| malformed("position needs at least two numbers"))?;
        let (Some(lon), Some(lat)) = (coords[0].as_f64(), coords[1].as_f64()) else {
            return Err(malformed("position is not numeric"));
        };
        if !(lon.is_finite() && lat.is_finite()) {
            return Err(malformed("position is not finite"));
        }
        ring.push(GeographicPoint::new(lon, lat));
    }

    // Closing vertex is optional
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return Err(malformed("ring has fewer than three distinct vertices"));
    }
    Ok(ring)
}
