//! WGS84 footprint of a rendered image.
//!
//! Written as a GeoJSON FeatureCollection holding one Polygon feature whose
//! ring is `[TL, TR, BR, BL, TL]`, with provenance in its properties.

use std::path::Path;

use map_common::crs::WGS84_EPSG;
use map_common::{
    AffineTransform, BoundingBox, Degradation, GeographicPoint, MapError, MapResult, RasterCrs,
};
use projection::Reprojector;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Properties attached to the bounds feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsProperties {
    pub source_crs: String,
    pub target_crs: String,
    pub width: usize,
    pub height: usize,
    pub num_bands: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colormap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Category of a monthly product, under the name web map clients read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pollutant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
    /// Region name, or "full" when the raster was not clipped
    pub clipped_to: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<Degradation>,
}

/// Image corners in WGS84 plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsRecord {
    /// Top-left, top-right, bottom-right, bottom-left
    pub corners: [GeographicPoint; 4],
    pub properties: BoundsProperties,
}

impl BoundsRecord {
    /// Corners of a `width` x `height` image under `transform`, moved to
    /// WGS84 from `crs`.
    pub fn from_transform(
        transform: &AffineTransform,
        width: usize,
        height: usize,
        num_bands: usize,
        crs: &RasterCrs,
    ) -> Self {
        let reprojector = Reprojector::for_crs(crs);
        let corners = transform
            .corners(width, height)
            .map(|(x, y)| reprojector.to_geographic(x, y));

        Self {
            corners,
            properties: BoundsProperties {
                source_crs: crs.to_string(),
                target_crs: WGS84_EPSG.to_string(),
                width,
                height,
                num_bands,
                vmin: None,
                vmax: None,
                colormap: None,
                category: None,
                pollutant: None,
                year: None,
                month: None,
                image_file: None,
                clipped_to: "full".to_string(),
                degradations: Vec::new(),
            },
        }
    }

    /// Box enclosing the four corners.
    pub fn bbox(&self) -> BoundingBox {
        let points = self.corners.iter().map(|p| (p.lon, p.lat));
        BoundingBox::enclosing(points).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    pub fn to_geojson(&self) -> MapResult<Value> {
        let mut ring: Vec<[f64; 2]> = self.corners.iter().map(|p| p.to_position()).collect();
        ring.push(self.corners[0].to_position());

        Ok(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring]
                },
                "properties": serde_json::to_value(&self.properties)?
            }]
        }))
    }

    /// Parse a bounds document written by [`BoundsRecord::write`].
    pub fn from_geojson(value: &Value) -> MapResult<Self> {
        let feature = value
            .pointer("/features/0")
            .ok_or_else(|| MapError::Json("bounds document has no feature".to_string()))?;
        let ring = feature
            .pointer("/geometry/coordinates/0")
            .and_then(Value::as_array)
            .filter(|r| r.len() >= 4)
            .ok_or_else(|| MapError::Json("bounds feature has no polygon ring".to_string()))?;

        let mut corners = [GeographicPoint::new(0.0, 0.0); 4];
        for (corner, position) in corners.iter_mut().zip(ring) {
            let lon = position.get(0).and_then(Value::as_f64);
            let lat = position.get(1).and_then(Value::as_f64);
            match (lon, lat) {
                (Some(lon), Some(lat)) => *corner = GeographicPoint::new(lon, lat),
                _ => return Err(MapError::Json("bounds position is not numeric".to_string())),
            }
        }
        let properties =
            serde_json::from_value(feature.get("properties").cloned().unwrap_or(Value::Null))?;
        Ok(Self { corners, properties })
    }

    /// Write pretty-printed GeoJSON to `path`.
    pub fn write(&self, path: &Path) -> MapResult<()> {
        let text = serde_json::to_string_pretty(&self.to_geojson()?)?;
        std::fs::write(path, text).map_err(|e| MapError::output(path, e.to_string()))
    }
}
