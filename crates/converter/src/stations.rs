//! Prediction values at ground-station locations.
//!
//! Stations come as a GeoJSON FeatureCollection of Points. Those inside a
//! WGS84 box around the raster are kept, band 1 is sampled under each one,
//! and the features are written back with a `predicted_value` property
//! (`null` off the raster or on no-data).

use std::path::Path;

use geotiff_parser::load_raster;
use map_common::{
    BoundingBox, Degradation, GeographicPoint, MapError, MapResult, Outcome, RasterGrid,
};
use projection::{transform_bounds_rect, Reprojector};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ConverterConfig;

/// Counts from one sampling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationReport {
    pub total: usize,
    pub in_bounds: usize,
    pub with_prediction: usize,
}

impl StationReport {
    /// Stations kept but without a value.
    pub fn missing(&self) -> usize {
        self.in_bounds - self.with_prediction
    }
}

/// Band 1 value under a WGS84 point; None off the raster or at no-data.
pub fn sample_at(grid: &RasterGrid, point: GeographicPoint) -> Option<f32> {
    let (x, y) = Reprojector::for_crs(&grid.crs).to_native(point);
    let (col, row) = grid.transform.pixel_of(x, y)?;
    let (col, row) = (col.floor(), row.floor());
    if col < 0.0 || row < 0.0 || col >= grid.width() as f64 || row >= grid.height() as f64 {
        return None;
    }
    let value = grid.value(0, col as usize, row as usize)?;
    (!grid.is_nodata(value)).then_some(value)
}

/// WGS84 box around the raster.
///
/// UTM rasters use their lower-left and upper-right corners only, so the
/// box follows the UTM rectangle rather than its rotated footprint.
pub fn raster_extent_wgs84(grid: &RasterGrid) -> BoundingBox {
    let corners = grid.transform.corners(grid.width(), grid.height());
    let native = BoundingBox::enclosing(corners.iter().copied())
        .unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0));

    match grid.crs.utm_zone() {
        Some(zone) => transform_bounds_rect(
            native.min_x,
            native.min_y,
            native.max_x,
            native.max_y,
            zone.number,
            zone.northern,
        ),
        None => native,
    }
}

/// Point coordinates of a station feature.
pub fn station_position(feature: &Value) -> Option<GeographicPoint> {
    let geometry = feature.get("geometry")?;
    if geometry.get("type").and_then(Value::as_str) != Some("Point") {
        return None;
    }
    let coords = geometry.get("coordinates")?.as_array()?;
    let lon = coords.first()?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    Some(GeographicPoint::new(lon, lat))
}

/// Features whose point lies in `bbox`, edges included.
pub fn filter_stations<'a>(features: &'a [Value], bbox: &BoundingBox) -> Vec<&'a Value> {
    features
        .iter()
        .filter(|f| station_position(f).is_some_and(|p| bbox.contains_point(p.lon, p.lat)))
        .collect()
}

/// Box used to select stations: configured region bounds when present,
/// else the raster extent, grown by the configured buffer.
pub fn station_filter_bbox(
    grid: &RasterGrid,
    config: &ConverterConfig,
    region: Option<&str>,
) -> BoundingBox {
    let base = region
        .and_then(|r| config.region_bounds_for(r))
        .unwrap_or_else(|| raster_extent_wgs84(grid));
    base.expanded(config.station_buffer_deg)
}

/// Sample `grid` under every station in `bbox`.
///
/// Returns a FeatureCollection of the kept stations, each with
/// `predicted_value` added to its properties.
pub fn annotate_stations(
    grid: &RasterGrid,
    stations: &Value,
    bbox: &BoundingBox,
) -> MapResult<(Value, StationReport)> {
    let features = stations
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| MapError::Json("station file has no features array".to_string()))?;

    let kept = filter_stations(features, bbox);
    let mut report = StationReport {
        total: features.len(),
        in_bounds: kept.len(),
        with_prediction: 0,
    };

    let mut annotated = Vec::with_capacity(kept.len());
    for feature in kept {
        let value = station_position(feature).and_then(|p| sample_at(grid, p));
        if value.is_some() {
            report.with_prediction += 1;
        }

        let mut feature = feature.clone();
        if !feature.get("properties").is_some_and(Value::is_object) {
            feature["properties"] = Value::Object(Default::default());
        }
        feature["properties"]["predicted_value"] = match value {
            Some(v) => serde_json::Number::from_f64(f64::from(v))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            None => Value::Null,
        };
        annotated.push(feature);
    }

    let collection = serde_json::json!({
        "type": "FeatureCollection",
        "features": annotated
    });
    Ok((collection, report))
}

/// Sample a prediction raster at the stations in `stations_path` and write
/// the annotated stations to `output_path`.
pub fn sample_stations(
    raster_path: &Path,
    stations_path: &Path,
    output_path: &Path,
    config: &ConverterConfig,
    region: Option<&str>,
) -> MapResult<Outcome<StationReport>> {
    let grid = load_raster(raster_path)?;
    let mut outcome = Outcome::exact(());
    if !grid.crs.is_resolved() {
        let reason = Degradation::ReprojectionUnavailable {
            crs_label: grid.crs.to_string(),
        };
        warn!(raster = %raster_path.display(), "{}", reason);
        outcome.push(reason);
    }

    let text = std::fs::read_to_string(stations_path)
        .map_err(|e| MapError::input_read(stations_path, e.to_string()))?;
    let stations: Value = serde_json::from_str(&text)
        .map_err(|e| MapError::input_read(stations_path, e.to_string()))?;

    let bbox = station_filter_bbox(&grid, config, region);
    debug!(
        min_lon = bbox.min_x,
        min_lat = bbox.min_y,
        max_lon = bbox.max_x,
        max_lat = bbox.max_y,
        "Station filter box"
    );
    let (collection, report) = annotate_stations(&grid, &stations, &bbox)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MapError::output(parent, e.to_string()))?;
    }
    let out = serde_json::to_string_pretty(&collection)?;
    std::fs::write(output_path, out).map_err(|e| MapError::output(output_path, e.to_string()))?;

    info!(
        raster = %raster_path.display(),
        output = %output_path.display(),
        total = report.total,
        in_bounds = report.in_bounds,
        sampled = report.with_prediction,
        missing = report.missing(),
        "Sampled stations"
    );
    Ok(outcome.map(|()| report))
}
