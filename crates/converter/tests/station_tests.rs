//! Station sampling against a GeoTIFF prediction raster.

use std::path::{Path, PathBuf};

use converter::{sample_stations, ConverterConfig};
use map_common::{BoundingBox, MapError};
use serde_json::Value;
use test_utils::{create_constant_grid, frascati, stations, write_geotiff, GeoTiffFixture};

// ============================================================================
// Helper functions
// ============================================================================

fn write_inputs(dir: &Path, value: f32, nodata: Option<f64>) -> (PathBuf, PathBuf) {
    let raster = dir.join("2024_01_NO2_interpolated.tif");
    let mut fixture = GeoTiffFixture::utm(
        32600 + frascati::ZONE as u16,
        frascati::ORIGIN_E,
        frascati::ORIGIN_N,
        frascati::PIXEL_SIZE,
        frascati::SIZE,
        frascati::SIZE,
        vec![create_constant_grid(frascati::SIZE, frascati::SIZE, value)],
    );
    if let Some(nodata) = nodata {
        fixture = fixture.with_nodata(nodata);
    }
    write_geotiff(&raster, &fixture).unwrap();

    let station_file = dir.join("stations.geojson");
    std::fs::write(&station_file, stations().to_string()).unwrap();
    (raster, station_file)
}

fn read_features(path: &Path) -> Vec<Value> {
    let text = std::fs::read_to_string(path).unwrap();
    let collection: Value = serde_json::from_str(&text).unwrap();
    collection["features"].as_array().unwrap().clone()
}

fn station_ids(features: &[Value]) -> Vec<&str> {
    features
        .iter()
        .filter_map(|f| f["properties"]["station_id"].as_str())
        .collect()
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn test_stations_outside_raster_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, station_file) = write_inputs(dir.path(), 12.5, None);
    let output = dir.path().join("out/stations_with_predictions.geojson");

    let outcome =
        sample_stations(&raster, &station_file, &output, &ConverterConfig::default(), None).unwrap();
    assert!(outcome.is_exact());
    assert_eq!(outcome.value.total, 3);
    assert_eq!(outcome.value.in_bounds, 2);
    assert_eq!(outcome.value.with_prediction, 2);

    let features = read_features(&output);
    assert_eq!(station_ids(&features), vec!["IT001", "IT002"]);
    for feature in &features {
        assert_eq!(feature["properties"]["predicted_value"], 12.5);
        assert!(feature["properties"]["ground_truth_value"].is_number());
    }
}

#[test]
fn test_nodata_becomes_null() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, station_file) = write_inputs(dir.path(), -9999.0, Some(-9999.0));
    let output = dir.path().join("sampled.geojson");

    let report = sample_stations(&raster, &station_file, &output, &ConverterConfig::default(), None)
        .unwrap()
        .value;
    assert_eq!(report.in_bounds, 2);
    assert_eq!(report.with_prediction, 0);
    assert_eq!(report.missing(), 2);

    let features = read_features(&output);
    assert!(features.iter().all(|f| f["properties"]["predicted_value"].is_null()));
}

#[test]
fn test_region_bounds_narrow_the_selection() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, station_file) = write_inputs(dir.path(), 1.0, None);
    let output = dir.path().join("sampled.geojson");

    let mut config = ConverterConfig {
        station_buffer_deg: 0.0,
        ..Default::default()
    };
    config.region_bounds.insert(
        "Frascati".to_string(),
        BoundingBox::new(12.655, 41.805, 12.665, 41.815),
    );

    let report = sample_stations(&raster, &station_file, &output, &config, Some("frascati"))
        .unwrap()
        .value;
    assert_eq!(report.in_bounds, 1);
    assert_eq!(station_ids(&read_features(&output)), vec!["IT001"]);
}

#[test]
fn test_missing_station_file() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, _) = write_inputs(dir.path(), 1.0, None);

    let err = sample_stations(
        &raster,
        &dir.path().join("absent.geojson"),
        &dir.path().join("out.geojson"),
        &ConverterConfig::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, MapError::InputRead { .. }));
}
