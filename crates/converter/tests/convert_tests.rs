//! End-to-end conversion tests.
//!
//! Rasters are written as real GeoTIFFs into a scratch directory, converted,
//! and the PNG and bounds files read back.

use std::path::{Path, PathBuf};

use converter::{
    BoundaryRef, BoundsRecord, ConversionStatus, ConvertRequest, Converter, ConverterConfig,
    RenderMode,
};
use image::GenericImageView;
use map_common::{Degradation, MapError};
use projection::geo_to_utm;
use renderer::Colormap;
use serde_json::Value;
use test_utils::{
    assert_approx_eq, create_ramp_grid, create_reflectance_bands, frascati, municipalities,
    origin_ramp_grid, write_geotiff, GeoTiffFixture,
};

// ============================================================================
// Helper functions
// ============================================================================

fn frascati_fixture(bands: Vec<Vec<f32>>) -> GeoTiffFixture {
    GeoTiffFixture::utm(
        32600 + frascati::ZONE as u16,
        frascati::ORIGIN_E,
        frascati::ORIGIN_N,
        frascati::PIXEL_SIZE,
        frascati::SIZE,
        frascati::SIZE,
        bands,
    )
}

/// A monthly NO2 raster and the municipality boundaries, side by side.
fn monthly_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let raster = dir.join("2024_03_NO2_interpolated.tif");
    let ramp = create_ramp_grid(frascati::SIZE, frascati::SIZE, 0.0, 50.0);
    write_geotiff(&raster, &frascati_fixture(vec![ramp])).unwrap();

    let boundaries = dir.join("comuni.geojson");
    std::fs::write(&boundaries, municipalities().to_string()).unwrap();
    (raster, boundaries)
}

fn read_bounds(path: &Path) -> BoundsRecord {
    let text = std::fs::read_to_string(path).unwrap();
    BoundsRecord::from_geojson(&serde_json::from_str::<Value>(&text).unwrap()).unwrap()
}

fn converter() -> Converter {
    Converter::new(ConverterConfig::default()).unwrap()
}

// ============================================================================
// In-memory rendering
// ============================================================================

#[test]
fn test_origin_ramp_scalar_render() {
    let grid = origin_ramp_grid();
    let mode = RenderMode::Scalar {
        category: "NO2".to_string(),
    };
    let out = converter().render(&grid, &mode, None).unwrap();
    assert!(out.is_exact());

    let image = &out.value.image;
    assert_eq!((image.width, image.height), (4, 4));
    assert_eq!(image.pixels.len(), 4 * 4 * 4);

    let first = Colormap::Inferno.first();
    let last = Colormap::Inferno.last();
    assert_eq!(image.pixel(0, 0).unwrap(), &[first.r, first.g, first.b, 255]);
    assert_eq!(image.pixel(3, 3).unwrap(), &[last.r, last.g, last.b, 255]);

    // Corners go back to the UTM rectangle
    let expected = [(0.0, 0.0), (40.0, 0.0), (40.0, -40.0), (0.0, -40.0)];
    for (corner, (e, n)) in out.value.bounds.corners.iter().zip(expected) {
        let p = geo_to_utm(corner.lon, corner.lat, 12, true);
        assert_approx_eq!(p.easting, e, 1.0);
        assert_approx_eq!(p.northing, n, 1.0);
    }
}

// ============================================================================
// File conversion
// ============================================================================

#[test]
fn test_monthly_conversion_clipped_to_region() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, boundaries) = monthly_inputs(dir.path());
    let out_dir = dir.path().join("web");

    let request = ConvertRequest::new(&raster, &out_dir)
        .with_boundary(BoundaryRef::new(&boundaries, "frascati"));
    let outcome = converter().convert(&request).unwrap();
    assert!(outcome.is_exact(), "{:?}", outcome.degradations);

    let report = outcome.value;
    assert_eq!(report.status, ConversionStatus::Converted);
    assert_eq!(report.image, out_dir.join("NO2_month03_inferno.png"));
    assert_eq!(report.bounds, out_dir.join("NO2_month03_bounds.geojson"));
    assert_eq!(report.clipped_to.as_deref(), Some("Frascati"));
    assert!(report.width < frascati::SIZE && report.height < frascati::SIZE);

    let png = image::open(&report.image).unwrap();
    assert_eq!(png.dimensions(), (report.width as u32, report.height as u32));

    let bounds = read_bounds(&report.bounds);
    let props = &bounds.properties;
    assert_eq!(props.clipped_to, "Frascati");
    assert_eq!(props.category.as_deref(), Some("NO2"));
    assert_eq!(props.pollutant.as_deref(), Some("NO2"));
    assert_eq!(props.year.as_deref(), Some("2024"));
    assert_eq!(props.month.as_deref(), Some("03"));
    assert_eq!(props.image_file.as_deref(), Some("NO2_month03_inferno.png"));
    assert_eq!((props.vmin, props.vmax), (Some(0.0), Some(50.0)));
    assert_eq!(props.source_crs, "EPSG:32633");
    assert!(props.degradations.is_empty());

    // The clipped footprint sits inside the raster extent
    let (min_lon, min_lat, max_lon, max_lat) = frascati::EXTENT;
    let bbox = bounds.bbox();
    assert!(bbox.min_x > min_lon - 0.001 && bbox.max_x < max_lon + 0.001);
    assert!(bbox.min_y > min_lat - 0.001 && bbox.max_y < max_lat + 0.001);
}

#[test]
fn test_disjoint_boundary_degrades_to_full_raster() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, boundaries) = monthly_inputs(dir.path());

    let request = ConvertRequest::new(&raster, dir.path())
        .with_boundary(BoundaryRef::new(&boundaries, "Faraway"));
    let outcome = converter().convert(&request).unwrap();

    assert!(matches!(outcome.degradations.as_slice(), [Degradation::ClipFailed { .. }]));
    assert_eq!((outcome.value.width, outcome.value.height), (frascati::SIZE, frascati::SIZE));
    assert_eq!(outcome.value.clipped_to, None);

    let props = read_bounds(&outcome.value.bounds).properties;
    assert_eq!(props.clipped_to, "full");
    assert_eq!(props.degradations, outcome.degradations);
}

#[test]
fn test_line_string_boundary_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, boundaries) = monthly_inputs(dir.path());

    let request = ConvertRequest::new(&raster, dir.path())
        .with_boundary(BoundaryRef::new(&boundaries, "Roadway"));
    let outcome = converter().convert(&request).unwrap();
    assert_eq!(
        outcome.degradations,
        vec![Degradation::UnsupportedGeometry {
            geometry_type: "LineString".to_string()
        }]
    );
    assert_eq!(outcome.value.width, frascati::SIZE);
}

#[test]
fn test_missing_boundary_name_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, boundaries) = monthly_inputs(dir.path());

    let request = ConvertRequest::new(&raster, dir.path())
        .with_boundary(BoundaryRef::new(&boundaries, "Atlantis"));
    let outcome = converter().convert(&request).unwrap();
    assert_eq!(
        outcome.degradations,
        vec![Degradation::BoundaryNotFound {
            name: "Atlantis".to_string()
        }]
    );
}

#[test]
fn test_clipping_disabled_ignores_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, boundaries) = monthly_inputs(dir.path());

    let config = ConverterConfig {
        clip_to_boundary: false,
        ..Default::default()
    };
    let request = ConvertRequest::new(&raster, dir.path())
        .with_boundary(BoundaryRef::new(&boundaries, "Frascati"));
    let outcome = Converter::new(config).unwrap().convert(&request).unwrap();
    assert!(outcome.is_exact());
    assert_eq!(outcome.value.width, frascati::SIZE);
    assert_eq!(outcome.value.clipped_to, None);
}

#[test]
fn test_truecolor_scene() {
    let dir = tempfile::tempdir().unwrap();
    let raster = dir.path().join("S2_Frascati.tif");
    let bands = create_reflectance_bands(frascati::SIZE, frascati::SIZE, 3, 400.0);
    write_geotiff(&raster, &frascati_fixture(bands)).unwrap();

    let outcome = converter().convert(&ConvertRequest::new(&raster, dir.path())).unwrap();
    let report = outcome.value;
    assert_eq!(report.image, dir.path().join("S2_Frascati.png"));
    assert_eq!(report.bounds, dir.path().join("S2_Frascati_bounds.json"));

    let png = image::open(&report.image).unwrap();
    assert_eq!(png.color(), image::ColorType::Rgb8);

    let props = read_bounds(&report.bounds).properties;
    assert_eq!(props.num_bands, 3);
    assert!(props.vmin.is_none() && props.colormap.is_none());
}

#[test]
fn test_explicit_mode_overrides_name() {
    let dir = tempfile::tempdir().unwrap();
    let raster = dir.path().join("ozone.tif");
    let ramp = create_ramp_grid(frascati::SIZE, frascati::SIZE, 20.0, 80.0);
    write_geotiff(&raster, &frascati_fixture(vec![ramp])).unwrap();

    let request = ConvertRequest::new(&raster, dir.path()).with_mode(RenderMode::Scalar {
        category: "o3".to_string(),
    });
    let report = converter().convert(&request).unwrap().value;
    let props = read_bounds(&report.bounds).properties;
    assert_eq!((props.vmin, props.vmax), (Some(20.0), Some(80.0)));
    assert!(props.month.is_none());
}

#[test]
fn test_skip_existing() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, _) = monthly_inputs(dir.path());

    let first = converter()
        .convert(&ConvertRequest::new(&raster, dir.path()).skip_existing(true))
        .unwrap();
    assert_eq!(first.value.status, ConversionStatus::Converted);

    let second = converter()
        .convert(&ConvertRequest::new(&raster, dir.path()).skip_existing(true))
        .unwrap();
    assert_eq!(second.value.status, ConversionStatus::Skipped);
    assert_eq!(second.value.image, first.value.image);
}

#[test]
fn test_webp_companion() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, _) = monthly_inputs(dir.path());

    let config = ConverterConfig {
        webp_quality: Some(80.0),
        ..Default::default()
    };
    let report = Converter::new(config)
        .unwrap()
        .convert(&ConvertRequest::new(&raster, dir.path()))
        .unwrap()
        .value;
    let webp = report.webp.unwrap();
    assert_eq!(webp, dir.path().join("NO2_month03_inferno.webp"));
    let data = std::fs::read(&webp).unwrap();
    assert_eq!(&data[0..4], b"RIFF");
    assert_eq!(&data[8..12], b"WEBP");
}

#[test]
fn test_unreadable_raster_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let raster = dir.path().join("broken.tif");
    std::fs::write(&raster, b"not a tiff").unwrap();

    let err = converter().convert(&ConvertRequest::new(&raster, dir.path())).unwrap_err();
    assert!(matches!(err, MapError::InputRead { .. }));
    assert!(err.is_fatal());
    assert!(!dir.path().join("broken.png").exists());
}

#[test]
fn test_failed_bounds_write_leaves_no_image() {
    let dir = tempfile::tempdir().unwrap();
    let (raster, _) = monthly_inputs(dir.path());
    let out_dir = dir.path().join("web");
    // A directory where the bounds file belongs makes the write fail
    std::fs::create_dir_all(out_dir.join("NO2_month03_bounds.geojson")).unwrap();

    let err = converter().convert(&ConvertRequest::new(&raster, &out_dir)).unwrap_err();
    assert!(matches!(err, MapError::Output { .. }));
    assert!(!out_dir.join("NO2_month03_inferno.png").exists());
}

#[test]
fn test_invalid_config_rejected() {
    let config = ConverterConfig {
        webp_quality: Some(150.0),
        ..Default::default()
    };
    assert!(matches!(Converter::new(config), Err(MapError::InvalidConfig(_))));
}
