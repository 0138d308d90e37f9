//! Round-trip tests: write a synthetic GeoTIFF, read it back.

use geotiff_parser::{load_raster, read_geotiff};
use map_common::{CrsKind, MapError, UtmZone};
use test_utils::{create_reflectance_bands, create_test_grid, write_geotiff, GeoTiffFixture};

// ============================================================================
// Georeferencing
// ============================================================================

#[test]
fn test_read_projected_single_band() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no2.tif");
    let data = create_test_grid(6, 4);
    let fixture = GeoTiffFixture::utm(32633, 305_000.0, 4_632_000.0, 100.0, 6, 4, vec![data.clone()]);
    write_geotiff(&path, &fixture).unwrap();

    let grid = read_geotiff(&path).unwrap();
    assert_eq!((grid.width(), grid.height()), (6, 4));
    assert_eq!(grid.band_count(), 1);
    assert_eq!(grid.crs.label, "EPSG:32633");
    assert_eq!(grid.crs.kind, CrsKind::Utm(UtmZone::north(33)));
    assert_eq!(grid.transform.forward(0.0, 0.0), (305_000.0, 4_632_000.0));
    assert_eq!(grid.transform.forward(6.0, 4.0), (305_600.0, 4_631_600.0));
    assert_eq!(grid.band(0).unwrap(), data.as_slice());
    assert_eq!(grid.nodata, None);
}

#[test]
fn test_read_citation_crs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cited.tif");
    let fixture = GeoTiffFixture::utm(0, 300_000.0, 6_200_000.0, 10.0, 2, 2, vec![vec![1.0; 4]])
        .with_citation("WGS 84 / UTM zone 56S");
    write_geotiff(&path, &fixture).unwrap();

    let grid = read_geotiff(&path).unwrap();
    assert_eq!(grid.crs.label, "WGS 84 / UTM zone 56S");
    assert_eq!(grid.crs.utm_zone(), Some(UtmZone::south(56)));
}

#[test]
fn test_read_geographic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wgs84.tif");
    let mut fixture = GeoTiffFixture::utm(0, 12.5, 42.0, 0.01, 3, 3, vec![vec![0.0; 9]]);
    fixture.epsg = None;
    write_geotiff(&path, &fixture).unwrap();

    let grid = read_geotiff(&path).unwrap();
    assert_eq!(grid.crs.label, "EPSG:4326");
    assert_eq!(grid.crs.kind, CrsKind::Geographic);
}

// ============================================================================
// Bands and no-data
// ============================================================================

#[test]
fn test_read_four_bands_deinterleaved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s2.tif");
    let bands = create_reflectance_bands(5, 5, 4, 100.0);
    let fixture = GeoTiffFixture::utm(32632, 500_000.0, 5_000_000.0, 10.0, 5, 5, bands.clone());
    write_geotiff(&path, &fixture).unwrap();

    let grid = read_geotiff(&path).unwrap();
    assert_eq!(grid.band_count(), 4);
    for (i, band) in bands.iter().enumerate() {
        assert_eq!(grid.band(i).unwrap(), band.as_slice(), "band {}", i);
    }
}

#[test]
fn test_read_gdal_nodata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nodata.tif");
    let fixture = GeoTiffFixture::utm(32612, 0.0, 0.0, 10.0, 2, 1, vec![vec![-9999.0, 3.0]])
        .with_nodata(-9999.0);
    write_geotiff(&path, &fixture).unwrap();

    let grid = read_geotiff(&path).unwrap();
    assert_eq!(grid.nodata, Some(-9999.0));
    assert!(grid.is_nodata(grid.value(0, 0, 0).unwrap()));
    assert!(!grid.is_nodata(grid.value(0, 1, 0).unwrap()));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_garbage_file_is_input_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.tif");
    std::fs::write(&path, b"II*\0garbage").unwrap();

    match load_raster(&path) {
        Err(MapError::InputRead { path: p, .. }) => assert!(p.ends_with("broken.tif")),
        other => panic!("expected InputRead, got {:?}", other.map(|g| g.width())),
    }
}
