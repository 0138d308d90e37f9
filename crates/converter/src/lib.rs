//! GeoTIFF to web-map overlay conversion.
//!
//! Turns a georeferenced raster into a PNG plus a WGS84 bounds GeoJSON that
//! a web map can drape as an image overlay. Monthly prediction rasters are
//! colored through a colormap; multi-band scenes become stretched truecolor
//! composites. Rasters can be clipped to a named region boundary, and
//! prediction rasters can be sampled at ground stations.

pub mod boundary;
pub mod bounds;
pub mod clip;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod stations;

pub use boundary::{load_boundary, BoundaryPolygon, BoundaryRef, Polygon};
pub use bounds::{BoundsProperties, BoundsRecord};
pub use clip::{clip_to_boundary, RasterView};
pub use config::{ConverterConfig, TruecolorConfig};
pub use output::{parse_monthly_name, MonthlyProduct, OutputPaths};
pub use pipeline::{
    select_truecolor_bands, BatchSummary, ConversionReport, ConversionStatus, ConvertRequest,
    Converter, RenderMode, RenderedOutput,
};
pub use stations::{sample_at, sample_stations, StationReport};
