//! Common types shared across the webmap-prep crates.

pub mod affine;
pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod outcome;
pub mod point;

pub use affine::AffineTransform;
pub use bbox::BoundingBox;
pub use crs::{CrsKind, RasterCrs, UtmZone};
pub use error::{MapError, MapResult};
pub use grid::RasterGrid;
pub use outcome::{Degradation, Outcome};
pub use point::{GeographicPoint, ProjectedPoint};
