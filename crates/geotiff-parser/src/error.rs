//! Error types for GeoTIFF reading.

use thiserror::Error;

/// Result type for GeoTIFF parser operations.
pub type GeoTiffResult<T> = Result<T, GeoTiffError>;

/// Error types for GeoTIFF parsing.
#[derive(Error, Debug)]
pub enum GeoTiffError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Not a TIFF, or a TIFF the decoder cannot handle
    #[error("TIFF decoding failed: {0}")]
    Decode(#[from] tiff::TiffError),

    /// Missing required tag
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Tag present but unusable
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Valid TIFF layout this reader does not support
    #[error("Unsupported layout: {0}")]
    Unsupported(String),
}
