//! Error types for webmap-prep.

use std::path::Path;

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for raster conversion.
///
/// Only `InputRead` on the primary raster is fatal for a file. The clip and
/// reprojection variants normally surface as a [`crate::Degradation`] on a
/// successful outcome; they exist here for the callers that want to treat
/// them as hard errors (for example when loading a boundary on its own).
#[derive(Debug, Error)]
pub enum MapError {
    // === Input Errors ===
    #[error("Failed to read {path}: {message}")]
    InputRead { path: String, message: String },

    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    #[error("Boundary not found: {0}")]
    BoundaryNotFound(String),

    // === Processing Errors ===
    #[error("Clip failed: {0}")]
    ClipFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    // === Output Errors ===
    #[error("Failed to write {path}: {message}")]
    Output { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl MapError {
    pub fn input_read(path: &Path, message: impl Into<String>) -> Self {
        MapError::InputRead {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    pub fn output(path: &Path, message: impl Into<String>) -> Self {
        MapError::Output {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the conversion of the current file.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            MapError::ClipFailure(_)
                | MapError::UnsupportedGeometry(_)
                | MapError::BoundaryNotFound(_)
        )
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(MapError::input_read(Path::new("a.tif"), "missing").is_fatal());
        assert!(MapError::Render("boom".into()).is_fatal());
        assert!(!MapError::ClipFailure("empty".into()).is_fatal());
        assert!(!MapError::BoundaryNotFound("Frascati".into()).is_fatal());
    }

    #[test]
    fn test_input_read_message_carries_path() {
        let err = MapError::input_read(Path::new("/data/x.tif"), "not a TIFF");
        assert_eq!(err.to_string(), "Failed to read /data/x.tif: not a TIFF");
    }
}
