//! Exact-or-degraded results.
//!
//! A conversion either fails outright (`Err(MapError)`) or produces output.
//! Output produced through a fallback path carries the reasons, so callers
//! can tell exact results from best-effort ones.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal reduction in output fidelity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// CRS label had no UTM zone; coordinates were treated as WGS84.
    ReprojectionUnavailable { crs_label: String },
    /// Clipping failed; the full raster was used.
    ClipFailed { reason: String },
    /// Boundary geometry is neither Polygon nor MultiPolygon; no clip.
    UnsupportedGeometry { geometry_type: String },
    /// Requested region is not in the boundary file; no clip.
    BoundaryNotFound { name: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::ReprojectionUnavailable { crs_label } => write!(
                f,
                "no UTM zone in CRS '{}', coordinates treated as WGS84",
                crs_label
            ),
            Degradation::ClipFailed { reason } => {
                write!(f, "clip failed ({}), using full raster", reason)
            }
            Degradation::UnsupportedGeometry { geometry_type } => write!(
                f,
                "boundary geometry '{}' is not a polygon, using full raster",
                geometry_type
            ),
            Degradation::BoundaryNotFound { name } => {
                write!(f, "boundary '{}' not found, using full raster", name)
            }
        }
    }
}

/// A value plus the degradations incurred while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub degradations: Vec<Degradation>,
}

impl<T> Outcome<T> {
    pub fn exact(value: T) -> Self {
        Self {
            value,
            degradations: Vec::new(),
        }
    }

    pub fn degraded(value: T, reason: Degradation) -> Self {
        Self {
            value,
            degradations: vec![reason],
        }
    }

    pub fn is_exact(&self) -> bool {
        self.degradations.is_empty()
    }

    pub fn push(&mut self, reason: Degradation) {
        self.degradations.push(reason);
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            degradations: self.degradations,
        }
    }

    /// Move this outcome's degradations onto `other`'s and return the value.
    pub fn merge_into<U>(self, other: &mut Outcome<U>) -> T {
        other.degradations.extend(self.degradations);
        self.value
    }

    pub fn into_parts(self) -> (T, Vec<Degradation>) {
        (self.value, self.degradations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_degraded() {
        let exact = Outcome::exact(1);
        assert!(exact.is_exact());

        let degraded = Outcome::degraded(
            2,
            Degradation::BoundaryNotFound {
                name: "Frascati".into(),
            },
        );
        assert!(!degraded.is_exact());
        assert_eq!(degraded.degradations.len(), 1);
    }

    #[test]
    fn test_merge_into_collects_reasons() {
        let mut outer = Outcome::exact("image");
        let inner = Outcome::degraded(
            7,
            Degradation::ClipFailed {
                reason: "no overlap".into(),
            },
        );
        let value = inner.merge_into(&mut outer);
        assert_eq!(value, 7);
        assert!(!outer.is_exact());
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_value(Degradation::ReprojectionUnavailable {
            crs_label: "EPSG:3035".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "reprojection_unavailable");
        assert_eq!(json["crs_label"], "EPSG:3035");
    }
}
