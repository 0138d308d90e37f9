//! Converter configuration.
//!
//! Loaded from an optional YAML file; every field has a default so an
//! empty or partial file is valid. A missing file means "all defaults".
//!
//! ```yaml
//! clip_to_boundary: true
//! color_domains:
//!   NO2: { vmin: 0, vmax: 50 }
//! truecolor:
//!   bands: [3, 2, 1]
//!   gamma: 0.75
//! region_bounds:
//!   Frascati: { min_x: 12.62, min_y: 41.77, max_x: 12.74, max_y: 41.85 }
//! webp_quality: 85
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use map_common::{BoundingBox, MapError, MapResult};
use renderer::{Colormap, StretchParams, ValueDomain};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable overriding `clip_to_boundary`.
pub const ENV_CLIP_TO_BOUNDARY: &str = "WEBMAP_CLIP_TO_BOUNDARY";

/// Environment variable overriding `webp_quality`.
pub const ENV_WEBP_QUALITY: &str = "WEBMAP_WEBP_QUALITY";

/// Truecolor composite settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruecolorConfig {
    /// Zero-based band indices for red, green and blue. Chosen from the
    /// band count when unset.
    pub bands: Option<[usize; 3]>,
    pub low_percentile: f32,
    pub high_percentile: f32,
    pub gamma: f32,
}

impl Default for TruecolorConfig {
    fn default() -> Self {
        let stretch = StretchParams::default();
        Self {
            bands: None,
            low_percentile: stretch.low_percentile,
            high_percentile: stretch.high_percentile,
            gamma: stretch.gamma,
        }
    }
}

impl TruecolorConfig {
    pub fn stretch_params(&self) -> StretchParams {
        StretchParams {
            low_percentile: self.low_percentile,
            high_percentile: self.high_percentile,
            gamma: self.gamma,
        }
    }
}

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Clip to the requested boundary when one is given
    pub clip_to_boundary: bool,
    /// Display range per category (e.g. pollutant)
    pub color_domains: BTreeMap<String, ValueDomain>,
    /// Display range for categories missing from `color_domains`
    pub default_domain: ValueDomain,
    pub colormap: Colormap,
    pub truecolor: TruecolorConfig,
    /// WGS84 extents of named regions, used to filter stations
    pub region_bounds: BTreeMap<String, BoundingBox>,
    /// Margin added around the station filter box, in degrees
    pub station_buffer_deg: f64,
    /// Also write a lossy WebP next to each PNG when set
    pub webp_quality: Option<f32>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            clip_to_boundary: true,
            color_domains: default_color_domains(),
            default_domain: ValueDomain::new(0.0, 50.0),
            colormap: Colormap::Inferno,
            truecolor: TruecolorConfig::default(),
            region_bounds: BTreeMap::new(),
            station_buffer_deg: 0.01,
            webp_quality: None,
        }
    }
}

/// Pollutant display ranges.
pub fn default_color_domains() -> BTreeMap<String, ValueDomain> {
    [
        ("NO2", 0.0, 50.0),
        ("O3", 20.0, 80.0),
        ("SO2", 0.0, 10.0),
        ("PM2_5", 0.0, 35.0),
        ("PM10", 0.0, 50.0),
    ]
    .into_iter()
    .map(|(name, vmin, vmax)| (name.to_string(), ValueDomain::new(vmin, vmax)))
    .collect()
}

impl ConverterConfig {
    /// Parse YAML. An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> MapResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| MapError::InvalidConfig(e.to_string()))
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> MapResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| MapError::input_read(path, e.to_string()))?;
        let config = Self::from_yaml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults when it is missing or
    /// cannot be used.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded converter config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unusable config file, using defaults");
                Self::default()
            }
        }
    }

    /// Apply `WEBMAP_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CLIP_TO_BOUNDARY) {
            match parse_bool(&raw) {
                Some(value) => self.clip_to_boundary = value,
                None => warn!(key = ENV_CLIP_TO_BOUNDARY, value = %raw, "Ignoring invalid boolean"),
            }
        }
        if let Some(raw) = lookup(ENV_WEBP_QUALITY) {
            match raw.trim().parse::<f32>() {
                Ok(q) => self.webp_quality = Some(q),
                Err(_) => warn!(key = ENV_WEBP_QUALITY, value = %raw, "Ignoring invalid number"),
            }
        }
    }

    pub fn validate(&self) -> MapResult<()> {
        for (name, domain) in &self.color_domains {
            domain
                .validate()
                .map_err(|e| MapError::InvalidConfig(format!("color_domains.{}: {}", name, e)))?;
        }
        self.default_domain
            .validate()
            .map_err(|e| MapError::InvalidConfig(format!("default_domain: {}", e)))?;
        self.truecolor
            .stretch_params()
            .validate()
            .map_err(|e| MapError::InvalidConfig(format!("truecolor: {}", e)))?;
        if !(self.station_buffer_deg >= 0.0 && self.station_buffer_deg.is_finite()) {
            return Err(MapError::InvalidConfig(
                "station_buffer_deg must be a non-negative number".to_string(),
            ));
        }
        if let Some(q) = self.webp_quality {
            if !(0.0..=100.0).contains(&q) {
                return Err(MapError::InvalidConfig(format!(
                    "webp_quality {} is outside 0-100",
                    q
                )));
            }
        }
        Ok(())
    }

    /// Display range for a category; exact match first, then
    /// case-insensitive, then the default domain.
    pub fn domain_for(&self, category: &str) -> ValueDomain {
        self.color_domains
            .get(category)
            .or_else(|| {
                self.color_domains
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(category))
                    .map(|(_, d)| d)
            })
            .copied()
            .unwrap_or(self.default_domain)
    }

    /// Configured WGS84 extent of a region, matched case-insensitively.
    pub fn region_bounds_for(&self, region: &str) -> Option<BoundingBox> {
        self.region_bounds
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(region))
            .map(|(_, b)| *b)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
