//! Raster to web-map overlay conversion.
//!
//! One raster moves through `Load -> [Clip] -> Normalize -> Colorize ->
//! Write`. Only a raster that cannot be read, or a render or write error,
//! fails the file. Boundary and reprojection problems fall back to the full
//! raster in native coordinates and are reported as degradations on the
//! outcome and in the bounds properties.

use std::fmt;
use std::path::{Path, PathBuf};

use geotiff_parser::load_raster;
use map_common::{Degradation, MapError, MapResult, Outcome, RasterGrid};
use renderer::{compose_scalar, compose_truecolor, encode_png, encode_webp, RenderedImage};
use tracing::{debug, info, warn};

use crate::boundary::{BoundaryPolygon, BoundaryRef};
use crate::bounds::BoundsRecord;
use crate::clip::{clip_to_boundary, RasterView};
use crate::config::ConverterConfig;
use crate::output::OutputPaths;

/// How pixel values become colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Three reflectance bands stretched into RGB
    TrueColor,
    /// One band mapped through the colormap over the category's domain
    Scalar { category: String },
}

impl RenderMode {
    /// Scalar for monthly products, truecolor otherwise.
    pub fn infer(paths: &OutputPaths) -> Self {
        match &paths.product {
            Some(product) => RenderMode::Scalar {
                category: product.category.clone(),
            },
            None => RenderMode::TrueColor,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::TrueColor => write!(f, "truecolor"),
            RenderMode::Scalar { category } => write!(f, "scalar({})", category),
        }
    }
}

/// Zero-based RGB band indices for a truecolor composite.
///
/// Defaults: `[3, 2, 1]` with four or more bands (B4/B3/B2 of a Sentinel-2
/// stack), `[0, 1, 2]` with three, and the first band as grayscale below
/// that. Configured indices must exist.
pub fn select_truecolor_bands(band_count: usize, configured: Option<[usize; 3]>) -> MapResult<[usize; 3]> {
    let bands = match configured {
        Some(bands) => bands,
        None if band_count >= 4 => [3, 2, 1],
        None if band_count == 3 => [0, 1, 2],
        None => [0, 0, 0],
    };
    if let Some(bad) = bands.iter().find(|b| **b >= band_count) {
        return Err(MapError::Render(format!(
            "band index {} out of range for a {}-band raster",
            bad, band_count
        )));
    }
    Ok(bands)
}

/// A rendered image with its footprint.
#[derive(Debug, Clone)]
pub struct RenderedOutput {
    pub image: RenderedImage,
    pub bounds: BoundsRecord,
}

/// One conversion job.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Inferred from the file name when unset
    pub mode: Option<RenderMode>,
    pub boundary: Option<BoundaryRef>,
    pub skip_existing: bool,
}

impl ConvertRequest {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            mode: None,
            boundary: None,
            skip_existing: false,
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryRef) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Converted,
    Skipped,
}

/// What a conversion produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub status: ConversionStatus,
    pub image: PathBuf,
    pub bounds: PathBuf,
    pub webp: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    /// Region the image was clipped to
    pub clipped_to: Option<String>,
}

/// Converts rasters according to one configuration.
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> MapResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert one file: read, render, write the image and bounds.
    pub fn convert(&self, request: &ConvertRequest) -> MapResult<Outcome<ConversionReport>> {
        let paths = OutputPaths::for_input(&request.input, &request.output_dir);

        if request.skip_existing && paths.exist() {
            info!(image = %paths.image.display(), "Skipped (exists)");
            return Ok(Outcome::exact(ConversionReport {
                input: request.input.clone(),
                status: ConversionStatus::Skipped,
                image: paths.image,
                bounds: paths.bounds,
                webp: None,
                width: 0,
                height: 0,
                clipped_to: None,
            }));
        }

        let grid = load_raster(&request.input)?;
        let mode = request.mode.clone().unwrap_or_else(|| RenderMode::infer(&paths));
        info!(
            input = %request.input.display(),
            mode = %mode,
            width = grid.width(),
            height = grid.height(),
            bands = grid.band_count(),
            crs = %grid.crs,
            "Converting raster"
        );

        let mut outcome = Outcome::exact(());
        let boundary = match (&request.boundary, self.config.clip_to_boundary) {
            (Some(boundary_ref), true) => match boundary_ref.load() {
                Ok(boundary) => Some(boundary),
                Err(e) => {
                    let reason = boundary_degradation(e);
                    warn!(boundary = %boundary_ref.name, "{}", reason);
                    outcome.push(reason);
                    None
                }
            },
            (Some(boundary_ref), false) => {
                debug!(boundary = %boundary_ref.name, "Clipping disabled by configuration");
                None
            }
            (None, _) => None,
        };

        let mut output = self.render(&grid, &mode, boundary.as_ref())?.merge_into(&mut outcome);
        drop(grid);

        let props = &mut output.bounds.properties;
        if let Some(product) = &paths.product {
            props.year = Some(product.year.clone());
            props.month = Some(product.month.clone());
            props.pollutant = Some(product.category.clone());
        }
        props.image_file = Some(paths.image_file_name());
        props.degradations = outcome.degradations.clone();
        let clipped_to = (props.clipped_to != "full").then(|| props.clipped_to.clone());

        let webp = self.write_outputs(&output, &paths, &request.output_dir)?;
        info!(
            image = %paths.image.display(),
            bounds = %paths.bounds.display(),
            clipped_to = clipped_to.as_deref().unwrap_or("full"),
            degraded = !outcome.is_exact(),
            "Converted"
        );

        Ok(outcome.map(|()| ConversionReport {
            input: request.input.clone(),
            status: ConversionStatus::Converted,
            image: paths.image,
            bounds: paths.bounds,
            webp,
            width: output.image.width,
            height: output.image.height,
            clipped_to,
        }))
    }

    /// Render an in-memory grid without touching the filesystem.
    pub fn render(
        &self,
        grid: &RasterGrid,
        mode: &RenderMode,
        boundary: Option<&BoundaryPolygon>,
    ) -> MapResult<Outcome<RenderedOutput>> {
        let mut outcome = Outcome::exact(());

        if !grid.crs.is_resolved() {
            let reason = Degradation::ReprojectionUnavailable {
                crs_label: grid.crs.to_string(),
            };
            warn!("{}", reason);
            outcome.push(reason);
        }

        let view = self.clip(grid, boundary).merge_into(&mut outcome);
        let (width, height) = (view.width(), view.height());

        let mut bounds =
            BoundsRecord::from_transform(view.transform(), width, height, grid.band_count(), &grid.crs);
        if view.is_clipped() {
            if let Some(b) = boundary {
                bounds.properties.clipped_to = b.name.clone();
            }
        }

        let image = match mode {
            RenderMode::TrueColor => {
                let bands = select_truecolor_bands(grid.band_count(), self.config.truecolor.bands)?;
                let mask = view.nodata_mask(&bands);
                let [r, g, b] = bands.map(|i| view.band(i).unwrap_or_default());
                compose_truecolor(
                    &r,
                    &g,
                    &b,
                    &mask,
                    width,
                    height,
                    &self.config.truecolor.stretch_params(),
                )
                .map_err(MapError::Render)?
            }
            RenderMode::Scalar { category } => {
                let domain = self.config.domain_for(category);
                let band = view
                    .band(0)
                    .ok_or_else(|| MapError::Render("raster has no bands".to_string()))?;
                let mask = view.nodata_mask(&[0]);
                let props = &mut bounds.properties;
                props.vmin = Some(domain.vmin);
                props.vmax = Some(domain.vmax);
                props.colormap = Some(self.config.colormap.name().to_string());
                props.category = Some(category.clone());
                compose_scalar(&band, &mask, width, height, &domain, &self.config.colormap)
                    .map_err(MapError::Render)?
            }
        };
        debug!(mode = %mode, width, height, format = ?image.format, "Rendered image");

        Ok(outcome.map(|()| RenderedOutput { image, bounds }))
    }

    /// Clip to `boundary`, or fall back to the full raster.
    pub fn clip<'a>(
        &self,
        grid: &'a RasterGrid,
        boundary: Option<&BoundaryPolygon>,
    ) -> Outcome<RasterView<'a>> {
        let Some(boundary) = boundary else {
            return Outcome::exact(RasterView::full(grid));
        };
        match clip_to_boundary(grid, boundary) {
            Ok(view) => {
                info!(
                    boundary = %boundary.name,
                    width = view.width(),
                    height = view.height(),
                    inside = view.inside_count(),
                    "Clipped to boundary"
                );
                Outcome::exact(view)
            }
            Err(e) => {
                let reason = Degradation::ClipFailed {
                    reason: failure_reason(e),
                };
                warn!(boundary = %boundary.name, "{}", reason);
                Outcome::degraded(RasterView::full(grid), reason)
            }
        }
    }

    fn write_outputs(
        &self,
        output: &RenderedOutput,
        paths: &OutputPaths,
        output_dir: &Path,
    ) -> MapResult<Option<PathBuf>> {
        std::fs::create_dir_all(output_dir).map_err(|e| MapError::output(output_dir, e.to_string()))?;

        let png = encode_png(&output.image).map_err(MapError::Render)?;
        std::fs::write(&paths.image, &png).map_err(|e| MapError::output(&paths.image, e.to_string()))?;
        // An image without its footprint is unusable
        if let Err(e) = output.bounds.write(&paths.bounds) {
            if let Err(remove_err) = std::fs::remove_file(&paths.image) {
                warn!(path = %paths.image.display(), error = %remove_err, "Failed to remove image");
            }
            return Err(e);
        }

        let Some(quality) = self.config.webp_quality else {
            return Ok(None);
        };
        let webp_path = paths.webp();
        let data = encode_webp(&output.image, quality).map_err(MapError::Render)?;
        std::fs::write(&webp_path, &data).map_err(|e| MapError::output(&webp_path, e.to_string()))?;
        debug!(path = %webp_path.display(), bytes = data.len(), "Wrote WebP");
        Ok(Some(webp_path))
    }
}

/// The degradation recorded when a boundary cannot be loaded.
fn boundary_degradation(err: MapError) -> Degradation {
    match err {
        MapError::BoundaryNotFound(name) => Degradation::BoundaryNotFound { name },
        MapError::UnsupportedGeometry(geometry_type) => Degradation::UnsupportedGeometry { geometry_type },
        other => Degradation::ClipFailed {
            reason: failure_reason(other),
        },
    }
}

fn failure_reason(err: MapError) -> String {
    match err {
        MapError::ClipFailure(message) => message,
        other => other.to_string(),
    }
}

/// Tally of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
    pub degraded: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn record(&mut self, input: &Path, result: &MapResult<Outcome<ConversionReport>>) {
        match result {
            Ok(outcome) => {
                match outcome.value.status {
                    ConversionStatus::Converted => self.converted += 1,
                    ConversionStatus::Skipped => self.skipped += 1,
                }
                if !outcome.is_exact() {
                    self.degraded += 1;
                }
            }
            Err(e) => self.failed.push((input.to_path_buf(), e.to_string())),
        }
    }

    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} converted ({} degraded), {} skipped, {} failed",
            self.total(),
            self.converted,
            self.degraded,
            self.skipped,
            self.failed.len()
        )
    }
}
