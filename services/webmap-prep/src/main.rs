//! Web-map preparation CLI.
//!
//! Converts GeoTIFF rasters into PNG overlays with WGS84 bounds, samples
//! prediction rasters at ground stations, and transcodes PNGs to WebP.

mod discover;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use converter::{
    sample_stations, BatchSummary, BoundaryRef, ConvertRequest, Converter, ConverterConfig,
    RenderMode,
};
use renderer::webp::convert_png_to_webp;
use renderer::DEFAULT_WEBP_QUALITY;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "webmap-prep")]
#[command(about = "Prepare GeoTIFF rasters as web map overlays")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "webmap-prep.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Truecolor,
    Scalar,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert one GeoTIFF to a PNG and bounds file
    Convert {
        /// Input GeoTIFF
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Boundary GeoJSON used for clipping
        #[arg(long, requires = "region")]
        boundary: Option<PathBuf>,

        /// Region (feature name) to clip to
        #[arg(long)]
        region: Option<String>,

        /// Rendering mode (inferred from the file name by default)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Category for scalar mode, e.g. NO2
        #[arg(long)]
        category: Option<String>,
    },

    /// Convert every GeoTIFF under a directory
    Batch {
        /// Input root; `<root>/<region>/...` names the region of each file
        input: PathBuf,

        /// Output root, mirroring the input layout
        #[arg(short, long)]
        output: PathBuf,

        /// Boundary GeoJSON used for clipping
        #[arg(long)]
        boundary: Option<PathBuf>,

        /// Region for every file instead of the directory name
        #[arg(long)]
        region: Option<String>,

        /// Skip files whose outputs already exist
        #[arg(long)]
        skip_existing: bool,
    },

    /// Sample a prediction raster at station locations
    SampleStations {
        /// Prediction GeoTIFF
        raster: PathBuf,

        /// Station GeoJSON (Points)
        #[arg(short, long)]
        stations: PathBuf,

        /// Output GeoJSON
        #[arg(short, long)]
        output: PathBuf,

        /// Region whose configured bounds select the stations
        #[arg(long)]
        region: Option<String>,
    },

    /// Transcode every PNG under a directory to WebP
    Webp {
        /// Directory of PNGs
        input: PathBuf,

        /// WebP quality (0-100)
        #[arg(short, long)]
        quality: Option<f32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    let mut config = ConverterConfig::load_or_default(&cli.config);
    config.apply_env_overrides();

    match cli.command {
        Commands::Convert {
            input,
            output,
            boundary,
            region,
            mode,
            category,
        } => {
            let mode = render_mode(mode, category)?;
            let converter = Converter::new(config).context("Invalid configuration")?;
            let mut request = ConvertRequest::new(&input, &output);
            if let Some(mode) = mode {
                request = request.with_mode(mode);
            }
            if let (Some(path), Some(name)) = (boundary, region) {
                request = request.with_boundary(BoundaryRef::new(path, name));
            }

            let outcome = converter
                .convert(&request)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            for reason in &outcome.degradations {
                warn!(input = %input.display(), "{}", reason);
            }
            println!("{}", outcome.value.image.display());
            println!("{}", outcome.value.bounds.display());
            Ok(())
        }
        Commands::Batch {
            input,
            output,
            boundary,
            region,
            skip_existing,
        } => {
            let converter = Converter::new(config).context("Invalid configuration")?;
            let summary = run_batch(&converter, &input, &output, boundary, region, skip_existing)?;
            println!("{}", summary);
            for (path, message) in &summary.failed {
                println!("  failed: {}: {}", path.display(), message);
            }
            if !summary.is_success() {
                bail!("{} of {} files failed", summary.failed.len(), summary.total());
            }
            Ok(())
        }
        Commands::SampleStations {
            raster,
            stations,
            output,
            region,
        } => {
            config.validate().context("Invalid configuration")?;
            let outcome = sample_stations(&raster, &stations, &output, &config, region.as_deref())
                .with_context(|| format!("Failed to sample {}", raster.display()))?;
            let report = outcome.value;
            println!(
                "{} stations, {} in bounds, {} with predictions, {} missing",
                report.total,
                report.in_bounds,
                report.with_prediction,
                report.missing()
            );
            Ok(())
        }
        Commands::Webp { input, quality } => {
            let quality = quality
                .or(config.webp_quality)
                .unwrap_or(DEFAULT_WEBP_QUALITY);
            if !(0.0..=100.0).contains(&quality) {
                bail!("WebP quality {} is outside 0-100", quality);
            }
            let converted = transcode_dir(&input, quality)?;
            println!("{} PNG files converted to WebP", converted);
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn render_mode(mode: Option<ModeArg>, category: Option<String>) -> Result<Option<RenderMode>> {
    match (mode, category) {
        (Some(ModeArg::Truecolor), _) => Ok(Some(RenderMode::TrueColor)),
        (Some(ModeArg::Scalar), Some(category)) | (None, Some(category)) => {
            Ok(Some(RenderMode::Scalar { category }))
        }
        (Some(ModeArg::Scalar), None) => bail!("--mode scalar needs --category"),
        (None, None) => Ok(None),
    }
}

/// Convert every GeoTIFF under `input`; failures are recorded, not raised.
fn run_batch(
    converter: &Converter,
    input: &Path,
    output: &Path,
    boundary: Option<PathBuf>,
    region: Option<String>,
    skip_existing: bool,
) -> Result<BatchSummary> {
    let mut files = discover::find_files(input, "tif")?;
    files.extend(discover::find_files(input, "tiff")?);
    files.sort();
    info!(input = %input.display(), count = files.len(), "Starting batch conversion");

    let mut summary = BatchSummary::default();
    for file in &files {
        let out_dir = discover::mirrored_dir(input, file, output);
        let mut request = ConvertRequest::new(file, out_dir).skip_existing(skip_existing);

        let name = region.clone().or_else(|| discover::region_from_path(input, file));
        if let (Some(path), Some(name)) = (&boundary, name) {
            request = request.with_boundary(BoundaryRef::new(path, name));
        }

        let result = converter.convert(&request);
        if let Err(e) = &result {
            error!(input = %file.display(), error = %e, "Conversion failed");
        }
        summary.record(file, &result);
    }

    info!(
        converted = summary.converted,
        skipped = summary.skipped,
        degraded = summary.degraded,
        failed = summary.failed.len(),
        "Batch conversion finished"
    );
    Ok(summary)
}

/// Write a `.webp` next to every PNG under `input`.
fn transcode_dir(input: &Path, quality: f32) -> Result<usize> {
    let files = discover::find_files(input, "png")?;
    let mut converted = 0;
    for png_path in &files {
        let png = std::fs::read(png_path)
            .with_context(|| format!("Failed to read {}", png_path.display()))?;
        let webp = match convert_png_to_webp(&png, quality) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %png_path.display(), error = %e, "Skipping PNG");
                continue;
            }
        };
        let webp_path = png_path.with_extension("webp");
        std::fs::write(&webp_path, &webp)
            .with_context(|| format!("Failed to write {}", webp_path.display()))?;
        info!(
            path = %webp_path.display(),
            png_bytes = png.len(),
            webp_bytes = webp.len(),
            "Wrote WebP"
        );
        converted += 1;
    }
    Ok(converted)
}
