//! Output file naming.

use std::path::{Path, PathBuf};

/// A monthly product named `YYYY_MM_<CATEGORY>_interpolated.tif`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyProduct {
    pub year: String,
    pub month: String,
    pub category: String,
}

/// Parse a monthly product file name; None for any other name.
///
/// ```
/// use converter::output::parse_monthly_name;
///
/// let p = parse_monthly_name("2024_01_PM2_5_interpolated.tif").unwrap();
/// assert_eq!((p.year.as_str(), p.month.as_str(), p.category.as_str()), ("2024", "01", "PM2_5"));
/// assert!(parse_monthly_name("S2_Frascati.tif").is_none());
/// ```
pub fn parse_monthly_name(file_name: &str) -> Option<MonthlyProduct> {
    let stem = file_name.strip_suffix("_interpolated.tif")?;
    let (year, rest) = stem.split_once('_')?;
    let (month, category) = rest.split_once('_')?;

    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    let valid_category = !category.is_empty()
        && category.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !(digits(year, 4) && digits(month, 2) && valid_category) {
        return None;
    }

    Some(MonthlyProduct {
        year: year.to_string(),
        month: month.to_string(),
        category: category.to_string(),
    })
}

/// Where the image and bounds for one input go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub image: PathBuf,
    pub bounds: PathBuf,
    pub product: Option<MonthlyProduct>,
}

impl OutputPaths {
    /// Monthly products become `<CAT>_month<MM>_inferno.png` and
    /// `<CAT>_month<MM>_bounds.geojson`; anything else `<stem>.png` and
    /// `<stem>_bounds.json`.
    pub fn for_input(input: &Path, output_dir: &Path) -> Self {
        let file_name = input.file_name().and_then(|n| n.to_str()).unwrap_or_default();

        if let Some(product) = parse_monthly_name(file_name) {
            let base = format!("{}_month{}", product.category, product.month);
            return Self {
                image: output_dir.join(format!("{}_inferno.png", base)),
                bounds: output_dir.join(format!("{}_bounds.geojson", base)),
                product: Some(product),
            };
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        Self {
            image: output_dir.join(format!("{}.png", stem)),
            bounds: output_dir.join(format!("{}_bounds.json", stem)),
            product: None,
        }
    }

    /// WebP companion of the PNG.
    pub fn webp(&self) -> PathBuf {
        self.image.with_extension("webp")
    }

    /// Both the image and the bounds file already exist.
    pub fn exist(&self) -> bool {
        self.image.exists() && self.bounds.exists()
    }

    pub fn image_file_name(&self) -> String {
        self.image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
