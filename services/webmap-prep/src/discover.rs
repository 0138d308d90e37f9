//! Input discovery for batch commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Files under `root` with extension `ext` (case-insensitive), sorted.
pub fn find_files(root: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    debug!(root = %root.display(), ext, count = files.len(), "Discovered files");
    Ok(files)
}

/// Output directory for `input` that mirrors its place under `root`.
///
/// `raw/Frascati/2024/a.tif` under `raw` goes to `<out>/Frascati/2024`.
pub fn mirrored_dir(root: &Path, input: &Path, out: &Path) -> PathBuf {
    match input.parent().and_then(|p| p.strip_prefix(root).ok()) {
        Some(relative) => out.join(relative),
        None => out.to_path_buf(),
    }
}

/// Region named by the first directory under `root`, as in
/// `raw/<region>/<year>/file.tif`.
pub fn region_from_path(root: &Path, input: &Path) -> Option<String> {
    let relative = input.strip_prefix(root).ok()?;
    let mut components = relative.components();
    let first = components.next()?;
    // A bare file name directly under root names no region
    components.next()?;
    first.as_os_str().to_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Frascati/2024");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("b.tif"), b"").unwrap();
        std::fs::write(nested.join("a.TIF"), b"").unwrap();
        std::fs::write(nested.join("notes.txt"), b"").unwrap();

        let files = find_files(dir.path(), "tif").unwrap();
        assert_eq!(files, vec![nested.join("a.TIF"), nested.join("b.tif")]);
    }

    #[test]
    fn test_mirrored_dir() {
        let out = mirrored_dir(
            Path::new("raw"),
            Path::new("raw/Frascati/2024/2024_01_NO2_interpolated.tif"),
            Path::new("web"),
        );
        assert_eq!(out, PathBuf::from("web/Frascati/2024"));
        assert_eq!(
            mirrored_dir(Path::new("raw"), Path::new("elsewhere/a.tif"), Path::new("web")),
            PathBuf::from("web")
        );
    }

    #[test]
    fn test_region_from_path() {
        let root = Path::new("raw");
        assert_eq!(
            region_from_path(root, Path::new("raw/Frascati/2024/a.tif")).as_deref(),
            Some("Frascati")
        );
        assert_eq!(region_from_path(root, Path::new("raw/a.tif")), None);
        assert_eq!(region_from_path(root, Path::new("other/x/a.tif")), None);
    }
}
