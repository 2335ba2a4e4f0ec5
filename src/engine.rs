//! Local file and directory classification.

use std::path::{Path, PathBuf};

use crate::classifier;

/// Result of classifying a single image file.
#[derive(Debug)]
pub struct CheckResult {
    /// Path of the classified file.
    pub path: PathBuf,
    /// `Some(true)` if transparent, `Some(false)` if opaque, `None` on failure.
    pub transparent: Option<bool>,
    /// Human-readable status message.
    pub message: String,
}

impl CheckResult {
    /// Whether the file was read and decoded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.transparent.is_some()
    }
}

/// Read and classify one file.
#[must_use]
pub fn check_file(path: &Path) -> CheckResult {
    let mut result = CheckResult {
        path: path.to_path_buf(),
        transparent: None,
        message: String::new(),
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            result.message = format!("Failed to read: {e}");
            return result;
        }
    };

    match classifier::classify(&bytes) {
        Ok(transparent) => {
            result.transparent = Some(transparent);
            result.message = if transparent {
                "has transparent pixels".to_string()
            } else {
                "fully opaque".to_string()
            };
        }
        Err(e) => {
            result.message = format!("Failed to decode: {e}");
        }
    }

    result
}

/// Classify every supported image directly inside `dir`, sorted by path.
///
/// Uses parallel iteration when the `cli` feature is enabled (via rayon).
#[must_use]
pub fn check_directory(dir: &Path) -> Vec<CheckResult> {
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => {
            return vec![CheckResult {
                path: dir.to_path_buf(),
                transparent: None,
                message: format!("Failed to read directory: {e}"),
            }];
        }
    };
    paths.sort();

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        paths.par_iter().map(|p| check_file(p)).collect()
    }

    #[cfg(not(feature = "cli"))]
    {
        paths.iter().map(|p| check_file(p)).collect()
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "png" | "gif" | "bmp" | "jpg" | "jpeg" | "webp" | "tif" | "tiff" | "ico"
        ),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.GIF")));
        assert!(is_supported_image(Path::new("photo.jpeg")));
        assert!(is_supported_image(Path::new("photo.bmp")));
        assert!(is_supported_image(Path::new("photo.tiff")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn check_file_reports_missing_file() {
        let result = check_file(Path::new("/definitely/not/here.png"));
        assert!(!result.success());
        assert!(result.message.starts_with("Failed to read"));
    }

    #[test]
    fn check_directory_reports_unreadable_directory() {
        let results = check_directory(Path::new("/definitely/not/a/dir"));
        assert_eq!(results.len(), 1);
        assert!(!results[0].success());
    }
}
