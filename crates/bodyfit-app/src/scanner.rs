//! Image scanning and validation

use std::path::{Path, PathBuf};

use bodyfit_types::{Error, Result};
use walkdir::WalkDir;

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff", "heic", "heif",
];

/// Check if a path is a supported image file
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate an image path before decoding (exists, is a file).
///
/// The format is sniffed from content at decode time, so the extension is not checked.
pub fn validate_image(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    if !path.is_file() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a file",
            path.display()
        )));
    }

    Ok(())
}

/// Scan a directory (recursively) for image files
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.JPEG")));
        assert!(is_supported_image(Path::new("test.png")));
        assert!(is_supported_image(Path::new("test.HEIC")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test")));
    }

    #[test]
    fn test_scan_directory_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("sub").join("c.jpeg"), b"x").unwrap();

        let found = scan_directory(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "a.png");
        assert_eq!(names[1], "b.jpg");
        assert!(names[2].ends_with("c.jpeg"));
    }

    #[test]
    fn test_validate_missing() {
        assert!(matches!(
            validate_image(Path::new("/nope/missing.jpg")),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_validate_ignores_extension() {
        let file = tempfile::Builder::new().suffix(".photo").tempfile().unwrap();
        assert!(validate_image(file.path()).is_ok());

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_image(dir.path()),
            Err(Error::InvalidImageFormat(_))
        ));
    }

    #[test]
    fn test_scan_file_is_not_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(scan_directory(file.path()).is_err());
    }
}
