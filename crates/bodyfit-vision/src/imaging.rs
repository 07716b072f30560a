//! Image decoding, downscaling and brightness measurement

use std::fs::File;
use std::io::Read;
use std::path::Path;

use bodyfit_types::{Error, ImageMetadata, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use tempfile::NamedTempFile;
use tracing::debug;

/// Larger image side above which images are downscaled before detection
pub const DEFAULT_MAX_DIMENSION: u32 = 1280;

/// A decoded RGB image ready for the detectors
#[derive(Debug, Clone)]
pub struct PreparedImage {
    image: RgbImage,
}

impl PreparedImage {
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata::new(self.image.width(), self.image.height())
    }

    /// Mean grayscale brightness (0-255)
    pub fn brightness(&self) -> f64 {
        mean_brightness(&self.image)
    }

    /// Shrink so the larger side is at most `max_dimension`, keeping aspect ratio
    pub fn downscale_to_fit(self, max_dimension: u32) -> Self {
        let (width, height) = self.image.dimensions();
        let larger = width.max(height);
        if larger <= max_dimension || max_dimension == 0 {
            return self;
        }

        let scale = max_dimension as f64 / larger as f64;
        let new_width = ((width as f64 * scale) as u32).max(1);
        let new_height = ((height as f64 * scale) as u32).max(1);
        debug!(width, height, new_width, new_height, "downscaling image");

        let resized = image::imageops::resize(&self.image, new_width, new_height, FilterType::Triangle);
        Self { image: resized }
    }

    /// Write the image to a temporary PNG that is deleted when the handle drops.
    ///
    /// External detectors read from disk; the returned handle must outlive their calls.
    pub fn persist_temp(&self, prefix: &str) -> Result<NamedTempFile> {
        let mut temp = tempfile::Builder::new()
            .prefix(&sanitize_prefix(prefix))
            .suffix(".png")
            .tempfile()?;
        DynamicImage::ImageRgb8(self.image.clone()).write_to(temp.as_file_mut(), ImageFormat::Png)?;
        Ok(temp)
    }
}

/// ISO-BMFF brands written by HEIF/HEIC encoders
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

/// True when the header is an ISO-BMFF `ftyp` box with a HEIF brand
pub fn is_heif(header: &[u8]) -> bool {
    header.len() >= 12
        && &header[4..8] == b"ftyp"
        && HEIF_BRANDS.iter().any(|brand| &header[8..12] == brand.as_slice())
}

fn sniff_heif(path: &Path) -> Result<bool> {
    let mut header = [0u8; 12];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(is_heif(&header[..filled]))
}

#[cfg(feature = "heif")]
fn decode_heif(path: &Path) -> Result<RgbImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let invalid = |e: libheif_rs::HeifError| {
        Error::InvalidImageFormat(format!("{}: {}", path.display(), e))
    };
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::InvalidImageFormat(format!("{}: non UTF-8 path", path.display())))?;

    let lib = LibHeif::new();
    let context = HeifContext::read_from_file(path_str).map_err(invalid)?;
    let handle = context.primary_image_handle().map_err(invalid)?;
    let decoded = lib
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(invalid)?;

    let plane = decoded.planes().interleaved.ok_or_else(|| {
        Error::InvalidImageFormat(format!("{}: no interleaved RGB plane", path.display()))
    })?;
    let (width, height) = (plane.width, plane.height);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }

    RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
        Error::InvalidImageFormat(format!("{}: truncated HEIF pixel data", path.display()))
    })
}

#[cfg(not(feature = "heif"))]
fn decode_heif(path: &Path) -> Result<RgbImage> {
    Err(Error::InvalidImageFormat(format!(
        "{}: HEIF/HEIC image but bodyfit was built without the `heif` feature",
        path.display()
    )))
}

/// Decode an image by content (not extension) and optionally downscale it.
///
/// HEIF/HEIC containers go through libheif; everything else through `image`.
pub fn load_image(path: &Path, max_dimension: Option<u32>) -> Result<PreparedImage> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    let rgb = if sniff_heif(path)? {
        debug!(path = %path.display(), "decoding HEIF container");
        decode_heif(path)?
    } else {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| Error::InvalidImageFormat(format!("{}: {}", path.display(), e)))?
            .to_rgb8()
    };

    let prepared = PreparedImage::from_rgb(rgb);
    Ok(match max_dimension {
        Some(max) => prepared.downscale_to_fit(max),
        None => prepared,
    })
}

/// Mean of per-pixel luma using BT.601 weights, each pixel rounded to 8 bits
pub fn mean_brightness(image: &RgbImage) -> f64 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0.0;
    }

    let total: u64 = image
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u64
        })
        .sum();

    total as f64 / count as f64
}

fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "bodyfit_".to_string()
    } else {
        format!("{}_", cleaned)
    }
}
