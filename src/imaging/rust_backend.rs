//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate, format sniffed from content |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop | fill-resize then `crop_imm` around the center |
//! | Sharpening | `DynamicImage::unsharpen` |
//! | Encode | same format as the source; JPEG honours the quality setting |
//! | Persist | `tempfile::NamedTempFile` in the target directory, renamed into place |

use super::backend::{BackendError, Dimensions, ImageBackend, ResizedImage};
use super::calculations::{
    calculate_crop_dimensions, calculate_fill_dimensions, calculate_fit_dimensions,
};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, returning it with its detected format.
fn load_image(path: &Path) -> Result<(DynamicImage, ImageFormat), BackendError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .or_else(|| ImageFormat::from_path(path).ok())
        .ok_or_else(|| BackendError::Unsupported(path.display().to_string()))?;
    let img = reader.decode().map_err(|e| BackendError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok((img, format))
}

/// Fill-resize to cover `target`, then cut the centered `target` box.
fn resize_and_crop(img: &DynamicImage, target: (u32, u32)) -> DynamicImage {
    let (fill_w, fill_h) = calculate_fill_dimensions((img.width(), img.height()), target);
    let filled = img.resize_exact(fill_w, fill_h, FilterType::Lanczos3);
    let x = (fill_w - target.0) / 2;
    let y = (fill_h - target.1) / 2;
    filled.crop_imm(x, y, target.0, target.1)
}

/// Encode into memory in the given format.
fn encode(img: &DynamicImage, format: ImageFormat, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality as u8);
            rgb.write_with_encoder(encoder)
                .map_err(|e| BackendError::Encode(e.to_string()))?;
        }
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::Tiff | ImageFormat::WebP => {
            img.write_to(&mut Cursor::new(&mut bytes), format)
                .map_err(|e| BackendError::Encode(e.to_string()))?;
        }
        other => return Err(BackendError::Unsupported(format!("{other:?}"))),
    }
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn resize(&self, params: &ResizeParams) -> Result<ResizedImage, BackendError> {
        let (img, format) = load_image(&params.source)?;
        let source = (img.width(), img.height());
        let target = (params.width, params.height);

        let resized = if params.crop {
            resize_and_crop(&img, calculate_crop_dimensions(source, target))
        } else {
            let (w, h) = calculate_fit_dimensions(source, target);
            img.resize_exact(w, h, FilterType::Lanczos3)
        };

        let final_img = match params.sharpening {
            Some(s) => resized.unsharpen(s.sigma, s.threshold),
            None => resized,
        };

        Ok(ResizedImage {
            bytes: encode(&final_img, format, params.quality.value())?,
            dimensions: Dimensions {
                width: final_img.width(),
                height: final_img.height(),
            },
        })
    }

    /// Write to a temporary file next to `path`, then rename it into place.
    ///
    /// Readers see either no file or the complete one. On failure the
    /// temporary file is removed and nothing appears at `path`.
    fn persist(&self, image: &ResizedImage, path: &Path) -> Result<(), BackendError> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&image.bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| BackendError::Io(e.error))?;
        Ok(())
    }
}
