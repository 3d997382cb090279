//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. The resolver builds a
//! [`ResizeParams`] and hands it to whatever [`ImageBackend`] it was given,
//! so tests can swap in a mock without touching pipeline logic.
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters applied after downscaling.
//! - [`ResizeParams`]: Source file, target box, crop flag, encoding settings.
//!
//! [`ImageBackend`]: super::ImageBackend

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening suitable for thumbnails.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// One resize request.
///
/// With `crop` the output is exactly the target box (center-cropped, never
/// larger than the source). Without it the image is scaled to fit inside
/// the box, keeping its aspect ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub crop: bool,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}
