//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the resize-and-encode capability the
//! thumbnail resolver depends on. It has two steps so the resolver can tell
//! the failures apart:
//!
//! 1. [`resize`](ImageBackend::resize) decodes the source, resizes, and
//!    encodes in memory. Fails if the source is unreadable or not an image.
//! 2. [`persist`](ImageBackend::persist) writes the encoded bytes. Fails on
//!    I/O errors at the destination.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Failed to encode: {0}")]
    Encode(String),
    #[error("Unsupported image format: {0}")]
    Unsupported(String),
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An encoded, resized image held in memory until persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizedImage {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Decode, resize and encode. The output format matches the source.
    fn resize(&self, params: &ResizeParams) -> Result<ResizedImage, BackendError>;

    /// Write an encoded image to `path`.
    fn persist(&self, image: &ResizedImage, path: &Path) -> Result<(), BackendError>;
}
