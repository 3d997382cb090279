//! High-level image operations.
//!
//! Turns a thumbnail request plus encoding settings into backend parameters.

use super::params::{Quality, ResizeParams, Sharpening};
use std::path::Path;

/// Encoding settings shared by every thumbnail a resolver generates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            sharpening: None,
        }
    }
}

/// Plan a resize operation without executing it.
pub fn plan_resize(
    source: &Path,
    width: u32,
    height: u32,
    crop: bool,
    config: &ThumbnailConfig,
) -> ResizeParams {
    ResizeParams {
        source: source.to_path_buf(),
        width,
        height,
        crop,
        quality: config.quality,
        sharpening: config.sharpening,
    }
}
