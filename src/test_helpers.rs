//! Shared test utilities for the post-thumb test suite.
//!
//! Provides synthetic image writers and a throwaway upload tree wired to a
//! [`StorageLocation`] and [`SiteIdentity`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = StorageFixture::new();
//! let url = fx.add_image("2024/05/dawn.jpg", 400, 300);
//! assert_eq!(url, "https://example.com/uploads/2024/05/dawn.jpg");
//! assert!(fx.path_for("2024/05/dawn.jpg").is_file());
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbImage};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::storage::{SiteIdentity, StorageLocation};

pub const SITE_URL: &str = "https://example.com";

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let writer = BufWriter::new(fs::File::create(path).unwrap());
    JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a small valid PNG file with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let writer = BufWriter::new(fs::File::create(path).unwrap());
    PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// Upload tree
// =========================================================================

/// A temporary `uploads/` tree served at `https://example.com/uploads`.
pub struct StorageFixture {
    tmp: TempDir,
}

impl StorageFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("uploads")).unwrap();
        Self { tmp }
    }

    pub fn root(&self) -> PathBuf {
        self.tmp.path().join("uploads")
    }

    pub fn site_url(&self) -> &'static str {
        SITE_URL
    }

    pub fn storage(&self) -> StorageLocation {
        StorageLocation::new(self.root(), format!("{SITE_URL}/uploads"))
    }

    pub fn site(&self) -> SiteIdentity {
        SiteIdentity::new(SITE_URL)
    }

    /// Filesystem path of `rel` inside the upload tree.
    pub fn path_for(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Public URL of `rel` inside the upload tree.
    pub fn url_for(&self, rel: &str) -> String {
        format!("{SITE_URL}/uploads/{rel}")
    }

    /// Write a synthetic image at `rel` and return its URL.
    ///
    /// `.png` paths get a PNG, everything else a JPEG.
    pub fn add_image(&self, rel: &str, width: u32, height: u32) -> String {
        let path = self.path_for(rel);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).unwrap();
        }
        if rel.ends_with(".png") {
            create_test_png(&path, width, height);
        } else {
            create_test_jpeg(&path, width, height);
        }
        self.url_for(rel)
    }
}
