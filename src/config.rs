//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. User files are
//! sparse: stock defaults are the base layer and only the keys present in
//! the file override them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_url = "http://localhost"          # Our own address; other hosts are external
//!
//! [storage]
//! base_path = "uploads"                  # Storage root on disk (relative to the config dir)
//! base_url = "http://localhost/uploads"  # Public URL of the storage root
//!
//! [thumbnails]
//! quality = 90                           # JPEG quality (1-100)
//! sharpen = false                        # Light unsharp mask after downscaling
//! crop = true                            # Default crop mode for the CLI
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::storage::{SiteIdentity, StorageLocation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public base URL of the site. Its host decides what counts as external.
    pub site_url: String,
    /// The managed storage tree.
    pub storage: StorageConfig,
    /// Thumbnail encoding settings.
    pub thumbnails: ThumbnailsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost".to_string(),
            storage: StorageConfig::default(),
            thumbnails: ThumbnailsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_absolute_url("site_url", &self.site_url)?;
        require_absolute_url("storage.base_url", &self.storage.base_url)?;
        if self.storage.base_path.is_empty() {
            return Err(ConfigError::Validation(
                "storage.base_path must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }

    pub fn storage_location(&self) -> StorageLocation {
        StorageLocation::new(&self.storage.base_path, self.storage.base_url.clone())
    }

    pub fn site_identity(&self) -> SiteIdentity {
        SiteIdentity::new(&self.site_url)
    }
}

fn require_absolute_url(key: &str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if url.host_str().is_some() => Ok(()),
        Ok(_) => Err(ConfigError::Validation(format!("{key} must have a host"))),
        Err(e) => Err(ConfigError::Validation(format!(
            "{key} is not a valid URL ({e})"
        ))),
    }
}

/// The storage root as a path/URL pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Filesystem path of the storage root. Relative paths are resolved
    /// against the directory holding `config.toml`.
    pub base_path: String,
    /// URL the storage root is served under. A trailing slash is ignored.
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: "uploads".to_string(),
            base_url: "http://localhost/uploads".to_string(),
        }
    }
}

/// Thumbnail encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// JPEG quality (1 = worst, 100 = best). Lossless formats ignore it.
    pub quality: u32,
    /// Apply a light unsharp mask after downscaling.
    pub sharpen: bool,
    /// Crop to the exact box by default (CLI only; the library takes it per call).
    pub crop: bool,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            sharpen: false,
            crop: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// validates, and anchors a relative `storage.base_path` at `root`.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let mut config = resolve_config(base, overlay)?;
    if Path::new(&config.storage.base_path).is_relative() {
        config.storage.base_path = root
            .join(&config.storage.base_path)
            .to_string_lossy()
            .into_owned();
    }
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# post-thumb configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Public base URL of the site. Images on any other host are never resized.
site_url = "http://localhost"

# ---------------------------------------------------------------------------
# Storage root
# ---------------------------------------------------------------------------
# Thumbnails are only generated for images below base_url, and are written
# next to their source below base_path. The two must mirror each other.
[storage]
# Relative paths are resolved against the directory holding this file.
base_path = "uploads"
base_url = "http://localhost/uploads"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# JPEG quality (1 = worst, 100 = best). PNG, GIF and WebP are lossless.
quality = 90

# Light unsharp mask after downscaling.
sharpen = false

# Crop to the exact box (true) or fit inside it (false) when the CLI is not
# told otherwise.
crop = true
"##
}
