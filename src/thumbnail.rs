//! Thumbnail resolution and generation.
//!
//! Given a source image URL and a target box, [`ThumbnailResolver`] returns
//! a URL that is always safe to render: either a generated thumbnail or the
//! original image. Every request walks the same steps, and the first step
//! that cannot proceed ends it:
//!
//! ```text
//! start
//!   ├─ host is not ours ─────────────────────────────→ ExternallyHosted (original URL)
//!   ├─ not under the storage root ───────────────────→ OutsideStorage   (original URL)
//!   ├─ strip query, map URL → path
//!   ├─ path leaves the storage tree (`..`) ───────────→ OutsideStorage   (original URL)
//!   ├─ name the artifact
//!   ├─ artifact already on disk ─────────────────────→ CacheHit         (artifact URL)
//!   ├─ resize fails (unreadable, not an image) ──────→ DecodeFailed     (original URL)
//!   ├─ write fails ──────────────────────────────────→ PersistFailed    (original URL)
//!   └─ written ──────────────────────────────────────→ Generated        (artifact URL)
//! ```
//!
//! Nothing is retried and nothing is raised. The [`Outcome`] on the returned
//! [`Resolved`] says which branch was taken so callers can log or count it.
//!
//! ## Cache
//!
//! The file on disk is the cache. The artifact for a given source and box
//! always has the same name (see [`crate::naming::thumbnail_name`]), so a
//! second request finds it and skips the backend entirely. There is no
//! index and no expiry: replacing a source image in place leaves its old
//! thumbnails behind until something outside the resolver deletes them
//! (see [`crate::cache`]).
//!
//! Two concurrent requests for the same artifact can both miss and both
//! write. Backends must make the artifact appear atomically (the production
//! backend writes a temporary file and renames it), so a request never sees
//! a half-written file and the loser only wastes work.
//!
//! ## Content items
//!
//! [`ThumbnailResolver::resolve_thumbnail`] adds source selection on top:
//! a featured image is returned as the host already sized it, a body image
//! goes through the pipeline above, a caller fallback is returned untouched,
//! and with none of those the result is an empty URL.

use crate::config::SiteConfig;
use crate::content::{
    ContentItem, FeaturedImageField, FeaturedImageProvider, ImageLocator, SourceImage,
};
use crate::imaging::{ImageBackend, Quality, RustBackend, Sharpening, ThumbnailConfig, plan_resize};
use crate::markup::{ElementExtractor, TagSoupExtractor};
use crate::naming::thumbnail_name;
use crate::storage::{SiteIdentity, StorageLocation, strip_query_string};
use maud::{Markup, html};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Which branch of the pipeline produced a [`Resolved`] URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// A new thumbnail was written.
    Generated,
    /// An existing thumbnail was found.
    CacheHit,
    /// The post's featured image, already sized by the host.
    Featured,
    /// The caller's fallback URL, returned as given.
    Fallback,
    /// The image lives on another host.
    ExternallyHosted,
    /// The image is ours but outside the managed storage tree.
    OutsideStorage,
    /// The source could not be read or decoded.
    DecodeFailed,
    /// The thumbnail could not be written.
    PersistFailed,
    /// Zero width or height was requested.
    InvalidSize,
    /// No featured image, no body image, no fallback.
    NotFound,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Generated => "generated",
            Outcome::CacheHit => "cache-hit",
            Outcome::Featured => "featured",
            Outcome::Fallback => "fallback",
            Outcome::ExternallyHosted => "externally-hosted",
            Outcome::OutsideStorage => "outside-storage",
            Outcome::DecodeFailed => "decode-failed",
            Outcome::PersistFailed => "persist-failed",
            Outcome::InvalidSize => "invalid-size",
            Outcome::NotFound => "not-found",
        }
    }

    /// True when the returned URL points at a thumbnail of the requested size.
    pub fn is_thumbnail(self) -> bool {
        matches!(self, Outcome::Generated | Outcome::CacheHit)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL to render and the reason it was chosen.
///
/// `url` is empty only for [`Outcome::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub url: String,
    pub outcome: Outcome,
}

impl Resolved {
    fn new(url: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            url: url.into(),
            outcome,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}

/// A thumbnail request. Identical specs always map to the same artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub source_url: String,
    pub width: u32,
    pub height: u32,
    pub crop: bool,
}

impl ThumbnailSpec {
    /// A missing height means a square box.
    pub fn new(source_url: impl Into<String>, width: u32, height: Option<u32>, crop: bool) -> Self {
        Self {
            source_url: source_url.into(),
            width,
            height: height.unwrap_or(width),
            crop,
        }
    }
}

/// Resolves content items and image URLs to thumbnail URLs.
pub struct ThumbnailResolver<B = RustBackend, E = TagSoupExtractor, F = FeaturedImageField> {
    storage: StorageLocation,
    site: SiteIdentity,
    locator: ImageLocator<E, F>,
    backend: B,
    config: ThumbnailConfig,
}

impl ThumbnailResolver {
    /// Build a resolver with the production backend from site configuration.
    pub fn from_site_config(config: &SiteConfig) -> Self {
        let thumbnails = ThumbnailConfig {
            quality: Quality::new(config.thumbnails.quality),
            sharpening: config.thumbnails.sharpen.then(Sharpening::light),
        };
        ThumbnailResolver::new(config.storage_location(), config.site_identity(), RustBackend::new())
            .with_config(thumbnails)
    }
}

impl<B: ImageBackend> ThumbnailResolver<B> {
    pub fn new(storage: StorageLocation, site: SiteIdentity, backend: B) -> Self {
        Self {
            storage,
            site,
            locator: ImageLocator::new(),
            backend,
            config: ThumbnailConfig::default(),
        }
    }
}

impl<B: ImageBackend, E: ElementExtractor, F: FeaturedImageProvider> ThumbnailResolver<B, E, F> {
    /// Replace the source-image locator (custom extractor or featured-image lookup).
    pub fn with_locator<E2, F2>(self, locator: ImageLocator<E2, F2>) -> ThumbnailResolver<B, E2, F2> {
        ThumbnailResolver {
            storage: self.storage,
            site: self.site,
            locator,
            backend: self.backend,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: ThumbnailConfig) -> Self {
        self.config = config;
        self
    }

    pub fn storage(&self) -> &StorageLocation {
        &self.storage
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Thumbnail URL for an image URL, or the original URL when that is not possible.
    pub fn generate_thumbnail(
        &self,
        source_url: &str,
        width: u32,
        height: Option<u32>,
        crop: bool,
    ) -> Resolved {
        self.generate(&ThumbnailSpec::new(source_url, width, height, crop))
    }

    /// Run the pipeline for one spec. See the [module docs](self).
    pub fn generate(&self, spec: &ThumbnailSpec) -> Resolved {
        let resolved = self.run(spec);
        log::debug!("{} → {} ({})", spec.source_url, resolved.url, resolved.outcome);
        resolved
    }

    fn run(&self, spec: &ThumbnailSpec) -> Resolved {
        let original = spec.source_url.as_str();

        if spec.width == 0 || spec.height == 0 {
            return Resolved::new(original, Outcome::InvalidSize);
        }
        if self.site.is_external(original) {
            return Resolved::new(original, Outcome::ExternallyHosted);
        }
        if !self.storage.is_under_storage_root(original) {
            return Resolved::new(original, Outcome::OutsideStorage);
        }

        let source_url = strip_query_string(original);
        let source_path = self.storage.url_to_path(source_url);
        if !self.storage.contains_path(&source_path) {
            log::warn!("refusing {}: resolves outside the storage root", original);
            return Resolved::new(original, Outcome::OutsideStorage);
        }
        let artifact_path = artifact_path(&source_path, spec.width, spec.height);
        let artifact_url = self.storage.path_to_url(&artifact_path);

        if artifact_path.is_file() {
            return Resolved::new(artifact_url, Outcome::CacheHit);
        }

        let params = plan_resize(&source_path, spec.width, spec.height, spec.crop, &self.config);
        let image = match self.backend.resize(&params) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("cannot resize {}: {e}", source_path.display());
                return Resolved::new(original, Outcome::DecodeFailed);
            }
        };
        if let Err(e) = self.backend.persist(&image, &artifact_path) {
            log::warn!("cannot write thumbnail {}: {e}", artifact_path.display());
            return Resolved::new(original, Outcome::PersistFailed);
        }

        Resolved::new(artifact_url, Outcome::Generated)
    }

    /// Thumbnail URL for a content item.
    ///
    /// Featured image first, then the first body image (thumbnailed), then
    /// `fallback` as given. Empty URL with [`Outcome::NotFound`] otherwise.
    pub fn resolve_thumbnail(
        &self,
        item: &ContentItem,
        width: u32,
        height: Option<u32>,
        crop: bool,
        fallback: Option<&str>,
    ) -> Resolved {
        let height = height.unwrap_or(width);
        match self
            .locator
            .resolve_source_image(item, width, height, fallback)
        {
            Some(SourceImage::Featured(url)) => Resolved::new(url, Outcome::Featured),
            Some(SourceImage::Content(url)) => {
                self.generate_thumbnail(&url, width, Some(height), crop)
            }
            Some(SourceImage::Fallback(url)) => Resolved::new(url, Outcome::Fallback),
            None => {
                log::debug!("no image for content item {}", item.id);
                Resolved::new("", Outcome::NotFound)
            }
        }
    }

    /// Resolve and write the URL to `out`. Nothing is written when no image was found.
    pub fn display_thumbnail(
        &self,
        out: &mut impl Write,
        item: &ContentItem,
        width: u32,
        height: Option<u32>,
        crop: bool,
        fallback: Option<&str>,
    ) -> io::Result<Resolved> {
        let resolved = self.resolve_thumbnail(item, width, height, crop, fallback);
        out.write_all(resolved.url.as_bytes())?;
        Ok(resolved)
    }
}

/// Where the thumbnail for `source_path` at `width`x`height` lives: next to the source.
pub fn artifact_path(source_path: &Path, width: u32, height: u32) -> PathBuf {
    let name = thumbnail_name(&source_path.to_string_lossy(), width, height);
    match source_path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Render a resolved URL as an `<img>` element. Renders nothing for an empty result.
pub fn render_img_tag(resolved: &Resolved, alt: &str) -> Markup {
    html! {
        @if !resolved.is_empty() {
            img src=(resolved.url) alt=(alt) loading="lazy";
        }
    }
}
