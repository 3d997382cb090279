//! Content items and source-image selection.
//!
//! A [`ContentItem`] is a post as the host system hands it over: an id, a
//! body of markup, and optionally a designated featured image. This module
//! never creates or edits posts, it only reads them to decide which image
//! represents the post.
//!
//! ## Selection order
//!
//! [`ImageLocator::resolve_source_image`] picks the first of:
//!
//! 1. the featured image, resolved by a [`FeaturedImageProvider`]
//! 2. the first `<img>` in the body with a non-empty `src`
//! 3. the caller's fallback URL, if non-empty
//!
//! The featured image always wins, even when the body has a "better" image.
//!
//! ## Loading
//!
//! Posts can come from HTML files, Markdown files (rendered with
//! `pulldown-cmark` so Markdown image syntax is found too) or a JSON manifest
//! holding many items.

use crate::markup::{ElementExtractor, TagSoupExtractor};
use crate::storage::strip_query_string;
use pulldown_cmark::{Parser, html as md_html};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A post owned by the host system. Read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    /// Body markup (HTML).
    #[serde(default)]
    pub body: String,
    /// Identifier of the designated featured image, if any. How it maps to a
    /// URL is up to the [`FeaturedImageProvider`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            featured_image: None,
        }
    }

    pub fn with_featured_image(mut self, featured: impl Into<String>) -> Self {
        self.featured_image = Some(featured.into());
        self
    }

    /// Load a post from disk. `.md`/`.markdown` files are rendered to HTML;
    /// anything else is taken as HTML. The file stem becomes the id.
    pub fn from_file(path: &Path) -> Result<Self, ContentError> {
        let raw = fs::read_to_string(path)?;
        let is_markdown = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));
        let body = if is_markdown {
            markdown_to_html(&raw)
        } else {
            raw
        };
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(id, body))
    }
}

/// Render Markdown to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

/// Load a JSON array of content items.
pub fn load_manifest(path: &Path) -> Result<Vec<ContentItem>, ContentError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Resolves a post's featured image to a URL at the requested size.
///
/// The returned URL is final; it is not resized again by this crate.
pub trait FeaturedImageProvider: Sync {
    fn featured_image_url(&self, item: &ContentItem, width: u32, height: u32) -> Option<String>;
}

/// Treats [`ContentItem::featured_image`] as a ready-to-use URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeaturedImageField;

impl FeaturedImageProvider for FeaturedImageField {
    fn featured_image_url(&self, item: &ContentItem, _width: u32, _height: u32) -> Option<String> {
        item.featured_image.clone().filter(|url| !url.is_empty())
    }
}

/// Where the chosen source image came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "kebab-case")]
pub enum SourceImage {
    Featured(String),
    Content(String),
    Fallback(String),
}

impl SourceImage {
    pub fn url(&self) -> &str {
        match self {
            SourceImage::Featured(url) | SourceImage::Content(url) | SourceImage::Fallback(url) => {
                url
            }
        }
    }
}

/// Picks the image that represents a post.
pub struct ImageLocator<E = TagSoupExtractor, F = FeaturedImageField> {
    extractor: E,
    featured: F,
}

impl ImageLocator {
    pub fn new() -> Self {
        Self {
            extractor: TagSoupExtractor,
            featured: FeaturedImageField,
        }
    }
}

impl Default for ImageLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ElementExtractor, F: FeaturedImageProvider> ImageLocator<E, F> {
    pub fn with_parts(extractor: E, featured: F) -> Self {
        Self {
            extractor,
            featured,
        }
    }

    /// Featured image URL at the requested size, if the post has one.
    pub fn locate_featured_image(
        &self,
        item: &ContentItem,
        width: u32,
        height: u32,
    ) -> Option<String> {
        self.featured.featured_image_url(item, width, height)
    }

    /// `src` of the first `<img>` with a non-empty source, query string removed.
    pub fn locate_first_image_in_markup(&self, markup: &str) -> Option<String> {
        if markup.is_empty() {
            return None;
        }
        self.extractor
            .extract(markup, "img")
            .iter()
            .filter_map(|img| img.attr("src"))
            .map(|src| strip_query_string(src.trim()))
            .find(|src| !src.is_empty())
            .map(str::to_string)
    }

    /// Featured image, then first body image, then the fallback.
    ///
    /// `None` means there is nothing to show.
    pub fn resolve_source_image(
        &self,
        item: &ContentItem,
        width: u32,
        height: u32,
        fallback: Option<&str>,
    ) -> Option<SourceImage> {
        if let Some(url) = self.locate_featured_image(item, width, height) {
            return Some(SourceImage::Featured(url));
        }
        if let Some(url) = self.locate_first_image_in_markup(&item.body) {
            return Some(SourceImage::Content(url));
        }
        fallback
            .filter(|f| !f.is_empty())
            .map(|f| SourceImage::Fallback(f.to_string()))
    }
}
