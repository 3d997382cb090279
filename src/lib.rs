//! # Post Thumb
//!
//! On-demand thumbnails for blog posts. Given a post and a target box, pick
//! the image that represents it and return a URL for a copy of that image at
//! the requested size, generating the copy on first use.
//!
//! # Architecture: One Request, Two Stages
//!
//! ```text
//! 1. Locate    post        →  source image URL   (featured > first <img> > fallback)
//! 2. Resolve   image URL   →  thumbnail URL      (gates → cache → resize → write)
//! ```
//!
//! Stage 2 is usable on its own for any image URL. Both stages are
//! infallible from the caller's point of view: every request ends with a URL
//! that can be rendered (possibly the original, possibly empty) plus an
//! [`thumbnail::Outcome`] saying why.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`thumbnail`] | The resolver: gates, cache lookup, generation, `<img>` rendering |
//! | [`content`] | Content items, Markdown bodies, featured-image lookup, source selection |
//! | [`markup`] | Tolerant element/attribute extraction from HTML fragments |
//! | [`storage`] | URL ↔ path translation for the storage root; site host identity |
//! | [`naming`] | `stem-WxH.ext` artifact names: build and parse |
//! | [`imaging`] | Pure-Rust resize/crop/encode behind the [`imaging::ImageBackend`] trait |
//! | [`cache`] | Artifact discovery, staleness, purge, batch statistics |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Filesystem Is the Cache
//!
//! A thumbnail is written next to its source under a deterministic name.
//! Finding it again is a single `is_file` check, with no index to keep in
//! sync and nothing to warm up after a restart. The price is that nothing
//! notices when a source is replaced in place; [`cache::is_stale`] exists
//! for external cleanup jobs.
//!
//! ## Never Fail the Page
//!
//! Thumbnails decorate listings. A missing or corrupt upload, a read-only
//! directory, or an image on a CDN must not break rendering, so the resolver
//! falls back to the original URL instead of returning an error. Failures are
//! logged through the `log` facade and reported in the outcome code.
//!
//! ## Only Our Own Files
//!
//! Images on other hosts, or on our host outside the storage root (theme
//! assets, emoji), pass through untouched. Generation only ever writes
//! inside the storage tree.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling, and encoding use the `image` crate only.
//! No system libraries, so the binary runs anywhere it compiles.

pub mod cache;
pub mod config;
pub mod content;
pub mod imaging;
pub mod markup;
pub mod naming;
pub mod output;
pub mod storage;
pub mod thumbnail;

#[cfg(test)]
pub(crate) mod test_helpers;
