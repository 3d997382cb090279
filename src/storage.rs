//! Path/URL translation for the managed storage tree.
//!
//! A [`StorageLocation`] pairs a filesystem base path with the public URL it
//! is served under. Every file below `base_path` has exactly one URL below
//! `base_url`, and the two are converted by swapping the prefix:
//!
//! ```text
//! /srv/site/uploads/2024/05/dawn.jpg  <->  https://example.com/uploads/2024/05/dawn.jpg
//! └──── base_path ─┘                       └──────── base_url ──────┘
//! ```
//!
//! ## Loose matching
//!
//! Both directions use plain substring replacement and the storage-root test
//! is a substring test, not tree containment. A URL such as
//! `https://cdn.test/mirror/https://example.com/uploads/x.jpg` therefore counts
//! as "under the storage root". The thumbnail pipeline only reaches the
//! translator after the ownership gate has rejected foreign hosts, and it
//! checks every translated path with [`StorageLocation::contains_path`]
//! before reading or writing, so `..` segments cannot leave the tree.
//!
//! [`SiteIdentity`] answers the other question the pipeline asks: does this
//! URL belong to our own site at all?

use std::path::{Component, Path, PathBuf};
use url::Url;

/// One storage root: a filesystem directory and the URL it is published at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    base_path: String,
    base_url: String,
}

impl StorageLocation {
    /// Trailing slashes on either side are dropped so that the translated
    /// remainder always starts with its own separator.
    pub fn new(base_path: impl AsRef<Path>, base_url: impl Into<String>) -> Self {
        let base_path = base_path.as_ref().to_string_lossy();
        let base_url = base_url.into();
        Self {
            base_path: trim_trailing_separators(&base_path).to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &Path {
        Path::new(&self.base_path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert a path below `base_path` to its public URL.
    ///
    /// Paths outside the tree produce a URL that points nowhere useful; the
    /// caller is expected to only pass paths it derived from [`url_to_path`].
    ///
    /// [`url_to_path`]: StorageLocation::url_to_path
    pub fn path_to_url(&self, path: &Path) -> String {
        let path = path.to_string_lossy();
        let relative = replace_all(&path, &self.base_path);
        format!("{}{}", self.base_url, relative.replace('\\', "/"))
    }

    /// Convert a URL below `base_url` to its filesystem path.
    pub fn url_to_path(&self, url: &str) -> PathBuf {
        let relative = replace_all(url, &self.base_url);
        PathBuf::from(format!("{}{}", self.base_path, relative))
    }

    /// True when `url` contains `base_url` anywhere in its string form.
    pub fn is_under_storage_root(&self, url: &str) -> bool {
        !self.base_url.is_empty() && url.contains(&self.base_url)
    }

    /// True when `path` lies below `base_path` and has no `..` segment.
    ///
    /// Lexical only. Symlinks inside the tree are followed as usual.
    pub fn contains_path(&self, path: &Path) -> bool {
        path.starts_with(self.base_path())
            && !path.components().any(|c| c == Component::ParentDir)
    }
}

/// Strip trailing `/` and `\\`, keeping a lone root separator.
fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !path.is_empty() {
        &path[..1]
    } else {
        trimmed
    }
}

/// Remove every occurrence of `needle`. An empty needle leaves the input as-is.
fn replace_all(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        haystack.to_string()
    } else {
        haystack.replace(needle, "")
    }
}

/// The site's own public address, used to tell owned images from foreign ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteIdentity {
    host: Option<String>,
}

impl SiteIdentity {
    pub fn new(site_url: &str) -> Self {
        Self {
            host: host_of(site_url),
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// True when the URL's host differs from the site's host.
    ///
    /// Hosts are compared case-insensitively: `url` lowercases them when
    /// parsing, so `Example.COM` and `example.com` are the same site.
    /// Scheme and port are ignored. URLs without a host (relative references,
    /// garbage input) never match and count as external.
    pub fn is_external(&self, url: &str) -> bool {
        match (host_of(url), &self.host) {
            (Some(host), Some(site)) => host != *site,
            _ => true,
        }
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Everything before the first `?`, or the whole string when there is none.
pub fn strip_query_string(url: &str) -> &str {
    match url.find('?') {
        Some(pos) => &url[..pos],
        None => url,
    }
}
