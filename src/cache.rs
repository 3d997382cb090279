//! Housekeeping for generated thumbnails.
//!
//! The resolver never deletes anything: a thumbnail, once written, is served
//! for as long as it exists. This module is for the tooling around it
//! (the `artifacts` CLI command, cron cleanup jobs).
//!
//! # Recognising artifacts
//!
//! A file is treated as a generated thumbnail when
//!
//! 1. its name parses as `stem-WxH.ext` ([`parse_thumbnail_name`]), and
//! 2. `stem.ext` exists in the same directory.
//!
//! The second rule keeps ordinary uploads such as `2024-1x2.png` out of the
//! list. An upload that happens to be named exactly like a thumbnail of a
//! sibling file is indistinguishable from one.
//!
//! # Staleness
//!
//! Replacing a source image in place does not touch its thumbnails, so they
//! keep showing the old picture. [`is_stale`] flags artifacts whose source
//! was modified after them; deleting those lets the resolver regenerate them
//! on the next request.

use crate::naming::parse_thumbnail_name;
use crate::thumbnail::Outcome;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A generated thumbnail found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    /// The image it was generated from.
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Recognise a single file as an artifact. See the [module docs](self).
pub fn artifact_for(path: &Path) -> Option<Artifact> {
    let name = path.file_name()?.to_str()?;
    let parsed = parse_thumbnail_name(name)?;
    let source = path.with_file_name(parsed.source_name());
    if !source.is_file() {
        return None;
    }
    Some(Artifact {
        path: path.to_path_buf(),
        source,
        width: parsed.width,
        height: parsed.height,
    })
}

/// All artifacts below `root`, sorted by path.
pub fn find_artifacts(root: &Path) -> Result<Vec<Artifact>, CacheError> {
    let mut artifacts = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(artifact) = artifact_for(entry.path()) {
            artifacts.push(artifact);
        }
    }
    artifacts.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(artifacts)
}

/// True when the source was modified after the artifact was written.
pub fn is_stale(artifact: &Artifact) -> io::Result<bool> {
    let source = fs::metadata(&artifact.source)?.modified()?;
    let generated = fs::metadata(&artifact.path)?.modified()?;
    Ok(source > generated)
}

/// Delete the given artifacts. Returns how many were removed.
///
/// Artifacts that are already gone are skipped; other errors abort.
pub fn purge(artifacts: &[Artifact]) -> Result<usize, CacheError> {
    let mut removed = 0;
    for artifact in artifacts {
        match fs::remove_file(&artifact.path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(removed)
}

/// Summary of resolver outcomes for a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub generated: u32,
    /// Featured images, fallbacks, and images the resolver may not touch.
    pub passthrough: u32,
    pub failed: u32,
    pub not_found: u32,
}

impl CacheStats {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::CacheHit => self.hits += 1,
            Outcome::Generated => self.generated += 1,
            Outcome::Featured
            | Outcome::Fallback
            | Outcome::ExternallyHosted
            | Outcome::OutsideStorage => self.passthrough += 1,
            Outcome::DecodeFailed | Outcome::PersistFailed | Outcome::InvalidSize => {
                self.failed += 1
            }
            Outcome::NotFound => self.not_found += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.generated + self.passthrough + self.failed + self.not_found
    }
}

impl FromIterator<Outcome> for CacheStats {
    fn from_iter<I: IntoIterator<Item = Outcome>>(iter: I) -> Self {
        let mut stats = Self::default();
        for outcome in iter {
            stats.record(outcome);
        }
        stats
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cached, {} generated, {} passed through",
            self.hits, self.generated, self.passthrough
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.not_found > 0 {
            write!(f, ", {} without image", self.not_found)?;
        }
        write!(f, " ({} total)", self.total())
    }
}
