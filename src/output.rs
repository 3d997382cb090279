//! CLI output formatting.
//!
//! # Display Contract
//!
//! Every entity is a header line (positional index + identity) followed by
//! indented context lines. Resolutions show where the URL came from;
//! artifacts show their source and whether it changed since.
//!
//! ## Resolve
//!
//! ```text
//! dawn → https://example.com/uploads/2024/dawn-150x150.jpg
//!     generated
//! ```
//!
//! ## Batch
//!
//! ```text
//! 001 dawn → https://example.com/uploads/2024/dawn-150x150.jpg
//!     cache-hit
//! 002 notes (no image)
//!
//! 1 cached, 0 generated, 0 passed through, 1 without image (2 total)
//! ```
//!
//! ## Artifacts
//!
//! ```text
//! 001 2024/dawn-150x150.jpg (150x150)
//!     Source: 2024/dawn.jpg
//! 002 2024/dusk-64x64.png (64x64)
//!     Source: 2024/dusk.png
//!     stale
//!
//! 2 thumbnails, 1 stale
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::{Artifact, CacheStats};
use crate::thumbnail::{Outcome, Resolved};
use serde::Serialize;
use std::path::Path;

/// One content item and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedItem {
    pub id: String,
    #[serde(flatten)]
    pub resolved: Resolved,
}

/// An artifact with its staleness, as listed by the `artifacts` command.
#[derive(Debug, Clone)]
pub struct ArtifactEntry {
    pub artifact: Artifact,
    pub stale: bool,
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path relative to `root` with forward slashes, or as-is outside it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn resolution_lines(header: String, resolved: &Resolved) -> Vec<String> {
    if resolved.outcome == Outcome::NotFound {
        return vec![format!("{header} (no image)")];
    }
    vec![
        format!("{header} → {}", resolved.url),
        format!("{}{}", indent(1), resolved.outcome),
    ]
}

// ============================================================================
// Resolve
// ============================================================================

pub fn format_resolution(item: &ResolvedItem) -> Vec<String> {
    resolution_lines(item.id.clone(), &item.resolved)
}

pub fn print_resolution(item: &ResolvedItem) {
    for line in format_resolution(item) {
        println!("{line}");
    }
}

// ============================================================================
// Batch
// ============================================================================

pub fn format_batch(items: &[ResolvedItem]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let header = format!("{} {}", format_index(i + 1), item.id);
        lines.extend(resolution_lines(header, &item.resolved));
    }
    let stats: CacheStats = items.iter().map(|item| item.resolved.outcome).collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(stats.to_string());
    lines
}

pub fn print_batch(items: &[ResolvedItem]) {
    for line in format_batch(items) {
        println!("{line}");
    }
}

// ============================================================================
// Artifacts
// ============================================================================

pub fn format_artifacts(entries: &[ArtifactEntry], root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let artifact = &entry.artifact;
        lines.push(format!(
            "{} {} ({}x{})",
            format_index(i + 1),
            display_path(&artifact.path, root),
            artifact.width,
            artifact.height
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            display_path(&artifact.source, root)
        ));
        if entry.stale {
            lines.push(format!("{}stale", indent(1)));
        }
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    let stale = entries.iter().filter(|e| e.stale).count();
    let noun = if entries.len() == 1 { "thumbnail" } else { "thumbnails" };
    lines.push(format!("{} {noun}, {stale} stale", entries.len()));
    lines
}

pub fn print_artifacts(entries: &[ArtifactEntry], root: &Path) {
    for line in format_artifacts(entries, root) {
        println!("{line}");
    }
}

pub fn format_purge(removed: usize) -> String {
    match removed {
        1 => "Removed 1 thumbnail".to_string(),
        n => format!("Removed {n} thumbnails"),
    }
}
