//! File-name helpers and the thumbnail naming convention.
//!
//! Generated thumbnails live next to their source image and are named after
//! it with the target box appended:
//!
//! - `dawn.jpg` at 150x150 → `dawn-150x150.jpg`
//! - `my-photo.final.png` at 300x200 → `my-photo.final-300x200.png`
//!
//! The name depends only on the source file name and the dimensions, so the
//! same request always lands on the same file. That is the whole cache key:
//! external tooling (cleanup jobs, CDNs) can rely on it, and
//! [`parse_thumbnail_name`] is its inverse.
//!
//! The three extractors below accept bare names, filesystem paths and URLs
//! alike. Only `/` and `\` separate components; nothing is URL-decoded.

/// Last path component: `"/a/b/dawn.jpg"` → `"dawn.jpg"`.
///
/// Trailing separators are ignored, so `"/a/b/"` → `"b"`.
pub fn file_name_and_extension(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// File name without its final extension: `"/a/b/dawn.jpg"` → `"dawn"`.
pub fn file_name(path: &str) -> &str {
    let base = file_name_and_extension(path);
    match base.rfind('.') {
        Some(pos) => &base[..pos],
        None => base,
    }
}

/// Final extension without the dot: `"/a/b/dawn.jpg"` → `"jpg"`. Empty if none.
pub fn file_extension(path: &str) -> &str {
    let base = file_name_and_extension(path);
    match base.rfind('.') {
        Some(pos) => &base[pos + 1..],
        None => "",
    }
}

/// Deterministic thumbnail file name for a source image and target box.
///
/// `name-{width}x{height}.ext`, dimensions in plain decimal.
pub fn thumbnail_name(source: &str, width: u32, height: u32) -> String {
    format!(
        "{}-{}x{}.{}",
        file_name(source),
        width,
        height,
        file_extension(source)
    )
}

/// A file name recognised as a generated thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedThumbnailName {
    /// Source file name without extension (`dawn` in `dawn-150x150.jpg`).
    pub stem: String,
    pub width: u32,
    pub height: u32,
    pub extension: String,
}

impl ParsedThumbnailName {
    /// File name of the image this thumbnail was generated from.
    pub fn source_name(&self) -> String {
        format!("{}.{}", self.stem, self.extension)
    }
}

/// Parse a name produced by [`thumbnail_name`]. Returns `None` for anything else.
///
/// - `"dawn-150x150.jpg"` → stem="dawn", 150, 150, ext="jpg"
/// - `"a-b-10x20.png"` → stem="a-b", 10, 20, ext="png"
/// - `"dawn.jpg"` → None
/// - `"dawn-0x10.jpg"` → None (zero is never generated)
/// - `"dawn-010x10.jpg"` → None (leading zeros are never generated)
pub fn parse_thumbnail_name(name: &str) -> Option<ParsedThumbnailName> {
    let name = file_name_and_extension(name);
    let dot = name.rfind('.')?;
    let (base, extension) = (&name[..dot], &name[dot + 1..]);
    let dash = base.rfind('-')?;
    let (stem, dims) = (&base[..dash], &base[dash + 1..]);
    if stem.is_empty() {
        return None;
    }
    let (w, h) = dims.split_once('x')?;
    Some(ParsedThumbnailName {
        stem: stem.to_string(),
        width: parse_dimension(w)?,
        height: parse_dimension(h)?,
        extension: extension.to_string(),
    })
}

/// Natural decimal only: digits, no sign, no leading zero, non-zero.
fn parse_dimension(s: &str) -> Option<u32> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_url() {
        let url = "https://example.com/uploads/2024/dawn.jpg";
        assert_eq!(file_name_and_extension(url), "dawn.jpg");
        assert_eq!(file_name(url), "dawn");
        assert_eq!(file_extension(url), "jpg");
    }

    #[test]
    fn extracts_from_bare_name() {
        assert_eq!(file_name("dawn.jpg"), "dawn");
        assert_eq!(file_extension("dawn.jpg"), "jpg");
    }

    #[test]
    fn multiple_dots_split_on_last() {
        assert_eq!(file_name("my-photo.final.png"), "my-photo.final");
        assert_eq!(file_extension("my-photo.final.png"), "png");
    }

    #[test]
    fn no_extension() {
        assert_eq!(file_name("/a/README"), "README");
        assert_eq!(file_extension("/a/README"), "");
    }

    #[test]
    fn dot_in_directory_does_not_count() {
        assert_eq!(file_name("/a.d/photo"), "photo");
        assert_eq!(file_extension("/a.d/photo"), "");
    }

    #[test]
    fn trailing_separator_ignored() {
        assert_eq!(file_name_and_extension("/a/b/"), "b");
    }

    #[test]
    fn windows_separators() {
        assert_eq!(file_name_and_extension(r"C:\up\dawn.jpg"), "dawn.jpg");
    }

    #[test]
    fn thumbnail_name_format() {
        assert_eq!(thumbnail_name("/up/dawn.jpg", 150, 100), "dawn-150x100.jpg");
    }

    #[test]
    fn thumbnail_name_is_stable() {
        let a = thumbnail_name("/up/2024/dawn.jpg", 300, 300);
        let b = thumbnail_name("/up/2024/dawn.jpg", 300, 300);
        assert_eq!(a, b);
    }

    #[test]
    fn thumbnail_name_distinguishes_dimensions() {
        assert_ne!(
            thumbnail_name("dawn.jpg", 100, 200),
            thumbnail_name("dawn.jpg", 200, 100)
        );
    }

    #[test]
    fn thumbnail_name_same_for_path_and_url() {
        assert_eq!(
            thumbnail_name("/srv/up/dawn.jpg", 64, 64),
            thumbnail_name("https://example.com/up/dawn.jpg", 64, 64)
        );
    }

    #[test]
    fn parse_generated_name() {
        let p = parse_thumbnail_name("dawn-150x100.jpg").unwrap();
        assert_eq!(p.stem, "dawn");
        assert_eq!((p.width, p.height), (150, 100));
        assert_eq!(p.extension, "jpg");
        assert_eq!(p.source_name(), "dawn.jpg");
    }

    #[test]
    fn parse_name_with_dashes_in_stem() {
        let p = parse_thumbnail_name("/up/my-best-shot-10x20.png").unwrap();
        assert_eq!(p.stem, "my-best-shot");
        assert_eq!((p.width, p.height), (10, 20));
    }

    #[test]
    fn parse_inverts_thumbnail_name() {
        let name = thumbnail_name("a.b-c.webp", 640, 480);
        let p = parse_thumbnail_name(&name).unwrap();
        assert_eq!(p.source_name(), "a.b-c.webp");
    }

    #[test]
    fn parse_rejects_plain_images() {
        assert_eq!(parse_thumbnail_name("dawn.jpg"), None);
        assert_eq!(parse_thumbnail_name("dawn-large.jpg"), None);
        assert_eq!(parse_thumbnail_name("-10x10.jpg"), None);
    }

    #[test]
    fn parse_rejects_non_natural_numbers() {
        assert_eq!(parse_thumbnail_name("dawn-0x10.jpg"), None);
        assert_eq!(parse_thumbnail_name("dawn-010x10.jpg"), None);
        assert_eq!(parse_thumbnail_name("dawn-+1x10.jpg"), None);
    }
}
