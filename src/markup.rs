//! Element extraction from post markup.
//!
//! Post bodies are whatever the editor produced: unclosed tags, attributes in
//! any quoting style, stray `>` inside quoted values. A strict XML reader
//! rejects most of that, so [`TagSoupExtractor`] scans start tags with a
//! regex instead and only promises document order and attribute access.
//! Quotes only open a value right after `=`; a stray apostrophe elsewhere
//! (`alt=don't`) is ordinary text and the tag still ends at the next `>`.
//!
//! The [`ElementExtractor`] trait is the seam: anything that can turn markup
//! into an ordered list of elements with queryable attributes will do.

use regex::Regex;
use std::sync::LazyLock;

/// A start tag and its attributes, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name.
    pub name: String,
    /// `(name, value)` pairs. Attribute names are lower-cased; valueless
    /// attributes get an empty value.
    pub attributes: Vec<(String, String)>,
}

impl Element {
    /// Value of the first attribute with this name (case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True when the `class` attribute lists `class` as one of its tokens.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|t| t == class))
    }
}

/// Turns markup into elements of a given tag, in document order.
pub trait ElementExtractor: Sync {
    fn extract(&self, markup: &str, tag: &str) -> Vec<Element>;
}

/// Regex-backed extractor that tolerates malformed HTML.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagSoupExtractor;

static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static RE_START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([A-Za-z][A-Za-z0-9-]*)((?:=\s*"[^"]*"|=\s*'[^']*'|[^>])*)>"#).unwrap()
});

static RE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .unwrap()
});

impl ElementExtractor for TagSoupExtractor {
    fn extract(&self, markup: &str, tag: &str) -> Vec<Element> {
        let markup = RE_COMMENT.replace_all(markup, "");
        RE_START_TAG
            .captures_iter(&markup)
            .filter(|caps| caps[1].eq_ignore_ascii_case(tag))
            .map(|caps| Element {
                name: caps[1].to_ascii_lowercase(),
                attributes: parse_attributes(caps.get(2).map_or("", |m| m.as_str())),
            })
            .collect()
    }
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    RE_ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (name, decode_entities(value))
        })
        .collect()
}

/// Decode the handful of entities editors put into URLs.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#038;", "&")
        .replace("&amp;", "&")
}
