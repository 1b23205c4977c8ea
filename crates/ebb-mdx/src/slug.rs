//! Anchor generation for headings.

use std::sync::LazyLock;

use regex::Regex;

static INVALID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-zA-Z0-9\x{4e00}-\x{9fa5}_-]+").expect("Invalid selector regex")
});

static HYPHENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("Invalid hyphen regex"));

/// Turn arbitrary heading text into a CSS-identifier-safe anchor.
///
/// Runs of characters other than ASCII alphanumerics, CJK ideographs,
/// `_` and `-` become a single `-`; leading and trailing hyphens are
/// removed.
pub fn sanitize_selector(text: &str) -> String {
    let replaced = INVALID_RE.replace_all(text.trim(), "-");
    let collapsed = HYPHENS_RE.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}
