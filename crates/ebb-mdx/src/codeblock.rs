//! Fenced code blocks in the rendering tree.

use std::sync::LazyLock;

use regex::Regex;

use crate::hast::{Node, PropertyValue};
use crate::tree::text_content;

const LANGUAGE_PREFIX: &str = "language-";

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+)\]$").expect("Invalid filename regex"));

/// A `pre > code` block ready for highlighting.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Language tag from the `language-*` class.
    pub language: Option<String>,
    /// Filename from a `[name]` fence meta.
    pub filename: Option<String>,
    /// Literal code text with `\n` line endings.
    pub source: String,
}

impl CodeBlock {
    /// Read a code block from a `pre` element whose first child is `code`.
    pub fn from_pre(pre: &Node) -> Option<Self> {
        if pre.tag() != Some("pre") {
            return None;
        }
        let code_node = pre.children.first()?;
        let code = code_node.as_element().filter(|e| e.tag == "code")?;

        let language = match code.properties.get("className") {
            Some(PropertyValue::List(classes)) => extract_language(classes),
            Some(PropertyValue::String(class)) => extract_language(&[class.clone()]),
            _ => None,
        };
        let filename = code.meta.as_deref().and_then(extract_filename);

        Some(Self {
            language,
            filename,
            source: text_content(code_node).replace("\r\n", "\n"),
        })
    }
}

/// Language tag of the first `language-*` class.
pub fn extract_language(classes: &[String]) -> Option<String> {
    classes
        .iter()
        .find_map(|class| class.strip_prefix(LANGUAGE_PREFIX))
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

/// Filename written as `[name]` in the fence meta.
pub fn extract_filename(meta: &str) -> Option<String> {
    FILENAME_RE
        .captures(meta.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Grammar used for a language tag, as a token the syntax set resolves.
/// Languages outside the bundled set (and `vb`, which has no grammar in
/// the default syntax set) render as plain text.
pub fn bundled_syntax(language: &str) -> Option<&'static str> {
    match language.to_lowercase().as_str() {
        "html" | "vue" => Some("html"),
        "css" => Some("css"),
        "js" | "javascript" | "jsx" | "ts" | "typescript" | "tsx" | "mjs" | "cjs" => Some("js"),
        "json" => Some("json"),
        "sh" | "bash" | "shell" | "shellscript" | "zsh" => Some("sh"),
        _ => None,
    }
}
