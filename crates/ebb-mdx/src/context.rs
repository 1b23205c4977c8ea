//! Per-file state shared between passes.

use std::path::{Path, PathBuf};

use crate::estree::{Record, Value};

/// Side channel threaded through every pass of one compilation.
///
/// Syntax passes fill it in, render passes read it back, so information
/// extracted from the syntax tree survives the conversion into the
/// rendering tree.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// Absolute path of the source file.
    pub path: PathBuf,
    /// Raw source text.
    pub source: String,
    /// Key/value pairs from the frontmatter block.
    pub matters: Option<serde_json::Map<String, serde_json::Value>>,
    /// Page metadata computed by the metadata pass.
    pub metadata: Option<Metadata>,
    /// Heading depths that feed the table of contents.
    pub toc_depth: Option<Vec<u8>>,
}

impl BuildContext {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Page metadata embedded into the compiled module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub title: String,
    pub toc: Vec<TocItem>,
    /// Last commit time in epoch milliseconds.
    pub last_updated: Option<i64>,
    /// Minutes, rounded up.
    pub reading_time: u64,
    /// Fields merged on top of the intrinsic ones.
    pub extra: Record,
}

impl Metadata {
    /// Intrinsic fields followed by the extension fields. An extension field
    /// named like an intrinsic one replaces it in place.
    pub fn to_record(&self) -> Record {
        let toc: Vec<Value> = self.toc.iter().map(TocItem::to_value).collect();

        let mut record = Record::new();
        record.insert("title", self.title.as_str());
        record.insert("toc", toc);
        record.insert("lastUpdated", self.last_updated);
        record.insert("readingTime", self.reading_time);
        record.merge(self.extra.clone());
        record
    }
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
    /// Sanitized anchor, without the leading `#`.
    pub anchor: String,
    pub text: String,
    pub level: u8,
}

impl TocItem {
    fn to_value(&self) -> Value {
        Value::Map(Record::from_iter([
            ("to", Value::from(format!("#{}", self.anchor))),
            ("text", Value::from(self.text.as_str())),
            ("level", Value::from(self.level)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estree::to_expression;
    use pretty_assertions::assert_eq;

    #[test]
    fn extension_fields_override_in_place() {
        let metadata = Metadata {
            title: "Intro".into(),
            toc: vec![TocItem {
                anchor: "setup".into(),
                text: "Setup".into(),
                level: 2,
            }],
            last_updated: None,
            reading_time: 2,
            extra: Record::from_iter([("title", "Custom"), ("author", "ebb")]),
        };

        let source = to_expression(&Value::Map(metadata.to_record())).unwrap().to_string();

        assert_eq!(
            source,
            r##"{title: "Custom", toc: [{to: "#setup", text: "Setup", level: 2}], lastUpdated: null, readingTime: 2, author: "ebb"}"##
        );
    }
}
