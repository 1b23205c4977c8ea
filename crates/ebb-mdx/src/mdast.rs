//! Syntax tree produced by the parser.

use crate::jsx::{Export, JsxElement};
use crate::tree::TreeNode;

/// Prose-oriented node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Root,
    Paragraph,
    Heading { depth: u8 },
    ThematicBreak,
    Blockquote,
    List { ordered: bool, start: Option<u64> },
    ListItem { checked: Option<bool> },
    Code {
        lang: Option<String>,
        meta: Option<String>,
        value: String,
    },
    Html(String),
    Text(String),
    Emphasis,
    Strong,
    Delete,
    InlineCode(String),
    Break,
    Link { url: String, title: Option<String> },
    Image { url: String, title: Option<String> },
    Table,
    TableRow { head: bool },
    TableCell,
    FootnoteReference(String),
    FootnoteDefinition(String),
    /// Component markup (`<Tabs>...</Tabs>`).
    MdxJsx(JsxElement),
    /// Raw `import`/`export` statements hoisted into the module.
    Esm(String),
    /// A binding exported from the compiled module.
    Export(Export),
}

impl Kind {
    /// Literal text of a text node.
    pub fn text(&self) -> Option<&str> {
        match self {
            Kind::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// A syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Kind,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: Kind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    pub fn root(children: Vec<Node>) -> Self {
        Self::with_children(Kind::Root, children)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Kind::Text(value.into()))
    }

    /// A heading whose only child is a text node.
    pub fn heading(depth: u8, text: impl Into<String>) -> Self {
        Self::with_children(Kind::Heading { depth }, vec![Self::text(text)])
    }

    /// Heading depth, if this is a heading.
    pub fn depth(&self) -> Option<u8> {
        match self.kind {
            Kind::Heading { depth } => Some(depth),
            _ => None,
        }
    }
}

impl TreeNode for Node {
    fn type_name(&self) -> &'static str {
        match &self.kind {
            Kind::Root => "root",
            Kind::Paragraph => "paragraph",
            Kind::Heading { .. } => "heading",
            Kind::ThematicBreak => "thematicBreak",
            Kind::Blockquote => "blockquote",
            Kind::List { .. } => "list",
            Kind::ListItem { .. } => "listItem",
            Kind::Code { .. } => "code",
            Kind::Html(_) => "html",
            Kind::Text(_) => "text",
            Kind::Emphasis => "emphasis",
            Kind::Strong => "strong",
            Kind::Delete => "delete",
            Kind::InlineCode(_) => "inlineCode",
            Kind::Break => "break",
            Kind::Link { .. } => "link",
            Kind::Image { .. } => "image",
            Kind::Table => "table",
            Kind::TableRow { .. } => "tableRow",
            Kind::TableCell => "tableCell",
            Kind::FootnoteReference(_) => "footnoteReference",
            Kind::FootnoteDefinition(_) => "footnoteDefinition",
            Kind::MdxJsx(jsx) => jsx.type_name(),
            Kind::Esm(_) => "mdxjsEsm",
            Kind::Export(_) => "export",
        }
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }

    fn text_value(&self) -> Option<&str> {
        match &self.kind {
            Kind::Text(value) | Kind::InlineCode(value) => Some(value),
            _ => None,
        }
    }
}
