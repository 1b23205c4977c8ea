//! Element-oriented rendering tree and its construction from the syntax tree.

use crate::jsx::{Export, JsxElement};
use crate::mdast;
use crate::tree::{text_content, TreeNode};

/// Value of an element property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Number(f64),
    /// Space-separated tokens such as `className`.
    List(Vec<String>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<usize> for PropertyValue {
    fn from(value: usize) -> Self {
        PropertyValue::Number(value as f64)
    }
}

/// Insertion-ordered element properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties(Vec<(String, PropertyValue)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// String value of a property.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub properties: Properties,
    /// Fence meta string carried on `code` elements (`[main.ts]`).
    pub meta: Option<String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            properties: Properties::new(),
            meta: None,
        }
    }
}

/// Rendering node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Root,
    Element(Element),
    Text(String),
    /// Literal HTML passed through untouched.
    Raw(String),
    MdxJsx(JsxElement),
    Esm(String),
    Export(Export),
}

/// A rendering tree node.
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

    pub fn root(children: Vec<Node>) -> Self {
        Self {
            kind: Kind::Root,
            children,
        }
    }

    pub fn element(tag: &str, properties: Properties, children: Vec<Node>) -> Self {
        Self {
            kind: Kind::Element(Element {
                properties,
                ..Element::new(tag)
            }),
            children,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Kind::Text(value.into()))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            Kind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.kind {
            Kind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Tag name, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag.as_str())
    }
}

impl TreeNode for Node {
    fn type_name(&self) -> &'static str {
        match &self.kind {
            Kind::Root => "root",
            Kind::Element(_) => "element",
            Kind::Text(_) => "text",
            Kind::Raw(_) => "raw",
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
            Kind::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// Convert a syntax tree into a rendering tree.
pub fn from_mdast(node: mdast::Node) -> Node {
    convert(node)
}

fn convert(node: mdast::Node) -> Node {
    use mdast::Kind as M;

    let mdast::Node { kind, children } = node;
    match kind {
        M::Root => Node::root(wrap(children, false)),
        M::Paragraph => element("p", children),
        M::Heading { depth } => element(&format!("h{depth}"), children),
        M::ThematicBreak => Node::element("hr", Properties::new(), Vec::new()),
        M::Blockquote => Node::element("blockquote", Properties::new(), wrap(children, true)),
        M::List { ordered, start } => {
            let mut properties = Properties::new();
            if let Some(start) = start.filter(|s| ordered && *s != 1) {
                properties.insert("start", PropertyValue::Number(start as f64));
            }
            let tag = if ordered { "ol" } else { "ul" };
            Node::element(tag, properties, wrap(children, true))
        }
        M::ListItem { checked } => list_item(checked, children),
        M::Code { lang, meta, value } => {
            let mut code = Element::new("code");
            if let Some(lang) = lang {
                code.properties
                    .insert("className", PropertyValue::List(vec![format!("language-{lang}")]));
            }
            code.meta = meta;
            let code = Node {
                kind: Kind::Element(code),
                children: vec![Node::text(format!("{value}\n"))],
            };
            Node::element("pre", Properties::new(), vec![code])
        }
        M::Html(raw) => Node::new(Kind::Raw(raw)),
        M::Text(value) => Node::text(value),
        M::Emphasis => element("em", children),
        M::Strong => element("strong", children),
        M::Delete => element("del", children),
        M::InlineCode(value) => Node::element("code", Properties::new(), vec![Node::text(value)]),
        M::Break => Node::element("br", Properties::new(), Vec::new()),
        M::Link { url, title } => {
            let mut properties = Properties::new().with("href", url);
            if let Some(title) = title {
                properties.insert("title", title);
            }
            Node::element("a", properties, convert_all(children))
        }
        M::Image { url, title } => {
            let alt = children.iter().map(text_content).collect::<String>();
            let mut properties = Properties::new().with("src", url).with("alt", alt);
            if let Some(title) = title {
                properties.insert("title", title);
            }
            Node::element("img", properties, Vec::new())
        }
        M::Table => table(children),
        M::TableRow { head } => table_row(children, head),
        M::TableCell => element("td", children),
        M::FootnoteReference(label) => {
            let link = Node::element(
                "a",
                Properties::new()
                    .with("href", format!("#fn-{label}"))
                    .with("id", format!("fnref-{label}")),
                vec![Node::text(label)],
            );
            Node::element("sup", Properties::new(), vec![link])
        }
        M::FootnoteDefinition(label) => Node::element(
            "div",
            Properties::new()
                .with("id", format!("fn-{label}"))
                .with("className", PropertyValue::List(vec!["footnote-definition".into()])),
            convert_all(children),
        ),
        M::MdxJsx(jsx) => Node {
            kind: Kind::MdxJsx(jsx),
            children: convert_all(children),
        },
        M::Esm(statement) => Node::new(Kind::Esm(statement)),
        M::Export(export) => Node::new(Kind::Export(export)),
    }
}

fn element(tag: &str, children: Vec<mdast::Node>) -> Node {
    Node::element(tag, Properties::new(), convert_all(children))
}

fn convert_all(children: Vec<mdast::Node>) -> Vec<Node> {
    children.into_iter().map(convert).collect()
}

/// Convert block children, separating them with newline text nodes.
/// Module-level statements are kept at the end without separators.
fn wrap(children: Vec<mdast::Node>, loose: bool) -> Vec<Node> {
    let (statements, blocks): (Vec<_>, Vec<_>) = children
        .into_iter()
        .partition(|n| matches!(n.kind, mdast::Kind::Esm(_) | mdast::Kind::Export(_)));

    let mut out = Vec::with_capacity(blocks.len() * 2 + statements.len());
    if loose && !blocks.is_empty() {
        out.push(Node::text("\n"));
    }
    for (i, block) in blocks.into_iter().enumerate() {
        if i > 0 {
            out.push(Node::text("\n"));
        }
        out.push(convert(block));
    }
    if loose && out.len() > 1 {
        out.push(Node::text("\n"));
    }
    out.extend(statements.into_iter().map(convert));
    out
}

fn list_item(checked: Option<bool>, children: Vec<mdast::Node>) -> Node {
    let mut properties = Properties::new();
    let mut items = Vec::new();
    if let Some(checked) = checked {
        properties.insert("className", PropertyValue::List(vec!["task-list-item".into()]));
        items.push(Node::element(
            "input",
            Properties::new()
                .with("type", "checkbox")
                .with("checked", checked)
                .with("disabled", true),
            Vec::new(),
        ));
        items.push(Node::text(" "));
    }
    items.extend(convert_all(children));
    Node::element("li", properties, items)
}

fn table(rows: Vec<mdast::Node>) -> Node {
    let (head, body): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|row| matches!(row.kind, mdast::Kind::TableRow { head: true }));

    let mut sections = Vec::new();
    if !head.is_empty() {
        sections.push(Node::element("thead", Properties::new(), convert_all(head)));
    }
    if !body.is_empty() {
        sections.push(Node::element("tbody", Properties::new(), convert_all(body)));
    }
    Node::element("table", Properties::new(), sections)
}

fn table_row(cells: Vec<mdast::Node>, head: bool) -> Node {
    let tag = if head { "th" } else { "td" };
    let cells = cells
        .into_iter()
        .map(|cell| element(tag, cell.children))
        .collect();
    Node::element("tr", Properties::new(), cells)
}
