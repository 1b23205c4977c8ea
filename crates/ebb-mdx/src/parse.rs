//! MDX document parser.
//!
//! Markdown is read with pulldown-cmark and folded into an [`mdast`] tree.
//! Component markup arrives as HTML events and is turned into
//! [`Kind::MdxJsx`] containers: an opening tag on its own block starts a
//! container that collects every following block until the matching closing
//! tag. Top-level `import`/`export` statements are lifted out before parsing
//! and appended to the root as [`Kind::Esm`] nodes.
//!
//! [`mdast`]: crate::mdast

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::jsx::{parse_tag, strip_trailing_close, JsxTag, TagKind};
use crate::mdast::{Kind, Node};

/// HTML elements that never have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parse an MDX source file into a syntax tree.
pub fn parse_mdx(source: &str) -> Node {
    let (markdown, esm) = split_esm(source);
    let mut root = Node::root(parse_fragment(&markdown));
    root.children
        .extend(esm.into_iter().map(|statement| Node::new(Kind::Esm(statement))));
    root
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

fn parse_fragment(markdown: &str) -> Vec<Node> {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(markdown, options()) {
        builder.push(event);
    }
    builder.finish()
}

struct CodeBuffer {
    lang: Option<String>,
    meta: Option<String>,
    value: String,
}

/// Folds a flat event stream into nested nodes using a stack of open nodes.
struct TreeBuilder {
    stack: Vec<Node>,
    html: Option<String>,
    code: Option<CodeBuffer>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Node::root(Vec::new())],
            html: None,
            code: None,
        }
    }

    fn push(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let (lang, meta) = match &kind {
                    CodeBlockKind::Fenced(info) => split_info(info),
                    CodeBlockKind::Indented => (None, None),
                };
                self.code = Some(CodeBuffer {
                    lang,
                    meta,
                    value: String::new(),
                });
            }
            Event::Start(Tag::HtmlBlock) => self.html = Some(String::new()),
            Event::Start(tag) => self.stack.push(Node::new(kind_for(tag))),

            Event::End(TagEnd::CodeBlock) => {
                if let Some(mut code) = self.code.take() {
                    if code.value.ends_with('\n') {
                        code.value.pop();
                    }
                    self.append(Node::new(Kind::Code {
                        lang: code.lang,
                        meta: code.meta,
                        value: code.value,
                    }));
                }
            }
            Event::End(TagEnd::HtmlBlock) => {
                if let Some(html) = self.html.take() {
                    self.flow_html(&html);
                }
            }
            Event::End(_) => self.close_container(),

            Event::Text(text) => match self.code.as_mut() {
                Some(code) => code.value.push_str(&text),
                None => self.append(Node::text(text.to_string())),
            },
            Event::Code(code) => self.append(Node::new(Kind::InlineCode(code.to_string()))),
            Event::Html(html) => match self.html.as_mut() {
                Some(buffer) => buffer.push_str(&html),
                None => self.flow_html(&html),
            },
            Event::InlineHtml(html) => self.inline_html(&html),
            Event::SoftBreak => self.append(Node::text("\n")),
            Event::HardBreak => self.append(Node::new(Kind::Break)),
            Event::Rule => self.append(Node::new(Kind::ThematicBreak)),
            Event::FootnoteReference(label) => {
                self.append(Node::new(Kind::FootnoteReference(label.to_string())))
            }
            Event::TaskListMarker(checked) => self.mark_task(checked),
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while self.stack.len() > 1 {
            if let Kind::MdxJsx(element) = &self.stack[self.stack.len() - 1].kind {
                tracing::warn!("Unclosed component <{}> at end of document", element.name);
            }
            self.fold();
        }
        self.stack.pop().map(|root| root.children).unwrap_or_default()
    }

    /// Append `node` to the innermost open node, merging adjacent text.
    fn append(&mut self, node: Node) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        if let (Kind::Text(value), Some(last)) = (&node.kind, parent.children.last_mut()) {
            if let Kind::Text(previous) = &mut last.kind {
                previous.push_str(value);
                return;
            }
        }
        parent.children.push(node);
    }

    /// Pop the innermost open node into its parent.
    fn fold(&mut self) {
        if self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                self.append(node);
            }
        }
    }

    fn close_container(&mut self) {
        // Components opened inside the closing container end with it.
        while self.stack.len() > 1 && self.top_is_jsx() {
            tracing::warn!("Component closed implicitly by its enclosing block");
            self.fold();
        }
        self.fold();
    }

    fn top_is_jsx(&self) -> bool {
        self.stack
            .last()
            .is_some_and(|node| matches!(node.kind, Kind::MdxJsx(_)))
    }

    fn flow_html(&mut self, html: &str) {
        let mut rest = html;
        let mut consumed = false;
        while !rest.trim().is_empty() {
            let Some((tag, after)) = parse_tag(rest) else {
                break;
            };
            self.apply_tag(tag, false);
            rest = after;
            consumed = true;
        }

        if !consumed {
            if !is_comment(rest) {
                self.append(Node::new(Kind::Html(rest.to_string())));
            }
            return;
        }

        let mut closes = Vec::new();
        let mut body = rest;
        while let Some((name, before)) = strip_trailing_close(body) {
            closes.push(name);
            body = before;
        }
        if !body.trim().is_empty() {
            for node in parse_fragment(body) {
                self.append(node);
            }
        }
        for name in closes.into_iter().rev() {
            self.close_jsx(&name);
        }
    }

    fn inline_html(&mut self, html: &str) {
        match parse_tag(html) {
            Some((tag, rest)) if rest.trim().is_empty() => self.apply_tag(tag, true),
            _ if is_comment(html) => {}
            _ => self.append(Node::new(Kind::Html(html.to_string()))),
        }
    }

    fn apply_tag(&mut self, tag: JsxTag, inline: bool) {
        let void = VOID_ELEMENTS.contains(&tag.name.as_str());
        match tag.kind {
            TagKind::Open if !void => {
                self.stack.push(Node::new(Kind::MdxJsx(tag.into_element(inline))))
            }
            TagKind::Open | TagKind::SelfClosing => {
                self.append(Node::new(Kind::MdxJsx(tag.into_element(inline))))
            }
            TagKind::Close if void => {}
            TagKind::Close => self.close_jsx(&tag.name),
        }
    }

    /// Close the innermost open component named `name`. Only components
    /// stacked directly on top of each other are searched, so a stray closing
    /// tag never ends a markdown container early.
    fn close_jsx(&mut self, name: &str) {
        let open = self
            .stack
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .take_while(|(_, node)| matches!(node.kind, Kind::MdxJsx(_)))
            .find(|(_, node)| matches!(&node.kind, Kind::MdxJsx(el) if el.name == name))
            .map(|(i, _)| i);

        let Some(index) = open else {
            tracing::warn!("Ignoring unmatched closing tag </{}>", name);
            return;
        };
        while self.stack.len() > index {
            self.fold();
        }
    }

    fn mark_task(&mut self, checked: bool) {
        let item = self
            .stack
            .iter_mut()
            .rev()
            .find(|node| matches!(node.kind, Kind::ListItem { .. }));
        if let Some(node) = item {
            node.kind = Kind::ListItem {
                checked: Some(checked),
            };
        }
    }
}

fn kind_for(tag: Tag<'_>) -> Kind {
    match tag {
        Tag::Paragraph => Kind::Paragraph,
        Tag::Heading { level, .. } => Kind::Heading { depth: level as u8 },
        Tag::BlockQuote(_) => Kind::Blockquote,
        Tag::List(start) => Kind::List {
            ordered: start.is_some(),
            start,
        },
        Tag::Item => Kind::ListItem { checked: None },
        Tag::FootnoteDefinition(label) => Kind::FootnoteDefinition(label.to_string()),
        Tag::Table(_) => Kind::Table,
        Tag::TableHead => Kind::TableRow { head: true },
        Tag::TableRow => Kind::TableRow { head: false },
        Tag::TableCell => Kind::TableCell,
        Tag::Emphasis => Kind::Emphasis,
        Tag::Strong => Kind::Strong,
        Tag::Strikethrough => Kind::Delete,
        Tag::Link {
            dest_url, title, ..
        } => Kind::Link {
            url: dest_url.to_string(),
            title: non_empty(&title),
        },
        Tag::Image {
            dest_url, title, ..
        } => Kind::Image {
            url: dest_url.to_string(),
            title: non_empty(&title),
        },
        _ => Kind::Paragraph,
    }
}

/// Split a fence info string into language and meta.
fn split_info(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    let (lang, meta) = info.split_once(char::is_whitespace).unwrap_or((info, ""));
    (non_empty(lang), non_empty(meta.trim()))
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn is_comment(html: &str) -> bool {
    html.trim_start().starts_with("<!--")
}

/// Lift top-level `import`/`export` statements out of the markdown.
///
/// A statement starts on an unindented line after a blank line (or at the
/// start of the file) outside fenced code, and runs until the next blank
/// line. Its lines are blanked in the returned markdown.
fn split_esm(source: &str) -> (String, Vec<String>) {
    let mut markdown = String::with_capacity(source.len());
    let mut statements = Vec::new();
    let mut current: Option<String> = None;
    let mut fence: Option<&'static str> = None;
    let mut previous_blank = true;

    for line in source.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some(mut block) = current.take() {
            if !content.trim().is_empty() {
                block.push_str(line);
                current = Some(block);
                markdown.push('\n');
                continue;
            }
            statements.push(block.trim_end().to_string());
        }

        if let Some(marker) = fence {
            if content.trim_start().starts_with(marker) {
                fence = None;
            }
        } else if let Some(marker) = fence_marker(content) {
            fence = Some(marker);
        } else if previous_blank && is_esm_start(content) {
            current = Some(line.to_string());
            markdown.push('\n');
            previous_blank = false;
            continue;
        }

        previous_blank = content.trim().is_empty();
        markdown.push_str(line);
    }

    if let Some(block) = current {
        statements.push(block.trim_end().to_string());
    }

    (markdown, statements)
}

fn fence_marker(line: &str) -> Option<&'static str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    if rest.starts_with("```") {
        Some("```")
    } else if rest.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn is_esm_start(line: &str) -> bool {
    line.starts_with("import ") || line.starts_with("export ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsx::AttrValue;
    use crate::tree::text_content;
    use pretty_assertions::assert_eq;

    fn kinds(nodes: &[Node]) -> Vec<&'static str> {
        use crate::tree::TreeNode;
        nodes.iter().map(TreeNode::type_name).collect()
    }

    #[test]
    fn parses_headings_and_paragraphs() {
        let root = parse_mdx("# Title\n\nSome *text*.\n\n## Section\n");

        assert_eq!(kinds(&root.children), vec!["heading", "paragraph", "heading"]);
        assert_eq!(root.children[0].depth(), Some(1));
        assert_eq!(text_content(&root.children[1]), "Some text.");
        assert_eq!(root.children[2].depth(), Some(2));
    }

    #[test]
    fn frontmatter_lines_become_setext_heading() {
        let root = parse_mdx("---\ntitle: \"X\"\n---\n# Body\n");

        assert_eq!(kinds(&root.children), vec!["thematicBreak", "heading", "heading"]);
        assert_eq!(root.children[1].depth(), Some(2));
        assert_eq!(text_content(&root.children[1]), "title: \"X\"");
    }

    #[test]
    fn parses_fenced_code_with_meta() {
        let root = parse_mdx("```ts [main.ts]\nconst a = 1\n```\n");

        assert_eq!(
            root.children[0].kind,
            Kind::Code {
                lang: Some("ts".into()),
                meta: Some("[main.ts]".into()),
                value: "const a = 1".into(),
            }
        );
    }

    #[test]
    fn block_component_collects_following_blocks() {
        let source = "<CodeGroup>\n\n```js [a.js]\n1\n```\n\n```ts\n2\n```\n\n</CodeGroup>\n\nAfter.\n";
        let root = parse_mdx(source);

        assert_eq!(kinds(&root.children), vec!["mdxJsxFlowElement", "paragraph"]);
        let Kind::MdxJsx(element) = &root.children[0].kind else {
            panic!("expected component");
        };
        assert_eq!(element.name, "CodeGroup");
        assert_eq!(kinds(&root.children[0].children), vec!["code", "code"]);
    }

    #[test]
    fn component_with_inline_body() {
        let root = parse_mdx("<Note type=\"info\">\nRead **this**.\n</Note>\n");

        let Kind::MdxJsx(element) = &root.children[0].kind else {
            panic!("expected component");
        };
        assert_eq!(
            element.attribute("type").and_then(|a| a.value.clone()),
            Some(AttrValue::String("info".into()))
        );
        assert_eq!(text_content(&root.children[0]), "Read this.");
    }

    #[test]
    fn inline_components_inside_paragraph() {
        let root = parse_mdx("New <Badge>beta</Badge> feature<br> here\n");
        let paragraph = &root.children[0];

        assert_eq!(kinds(&paragraph.children), vec!["text", "mdxJsxTextElement", "text", "mdxJsxTextElement", "text"]);
        assert_eq!(text_content(&paragraph.children[1]), "beta");
        assert!(paragraph.children[3].children.is_empty());
    }

    #[test]
    fn lifts_esm_statements() {
        let source = "import { Chart } from './chart'\n\n# Title\n\n```js\nimport x from 'y'\n```\n";
        let root = parse_mdx(source);

        assert_eq!(kinds(&root.children), vec!["heading", "code", "mdxjsEsm"]);
        assert_eq!(root.children[2].kind, Kind::Esm("import { Chart } from './chart'".into()));
    }

    #[test]
    fn task_list_items_are_checked() {
        let root = parse_mdx("- [x] done\n- [ ] todo\n");
        let list = &root.children[0];

        assert_eq!(list.children[0].kind, Kind::ListItem { checked: Some(true) });
        assert_eq!(list.children[1].kind, Kind::ListItem { checked: Some(false) });
    }

    #[test]
    fn unmatched_closing_tag_is_ignored() {
        let root = parse_mdx("Para\n\n</Stray>\n\nMore\n");
        assert_eq!(kinds(&root.children), vec!["paragraph", "paragraph"]);
    }
}
