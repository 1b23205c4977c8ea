//! Syntax highlighting of fenced code blocks.
//!
//! Every `pre > code` block is re-rendered as
//! `pre.shiki > code > span.line > span` with one color per theme on each
//! token, so the page can switch between light and dark without
//! re-highlighting.

use std::sync::Arc;

use syntect::highlighting::{Color, Highlighter as ThemeHighlighter, Theme, ThemeSet};
use syntect::parsing::{ParseState, Scope, ScopeStack, ScopeStackOp, SyntaxReference, SyntaxSet};

use super::{Pass, PassError};
use crate::codeblock::{bundled_syntax, CodeBlock};
use crate::context::BuildContext;
use crate::hast::{Node, Properties, PropertyValue};
use crate::tree::text_content;
use crate::visit::{visit, Signal, VisitOptions};

/// Trailing comment that marks a line as highlighted.
pub const HIGHLIGHT_DIRECTIVE: &str = "// [!code highlight]";

/// Grammars and the two theme variants used for highlighting.
///
/// Loading is expensive; build one and share it.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    light: Theme,
    dark: Theme,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("light", &self.light.name)
            .field("dark", &self.dark.name)
            .finish_non_exhaustive()
    }
}

impl Highlighter {
    pub const DEFAULT_LIGHT: &'static str = "InspiredGitHub";
    pub const DEFAULT_DARK: &'static str = "base16-ocean.dark";

    /// Load the bundled grammars and the named themes.
    pub fn new(light: &str, dark: &str) -> Result<Self, PassError> {
        let mut themes = ThemeSet::load_defaults().themes;
        let mut take = |name: &str| {
            themes.remove(name).ok_or_else(|| PassError::Failed {
                pass: "highlight",
                message: format!("unknown theme `{name}`"),
            })
        };
        let light = take(light)?;
        let dark = take(dark)?;

        Ok(Self {
            syntaxes: SyntaxSet::load_defaults_nonewlines(),
            light,
            dark,
        })
    }

    fn syntax(&self, language: Option<&str>) -> &SyntaxReference {
        language
            .and_then(bundled_syntax)
            .and_then(|token| self.syntaxes.find_syntax_by_token(token))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    /// Render `source` into one `span.line` element per line.
    fn lines(&self, source: &str, language: Option<&str>) -> Result<Vec<Node>, PassError> {
        let error = |message: String| PassError::Highlight {
            language: language.unwrap_or("text").to_string(),
            message,
        };

        let light = ThemeHighlighter::new(&self.light);
        let dark = ThemeHighlighter::new(&self.dark);
        let mut state = ParseState::new(self.syntax(language));
        let mut stack = ScopeStack::new();
        let comment = Scope::new("comment").map_err(|e| error(e.to_string()))?;

        let mut lines = Vec::new();
        for line in source.split('\n') {
            let ops = state
                .parse_line(line, &self.syntaxes)
                .map_err(|e| error(e.to_string()))?;

            let mut tokens: Vec<Token> = Vec::new();
            for (text, op) in regions(&ops, line) {
                if let Some(op) = op {
                    stack.apply(op).map_err(|e| error(e.to_string()))?;
                }
                if text.is_empty() {
                    continue;
                }
                let scopes = stack.as_slice();
                let token = Token {
                    text: text.to_string(),
                    light: light.style_for_stack(scopes).foreground,
                    dark: dark.style_for_stack(scopes).foreground,
                    comment: scopes.iter().any(|s| comment.is_prefix_of(*s)),
                };
                match tokens.last_mut() {
                    Some(last) if last.joins(&token) => last.text.push_str(&token.text),
                    _ => tokens.push(token),
                }
            }

            let children = tokens.into_iter().map(Token::into_node).collect();
            lines.push(Node::element(
                "span",
                Properties::new().with("className", PropertyValue::List(vec!["line".into()])),
                children,
            ));
        }
        Ok(lines)
    }

    fn pre_style(&self) -> String {
        let color = |theme: &Theme, fallback: Color| hex(theme.settings.foreground.unwrap_or(fallback));
        let background = |theme: &Theme, fallback: Color| hex(theme.settings.background.unwrap_or(fallback));
        format!(
            "--shiki-light:{};--shiki-dark:{};--shiki-light-bg:{};--shiki-dark-bg:{}",
            color(&self.light, Color::BLACK),
            color(&self.dark, Color::WHITE),
            background(&self.light, Color::WHITE),
            background(&self.dark, Color::BLACK),
        )
    }
}

/// Pair each op with the text that follows it up to the next op. The text
/// before the first op has no op of its own.
fn regions<'a>(
    ops: &'a [(usize, ScopeStackOp)],
    line: &'a str,
) -> Vec<(&'a str, Option<&'a ScopeStackOp>)> {
    let mut out = Vec::with_capacity(ops.len() + 1);
    let mut start = 0;
    let mut pending = None;
    for (index, op) in ops {
        out.push((&line[start..*index], pending));
        start = *index;
        pending = Some(op);
    }
    out.push((&line[start..], pending));
    out
}

struct Token {
    text: String,
    light: Color,
    dark: Color,
    comment: bool,
}

impl Token {
    fn joins(&self, next: &Token) -> bool {
        self.comment == next.comment
            && (self.comment || (self.light == next.light && self.dark == next.dark))
    }

    fn into_node(self) -> Node {
        let style = format!("--shiki-light:{};--shiki-dark:{}", hex(self.light), hex(self.dark));
        Node::element("span", Properties::new().with("style", style), vec![Node::text(self.text)])
    }
}

fn hex(color: Color) -> String {
    if color.a == 0xFF {
        format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
    } else {
        format!("#{:02X}{:02X}{:02X}{:02X}", color.r, color.g, color.b, color.a)
    }
}

/// Mark a line whose last token is the highlight directive and drop the
/// directive.
fn line_hook(line: &mut Node) {
    let mut found = false;
    let options = VisitOptions::kind("element").max_depth(1).reversed();
    visit(line, &options, |token, at| {
        if at.depth == 0 {
            return Signal::CONTINUE;
        }
        if text_content(token).trim() == HIGHLIGHT_DIRECTIVE {
            found = true;
            return Signal::DELETE | Signal::RETURN;
        }
        Signal::RETURN
    });

    if found {
        if let Some(element) = line.as_element_mut() {
            element.properties.insert("data-highlight", true);
        }
    }
}

/// Drop the empty line produced by the final newline and count the rest.
fn code_hook(lines: &mut Vec<Node>) -> usize {
    if lines.last().is_some_and(|line| line.children.is_empty()) {
        lines.pop();
    }
    lines.len()
}

fn interleave(lines: Vec<Node>) -> Vec<Node> {
    let mut children = Vec::with_capacity(lines.len() * 2);
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            children.push(Node::text("\n"));
        }
        children.push(line);
    }
    children
}

/// Replaces fenced code blocks with highlighted markup.
#[derive(Debug, Clone)]
pub struct HighlightPass {
    highlighter: Arc<Highlighter>,
}

impl HighlightPass {
    pub fn new(highlighter: Arc<Highlighter>) -> Self {
        Self { highlighter }
    }

    fn render(&self, block: CodeBlock) -> Result<Node, PassError> {
        let language = block.language.as_deref();
        let mut lines = self.highlighter.lines(&block.source, language)?;
        for line in &mut lines {
            line_hook(line);
        }
        let count = code_hook(&mut lines);

        let code = Node::element("code", Properties::new(), interleave(lines));

        let mut properties = Properties::new()
            .with("className", PropertyValue::List(vec!["shiki".into()]))
            .with("style", self.highlighter.pre_style())
            .with("tabindex", "0")
            .with("code", block.source.as_str())
            .with("language", language.unwrap_or_default());
        if let Some(filename) = block.filename {
            properties.insert("filename", filename);
        }
        properties.insert("lines", count);

        Ok(Node::element("pre", properties, vec![code]))
    }
}

impl Pass<Node> for HighlightPass {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn run(&self, tree: &mut Node, _ctx: &mut BuildContext) -> Result<(), PassError> {
        let mut failure = None;

        visit(tree, &VisitOptions::kind("element"), |node, _| {
            let Some(block) = CodeBlock::from_pre(node) else {
                return Signal::CONTINUE;
            };
            match self.render(block) {
                Ok(pre) => {
                    *node = pre;
                    Signal::STOP
                }
                Err(e) => {
                    failure = Some(e);
                    Signal::RETURN
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
