//! Component markup embedded in MDX prose.

use crate::estree::Expression;

/// A component or intrinsic element written as JSX.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    /// Tag name: `CodeGroup`, `Foo.Bar`, or a lowercase intrinsic like `div`.
    pub name: String,
    pub attributes: Vec<JsxAttribute>,
    /// Written inside a paragraph rather than as a block of its own.
    pub inline: bool,
}

impl JsxElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            inline: false,
        }
    }

    /// unist type name: `mdxJsxTextElement` when inline, else `mdxJsxFlowElement`.
    pub fn type_name(&self) -> &'static str {
        if self.inline {
            "mdxJsxTextElement"
        } else {
            "mdxJsxFlowElement"
        }
    }

    /// Whether the tag refers to a component rather than an intrinsic element.
    pub fn is_component(&self) -> bool {
        self.name.contains('.') || self.name.starts_with(|c: char| c.is_ascii_uppercase())
    }

    pub fn attribute(&self, name: &str) -> Option<&JsxAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// `name`, `name="value"` or `name={expression}`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxAttribute {
    pub name: String,
    /// `None` for a bare boolean attribute.
    pub value: Option<AttrValue>,
}

/// Value of a [`JsxAttribute`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// A quoted string.
    String(String),
    /// Expression source written by the author, emitted verbatim.
    Raw(String),
    /// Expression built by a pass.
    Expression(Expression),
}

/// `export const <name> = <value>` in the compiled module.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub value: Expression,
}

/// What a scanned tag does to the element stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    SelfClosing,
}

/// A single scanned tag.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxTag {
    pub name: String,
    pub attributes: Vec<JsxAttribute>,
    pub kind: TagKind,
}

impl JsxTag {
    pub fn into_element(self, inline: bool) -> JsxElement {
        JsxElement {
            name: self.name,
            attributes: self.attributes,
            inline,
        }
    }
}

/// Scan one tag at the start of `input` (leading whitespace allowed).
///
/// Returns the tag and the unconsumed rest, or `None` when the input does
/// not start with a tag this scanner understands (comments, spread
/// attributes, unquoted values).
pub fn parse_tag(input: &str) -> Option<(JsxTag, &str)> {
    let mut cur = Cursor::new(input);
    cur.skip_ws();
    if !cur.eat('<') {
        return None;
    }
    let closing = cur.eat('/');

    let name = cur.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'));
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name = name.to_string();

    if closing {
        cur.skip_ws();
        if !cur.eat('>') {
            return None;
        }
        let tag = JsxTag {
            name,
            attributes: Vec::new(),
            kind: TagKind::Close,
        };
        return Some((tag, cur.rest()));
    }

    let mut attributes = Vec::new();
    loop {
        cur.skip_ws();
        let kind = match cur.peek()? {
            '>' => {
                cur.bump();
                TagKind::Open
            }
            '/' => {
                cur.bump();
                if !cur.eat('>') {
                    return None;
                }
                TagKind::SelfClosing
            }
            _ => {
                attributes.push(parse_attribute(&mut cur)?);
                continue;
            }
        };
        let tag = JsxTag {
            name,
            attributes,
            kind,
        };
        return Some((tag, cur.rest()));
    }
}

/// Scan a closing tag that ends `input` (trailing whitespace allowed).
///
/// Returns the tag name and everything before the tag.
pub fn strip_trailing_close(input: &str) -> Option<(String, &str)> {
    let trimmed = input.trim_end();
    let start = trimmed.rfind("</")?;
    let (tag, rest) = parse_tag(&trimmed[start..])?;
    if tag.kind != TagKind::Close || !rest.trim().is_empty() {
        return None;
    }
    Some((tag.name, &trimmed[..start]))
}

fn parse_attribute(cur: &mut Cursor<'_>) -> Option<JsxAttribute> {
    let name = cur.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
    if name.is_empty() {
        return None;
    }
    let name = name.to_string();

    cur.skip_ws();
    if !cur.eat('=') {
        return Some(JsxAttribute { name, value: None });
    }
    cur.skip_ws();

    let value = match cur.peek()? {
        quote @ ('"' | '\'') => {
            cur.bump();
            let value = cur.take_while(move |c| c != quote).to_string();
            if !cur.eat(quote) {
                return None;
            }
            AttrValue::String(value)
        }
        '{' => AttrValue::Raw(cur.balanced_braces()?.trim().to_string()),
        _ => return None,
    };

    Some(JsxAttribute {
        name,
        value: Some(value),
    })
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    /// Consume `{ ... }`, honoring nested braces and string literals.
    /// Returns the text between the outer braces.
    fn balanced_braces(&mut self) -> Option<&'a str> {
        if !self.eat('{') {
            return None;
        }
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&self.src[start..self.pos - 1]);
                    }
                }
                '"' | '\'' | '`' => loop {
                    match self.bump()? {
                        '\\' => {
                            self.bump()?;
                        }
                        q if q == c => break,
                        _ => {}
                    }
                },
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scans_open_tag_with_attributes() {
        let (tag, rest) = parse_tag(r#"<Callout type="warn" open data-x='1' items={[1, "}"]}>tail"#).unwrap();

        assert_eq!(tag.name, "Callout");
        assert_eq!(tag.kind, TagKind::Open);
        assert_eq!(
            tag.attributes,
            vec![
                JsxAttribute {
                    name: "type".into(),
                    value: Some(AttrValue::String("warn".into())),
                },
                JsxAttribute {
                    name: "open".into(),
                    value: None,
                },
                JsxAttribute {
                    name: "data-x".into(),
                    value: Some(AttrValue::String("1".into())),
                },
                JsxAttribute {
                    name: "items".into(),
                    value: Some(AttrValue::Raw(r#"[1, "}"]"#.into())),
                },
            ]
        );
        assert_eq!(rest, "tail");
    }

    #[test]
    fn scans_close_and_self_closing() {
        let (tag, _) = parse_tag("  </CodeGroup>\n").unwrap();
        assert_eq!((tag.name.as_str(), tag.kind), ("CodeGroup", TagKind::Close));

        let (tag, rest) = parse_tag("<Divider />").unwrap();
        assert_eq!((tag.name.as_str(), tag.kind), ("Divider", TagKind::SelfClosing));
        assert_eq!(rest, "");
    }

    #[test]
    fn rejects_non_tags() {
        assert!(parse_tag("<!-- comment -->").is_none());
        assert!(parse_tag("plain text").is_none());
        assert!(parse_tag("<div class=unquoted>").is_none());
        assert!(parse_tag("<Box {...props}>").is_none());
    }

    #[test]
    fn strips_trailing_close_tag() {
        let (name, before) = strip_trailing_close("Some **text**\n</Note>\n").unwrap();
        assert_eq!(name, "Note");
        assert_eq!(before, "Some **text**\n");

        assert!(strip_trailing_close("no tag here").is_none());
    }

    #[test]
    fn component_detection() {
        assert!(JsxElement::new("CodeGroup").is_component());
        assert!(JsxElement::new("ui.Tabs").is_component());
        assert!(!JsxElement::new("div").is_component());
    }
}
