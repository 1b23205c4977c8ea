//! Frontmatter extraction.
//!
//! A document may open with a `---` delimited block of `key: value` lines.
//! The parser sees the opening delimiter as a thematic break and usually
//! reads the lines plus the closing delimiter as a level-2 setext heading,
//! so either node ends the block.

use serde_json::{Map, Value};

use super::{Pass, PassError};
use crate::context::BuildContext;
use crate::mdast::{Kind, Node};
use crate::tree::text_content;

/// Moves the leading frontmatter block into [`BuildContext::matters`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterPass;

impl Pass<Node> for FrontmatterPass {
    fn name(&self) -> &'static str {
        "frontmatter"
    }

    fn run(&self, tree: &mut Node, ctx: &mut BuildContext) -> Result<(), PassError> {
        let children = &tree.children;
        if !children.first().is_some_and(is_delimiter) {
            return Ok(());
        }

        let Some(end) = children
            .iter()
            .skip(1)
            .position(|node| is_delimiter(node) || node.depth() == Some(2))
            .map(|i| i + 2)
        else {
            return Ok(());
        };

        let mut matters = ctx.matters.take().unwrap_or_default();
        for node in &children[1..end] {
            if is_delimiter(node) {
                continue;
            }
            for line in text_content(node).lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_entry(line) {
                    Some(entry) => matters.extend(entry),
                    None => tracing::error!(
                        "Unable to parse frontmatter `{}` in {}",
                        line,
                        ctx.path.display()
                    ),
                }
            }
        }

        ctx.matters = Some(matters);
        tree.children.drain(..end);
        Ok(())
    }
}

fn is_delimiter(node: &Node) -> bool {
    node.kind == Kind::ThematicBreak
}

/// Parse `key: value` where `value` is a JSON literal. Single quotes are
/// accepted in place of double quotes.
fn parse_entry(line: &str) -> Option<Map<String, Value>> {
    let (key, value) = line.split_once(':')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    let object = format!("{{\"{key}\": {value}}}").replace('\'', "\"");
    serde_json::from_str(&object).ok()
}
