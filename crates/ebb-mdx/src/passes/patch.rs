//! Structural fixes on top-level rendered blocks: heading ids and code
//! group tabs.

use super::{Pass, PassError};
use crate::context::BuildContext;
use crate::estree::{to_expression, Record, Value};
use crate::hast::{Kind, Node};
use crate::jsx::{AttrValue, JsxAttribute, JsxElement};
use crate::tree::text_content;
use crate::visit::{visit, Signal, VisitOptions};

const CODE_GROUP: &str = "CodeGroup";

/// Sets the `id` of TOC headings to their text and adds a `tabs` attribute
/// to code groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchPass;

impl Pass<Node> for PatchPass {
    fn name(&self) -> &'static str {
        "patch"
    }

    fn run(&self, tree: &mut Node, ctx: &mut BuildContext) -> Result<(), PassError> {
        let toc_depth = ctx.toc_depth.clone().unwrap_or_default();

        visit(tree, &VisitOptions::default().max_depth(1), |node, _| {
            if heading_level(node).is_some_and(|l| toc_depth.contains(&l)) {
                let id = text_content(node);
                if let Some(element) = node.as_element_mut() {
                    element.properties.insert("id", id);
                }
                return Signal::STOP;
            }

            let tabs = match &node.kind {
                Kind::MdxJsx(jsx) if jsx.name == CODE_GROUP => code_tabs(&node.children),
                _ => return Signal::CONTINUE,
            };
            if let Kind::MdxJsx(jsx) = &mut node.kind {
                set_expression(jsx, "tabs", &Value::List(tabs));
            }
            Signal::STOP
        });
        Ok(())
    }
}

fn heading_level(node: &Node) -> Option<u8> {
    let tag = node.tag()?;
    let level = tag.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// One `{text, icon}` entry per highlighted block, either a direct child or
/// the first child of a wrapper.
fn code_tabs(children: &[Node]) -> Vec<Value> {
    children
        .iter()
        .filter_map(|child| match child.tag() {
            Some("pre") => Some(child),
            _ => child.children.first().filter(|n| n.tag() == Some("pre")),
        })
        .filter_map(Node::as_element)
        .map(|pre| {
            let language = pre.properties.get_str("language").unwrap_or_default();
            let text = pre
                .properties
                .get_str("filename")
                .filter(|f| !f.is_empty())
                .unwrap_or(language);
            Value::Map(Record::from_iter([("text", text), ("icon", language)]))
        })
        .collect()
}

fn set_expression(jsx: &mut JsxElement, name: &str, value: &Value) {
    let Some(expression) = to_expression(value) else {
        return;
    };
    let value = Some(AttrValue::Expression(expression));
    match jsx.attributes.iter_mut().find(|a| a.name == name) {
        Some(attribute) => attribute.value = value,
        None => jsx.attributes.push(JsxAttribute {
            name: name.to_string(),
            value,
        }),
    }
}
