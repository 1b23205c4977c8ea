//! JavaScript module generation from the rendering tree.
//!
//! The output targets the automatic JSX runtime:
//!
//! ```js
//! import {Fragment as _Fragment, jsx as _jsx, jsxs as _jsxs} from "react/jsx-runtime";
//! import Chart from "./chart.js"
//! export const _metadata = {title: "Intro", ...};
//! function _createMdxContent(props) { ... }
//! export default function MDXContent(props = {}) { ... }
//! ```
//!
//! Intrinsic elements produced from markdown are looked up through
//! `props.components` so the caller can swap them out; capitalized
//! components that are not imported by the page itself must be provided
//! the same way.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::estree::{is_identifier, js_string_literal, property_key};
use crate::hast::{Kind, Node, PropertyValue};
use crate::jsx::{AttrValue, JsxElement};

const RUNTIME_IMPORT: &str =
    "import {Fragment as _Fragment, jsx as _jsx, jsxs as _jsxs} from \"react/jsx-runtime\";";

const MISSING_REFERENCE: &str = r#"function _missingMdxReference(id, component) {
  throw new Error("Expected " + (component ? "component" : "object") + " `" + id + "` to be defined: you likely forgot to import, pass, or provide it.");
}"#;

/// Generate an ES module from a rendering tree.
pub fn generate_module(tree: &Node) -> String {
    let mut statements = Vec::new();
    let mut exports = Vec::new();
    let mut content = Vec::new();
    for child in &tree.children {
        match &child.kind {
            Kind::Esm(statement) => statements.push(statement.as_str()),
            Kind::Export(export) => exports.push(format!(
                "export const {} = {};",
                export.name, export.value
            )),
            _ => content.push(child),
        }
    }

    let declared: BTreeSet<String> = statements.iter().flat_map(|s| declared_names(s)).collect();
    let mut gen = Codegen {
        declared: &declared,
        intrinsics: BTreeSet::new(),
        components: BTreeSet::new(),
        objects: BTreeSet::new(),
    };
    let body = gen.fragment(&content);

    let mut out = String::new();
    out.push_str(RUNTIME_IMPORT);
    out.push('\n');
    for statement in &statements {
        out.push_str(statement);
        out.push('\n');
    }
    for export in &exports {
        out.push_str(export);
        out.push('\n');
    }

    out.push_str("function _createMdxContent(props) {\n");
    out.push_str("  const _components = {\n");
    for tag in &gen.intrinsics {
        let _ = writeln!(out, "    {}: {},", property_key(tag), js_string_literal(tag));
    }
    out.push_str("    ...props.components\n  }");
    let provided: Vec<&str> = gen
        .components
        .iter()
        .chain(gen.objects.iter())
        .map(String::as_str)
        .collect();
    if !provided.is_empty() {
        let _ = write!(out, ", {{{}}} = _components", provided.join(", "));
    }
    out.push_str(";\n");
    for name in &gen.objects {
        let _ = writeln!(out, "  if (!{name}) _missingMdxReference({}, false);", js_string_literal(name));
    }
    for name in &gen.components {
        let _ = writeln!(out, "  if (!{name}) _missingMdxReference({}, true);", js_string_literal(name));
    }
    let _ = writeln!(out, "  return {body};\n}}");

    out.push_str(
        "export default function MDXContent(props = {}) {\n  \
         const {wrapper: MDXLayout} = props.components || ({});\n  \
         return MDXLayout ? _jsx(MDXLayout, {\n    ...props,\n    \
         children: _jsx(_createMdxContent, {...props})\n  }) : _createMdxContent(props);\n}\n",
    );
    if !gen.components.is_empty() || !gen.objects.is_empty() {
        out.push_str(MISSING_REFERENCE);
        out.push('\n');
    }
    out
}

struct Codegen<'a> {
    /// Bindings declared by the page's own import/export statements.
    declared: &'a BTreeSet<String>,
    intrinsics: BTreeSet<String>,
    components: BTreeSet<String>,
    objects: BTreeSet<String>,
}

impl Codegen<'_> {
    fn fragment(&mut self, children: &[&Node]) -> String {
        let children: Vec<String> = children.iter().map(|c| self.node(c, true)).collect();
        call("_Fragment", Vec::new(), children)
    }

    fn node(&mut self, node: &Node, top_level: bool) -> String {
        match &node.kind {
            Kind::Text(value) => js_string_literal(value),
            Kind::Element(element) => {
                self.intrinsics.insert(element.tag.clone());
                let props = element
                    .properties
                    .iter()
                    .map(|(name, value)| prop(name, value))
                    .collect();
                let children = self.children(node);
                call(&intrinsic(&element.tag), props, children)
            }
            Kind::MdxJsx(jsx) => {
                let name = self.component(jsx);
                let props = jsx
                    .attributes
                    .iter()
                    .map(|attribute| {
                        let value = match &attribute.value {
                            None => "true".to_string(),
                            Some(AttrValue::String(s)) => js_string_literal(s),
                            Some(AttrValue::Raw(source)) => format!("({source})"),
                            Some(AttrValue::Expression(expression)) => expression.to_string(),
                        };
                        format!("{}: {value}", property_key(&attribute.name))
                    })
                    .collect();
                let children = self.children(node);
                call(&name, props, children)
            }
            Kind::Raw(html) => {
                let tag = if top_level { "\"div\"" } else { "\"span\"" };
                let props = vec![format!(
                    "dangerouslySetInnerHTML: {{__html: {}}}",
                    js_string_literal(html)
                )];
                call(tag, props, Vec::new())
            }
            Kind::Root => {
                let children: Vec<&Node> = node.children.iter().collect();
                self.fragment(&children)
            }
            // Statements are hoisted by the caller.
            Kind::Esm(_) | Kind::Export(_) => "null".to_string(),
        }
    }

    fn children(&mut self, node: &Node) -> Vec<String> {
        node.children.iter().map(|c| self.node(c, false)).collect()
    }

    /// Expression referring to the component for `jsx`, recording what has
    /// to be taken from `props.components`.
    fn component(&mut self, jsx: &JsxElement) -> String {
        if !jsx.is_component() {
            return js_string_literal(&jsx.name);
        }
        let base = jsx.name.split('.').next().unwrap_or_default();
        if !self.declared.contains(base) && is_identifier(base) {
            if jsx.name.contains('.') {
                self.objects.insert(base.to_string());
            } else {
                self.components.insert(base.to_string());
            }
        }
        jsx.name.clone()
    }
}

/// `_jsx(type, {props, children})`, or `_jsxs` for several children.
fn call(callee: &str, mut props: Vec<String>, children: Vec<String>) -> String {
    let runtime = match children.len() {
        0 => "_jsx",
        1 => {
            props.extend(children.into_iter().map(|c| format!("children: {c}")));
            "_jsx"
        }
        _ => {
            props.push(format!("children: [{}]", children.join(", ")));
            "_jsxs"
        }
    };
    format!("{runtime}({callee}, {{{}}})", props.join(", "))
}

fn intrinsic(tag: &str) -> String {
    if is_identifier(tag) {
        format!("_components.{tag}")
    } else {
        format!("_components[{}]", js_string_literal(tag))
    }
}

fn prop(name: &str, value: &PropertyValue) -> String {
    let name = react_name(name);
    let value = match value {
        PropertyValue::String(s) if name == "style" => style_object(s),
        PropertyValue::String(s) => js_string_literal(s),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
        PropertyValue::Number(n) => n.to_string(),
        PropertyValue::List(items) => js_string_literal(&items.join(" ")),
    };
    format!("{}: {value}", property_key(name))
}

/// React spelling of an HTML attribute.
fn react_name(name: &str) -> &str {
    match name {
        "class" => "className",
        "tabindex" => "tabIndex",
        "for" => "htmlFor",
        "colspan" => "colSpan",
        "rowspan" => "rowSpan",
        other => other,
    }
}

/// Turn `a-b: x; --c: y` into `{aB: "x", "--c": "y"}`.
fn style_object(style: &str) -> String {
    let entries: Vec<String> = style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .map(|(name, value)| {
            let name = name.trim();
            let key = if name.starts_with("--") {
                name.to_string()
            } else {
                camel_case(name)
            };
            format!("{}: {}", property_key(&key), js_string_literal(value.trim()))
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Names bound by an `import` or `export` statement.
fn declared_names(statement: &str) -> Vec<String> {
    let statement = statement.trim();
    if let Some(rest) = statement.strip_prefix("import ") {
        let Some((clause, _)) = rest.rsplit_once(" from ") else {
            return Vec::new();
        };
        return clause
            .split(|c| matches!(c, ',' | '{' | '}'))
            .filter_map(|binding| binding.split_whitespace().last())
            .filter(|name| *name != "type" && *name != "*" && is_identifier(name))
            .map(str::to_string)
            .collect();
    }
    if let Some(rest) = statement.strip_prefix("export ") {
        let rest = rest.trim_start();
        let declaration = ["const ", "let ", "var ", "function ", "class "]
            .iter()
            .find_map(|keyword| rest.strip_prefix(keyword));
        if let Some(declaration) = declaration {
            let name: String = declaration
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
                .collect();
            if !name.is_empty() {
                return vec![name];
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estree::Expression;
    use crate::hast::{from_mdast, Properties};
    use crate::jsx::Export;
    use crate::parse::parse_mdx;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> String {
        generate_module(&from_mdast(parse_mdx(source)))
    }

    #[test]
    fn renders_markdown_through_components() {
        let module = compile("# Hi *there*\n");

        assert!(module.starts_with(RUNTIME_IMPORT));
        assert!(module.contains("    em: \"em\",\n    h1: \"h1\",\n    ...props.components\n  };"));
        assert!(module.contains(
            r#"return _jsx(_Fragment, {children: _jsxs(_components.h1, {children: ["Hi ", _jsx(_components.em, {children: "there"})]})});"#
        ));
        assert!(module.contains("export default function MDXContent(props = {})"));
        assert!(!module.contains("_missingMdxReference"));
    }

    #[test]
    fn hoists_statements_and_exports() {
        let mut tree = from_mdast(parse_mdx("import Chart from './chart.js'\n\n<Chart />\n"));
        tree.children.push(Node::new(Kind::Export(Export {
            name: "_metadata".into(),
            value: Expression::string("x"),
        })));

        let module = generate_module(&tree);
        let lines: Vec<&str> = module.lines().take(3).collect();

        assert_eq!(
            lines,
            vec![RUNTIME_IMPORT, "import Chart from './chart.js'", "export const _metadata = \"x\";"]
        );
        // Imported components are used directly.
        assert!(!module.contains("_missingMdxReference(\"Chart\""));
        assert!(module.contains("_jsx(Chart, {})"));
    }

    #[test]
    fn provided_components_are_checked() {
        let mut tree = from_mdast(parse_mdx("<Note type=\"info\" open count={2}>\n\nText\n\n</Note>\n"));
        tree.children.push(Node::new(Kind::MdxJsx(JsxElement::new("ui.Tabs"))));
        let module = generate_module(&tree);

        assert!(module.contains("}, {Note, ui} = _components;"));
        assert!(module.contains("if (!Note) _missingMdxReference(\"Note\", true);"));
        assert!(module.contains("if (!ui) _missingMdxReference(\"ui\", false);"));
        assert!(module.contains(r#"_jsx(Note, {type: "info", open: true, count: (2), children: "#));
        assert!(module.contains("_jsx(ui.Tabs, {})"));
        assert!(module.ends_with(&format!("{MISSING_REFERENCE}\n")));
    }

    #[test]
    fn intrinsic_jsx_is_not_overridable() {
        let module = compile("<div>\n\nx\n\n</div>\n");
        assert!(module.contains(r#"_jsx("div", {children: _jsx(_components.p, {children: "x"})})"#));
    }

    #[test]
    fn converts_properties() {
        let node = Node::element(
            "pre",
            Properties::new()
                .with("className", PropertyValue::List(vec!["shiki".into(), "x".into()]))
                .with("style", "--shiki-light:#FFF;background-color: red")
                .with("tabindex", "0")
                .with("data-highlight", true)
                .with("lines", 2usize),
            Vec::new(),
        );
        let mut gen = Codegen {
            declared: &BTreeSet::new(),
            intrinsics: BTreeSet::new(),
            components: BTreeSet::new(),
            objects: BTreeSet::new(),
        };

        assert_eq!(
            gen.node(&node, true),
            r##"_jsx(_components.pre, {className: "shiki x", style: {"--shiki-light": "#FFF", backgroundColor: "red"}, tabIndex: "0", "data-highlight": true, lines: 2})"##
        );
    }

    #[test]
    fn raw_html_is_inlined() {
        let module = compile("a <span class=x>b</span>\n");
        assert!(module.contains(r#"_jsx("span", {dangerouslySetInnerHTML: {__html: "<span class=x>"}})"#));
    }

    #[test]
    fn finds_declared_names() {
        assert_eq!(
            declared_names("import Def, { a, b as C, type T } from 'm'"),
            vec!["Def", "a", "C", "T"]
        );
        assert_eq!(declared_names("import * as ns from 'm'"), vec!["ns"]);
        assert_eq!(declared_names("export function Foo() {}"), vec!["Foo"]);
        assert_eq!(declared_names("export default 1"), Vec::<String>::new());
    }
}
