//! Page metadata: title, table of contents, reading time and last update.

use std::fmt;
use std::sync::Arc;

use super::{Pass, PassError};
use crate::context::{BuildContext, Metadata, TocItem};
use crate::estree::{to_expression, Record, Value};
use crate::history::{GitHistory, History};
use crate::jsx::Export;
use crate::mdast::{Kind, Node};
use crate::slug::sanitize_selector;
use crate::tree::text_content;
use crate::visit::{visit, Signal, VisitOptions};

const WORDS_PER_MINUTE: usize = 200;

/// Caller hook producing extra metadata fields for a page.
pub type SetupHook = Arc<dyn Fn(&Node, &BuildContext) -> Record + Send + Sync>;

/// Configuration for [`MetadataPass`].
#[derive(Clone)]
pub struct MetadataOptions {
    /// Name of the exported binding.
    pub name: String,
    /// Heading depths listed in the table of contents.
    pub toc_depth: Vec<u8>,
    pub setup: Option<SetupHook>,
    pub history: Arc<dyn History>,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            name: "_metadata".to_string(),
            toc_depth: vec![2, 3],
            setup: None,
            history: Arc::new(GitHistory::default()),
        }
    }
}

impl fmt::Debug for MetadataOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataOptions")
            .field("name", &self.name)
            .field("toc_depth", &self.toc_depth)
            .field("setup", &self.setup.is_some())
            .finish_non_exhaustive()
    }
}

impl MetadataOptions {
    /// Setup hook that copies every frontmatter field into the metadata.
    pub fn merge_matters() -> SetupHook {
        Arc::new(|_: &Node, ctx: &BuildContext| {
            ctx.matters
                .clone()
                .map(|matters| matters.into_iter().collect::<Record>())
                .unwrap_or_default()
        })
    }
}

/// Computes [`Metadata`] and exports it from the compiled module.
#[derive(Debug, Default)]
pub struct MetadataPass {
    options: MetadataOptions,
}

impl MetadataPass {
    pub fn new(options: MetadataOptions) -> Self {
        Self { options }
    }

    fn collect_headings(&self, tree: &mut Node, metadata: &mut Metadata) {
        let options = VisitOptions::kind("heading").max_depth(1);
        let mut has_title = false;

        visit(tree, &options, |node, _| {
            let Some(depth) = node.depth() else {
                return Signal::CONTINUE;
            };
            let text = text_content(node);

            if depth == 1 && !has_title {
                metadata.title = text.clone();
                has_title = true;
            }
            if self.options.toc_depth.contains(&depth) {
                metadata.toc.push(TocItem {
                    anchor: sanitize_selector(&text),
                    text,
                    level: depth,
                });
            }
            Signal::STOP
        });
    }
}

impl Pass<Node> for MetadataPass {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn run(&self, tree: &mut Node, ctx: &mut BuildContext) -> Result<(), PassError> {
        let mut metadata = Metadata {
            last_updated: self.options.history.last_updated(ctx.path()),
            reading_time: reading_time(&ctx.source),
            ..Metadata::default()
        };
        self.collect_headings(tree, &mut metadata);

        if let Some(setup) = &self.options.setup {
            metadata.extra = setup(tree, ctx);
        }

        let name = &self.options.name;
        let expression = to_expression(&Value::Map(metadata.to_record()));

        ctx.metadata = Some(metadata);
        ctx.toc_depth = Some(self.options.toc_depth.clone());

        if is_exported(tree, name) {
            tracing::error!("`{}` is already exported in {}", name, ctx.path.display());
            return Ok(());
        }
        if let Some(value) = expression {
            tree.children.push(Node::new(Kind::Export(Export {
                name: name.clone(),
                value,
            })));
        }
        Ok(())
    }
}

/// Minutes needed to read `source`, rounded up.
pub fn reading_time(source: &str) -> u64 {
    source.split_whitespace().count().div_ceil(WORDS_PER_MINUTE) as u64
}

fn is_exported(tree: &Node, name: &str) -> bool {
    tree.children.iter().any(|node| match &node.kind {
        Kind::Export(export) => export.name == name,
        Kind::Esm(statement) => declares(statement, name),
        _ => false,
    })
}

/// Whether an `export` statement declares `name`.
fn declares(statement: &str, name: &str) -> bool {
    ["const", "let", "var", "function", "class"].iter().any(|keyword| {
        statement
            .strip_prefix("export ")
            .and_then(|rest| rest.trim_start().strip_prefix(keyword))
            .and_then(|rest| rest.trim_start().strip_prefix(name))
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_mdx;
    use crate::passes::FrontmatterPass;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    struct FixedHistory(Option<i64>);

    impl History for FixedHistory {
        fn last_updated(&self, _: &Path) -> Option<i64> {
            self.0
        }
    }

    fn options() -> MetadataOptions {
        MetadataOptions {
            history: Arc::new(FixedHistory(Some(1_700_000_000_000))),
            ..MetadataOptions::default()
        }
    }

    fn run(source: &str, options: MetadataOptions) -> (Node, BuildContext) {
        let mut tree = parse_mdx(source);
        let mut ctx = BuildContext::new("/content/page.mdx", source);
        FrontmatterPass.run(&mut tree, &mut ctx).unwrap();
        MetadataPass::new(options).run(&mut tree, &mut ctx).unwrap();
        (tree, ctx)
    }

    fn exported(tree: &Node) -> Vec<&Export> {
        tree.children
            .iter()
            .filter_map(|n| match &n.kind {
                Kind::Export(export) => Some(export),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn collects_toc_for_configured_depths() {
        let source = "# Title\n\n## One\n\n## Two\n\n### Two.A\n\n## Three\n\n#### Deep\n";
        let (_, ctx) = run(source, options());
        let metadata = ctx.metadata.unwrap();

        let toc: Vec<_> = metadata
            .toc
            .iter()
            .map(|t| (t.anchor.as_str(), t.level))
            .collect();
        assert_eq!(toc, vec![("One", 2), ("Two", 2), ("Two-A", 3), ("Three", 2)]);
        assert_eq!(ctx.toc_depth, Some(vec![2, 3]));
    }

    #[test]
    fn first_top_level_heading_is_the_title() {
        let (_, ctx) = run("# First\n\n# Second\n", options());
        assert_eq!(ctx.metadata.unwrap().title, "First");
    }

    #[test]
    fn anchors_are_sanitized() {
        let (_, ctx) = run("## Hello, World! 你好\n", options());
        let metadata = ctx.metadata.unwrap();
        let item = &metadata.toc[0];

        assert_eq!(item.anchor, "Hello-World-你好");
        assert_eq!(item.text, "Hello, World! 你好");
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time(""), 0);
        assert_eq!(reading_time("word"), 1);
        assert_eq!(reading_time(&"w ".repeat(200)), 1);
        assert_eq!(reading_time(&"w\n".repeat(401)), 3);
    }

    #[test]
    fn exports_metadata_record() {
        let (tree, _) = run("# Guide\n\n## Setup\n", options());
        let exports = exported(&tree);

        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].name, "_metadata");
        assert_eq!(
            exports[0].value.to_string(),
            r##"{title: "Guide", toc: [{to: "#Setup", text: "Setup", level: 2}], lastUpdated: 1700000000000, readingTime: 1}"##
        );
    }

    #[test]
    fn untracked_file_has_null_last_updated() {
        let options = MetadataOptions {
            history: Arc::new(FixedHistory(None)),
            ..MetadataOptions::default()
        };
        let (tree, ctx) = run("# A\n", options);

        assert_eq!(ctx.metadata.unwrap().last_updated, None);
        assert!(exported(&tree)[0].value.to_string().contains("lastUpdated: null"));
    }

    #[test]
    fn setup_fields_merge_over_intrinsic_ones() {
        let options = MetadataOptions {
            setup: Some(MetadataOptions::merge_matters()),
            ..options()
        };
        let (tree, ctx) = run("---\ntitle: 'Custom'\ndraft: true\n---\n# Heading\n", options);

        let metadata = ctx.metadata.unwrap();
        assert_eq!(metadata.title, "Heading");
        assert_eq!(
            exported(&tree)[0].value.to_string(),
            r#"{title: "Custom", toc: [], lastUpdated: 1700000000000, readingTime: 1, draft: true}"#
        );
    }

    #[test]
    fn custom_name_and_depths() {
        let options = MetadataOptions {
            name: "meta".into(),
            toc_depth: vec![1],
            ..options()
        };
        let (tree, ctx) = run("# Only\n\n## Skipped\n", options);

        assert_eq!(exported(&tree)[0].name, "meta");
        assert_eq!(ctx.metadata.unwrap().toc.len(), 1);
    }

    #[test]
    fn duplicate_export_is_skipped() {
        let (tree, ctx) = run("export const _metadata = {}\n\n# Page\n", options());

        assert!(exported(&tree).is_empty());
        assert!(ctx.metadata.is_some());
    }

    #[test]
    fn headings_inside_components_are_not_collected() {
        let (_, ctx) = run("<Note>\n\n## Hidden\n\n</Note>\n\n## Shown\n", options());
        let toc = ctx.metadata.unwrap().toc;

        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].text, "Shown");
    }
}
