//! The compilation pipeline for a single MDX file.

use std::path::PathBuf;

use crate::codegen::generate_module;
use crate::context::BuildContext;
use crate::hast;
use crate::parse::parse_mdx;
use crate::passes::{PassError, RenderPass, SyntaxPass};

/// Output of compiling one file.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// JavaScript module source.
    pub code: String,
    /// Context as left by the passes (frontmatter, metadata).
    pub context: BuildContext,
}

/// Errors from compiling a file.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Pass `{name}` failed on {path}: {source}")]
    Pass {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: PassError,
    },
}

/// Parses, transforms and generates code, in that order:
/// syntax passes, conversion to the rendering tree, render passes, codegen.
#[derive(Default)]
pub struct Processor {
    syntax_passes: Vec<SyntaxPass>,
    render_passes: Vec<RenderPass>,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass over the syntax tree.
    pub fn syntax_pass(mut self, pass: SyntaxPass) -> Self {
        self.syntax_passes.push(pass);
        self
    }

    /// Append a pass over the rendering tree.
    pub fn render_pass(mut self, pass: RenderPass) -> Self {
        self.render_passes.push(pass);
        self
    }

    /// Names of the configured passes, syntax passes first.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.syntax_passes
            .iter()
            .map(|p| p.name())
            .chain(self.render_passes.iter().map(|p| p.name()))
            .collect()
    }

    /// Compile `source`, read from `path`.
    pub fn process(
        &self,
        path: impl Into<PathBuf>,
        source: &str,
    ) -> Result<CompiledModule, ProcessError> {
        let mut ctx = BuildContext::new(path, source);

        let mut syntax = parse_mdx(source);
        for pass in &self.syntax_passes {
            tracing::trace!("Running {} on {}", pass.name(), ctx.path.display());
            pass.run(&mut syntax, &mut ctx)
                .map_err(|source| failed(pass.name(), &ctx, source))?;
        }

        let mut tree = hast::from_mdast(syntax);
        for pass in &self.render_passes {
            tracing::trace!("Running {} on {}", pass.name(), ctx.path.display());
            pass.run(&mut tree, &mut ctx)
                .map_err(|source| failed(pass.name(), &ctx, source))?;
        }

        Ok(CompiledModule {
            code: generate_module(&tree),
            context: ctx,
        })
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("passes", &self.pass_names())
            .finish()
    }
}

fn failed(name: &'static str, ctx: &BuildContext, source: PassError) -> ProcessError {
    ProcessError::Pass {
        name,
        path: ctx.path.clone(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::mdast;
    use crate::passes::{
        FrontmatterPass, HighlightPass, Highlighter, MetadataOptions, MetadataPass, Pass,
        PatchPass,
    };
    use std::path::Path;
    use std::sync::Arc;

    struct NoHistory;

    impl History for NoHistory {
        fn last_updated(&self, _: &Path) -> Option<i64> {
            None
        }
    }

    struct Failing;

    impl Pass<mdast::Node> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn run(&self, _: &mut mdast::Node, _: &mut BuildContext) -> Result<(), PassError> {
            Err(PassError::Failed {
                pass: "failing",
                message: "boom".into(),
            })
        }
    }

    fn processor() -> Processor {
        let highlighter =
            Highlighter::new(Highlighter::DEFAULT_LIGHT, Highlighter::DEFAULT_DARK).unwrap();
        let metadata = MetadataOptions {
            setup: Some(MetadataOptions::merge_matters()),
            history: Arc::new(NoHistory),
            ..MetadataOptions::default()
        };
        Processor::new()
            .syntax_pass(Box::new(FrontmatterPass))
            .syntax_pass(Box::new(MetadataPass::new(metadata)))
            .render_pass(Box::new(HighlightPass::new(Arc::new(highlighter))))
            .render_pass(Box::new(PatchPass))
    }

    #[test]
    fn compiles_a_page() {
        let source = "---\ndescription: 'About'\n---\n# Guide\n\n## Install it\n\n```sh [setup.sh]\nnpm i ebb\n```\n";
        let module = processor().process("/content/guide.mdx", source).unwrap();

        assert!(module.code.contains(
            r##"export const _metadata = {title: "Guide", toc: [{to: "#Install-it", text: "Install it", level: 2}], lastUpdated: null, readingTime: 1, description: "About"};"##
        ));
        assert!(module.code.contains(r#"id: "Install it""#));
        assert!(module.code.contains(r#"filename: "setup.sh""#));
        assert!(!module.code.contains("description: 'About'"));
        assert_eq!(module.context.metadata.unwrap().title, "Guide");
    }

    #[test]
    fn pass_order_is_kept() {
        assert_eq!(
            processor().pass_names(),
            vec!["frontmatter", "metadata", "highlight", "patch"]
        );
    }

    #[test]
    fn pass_failure_names_pass_and_file() {
        let processor = Processor::new().syntax_pass(Box::new(Failing));
        let err = processor.process("/content/a.mdx", "# A\n").unwrap_err();

        assert_eq!(err.to_string(), "Pass `failing` failed on /content/a.mdx: failing: boom");
    }

    #[test]
    fn empty_pipeline_still_generates_a_module() {
        let module = Processor::new().process("/content/a.mdx", "Hello\n").unwrap();

        assert!(module.code.contains("_jsx(_components.p, {children: \"Hello\"})"));
        assert!(module.context.metadata.is_none());
    }
}
