//! MDX compiler: parsing, tree passes and JavaScript module generation.
//!
//! A source file is parsed into an [`mdast`] syntax tree, transformed by
//! syntax passes (frontmatter, metadata), converted into a [`hast`]
//! rendering tree, transformed by render passes (highlighting, structural
//! patches) and finally printed as an ES module by [`codegen`].

pub mod codeblock;
pub mod codegen;
pub mod context;
pub mod estree;
pub mod hast;
pub mod history;
pub mod jsx;
pub mod mdast;
pub mod parse;
pub mod passes;
pub mod processor;
pub mod slug;
pub mod tree;
pub mod visit;

pub use codegen::generate_module;
pub use context::{BuildContext, Metadata, TocItem};
pub use estree::{to_expression, Expression, Record, Value};
pub use history::{GitHistory, History};
pub use parse::parse_mdx;
pub use passes::{
    FrontmatterPass, HighlightPass, Highlighter, MetadataOptions, MetadataPass, Pass, PassError,
    PatchPass, RenderPass, SyntaxPass,
};
pub use processor::{CompiledModule, ProcessError, Processor};
pub use slug::sanitize_selector;
pub use tree::{text_content, TreeNode};
pub use visit::{visit, Signal, Visit, VisitOptions};
