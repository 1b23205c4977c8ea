//! Tree transformation passes.
//!
//! Syntax passes run on the [`mdast`](crate::mdast) tree straight after
//! parsing; render passes run on the [`hast`](crate::hast) tree after
//! conversion. Both kinds share the per-file [`BuildContext`].

mod frontmatter;
mod highlight;
mod metadata;
mod patch;

pub use frontmatter::FrontmatterPass;
pub use highlight::{HighlightPass, Highlighter, HIGHLIGHT_DIRECTIVE};
pub use metadata::{MetadataOptions, MetadataPass, SetupHook};
pub use patch::PatchPass;

use crate::context::BuildContext;
use crate::{hast, mdast};

/// A transformation over one tree type.
pub trait Pass<T>: Send + Sync {
    /// Name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Transform `tree` in place.
    fn run(&self, tree: &mut T, ctx: &mut BuildContext) -> Result<(), PassError>;
}

/// Pass over the syntax tree.
pub type SyntaxPass = Box<dyn Pass<mdast::Node>>;

/// Pass over the rendering tree.
pub type RenderPass = Box<dyn Pass<hast::Node>>;

/// Errors that abort a pass.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("{pass}: {message}")]
    Failed { pass: &'static str, message: String },

    #[error("highlighting {language} failed: {message}")]
    Highlight { language: String, message: String },
}
