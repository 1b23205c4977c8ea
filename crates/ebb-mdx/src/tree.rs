//! Shared shape of the syntax and rendering trees.

/// A node that owns an ordered list of children.
///
/// Both [`crate::mdast::Node`] and [`crate::hast::Node`] implement this, so
/// the same [`crate::visit::visit`] walker drives passes over either tree.
pub trait TreeNode: Sized {
    /// Type tag used by [`crate::visit::VisitOptions::kind`] filters.
    fn type_name(&self) -> &'static str;

    /// Children of this node (empty for leaves).
    fn children(&self) -> &[Self];

    /// Mutable access to the children list.
    fn children_mut(&mut self) -> &mut Vec<Self>;

    /// Literal text carried by this node, if it is a text leaf.
    fn text_value(&self) -> Option<&str>;

    /// Whether this node is the document root.
    fn is_root(&self) -> bool {
        self.type_name() == "root"
    }
}

/// Concatenate the text of every text leaf below `node`, in document order.
pub fn text_content<T: TreeNode>(node: &T) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text<T: TreeNode>(node: &T, out: &mut String) {
    if let Some(value) = node.text_value() {
        out.push_str(value);
    }
    for child in node.children() {
        collect_text(child, out);
    }
}
