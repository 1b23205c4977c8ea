//! Depth-first tree walker with signal-based flow control.
//!
//! The visitor callback steers the walk through its return value:
//!
//! - [`Signal::STOP`]: do not descend into this node, continue with siblings
//! - [`Signal::RETURN`]: abort the whole walk
//! - [`Signal::DELETE`]: drop this node from its parent once the parent has
//!   finished iterating its children
//!
//! Signals combine with `|`. Returning `()` is the same as
//! [`Signal::CONTINUE`].

use std::ops::{BitOr, BitOrAssign};

use crate::tree::TreeNode;

/// Flow-control flags returned by a visitor callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signal(u8);

impl Signal {
    /// Keep walking, descend into children.
    pub const CONTINUE: Signal = Signal(0);
    /// Skip this node's children.
    pub const STOP: Signal = Signal(1);
    /// Abort the entire traversal.
    pub const RETURN: Signal = Signal(2);
    /// Remove this node from its parent after sibling processing.
    pub const DELETE: Signal = Signal(4);

    /// Whether every flag set in `other` is also set in `self`.
    pub fn contains(self, other: Signal) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// No flag is set.
    pub fn is_continue(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Signal {
    type Output = Signal;

    fn bitor(self, rhs: Signal) -> Signal {
        Signal(self.0 | rhs.0)
    }
}

impl BitOrAssign for Signal {
    fn bitor_assign(&mut self, rhs: Signal) {
        self.0 |= rhs.0;
    }
}

impl From<()> for Signal {
    fn from(_: ()) -> Self {
        Signal::CONTINUE
    }
}

/// Options controlling a walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitOptions<'a> {
    /// Only invoke the callback for nodes with this type tag. Non-matching
    /// nodes are still descended into.
    pub kind: Option<&'a str>,

    /// Maximum depth to descend to, relative to the starting node (which is
    /// depth 0). `None` walks the whole tree.
    pub max_depth: Option<usize>,

    /// Iterate children back to front. Never applied to `root` nodes.
    pub reversed: bool,
}

impl<'a> VisitOptions<'a> {
    /// Walk every node of the given type.
    pub fn kind(kind: &'a str) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Limit the walk to `depth` levels below the starting node.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Iterate children in reverse order.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    fn matches<T: TreeNode>(&self, node: &T) -> bool {
        self.kind.is_none_or(|kind| kind == node.type_name())
    }
}

/// Position of the node handed to a visitor callback.
#[derive(Debug)]
pub struct Visit<'a, T> {
    /// Index of the node in its parent's children, `None` for the start node.
    pub index: Option<usize>,

    /// The parent node. Its children are detached while they are walked, so
    /// only the parent's own fields are meaningful here.
    pub parent: Option<&'a T>,

    /// Depth below the start node.
    pub depth: usize,
}

/// Walk `tree` depth-first in pre-order, calling `visitor` for every node
/// that matches `options`.
///
/// The callback may mutate or replace the node it is given; replacing it
/// keeps the new node at the same index in the parent. Returns the signal
/// produced for the start node, with [`Signal::RETURN`] set if the walk was
/// aborted.
pub fn visit<T, F, R>(tree: &mut T, options: &VisitOptions<'_>, mut visitor: F) -> Signal
where
    T: TreeNode,
    F: FnMut(&mut T, Visit<'_, T>) -> R,
    R: Into<Signal>,
{
    walk(tree, None, None, 0, options, &mut visitor)
}

fn walk<T, F, R>(
    node: &mut T,
    index: Option<usize>,
    parent: Option<&T>,
    depth: usize,
    options: &VisitOptions<'_>,
    visitor: &mut F,
) -> Signal
where
    T: TreeNode,
    F: FnMut(&mut T, Visit<'_, T>) -> R,
    R: Into<Signal>,
{
    let mut flag = Signal::CONTINUE;
    if options.matches(node) {
        flag = visitor(
            node,
            Visit {
                index,
                parent,
                depth,
            },
        )
        .into();
    }

    let exhausted = options.max_depth.is_some_and(|max| depth >= max);
    if exhausted || !flag.is_continue() || node.children().is_empty() {
        return flag;
    }

    let reversed = options.reversed && !node.is_root();
    let mut children = std::mem::take(node.children_mut());
    let mut doomed = vec![false; children.len()];

    let order: Vec<usize> = if reversed {
        (0..children.len()).rev().collect()
    } else {
        (0..children.len()).collect()
    };

    for i in order {
        let child_flag = walk(
            &mut children[i],
            Some(i),
            Some(&*node),
            depth + 1,
            options,
            visitor,
        );

        if child_flag.contains(Signal::DELETE) {
            doomed[i] = true;
        }
        if child_flag.contains(Signal::RETURN) {
            flag |= Signal::RETURN;
            break;
        }
    }

    if doomed.contains(&true) {
        let mut doomed = doomed.into_iter();
        children.retain(|_| !doomed.next().unwrap_or(false));
    }
    *node.children_mut() = children;

    flag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdast::{Kind, Node};
    use crate::tree::text_content;
    use pretty_assertions::assert_eq;

    /// root
    /// ├── a (paragraph)
    /// │   └── a1 (emphasis)
    /// │       └── a1x (text)
    /// ├── b (paragraph)
    /// │   └── b1 (text)
    /// └── c (text)
    fn sample() -> Node {
        Node::root(vec![
            Node::with_children(
                Kind::Paragraph,
                vec![Node::with_children(Kind::Emphasis, vec![Node::text("a1x")])],
            ),
            Node::with_children(Kind::Paragraph, vec![Node::text("b1")]),
            Node::text("c"),
        ])
    }

    fn texts_visited(tree: &mut Node, stop_at_first_paragraph: bool) -> Vec<String> {
        let mut seen = Vec::new();
        let mut paragraphs = 0;
        visit(tree, &VisitOptions::default(), |node, _| {
            if let Kind::Text(value) = &node.kind {
                seen.push(value.clone());
            }
            if node.kind == Kind::Paragraph {
                paragraphs += 1;
                if stop_at_first_paragraph && paragraphs == 1 {
                    return Signal::STOP;
                }
            }
            Signal::CONTINUE
        });
        seen
    }

    #[test]
    fn visits_in_pre_order() {
        let mut tree = sample();
        assert_eq!(texts_visited(&mut tree, false), vec!["a1x", "b1", "c"]);
    }

    #[test]
    fn stop_skips_descendants_but_not_siblings() {
        let mut tree = sample();
        assert_eq!(texts_visited(&mut tree, true), vec!["b1", "c"]);
    }

    #[test]
    fn return_aborts_whole_walk() {
        let mut tree = sample();
        let mut seen = Vec::new();
        let signal = visit(&mut tree, &VisitOptions::kind("text"), |node, _| {
            let value = node.kind.text().unwrap_or_default().to_string();
            seen.push(value.clone());
            if value == "a1x" {
                Signal::RETURN
            } else {
                Signal::CONTINUE
            }
        });

        assert_eq!(seen, vec!["a1x"]);
        assert!(signal.contains(Signal::RETURN));
    }

    #[test]
    fn alternating_delete_keeps_order_and_indices() {
        let mut tree = Node::root((0..6).map(|i| Node::text(&i.to_string())).collect());
        let mut indices = Vec::new();

        visit(&mut tree, &VisitOptions::kind("text"), |_, at| {
            let index = at.index.unwrap_or_default();
            indices.push(index);
            if index % 2 == 1 {
                Signal::DELETE
            } else {
                Signal::CONTINUE
            }
        });

        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        let kept: Vec<_> = tree.children.iter().map(text_content).collect();
        assert_eq!(kept, vec!["0", "2", "4"]);
    }

    #[test]
    fn delete_is_applied_even_when_walk_returns() {
        let mut tree = Node::root(vec![Node::text("x"), Node::text("y"), Node::text("z")]);

        visit(&mut tree, &VisitOptions::kind("text"), |node, _| {
            if node.kind.text() == Some("y") {
                Signal::DELETE | Signal::RETURN
            } else {
                Signal::CONTINUE
            }
        });

        let kept: Vec<_> = tree.children.iter().map(text_content).collect();
        assert_eq!(kept, vec!["x", "z"]);
    }

    #[test]
    fn unmatched_filter_still_walks_everything() {
        let mut tree = sample();
        let mut calls = 0;
        let signal = visit(&mut tree, &VisitOptions::kind("heading"), |_, _| {
            calls += 1;
        });

        assert_eq!(calls, 0);
        assert!(signal.is_continue());
        assert_eq!(tree, sample());
    }

    #[test]
    fn max_depth_limits_descent() {
        let mut tree = sample();
        let mut depths = Vec::new();
        visit(&mut tree, &VisitOptions::default().max_depth(1), |_, at| {
            depths.push(at.depth);
        });

        assert_eq!(depths, vec![0, 1, 1, 1]);
    }

    #[test]
    fn reversed_order_skips_root() {
        let mut tree = Node::root(vec![
            Node::with_children(Kind::Paragraph, vec![Node::text("p1"), Node::text("p2")]),
            Node::text("t"),
        ]);
        let mut seen = Vec::new();
        visit(&mut tree, &VisitOptions::kind("text").reversed(), |node, at| {
            seen.push((node.kind.text().unwrap_or_default().to_string(), at.index));
        });

        assert_eq!(
            seen,
            vec![
                ("p2".to_string(), Some(1)),
                ("p1".to_string(), Some(0)),
                ("t".to_string(), Some(1)),
            ]
        );
    }

    #[test]
    fn parent_is_exposed_to_children() {
        let mut tree = sample();
        let mut parents = Vec::new();
        visit(&mut tree, &VisitOptions::kind("text"), |_, at| {
            parents.push(at.parent.map(|p| p.kind.clone()));
        });

        assert_eq!(
            parents,
            vec![Some(Kind::Emphasis), Some(Kind::Paragraph), Some(Kind::Root)]
        );
    }

    #[test]
    fn empty_tree_is_a_no_op() {
        let mut tree = Node::root(Vec::new());
        let mut calls = 0;
        visit(&mut tree, &VisitOptions::kind("text"), |_, _| calls += 1);
        assert_eq!(calls, 0);
    }
}
