//! Serializable tree dump for explain tooling
//!
//! Mirrors the `Display` rendering of `RangeColumnExprTree` as nested data,
//! so plan-explain output can embed it as JSON.

use serde::Serialize;

use super::tree::{Color, NodeRef, RangeColumnExprTree};
use super::types::SqlType;

/// One column's tree
#[derive(Debug, Clone, Serialize)]
pub struct TreeExplain {
    /// Column type
    pub column_type: SqlType,
    /// Node count at this level
    pub size: usize,
    /// Root node (absent for an empty tree)
    pub root: Option<NodeExplain>,
}

/// One node with its subtrees
#[derive(Debug, Clone, Serialize)]
pub struct NodeExplain {
    /// Bound rendered as an interval, e.g. `[1, 5]`
    pub bound: String,
    /// Largest upper cut in the subtree, rendered as an upper bound
    pub max_upper_bound: String,
    pub color: Color,
    /// Tree for the next column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<TreeExplain>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<NodeExplain>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<NodeExplain>>,
}

impl TreeExplain {
    /// Captures the structure of a tree
    pub fn from_tree(tree: &RangeColumnExprTree) -> Self {
        Self {
            column_type: tree.typ(),
            size: tree.len(),
            root: tree.root().map(NodeExplain::from_node),
        }
    }

    /// Total nodes across every nesting level
    pub fn total_nodes(&self) -> usize {
        self.root.as_ref().map_or(0, NodeExplain::total_nodes)
    }
}

impl NodeExplain {
    fn from_node(node: NodeRef<'_>) -> Self {
        Self {
            bound: node.column_expr().to_string(),
            max_upper_bound: node.max_upper_bound().display_as_upper(),
            color: node.color(),
            inner: node.inner().map(|t| Box::new(TreeExplain::from_tree(t))),
            left: node.left().map(|n| Box::new(NodeExplain::from_node(n))),
            right: node.right().map(|n| Box::new(NodeExplain::from_node(n))),
        }
    }

    fn total_nodes(&self) -> usize {
        1 + self.inner.as_ref().map_or(0, |t| t.total_nodes())
            + self.left.as_ref().map_or(0, |n| n.total_nodes())
            + self.right.as_ref().map_or(0, |n| n.total_nodes())
    }
}
