//! Augmented, nested red-black interval tree over column ranges
//!
//! One tree covers one index column. Nodes are ordered by lower cut, then
//! upper cut, and each node records the largest upper cut in its subtree
//! (`max_upper_bound`) so overlap searches can skip whole subtrees. A node
//! may own an inner tree for the next column holding every stored range
//! that shares the node's bound in this column.
//!
//! # Invariants
//!
//! - Root is black, no red node has a red child, every root-to-leaf path
//!   has the same number of black nodes
//! - `max_upper_bound == max(upper_bound, left.max_upper_bound, right.max_upper_bound)`
//! - Inner trees are never empty; a node whose inner tree drains is removed
//!
//! Nodes live in an arena and link to each other by index. Inputs are
//! validated against the column types before any structural change, so a
//! failing comparison never leaves a half-rebalanced tree behind.

use std::cmp::Ordering;
use std::fmt::{self, Write as _};

use serde::Serialize;

use super::column_expr::{MergePolicy, RangeColumnExpr};
use super::cut::{max_cut, Cut};
use super::errors::{RangeError, RangeResult};
use super::range::Range;
use super::types::SqlType;

type NodeId = usize;

/// Node color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Black => "black",
        }
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    color: Color,
    lower_bound: Cut,
    upper_bound: Cut,
    max_upper_bound: Cut,
    inner: Option<Box<RangeColumnExprTree>>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

/// Interval tree for one index column, nesting trees for the following
/// columns.
#[derive(Debug, Clone)]
pub struct RangeColumnExprTree {
    nodes: Vec<TreeNode>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    size: usize,
    /// This column's type followed by the types of the nested columns
    types: Vec<SqlType>,
}

impl RangeColumnExprTree {
    /// Creates a tree seeded with one range.
    ///
    /// Column types are taken from the range. A zero-length range is
    /// rejected.
    pub fn new(initial: &Range) -> RangeResult<Self> {
        if initial.column_count() == 0 {
            return Err(RangeError::empty_range());
        }
        initial.validate()?;
        Ok(Self::seeded(initial.columns()))
    }

    /// Creates an empty tree over the given column types
    pub fn empty(types: Vec<SqlType>) -> RangeResult<Self> {
        if types.is_empty() {
            return Err(RangeError::empty_range());
        }
        Ok(Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            size: 0,
            types,
        })
    }

    fn seeded(columns: &[RangeColumnExpr]) -> Self {
        let inner = (columns.len() > 1).then(|| Box::new(Self::seeded(&columns[1..])));
        let mut tree = Self {
            nodes: Vec::with_capacity(1),
            free: Vec::new(),
            root: None,
            size: 1,
            types: columns.iter().map(|c| c.typ).collect(),
        };
        let id = tree.alloc(&columns[0], inner);
        tree.nodes[id].color = Color::Black;
        tree.root = Some(id);
        tree
    }

    /// Number of nodes in this column's tree (not counting inner trees)
    pub fn len(&self) -> usize {
        self.size
    }

    /// True when the tree holds no ranges
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// This column's type
    pub fn typ(&self) -> SqlType {
        self.types[0]
    }

    /// Types of this column and every nested column
    pub fn column_types(&self) -> &[SqlType] {
        &self.types
    }

    /// Root node, if any
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root.map(|id| NodeRef { tree: self, id })
    }

    /// In-order iterator over this column's nodes
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Adds a range to the tree.
    pub fn insert(&mut self, range: &Range) -> RangeResult<()> {
        self.validate_input(range)?;
        self.insert_at(range.columns())
    }

    /// Removes a range previously inserted. Unknown ranges are ignored.
    pub fn remove(&mut self, range: &Range) -> RangeResult<()> {
        self.validate_input(range)?;
        self.remove_at(range.columns())
    }

    /// Returns every stored range that overlaps or touches `probe` in every
    /// column, in key order.
    pub fn find_connections(&self, probe: &Range) -> RangeResult<Vec<Range>> {
        self.validate_input(probe)?;
        let mut found = Vec::new();
        if let Some(root) = self.root {
            self.collect_connections(root, probe.columns(), &mut found)?;
        }
        Ok(found.into_iter().map(Range::new).collect())
    }

    /// Flattens the tree into ranges, merging neighbours that touch.
    pub fn get_range_collection(&self) -> RangeResult<Vec<Range>> {
        self.get_range_collection_with(MergePolicy::Connected)
    }

    /// Flattens the tree into ranges, merging neighbours under `policy`.
    ///
    /// Logically empty ranges are dropped. If nothing else remains, one
    /// empty range is returned so "matches nothing" stays distinct from an
    /// empty (unconstrained) result.
    pub fn get_range_collection_with(&self, policy: MergePolicy) -> RangeResult<Vec<Range>> {
        let mut collection: Vec<Range> = Vec::new();
        let mut empty_range = None;
        let mut iters = vec![self.iter()];
        let mut partial: Vec<RangeColumnExpr> = Vec::with_capacity(self.types.len());

        while let Some(iter) = iters.last_mut() {
            let Some(node) = iter.next() else {
                iters.pop();
                continue;
            };
            partial.truncate(iters.len() - 1);
            partial.push(node.column_expr());

            if let Some(inner) = node.inner() {
                iters.push(inner.iter());
                continue;
            }

            let range = Range::new(partial.clone());
            if range.is_empty()? {
                empty_range = Some(range);
                continue;
            }
            match collection.last_mut() {
                Some(last) => match last.try_merge(&range, policy)? {
                    Some(merged) => *last = merged,
                    None => collection.push(range),
                },
                None => collection.push(range),
            }
        }

        if collection.is_empty() {
            collection.extend(empty_range);
        }
        Ok(collection)
    }

    fn validate_input(&self, range: &Range) -> RangeResult<()> {
        if range.column_count() != self.types.len() {
            return Err(RangeError::dimension_mismatch(
                self.types.len(),
                range.column_count(),
            ));
        }
        for (i, (col, typ)) in range.columns().iter().zip(&self.types).enumerate() {
            if col.typ != *typ {
                return Err(RangeError::type_mismatch(format!(
                    "column is {} but the range supplies {}",
                    typ, col.typ
                ))
                .at_column(i));
            }
            col.validate().map_err(|e| e.at_column(i))?;
        }
        Ok(())
    }

    fn insert_at(&mut self, columns: &[RangeColumnExpr]) -> RangeResult<()> {
        let expr = &columns[0];
        let typ = self.typ();
        let mut parent = None;
        let mut went_left = false;
        let mut cursor = self.root;
        let mut raised = Vec::new();

        while let Some(id) = cursor {
            match self.compare_to_node(expr, id)? {
                Ordering::Equal => {
                    return match self.nodes[id].inner.as_mut() {
                        Some(inner) => inner.insert_at(&columns[1..]),
                        None => Ok(()),
                    };
                }
                ord => {
                    if expr.upper_bound.compare(&self.nodes[id].max_upper_bound, typ)?
                        == Ordering::Greater
                    {
                        raised.push(id);
                    }
                    parent = Some(id);
                    went_left = ord == Ordering::Less;
                    cursor = if went_left {
                        self.nodes[id].left
                    } else {
                        self.nodes[id].right
                    };
                }
            }
        }

        let inner = (columns.len() > 1).then(|| Box::new(Self::seeded(&columns[1..])));
        let id = self.alloc(expr, inner);
        for ancestor in raised {
            self.nodes[ancestor].max_upper_bound = expr.upper_bound.clone();
        }
        self.nodes[id].parent = parent;
        match parent {
            None => self.root = Some(id),
            Some(p) if went_left => self.nodes[p].left = Some(id),
            Some(p) => self.nodes[p].right = Some(id),
        }
        self.size += 1;
        self.insert_fixup(id)
    }

    fn insert_fixup(&mut self, mut node: NodeId) -> RangeResult<()> {
        while let Some(mut parent) = self.nodes[node].parent {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red parent is never the root.
            let Some(grand) = self.nodes[parent].parent else {
                break;
            };
            let parent_is_left = self.nodes[grand].left == Some(parent);
            let uncle = if parent_is_left {
                self.nodes[grand].right
            } else {
                self.nodes[grand].left
            };

            if let Some(uncle) = uncle.filter(|&u| self.nodes[u].color == Color::Red) {
                self.nodes[parent].color = Color::Black;
                self.nodes[uncle].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                node = grand;
                continue;
            }

            if parent_is_left {
                if self.nodes[parent].right == Some(node) {
                    self.rotate_left(parent)?;
                    std::mem::swap(&mut node, &mut parent);
                }
                self.nodes[parent].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_right(grand)?;
            } else {
                if self.nodes[parent].left == Some(node) {
                    self.rotate_right(parent)?;
                    std::mem::swap(&mut node, &mut parent);
                }
                self.nodes[parent].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_left(grand)?;
            }
            break;
        }
        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
        Ok(())
    }

    fn remove_at(&mut self, columns: &[RangeColumnExpr]) -> RangeResult<()> {
        let Some(id) = self.find_node(&columns[0])? else {
            return Ok(());
        };
        if let Some(inner) = self.nodes[id].inner.as_mut() {
            inner.remove_at(&columns[1..])?;
            if !inner.is_empty() {
                return Ok(());
            }
            self.nodes[id].inner = None;
        }
        self.delete_node(id)
    }

    fn delete_node(&mut self, target: NodeId) -> RangeResult<()> {
        let mut node = target;
        if let (Some(left), Some(_)) = (self.nodes[target].left, self.nodes[target].right) {
            // Take over the in-order predecessor's bound, then delete the
            // predecessor instead. It has at most one (left) child.
            let pred = self.maximum(left);
            let lower = self.nodes[pred].lower_bound.clone();
            let upper = self.nodes[pred].upper_bound.clone();
            let inner = self.nodes[pred].inner.take().filter(|t| !t.is_empty());
            let slot = &mut self.nodes[target];
            slot.lower_bound = lower;
            slot.upper_bound = upper;
            slot.inner = inner;
            self.propagate_max(target)?;
            node = pred;
        }

        let child = self.nodes[node].left.or(self.nodes[node].right);
        if self.nodes[node].color == Color::Black {
            match child {
                Some(c) if self.nodes[c].color == Color::Red => {
                    self.nodes[c].color = Color::Black;
                }
                _ => self.remove_fixup(node)?,
            }
        }

        let parent = self.nodes[node].parent;
        self.replace_child(node, child);
        self.release(node);
        self.size -= 1;

        if let Some(parent) = parent {
            self.propagate_max(parent)?;
        }
        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
        Ok(())
    }

    /// Restores black heights around `node`, a black leaf-or-single-child
    /// node that is about to be unlinked. The node stays in place during the
    /// fixup and stands in for the missing black.
    fn remove_fixup(&mut self, mut node: NodeId) -> RangeResult<()> {
        while let Some(parent) = self.nodes[node].parent {
            if self.nodes[node].color == Color::Red {
                break;
            }
            let is_left = self.nodes[parent].left == Some(node);
            let Some(mut sibling) = self.sibling_of(parent, is_left) else {
                break;
            };

            if self.nodes[sibling].color == Color::Red {
                self.nodes[sibling].color = Color::Black;
                self.nodes[parent].color = Color::Red;
                self.rotate_toward(parent, is_left)?;
                match self.sibling_of(parent, is_left) {
                    Some(s) => sibling = s,
                    None => break,
                }
            }

            let (near, far) = if is_left {
                (self.nodes[sibling].left, self.nodes[sibling].right)
            } else {
                (self.nodes[sibling].right, self.nodes[sibling].left)
            };

            if self.color_of(near) == Color::Black && self.color_of(far) == Color::Black {
                self.nodes[sibling].color = Color::Red;
                node = parent;
                continue;
            }

            if self.color_of(far) == Color::Black {
                if let Some(near) = near {
                    self.nodes[near].color = Color::Black;
                }
                self.nodes[sibling].color = Color::Red;
                self.rotate_toward(sibling, !is_left)?;
                match self.sibling_of(parent, is_left) {
                    Some(s) => sibling = s,
                    None => break,
                }
            }

            self.nodes[sibling].color = self.nodes[parent].color;
            self.nodes[parent].color = Color::Black;
            let far = if is_left {
                self.nodes[sibling].right
            } else {
                self.nodes[sibling].left
            };
            if let Some(far) = far {
                self.nodes[far].color = Color::Black;
            }
            self.rotate_toward(parent, is_left)?;
            break;
        }
        self.nodes[node].color = Color::Black;
        Ok(())
    }

    /// Recomputes `max_upper_bound` from `start` toward the root, stopping
    /// once a node's value is unchanged.
    fn propagate_max(&mut self, start: NodeId) -> RangeResult<()> {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if !self.recompute_max(id)? {
                break;
            }
            cursor = self.nodes[id].parent;
        }
        Ok(())
    }

    /// Returns true if the stored value changed.
    fn recompute_max(&mut self, id: NodeId) -> RangeResult<bool> {
        let typ = self.typ();
        let node = &self.nodes[id];
        let mut max = &node.upper_bound;
        for child in [node.left, node.right].into_iter().flatten() {
            max = max_cut(max, &self.nodes[child].max_upper_bound, typ)?;
        }
        if max.compare(&node.max_upper_bound, typ)? == Ordering::Equal {
            return Ok(false);
        }
        let max = max.clone();
        self.nodes[id].max_upper_bound = max;
        Ok(true)
    }

    /// Rotates so that `node` moves toward the side of `left`
    fn rotate_toward(&mut self, node: NodeId, left: bool) -> RangeResult<()> {
        if left {
            self.rotate_left(node)
        } else {
            self.rotate_right(node)
        }
    }

    fn rotate_left(&mut self, node: NodeId) -> RangeResult<()> {
        let Some(right) = self.nodes[node].right else {
            return Ok(());
        };
        let moved = self.nodes[right].left;
        self.nodes[node].right = moved;
        if let Some(m) = moved {
            self.nodes[m].parent = Some(node);
        }
        self.replace_child(node, Some(right));
        self.nodes[right].left = Some(node);
        self.nodes[node].parent = Some(right);
        self.recompute_max(node)?;
        self.recompute_max(right)?;
        Ok(())
    }

    fn rotate_right(&mut self, node: NodeId) -> RangeResult<()> {
        let Some(left) = self.nodes[node].left else {
            return Ok(());
        };
        let moved = self.nodes[left].right;
        self.nodes[node].left = moved;
        if let Some(m) = moved {
            self.nodes[m].parent = Some(node);
        }
        self.replace_child(node, Some(left));
        self.nodes[left].right = Some(node);
        self.nodes[node].parent = Some(left);
        self.recompute_max(node)?;
        self.recompute_max(left)?;
        Ok(())
    }

    /// Points `old`'s parent (or the root) at `new`
    fn replace_child(&mut self, old: NodeId, new: Option<NodeId>) {
        let parent = self.nodes[old].parent;
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    self.nodes[p].right = new;
                }
            }
        }
        if let Some(n) = new {
            self.nodes[n].parent = parent;
        }
    }

    fn sibling_of(&self, parent: NodeId, of_left: bool) -> Option<NodeId> {
        if of_left {
            self.nodes[parent].right
        } else {
            self.nodes[parent].left
        }
    }

    fn color_of(&self, id: Option<NodeId>) -> Color {
        id.map_or(Color::Black, |i| self.nodes[i].color)
    }

    fn maximum(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.nodes[id].right {
            id = right;
        }
        id
    }

    fn compare_to_node(&self, expr: &RangeColumnExpr, id: NodeId) -> RangeResult<Ordering> {
        let typ = self.typ();
        let node = &self.nodes[id];
        match expr.lower_bound.compare(&node.lower_bound, typ)? {
            Ordering::Equal => expr.upper_bound.compare(&node.upper_bound, typ),
            ord => Ok(ord),
        }
    }

    fn find_node(&self, expr: &RangeColumnExpr) -> RangeResult<Option<NodeId>> {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            cursor = match self.compare_to_node(expr, id)? {
                Ordering::Less => self.nodes[id].left,
                Ordering::Greater => self.nodes[id].right,
                Ordering::Equal => return Ok(Some(id)),
            };
        }
        Ok(None)
    }

    fn collect_connections(
        &self,
        id: NodeId,
        probe: &[RangeColumnExpr],
        found: &mut Vec<Vec<RangeColumnExpr>>,
    ) -> RangeResult<()> {
        let typ = self.typ();
        let expr = &probe[0];
        let node = &self.nodes[id];

        // Left subtree only matters if something in it reaches the probe.
        if let Some(left) = node.left {
            if expr.lower_bound.compare(&self.nodes[left].max_upper_bound, typ)? != Ordering::Greater {
                self.collect_connections(left, probe, found)?;
            }
        }

        let starts_before_end = node.lower_bound.compare(&expr.upper_bound, typ)? != Ordering::Greater;
        if starts_before_end && expr.lower_bound.compare(&node.upper_bound, typ)? != Ordering::Greater {
            let bound = RangeColumnExpr::new(node.lower_bound.clone(), node.upper_bound.clone(), typ);
            match &node.inner {
                None => found.push(vec![bound]),
                Some(inner) => {
                    let mut nested = Vec::new();
                    if let Some(root) = inner.root {
                        inner.collect_connections(root, &probe[1..], &mut nested)?;
                    }
                    for rest in nested {
                        let mut columns = Vec::with_capacity(rest.len() + 1);
                        columns.push(bound.clone());
                        columns.extend(rest);
                        found.push(columns);
                    }
                }
            }
        }

        // Every node to the right starts at or after this one.
        if starts_before_end {
            if let Some(right) = node.right {
                if expr.lower_bound.compare(&self.nodes[right].max_upper_bound, typ)?
                    != Ordering::Greater
                {
                    self.collect_connections(right, probe, found)?;
                }
            }
        }
        Ok(())
    }

    fn alloc(&mut self, expr: &RangeColumnExpr, inner: Option<Box<Self>>) -> NodeId {
        let node = TreeNode {
            color: Color::Red,
            lower_bound: expr.lower_bound.clone(),
            upper_bound: expr.upper_bound.clone(),
            max_upper_bound: expr.upper_bound.clone(),
            inner,
            left: None,
            right: None,
            parent: None,
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        node.inner = None;
        node.left = None;
        node.right = None;
        node.parent = None;
        self.free.push(id);
    }

    fn render_into(&self, out: &mut String, margin: &str) -> fmt::Result {
        writeln!(out, "{}RangeColumnExprTree ({})", margin, self.typ())?;
        if let Some(root) = self.root {
            self.render_node(out, root, margin, true)?;
        }
        Ok(())
    }

    fn render_node(&self, out: &mut String, id: NodeId, prefix: &str, is_tail: bool) -> fmt::Result {
        let node = &self.nodes[id];
        if let Some(right) = node.right {
            let next = format!("{}{}", prefix, if is_tail { "│   " } else { "    " });
            self.render_node(out, right, &next, false)?;
        }
        writeln!(
            out,
            "{}{}{}, {} max: {} color: {}",
            prefix,
            if is_tail { "└── " } else { "┌── " },
            node.lower_bound.display_as_lower(),
            node.upper_bound.display_as_upper(),
            node.max_upper_bound.display_as_upper(),
            node.color.as_str()
        )?;
        if let Some(inner) = &node.inner {
            let nested = format!("{}{}", prefix, if is_tail { "        " } else { "│       " });
            inner.render_into(out, &nested)?;
        }
        if let Some(left) = node.left {
            let next = format!("{}{}", prefix, if is_tail { "    " } else { "│   " });
            self.render_node(out, left, &next, true)?;
        }
        Ok(())
    }
}

impl fmt::Display for RangeColumnExprTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render_into(&mut out, "")?;
        f.write_str(&out)
    }
}

/// Read-only view of one tree node
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a RangeColumnExprTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a TreeNode {
        &self.tree.nodes[self.id]
    }

    pub fn lower_bound(&self) -> &'a Cut {
        &self.node().lower_bound
    }

    pub fn upper_bound(&self) -> &'a Cut {
        &self.node().upper_bound
    }

    /// Largest upper cut in this node's subtree
    pub fn max_upper_bound(&self) -> &'a Cut {
        &self.node().max_upper_bound
    }

    pub fn color(&self) -> Color {
        self.node().color
    }

    /// Tree for the next column, shared by every range with this bound
    pub fn inner(&self) -> Option<&'a RangeColumnExprTree> {
        self.node().inner.as_deref()
    }

    pub fn left(&self) -> Option<NodeRef<'a>> {
        self.node().left.map(|id| NodeRef { tree: self.tree, id })
    }

    pub fn right(&self) -> Option<NodeRef<'a>> {
        self.node().right.map(|id| NodeRef { tree: self.tree, id })
    }

    /// This node's bound as a column range
    pub fn column_expr(&self) -> RangeColumnExpr {
        RangeColumnExpr::new(
            self.lower_bound().clone(),
            self.upper_bound().clone(),
            self.tree.typ(),
        )
    }
}

/// In-order iterator over one column's nodes
pub struct Iter<'a> {
    tree: &'a RangeColumnExprTree,
    stack: Vec<NodeId>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut cursor: Option<NodeId>) {
        while let Some(id) = cursor {
            self.stack.push(id);
            cursor = self.tree.nodes[id].left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.push_left_spine(self.tree.nodes[id].right);
        Some(NodeRef {
            tree: self.tree,
            id,
        })
    }
}
