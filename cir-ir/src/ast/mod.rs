//! AST node graph
//!
//! Nodes live in an arena owned by [`Ast`] and refer to each other by
//! [`NodeIndex`]. A node owns its ordered children; the parent link is a
//! plain index that never keeps anything alive. Nodes are never freed, so a
//! detached subtree stays reachable from the version history of its former
//! parent.
//!
//! Destructive edits are bracketed by [`Ast::bump`], which records the
//! pre-edit state. [`Version::Canonical`] views the tree as it was at each
//! node's first bump.

pub mod node;
pub mod ops;
mod print;
mod traverse;
mod wire;

pub use node::{AstNode, NodeId, NodeIndex, NodeKind, Snapshot, Version};
pub use ops::{BinaryOp, UnaryOp};
pub use traverse::Preorder;
pub use wire::AST_MAGIC;

use crate::typesys::TypeFacade;
use crate::value::Value;
use cir_common::{fatal, IrError, IrResult, SourceLocation};
use log::trace;
use serde::{Deserialize, Serialize};

/// Arena of AST nodes with an optional root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: Option<NodeIndex>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node
    pub fn add_node(&mut self, kind: NodeKind, location: SourceLocation) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(AstNode::new(kind, location));
        index
    }

    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeIndex) {
        self.slot(root);
        self.root = Some(root);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: NodeIndex) -> Option<&AstNode> {
        self.nodes.get(index.0)
    }

    /// The node at `index`. Indices come from this arena; a foreign one is
    /// an internal invariant violation.
    pub fn node(&self, index: NodeIndex) -> &AstNode {
        self.slot(index)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &AstNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i), node))
    }

    fn slot(&self, index: NodeIndex) -> &AstNode {
        match self.nodes.get(index.0) {
            Some(node) => node,
            None => fatal!("node index {index} outside an arena of {} node(s)", self.nodes.len()),
        }
    }

    fn slot_mut(&mut self, index: NodeIndex) -> &mut AstNode {
        let len = self.nodes.len();
        match self.nodes.get_mut(index.0) {
            Some(node) => node,
            None => fatal!("node index {index} outside an arena of {len} node(s)"),
        }
    }

    fn adopt(&mut self, parent: NodeIndex, child: NodeIndex) {
        if parent == child {
            fatal!("node {child} cannot be its own child");
        }
        if let Some(current) = self.slot(child).parent {
            fatal!("node {child} already has parent {current}");
        }
        self.slot_mut(child).parent = Some(parent);
    }

    // Structure

    /// Append `child` to `parent` and point the child back at it
    pub fn append_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.adopt(parent, child);
        self.slot_mut(parent).children.push(child);
    }

    /// Insert `child` at `position` (clamped to the end)
    pub fn emplace(&mut self, parent: NodeIndex, position: usize, child: NodeIndex) {
        self.adopt(parent, child);
        let node = self.slot_mut(parent);
        let position = position.min(node.children.len());
        node.children.insert(position, child);
        node.modifier_count += 1;
    }

    /// Remove the child at `position`, leaving it detached in the arena
    pub fn detach_child(&mut self, parent: NodeIndex, position: usize) -> IrResult<NodeIndex> {
        let node = self.slot_mut(parent);
        if position >= node.children.len() {
            return Err(IrError::OutOfBounds {
                index: position,
                size: node.children.len(),
            });
        }
        let child = node.children.remove(position);
        self.slot_mut(child).parent = None;
        Ok(child)
    }

    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.slot(node).parent
    }

    pub fn children(&self, node: NodeIndex, version: Version) -> &[NodeIndex] {
        self.slot(node).children_at(version)
    }

    /// Live child count
    pub fn children_count(&self, node: NodeIndex) -> usize {
        self.slot(node).children.len()
    }

    // Attributes

    pub fn set_kind(&mut self, node: NodeIndex, kind: NodeKind) {
        self.slot_mut(node).kind = kind;
    }

    pub fn set_location(&mut self, node: NodeIndex, location: SourceLocation) {
        self.slot_mut(node).location = location;
    }

    pub fn set_return_type(&mut self, node: NodeIndex, facade: Option<TypeFacade>) {
        self.slot_mut(node).return_type = facade;
    }

    pub fn set_value(&mut self, node: NodeIndex, value: Option<Value>) {
        self.slot_mut(node).value = value;
    }

    pub fn take_value(&mut self, node: NodeIndex) -> Option<Value> {
        self.slot_mut(node).value.take()
    }

    // History

    /// Record the current state before a destructive edit
    pub fn bump(&mut self, node: NodeIndex) {
        let target = self.slot_mut(node);
        let snapshot = target.snapshot();
        target.history.push(snapshot);
        trace!("bumped node {} to alteration {}", target.id, target.history.len());
    }

    pub fn alteration(&self, node: NodeIndex) -> usize {
        self.slot(node).alteration()
    }

    pub fn has_alteration(&self, node: NodeIndex) -> bool {
        self.slot(node).has_alteration()
    }

    /// The `n`-th recorded state, oldest first
    pub fn snapshot(&self, node: NodeIndex, n: usize) -> Option<&Snapshot> {
        self.slot(node).history.get(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::make_int;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new(line, 1)
    }

    #[test]
    fn test_append_sets_parent() {
        let mut ast = Ast::new();
        let parent = ast.add_node(NodeKind::CompoundStmt, loc(1));
        let child = ast.add_node(NodeKind::ReturnStmt, loc(2));
        assert_eq!(ast.parent(child), None);

        ast.append_child(parent, child);
        assert_eq!(ast.parent(child), Some(parent));
        assert_eq!(ast.children_count(parent), 1);
        assert_eq!(ast.children(parent, Version::Live), &[child]);
    }

    #[test]
    fn test_emplace_clamps_and_counts() {
        let mut ast = Ast::new();
        let parent = ast.add_node(NodeKind::CompoundStmt, loc(1));
        let a = ast.add_node(NodeKind::BreakStmt, loc(2));
        let b = ast.add_node(NodeKind::ContinueStmt, loc(3));
        let c = ast.add_node(NodeKind::ReturnStmt, loc(4));
        ast.append_child(parent, a);
        ast.emplace(parent, 0, b);
        ast.emplace(parent, 99, c);
        assert_eq!(ast.children(parent, Version::Live), &[b, a, c]);
        assert_eq!(ast.node(parent).modifier_count(), 2);
        assert_eq!(ast.parent(c), Some(parent));
    }

    #[test]
    fn test_detach_child() {
        let mut ast = Ast::new();
        let parent = ast.add_node(NodeKind::CompoundStmt, loc(1));
        let child = ast.add_node(NodeKind::BreakStmt, loc(2));
        ast.append_child(parent, child);

        assert_eq!(ast.detach_child(parent, 0), Ok(child));
        assert_eq!(ast.parent(child), None);
        assert_eq!(
            ast.detach_child(parent, 0),
            Err(IrError::OutOfBounds { index: 0, size: 0 })
        );
        // A detached node can be re-attached elsewhere
        let other = ast.add_node(NodeKind::CompoundStmt, loc(3));
        ast.append_child(other, child);
        assert_eq!(ast.parent(child), Some(other));
    }

    #[test]
    #[should_panic(expected = "already has parent")]
    fn test_double_adoption_is_fatal() {
        let mut ast = Ast::new();
        let a = ast.add_node(NodeKind::CompoundStmt, loc(1));
        let b = ast.add_node(NodeKind::CompoundStmt, loc(2));
        let child = ast.add_node(NodeKind::BreakStmt, loc(3));
        ast.append_child(a, child);
        ast.append_child(b, child);
    }

    #[test]
    fn test_bump_records_pre_edit_state() {
        let mut ast = Ast::new();
        let literal = ast.add_node(NodeKind::Literal, loc(1));
        ast.set_value(literal, Some(make_int(1)));
        assert!(!ast.has_alteration(literal));

        ast.bump(literal);
        ast.set_value(literal, Some(make_int(2)));
        ast.bump(literal);
        ast.set_kind(literal, NodeKind::CastExpr);

        assert_eq!(ast.alteration(literal), 2);
        assert_eq!(ast.snapshot(literal, 0).and_then(|s| s.value.clone()), Some(make_int(1)));
        assert_eq!(ast.snapshot(literal, 1).map(|s| s.kind.clone()), Some(NodeKind::Literal));
        assert!(ast.snapshot(literal, 2).is_none());

        let node = ast.node(literal);
        assert_eq!(node.value_at(Version::Canonical), Some(&make_int(1)));
        assert_eq!(node.value_at(Version::Live), Some(&make_int(2)));
        assert_eq!(node.kind_at(Version::Live), &NodeKind::CastExpr);
    }

    #[test]
    fn test_take_value() {
        let mut ast = Ast::new();
        let node = ast.add_node(NodeKind::Literal, loc(1));
        ast.set_value(node, Some(make_int(5)));
        assert_eq!(ast.take_value(node), Some(make_int(5)));
        assert_eq!(ast.node(node).value(), None);
    }
}
