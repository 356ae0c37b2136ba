//! Preorder traversal

use super::{Ast, NodeIndex, Version};
use std::collections::HashSet;

impl Ast {
    /// Parent of `node` as seen in `version`. A canonical child list may
    /// still name a node that has since been detached, so the live link is
    /// only trusted when the parent's list actually contains the node.
    fn parent_at(&self, node: NodeIndex, version: Version) -> Option<NodeIndex> {
        let live = self.parent(node);
        if version == Version::Live {
            return live;
        }
        if let Some(parent) = live {
            if self.children(parent, version).contains(&node) {
                return Some(parent);
            }
        }
        self.nodes()
            .find(|(_, candidate)| candidate.children_at(version).contains(&node))
            .map(|(index, _)| index)
    }

    /// One preorder step from `node`: descend to the first child, otherwise
    /// climb until an ancestor has a next sibling. `None` once the walk
    /// passes the last node under the topmost ancestor.
    pub fn forward_internal_tree(&self, node: NodeIndex, version: Version) -> Option<NodeIndex> {
        if let Some(&first) = self.children(node, version).first() {
            return Some(first);
        }
        let mut current = node;
        // A canonical view may revisit a node that was re-parented after its
        // first bump, so the climb is bounded by the arena size
        let mut climbed = 0;
        while let Some(parent) = self.parent_at(current, version) {
            climbed += 1;
            if climbed > self.len() {
                return None;
            }
            let siblings = self.children(parent, version);
            if let Some(position) = siblings.iter().position(|&sibling| sibling == current) {
                if let Some(&next) = siblings.get(position + 1) {
                    return Some(next);
                }
            }
            current = parent;
        }
        None
    }

    /// Iterate the subtree under `node` in preorder
    pub fn preorder(&self, node: NodeIndex, version: Version) -> Preorder<'_> {
        Preorder {
            ast: self,
            version,
            stack: vec![(node, 0)],
            seen: HashSet::new(),
            depth: 0,
        }
    }
}

/// Explicit-stack preorder walk over one subtree. Each node is yielded at
/// most once, even when a canonical view lists it under two parents.
pub struct Preorder<'a> {
    ast: &'a Ast,
    version: Version,
    stack: Vec<(NodeIndex, usize)>,
    seen: HashSet<NodeIndex>,
    depth: usize,
}

impl Preorder<'_> {
    /// Depth of the node most recently returned, relative to the start
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Iterator for Preorder<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let (node, depth) = loop {
            let (node, depth) = self.stack.pop()?;
            if self.seen.insert(node) {
                break (node, depth);
            }
        };
        self.depth = depth;
        let children = self.ast.children(node, self.version);
        self.stack
            .extend(children.iter().rev().map(|&child| (child, depth + 1)));
        Some(node)
    }
}
