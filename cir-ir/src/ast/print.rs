//! Indented tree dumps

use super::{Ast, NodeIndex, Version};
use std::fmt::Write;

impl Ast {
    /// Render the subtree under `node`, one line per node:
    /// `Kind 'name' <line:col> 'type' = value`
    pub fn print(&self, node: NodeIndex, version: Version) -> String {
        let mut out = String::new();
        let mut walk = self.preorder(node, version);
        while let Some(index) = walk.next() {
            let current = self.node(index);
            let _ = write!(
                out,
                "{:indent$}{} <{}>",
                "",
                current.kind_at(version),
                current.location_at(version),
                indent = walk.depth() * 2
            );
            if let Some(facade) = current.return_type_at(version) {
                let _ = write!(out, " '{facade}'");
            }
            if let Some(value) = current.value_at(version) {
                let _ = write!(out, " = {value}");
            }
            out.push('\n');
        }
        out
    }
}
