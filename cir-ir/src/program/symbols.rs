//! Program-level symbol table mapping names to their declaring nodes

use crate::ast::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: HashMap<String, NodeIndex>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `node`, returning the node it previously named
    pub fn insert(&mut self, name: impl Into<String>, node: NodeIndex) -> Option<NodeIndex> {
        self.symbols.insert(name.into(), node)
    }

    pub fn lookup(&self, name: &str) -> Option<NodeIndex> {
        self.symbols.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<NodeIndex> {
        self.symbols.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Entries sorted by name
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, NodeIndex)> {
        let mut entries: Vec<_> = self
            .symbols
            .iter()
            .map(|(name, node)| (name.as_str(), *node))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_shadow() {
        let mut table = SymbolTable::new();
        assert_eq!(table.insert("main", NodeIndex(0)), None);
        assert_eq!(table.insert("main", NodeIndex(4)), Some(NodeIndex(0)));
        assert_eq!(table.lookup("main"), Some(NodeIndex(4)));
        assert!(table.contains("main"));
        assert_eq!(table.remove("main"), Some(NodeIndex(4)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut table = SymbolTable::new();
        table.insert("zeta", NodeIndex(1));
        table.insert("alpha", NodeIndex(2));
        table.insert("mid", NodeIndex(3));
        let names: Vec<_> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(table.len(), 3);
    }
}
