//! AST nodes, their identities and version snapshots

use super::ops::{BinaryOp, UnaryOp};
use crate::typesys::TypeFacade;
use crate::value::Value;
use cir_common::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild a decoded id, making sure later allocations stay above it
    pub fn observe(raw: u64) -> Self {
        NEXT_NODE_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        NodeId(raw)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a node in its AST arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which state of the tree to look at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Version {
    /// Current children and attributes
    #[default]
    Live,
    /// The state recorded by a node's first bump, where one exists
    Canonical,
}

/// Declaration, statement and expression kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    TranslationUnit,
    FunctionDecl { name: String },
    ParamDecl { name: String },
    VarDecl { name: String },
    TypedefDecl { name: String },
    RecordDecl { name: String },
    FieldDecl { name: String },
    CompoundStmt,
    IfStmt,
    WhileStmt,
    DoStmt,
    ForStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    DeclStmt,
    BinaryOperator(BinaryOp),
    UnaryOperator(UnaryOp),
    CallExpr,
    DeclRef { name: String },
    Literal,
    CastExpr,
    MemberExpr { member: String, arrow: bool },
    ConditionalOperator,
}

impl NodeKind {
    pub fn tag(&self) -> u8 {
        match self {
            NodeKind::TranslationUnit => 0,
            NodeKind::FunctionDecl { .. } => 1,
            NodeKind::ParamDecl { .. } => 2,
            NodeKind::VarDecl { .. } => 3,
            NodeKind::TypedefDecl { .. } => 4,
            NodeKind::RecordDecl { .. } => 5,
            NodeKind::FieldDecl { .. } => 6,
            NodeKind::CompoundStmt => 7,
            NodeKind::IfStmt => 8,
            NodeKind::WhileStmt => 9,
            NodeKind::DoStmt => 10,
            NodeKind::ForStmt => 11,
            NodeKind::ReturnStmt => 12,
            NodeKind::BreakStmt => 13,
            NodeKind::ContinueStmt => 14,
            NodeKind::DeclStmt => 15,
            NodeKind::BinaryOperator(_) => 16,
            NodeKind::UnaryOperator(_) => 17,
            NodeKind::CallExpr => 18,
            NodeKind::DeclRef { .. } => 19,
            NodeKind::Literal => 20,
            NodeKind::CastExpr => 21,
            NodeKind::MemberExpr { .. } => 22,
            NodeKind::ConditionalOperator => 23,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::TranslationUnit => "TranslationUnit",
            NodeKind::FunctionDecl { .. } => "FunctionDecl",
            NodeKind::ParamDecl { .. } => "ParamDecl",
            NodeKind::VarDecl { .. } => "VarDecl",
            NodeKind::TypedefDecl { .. } => "TypedefDecl",
            NodeKind::RecordDecl { .. } => "RecordDecl",
            NodeKind::FieldDecl { .. } => "FieldDecl",
            NodeKind::CompoundStmt => "CompoundStmt",
            NodeKind::IfStmt => "IfStmt",
            NodeKind::WhileStmt => "WhileStmt",
            NodeKind::DoStmt => "DoStmt",
            NodeKind::ForStmt => "ForStmt",
            NodeKind::ReturnStmt => "ReturnStmt",
            NodeKind::BreakStmt => "BreakStmt",
            NodeKind::ContinueStmt => "ContinueStmt",
            NodeKind::DeclStmt => "DeclStmt",
            NodeKind::BinaryOperator(_) => "BinaryOperator",
            NodeKind::UnaryOperator(_) => "UnaryOperator",
            NodeKind::CallExpr => "CallExpr",
            NodeKind::DeclRef { .. } => "DeclRef",
            NodeKind::Literal => "Literal",
            NodeKind::CastExpr => "CastExpr",
            NodeKind::MemberExpr { .. } => "MemberExpr",
            NodeKind::ConditionalOperator => "ConditionalOperator",
        }
    }

    /// Declared name, for kinds that introduce one
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            NodeKind::FunctionDecl { name }
            | NodeKind::ParamDecl { name }
            | NodeKind::VarDecl { name }
            | NodeKind::TypedefDecl { name }
            | NodeKind::RecordDecl { name }
            | NodeKind::FieldDecl { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self {
            NodeKind::BinaryOperator(op) => write!(f, " '{op}'"),
            NodeKind::UnaryOperator(op) => write!(f, " '{op}'"),
            NodeKind::DeclRef { name } => write!(f, " '{name}'"),
            NodeKind::MemberExpr { member, arrow } => {
                write!(f, " {}{member}", if *arrow { "->" } else { "." })
            }
            other => match other.declared_name() {
                Some(name) => write!(f, " '{name}'"),
                None => Ok(()),
            },
        }
    }
}

/// A node's state as recorded by a bump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub kind: NodeKind,
    pub location: SourceLocation,
    pub return_type: Option<TypeFacade>,
    pub value: Option<Value>,
    pub children: Vec<NodeIndex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    pub(crate) id: NodeId,
    pub(crate) location: SourceLocation,
    pub(crate) kind: NodeKind,
    pub(crate) return_type: Option<TypeFacade>,
    pub(crate) value: Option<Value>,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) modifier_count: u32,
    pub(crate) history: Vec<Snapshot>,
}

impl AstNode {
    pub(crate) fn new(kind: NodeKind, location: SourceLocation) -> Self {
        Self {
            id: NodeId::next(),
            location,
            kind,
            return_type: None,
            value: None,
            children: Vec::new(),
            parent: None,
            modifier_count: 0,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn return_type(&self) -> Option<&TypeFacade> {
        self.return_type.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Number of `emplace` calls, kept for diagnostics
    pub fn modifier_count(&self) -> u32 {
        self.modifier_count
    }

    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    pub fn alteration(&self) -> usize {
        self.history.len()
    }

    pub fn has_alteration(&self) -> bool {
        self.alteration() > 0
    }

    fn canonical(&self, version: Version) -> Option<&Snapshot> {
        match version {
            Version::Live => None,
            Version::Canonical => self.history.first(),
        }
    }

    pub fn children_at(&self, version: Version) -> &[NodeIndex] {
        self.canonical(version)
            .map_or(&self.children, |snapshot| &snapshot.children)
    }

    pub fn kind_at(&self, version: Version) -> &NodeKind {
        self.canonical(version).map_or(&self.kind, |snapshot| &snapshot.kind)
    }

    pub fn location_at(&self, version: Version) -> SourceLocation {
        self.canonical(version)
            .map_or(self.location, |snapshot| snapshot.location)
    }

    pub fn return_type_at(&self, version: Version) -> Option<&TypeFacade> {
        match self.canonical(version) {
            Some(snapshot) => snapshot.return_type.as_ref(),
            None => self.return_type.as_ref(),
        }
    }

    pub fn value_at(&self, version: Version) -> Option<&Value> {
        match self.canonical(version) {
            Some(snapshot) => snapshot.value.as_ref(),
            None => self.value.as_ref(),
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            kind: self.kind.clone(),
            location: self.location,
            return_type: self.return_type.clone(),
            value: self.value.clone(),
            children: self.children.clone(),
        }
    }
}

/// Shallow comparison: identity, location, history length and live child
/// count. Children themselves are not compared.
impl PartialEq for AstNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.location == other.location
            && self.history.len() == other.history.len()
            && self.children.len() == other.children.len()
    }
}
