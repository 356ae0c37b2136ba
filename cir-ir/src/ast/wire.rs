//! AST envelopes
//!
//! ```text
//! [magic 0xA5][platform]            optional preamble
//! [node count]
//!   per node: kind, id, line, column, parent?, children, modifier count,
//!             return type?, value?, history
//! [root?]
//! ```
//!
//! Unlike a bare type envelope, a node's return type carries its pointer and
//! array modifiers.

use super::node::{AstNode, NodeId, NodeIndex, NodeKind, Snapshot};
use super::ops::{BinaryOp, UnaryOp};
use super::Ast;
use crate::typesys::TypeFacade;
use crate::value::Value;
use cir_common::{fatal, SourceLocation};
use cir_wire::{ByteStream, EncodeOptions, WireDecode, WireEncode, WireError, WireResult};
use log::debug;

/// Magic byte of a standalone AST envelope
pub const AST_MAGIC: u8 = 0xA5;

impl WireEncode for NodeKind {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_byte(self.tag());
        match self {
            NodeKind::FunctionDecl { name }
            | NodeKind::ParamDecl { name }
            | NodeKind::VarDecl { name }
            | NodeKind::TypedefDecl { name }
            | NodeKind::RecordDecl { name }
            | NodeKind::FieldDecl { name }
            | NodeKind::DeclRef { name } => stream.put_string(name),
            NodeKind::BinaryOperator(op) => stream.put_byte(op.tag()),
            NodeKind::UnaryOperator(op) => stream.put_byte(op.tag()),
            NodeKind::MemberExpr { member, arrow } => {
                stream.put_string(member);
                stream.put_bool(*arrow);
            }
            _ => {}
        }
    }
}

impl WireDecode for NodeKind {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        let tag = stream.get_byte()?;
        Ok(match tag {
            0 => NodeKind::TranslationUnit,
            1 => NodeKind::FunctionDecl { name: stream.get_string()? },
            2 => NodeKind::ParamDecl { name: stream.get_string()? },
            3 => NodeKind::VarDecl { name: stream.get_string()? },
            4 => NodeKind::TypedefDecl { name: stream.get_string()? },
            5 => NodeKind::RecordDecl { name: stream.get_string()? },
            6 => NodeKind::FieldDecl { name: stream.get_string()? },
            7 => NodeKind::CompoundStmt,
            8 => NodeKind::IfStmt,
            9 => NodeKind::WhileStmt,
            10 => NodeKind::DoStmt,
            11 => NodeKind::ForStmt,
            12 => NodeKind::ReturnStmt,
            13 => NodeKind::BreakStmt,
            14 => NodeKind::ContinueStmt,
            15 => NodeKind::DeclStmt,
            16 => {
                let op = stream.get_byte()?;
                NodeKind::BinaryOperator(
                    BinaryOp::from_tag(op).ok_or(WireError::unknown_tag("binary operator", op))?,
                )
            }
            17 => {
                let op = stream.get_byte()?;
                NodeKind::UnaryOperator(
                    UnaryOp::from_tag(op).ok_or(WireError::unknown_tag("unary operator", op))?,
                )
            }
            18 => NodeKind::CallExpr,
            19 => NodeKind::DeclRef { name: stream.get_string()? },
            20 => NodeKind::Literal,
            21 => NodeKind::CastExpr,
            22 => NodeKind::MemberExpr {
                member: stream.get_string()?,
                arrow: stream.get_bool()?,
            },
            23 => NodeKind::ConditionalOperator,
            other => return Err(WireError::unknown_tag("node kind", other)),
        })
    }
}

/// Use-site facade: type envelope plus both modifier counts
struct UseSite<'a>(&'a TypeFacade);

impl WireEncode for UseSite<'_> {
    fn encode(&self, stream: &mut ByteStream) {
        self.0.encode(stream);
        stream.put_word(self.0.pointer_count());
        stream.put_word(self.0.array_count());
    }
}

fn put_return_type(stream: &mut ByteStream, facade: Option<&TypeFacade>) {
    facade.map(UseSite).encode(stream);
}

fn get_return_type(stream: &mut ByteStream) -> WireResult<Option<TypeFacade>> {
    if !stream.get_bool()? {
        return Ok(None);
    }
    let facade = TypeFacade::decode(stream)?;
    let pointer = stream.get_word()?;
    let array = stream.get_word()?;
    Ok(Some(facade.with_pointer(pointer).with_array(array)))
}

fn put_index(stream: &mut ByteStream, index: NodeIndex) {
    stream.put_len(index.0);
}

fn put_location(stream: &mut ByteStream, location: SourceLocation) {
    stream.put_word(location.line);
    stream.put_word(location.column);
}

fn get_location(stream: &mut ByteStream) -> WireResult<SourceLocation> {
    let line = stream.get_word()?;
    let column = stream.get_word()?;
    Ok(SourceLocation::new(line, column))
}

impl WireEncode for Snapshot {
    fn encode(&self, stream: &mut ByteStream) {
        self.kind.encode(stream);
        put_location(stream, self.location);
        put_return_type(stream, self.return_type.as_ref());
        self.value.encode(stream);
        stream.write_iter(&self.children, |s, child| put_index(s, *child));
    }
}

impl WireEncode for AstNode {
    fn encode(&self, stream: &mut ByteStream) {
        self.kind.encode(stream);
        stream.put_dword(self.id.value());
        put_location(stream, self.location);
        self.parent.map(|p| p.0 as u32).encode(stream);
        stream.write_iter(&self.children, |s, child| put_index(s, *child));
        stream.put_word(self.modifier_count);
        put_return_type(stream, self.return_type.as_ref());
        self.value.encode(stream);
        stream.write_iter(&self.history, |s, snapshot| snapshot.encode(s));
    }
}

/// Reads node indices, checking them against the arena size
struct IndexReader {
    count: usize,
}

impl IndexReader {
    fn read(&self, stream: &mut ByteStream) -> WireResult<NodeIndex> {
        let raw = stream.get_word()? as usize;
        if raw >= self.count {
            return Err(WireError::malformed(format!(
                "node index {raw} outside an arena of {} node(s)",
                self.count
            )));
        }
        Ok(NodeIndex(raw))
    }

    fn read_list(&self, stream: &mut ByteStream) -> WireResult<Vec<NodeIndex>> {
        stream.read_seq(|s| self.read(s))
    }

    fn read_optional(&self, stream: &mut ByteStream) -> WireResult<Option<NodeIndex>> {
        if stream.get_bool()? {
            self.read(stream).map(Some)
        } else {
            Ok(None)
        }
    }

    fn read_snapshot(&self, owner: usize, stream: &mut ByteStream) -> WireResult<Snapshot> {
        let kind = NodeKind::decode(stream)?;
        let location = get_location(stream)?;
        let return_type = get_return_type(stream)?;
        let value = Option::<Value>::decode(stream)?;
        let children = self.read_list(stream)?;
        for (position, child) in children.iter().enumerate() {
            if child.0 == owner {
                return Err(WireError::malformed(format!(
                    "snapshot of node {owner} lists itself as a child"
                )));
            }
            if children[..position].contains(child) {
                return Err(WireError::malformed(format!(
                    "snapshot of node {owner} lists child {child} twice"
                )));
            }
        }
        Ok(Snapshot {
            kind,
            location,
            return_type,
            value,
            children,
        })
    }

    fn read_node(&self, index: usize, stream: &mut ByteStream) -> WireResult<AstNode> {
        let kind = NodeKind::decode(stream)?;
        let id = NodeId::observe(stream.get_dword()?);
        let location = get_location(stream)?;
        let parent = self.read_optional(stream)?;
        let children = self.read_list(stream)?;
        let modifier_count = stream.get_word()?;
        let return_type = get_return_type(stream)?;
        let value = Option::<Value>::decode(stream)?;
        let history = stream.read_seq(|s| self.read_snapshot(index, s))?;
        Ok(AstNode {
            id,
            location,
            kind,
            return_type,
            value,
            children,
            parent,
            modifier_count,
            history,
        })
    }
}

/// Live parent and child links must describe a forest: every child is listed
/// exactly once, by the node its parent link names, and every parent chain
/// ends at a root.
fn check_links(nodes: &[AstNode]) -> WireResult<()> {
    let mut listed_by: Vec<Option<usize>> = vec![None; nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        for child in &node.children {
            if let Some(other) = listed_by[child.0] {
                return Err(WireError::malformed(format!(
                    "child {child} is listed by node {other} and again by node {i}"
                )));
            }
            listed_by[child.0] = Some(i);
            if nodes[child.0].parent != Some(NodeIndex(i)) {
                return Err(WireError::malformed(format!(
                    "node {i} lists child {child} whose parent link disagrees"
                )));
            }
        }
    }

    for (i, node) in nodes.iter().enumerate() {
        let Some(parent) = node.parent else {
            continue;
        };
        if parent.0 == i {
            return Err(WireError::malformed(format!("node {i} is its own parent")));
        }
        if listed_by[i] != Some(parent.0) {
            return Err(WireError::malformed(format!(
                "node {i} names parent {parent}, which does not list it"
            )));
        }
    }

    for start in 0..nodes.len() {
        let mut current = start;
        let mut steps = 0;
        while let Some(parent) = nodes[current].parent {
            steps += 1;
            if steps > nodes.len() {
                return Err(WireError::malformed(format!(
                    "parent chain from node {start} never reaches a root"
                )));
            }
            current = parent.0;
        }
    }
    Ok(())
}

impl WireEncode for Ast {
    fn encode(&self, stream: &mut ByteStream) {
        stream.write_iter(&self.nodes, |s, node| node.encode(s));
        self.root.map(|root| root.0 as u32).encode(stream);
    }
}

impl WireDecode for Ast {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        // Smallest node: kind, id, location, parent flag, children count,
        // modifier count, return type flag, value flag, history count
        let count = stream.get_len("ast nodes", 1 + 8 + 8 + 1 + 4 + 4 + 1 + 1 + 4)?;
        let reader = IndexReader { count };
        let mut nodes = Vec::with_capacity(count);
        for index in 0..count {
            nodes.push(reader.read_node(index, stream)?);
        }
        let root = reader.read_optional(stream)?;

        check_links(&nodes)?;
        debug!("decoded ast with {count} node(s)");
        Ok(Ast { nodes, root })
    }
}

impl Ast {
    /// Encode as a standalone envelope, with the preamble when enabled
    pub fn to_envelope(&self, options: &EncodeOptions) -> Vec<u8> {
        let mut stream = options.begin(AST_MAGIC);
        self.encode(&mut stream);
        stream.into_bytes()
    }

    /// Decode a standalone envelope, with or without preamble
    pub fn from_envelope(bytes: &[u8]) -> WireResult<Ast> {
        let mut stream = ByteStream::from_bytes(bytes);
        Self::read_envelope(&mut stream)
    }

    pub(crate) fn read_envelope(stream: &mut ByteStream) -> WireResult<Ast> {
        stream.validate_preamble(AST_MAGIC);
        let ast = Ast::decode(stream)?;
        if !stream.is_exhausted() {
            return Err(WireError::malformed(format!(
                "{} trailing byte(s) after ast",
                stream.remaining()
            )));
        }
        Ok(ast)
    }

    /// Decode an envelope produced by [`Ast::to_envelope`]. Corrupt input is
    /// an internal invariant violation.
    pub fn deserialize(bytes: &[u8]) -> Ast {
        match Ast::from_envelope(bytes) {
            Ok(ast) => ast,
            Err(err) => fatal!("corrupt ast envelope: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Version;
    use crate::typesys::Specifier;
    use crate::value::make_int;
    use cir_wire::Endian;
    use pretty_assertions::assert_eq;

    fn sample() -> Ast {
        let mut ast = Ast::new();
        let func = ast.add_node(
            NodeKind::FunctionDecl { name: "f".into() },
            SourceLocation::new(1, 1),
        );
        let member = ast.add_node(
            NodeKind::MemberExpr { member: "next".into(), arrow: true },
            SourceLocation::new(2, 3),
        );
        let literal = ast.add_node(NodeKind::Literal, SourceLocation::new(3, 3));
        ast.append_child(func, member);
        ast.emplace(func, 0, literal);
        ast.set_return_type(func, Some(TypeFacade::builtin(Specifier::Char).with_pointer(2)));
        ast.set_value(literal, Some(make_int(9)));
        ast.bump(literal);
        ast.set_value(literal, Some(make_int(10)));
        ast.set_root(func);
        ast
    }

    fn assert_same(decoded: &Ast, original: &Ast) {
        assert_eq!(decoded.len(), original.len());
        assert_eq!(decoded.root(), original.root());
        for ((_, a), (_, b)) in decoded.nodes().zip(original.nodes()) {
            assert_eq!(a, b);
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.parent(), b.parent());
            assert_eq!(a.children(), b.children());
            assert_eq!(a.modifier_count(), b.modifier_count());
            assert_eq!(a.value(), b.value());
            assert_eq!(a.history(), b.history());
            match (a.return_type(), b.return_type()) {
                (Some(x), Some(y)) => assert!(x.identical(y)),
                (x, y) => assert_eq!(x.is_none(), y.is_none()),
            }
        }
    }

    #[test]
    fn test_roundtrip_with_and_without_preamble() {
        let ast = sample();
        for preamble in [true, false] {
            for endian in [Endian::Little, Endian::Big] {
                let bytes = ast.to_envelope(&EncodeOptions { preamble, endian });
                assert_eq!(bytes[0] == AST_MAGIC, preamble);
                if !preamble && endian == Endian::Big {
                    // A bare big-endian payload is only readable by a stream
                    // that already knows its byte order
                    continue;
                }
                assert_same(&Ast::deserialize(&bytes), &ast);
            }
        }
    }

    #[test]
    fn test_modifiers_survive_in_node_envelope() {
        let ast = sample();
        let decoded = Ast::deserialize(&ast.to_envelope(&EncodeOptions::default()));
        let root = decoded.root().unwrap();
        let facade = decoded.node(root).return_type().unwrap();
        assert_eq!(facade.pointer_count(), 2);
        assert_eq!(facade.to_string(), "char**");
    }

    #[test]
    fn test_decoded_history_keeps_canonical_view() {
        let ast = sample();
        let decoded = Ast::deserialize(&ast.to_envelope(&EncodeOptions::default()));
        let root = decoded.root().unwrap();
        assert_eq!(decoded.print(root, Version::Canonical), ast.print(root, Version::Canonical));
        assert!(decoded.print(root, Version::Live).contains("= 10"));
        assert!(decoded.print(root, Version::Canonical).contains("= 9"));
    }

    #[test]
    fn test_decoded_ids_stay_unique() {
        let ast = sample();
        let decoded = Ast::deserialize(&ast.to_envelope(&EncodeOptions::default()));
        let mut fresh = decoded.clone();
        let added = fresh.add_node(NodeKind::Literal, SourceLocation::dummy());
        let max = decoded.nodes().map(|(_, n)| n.id()).max().unwrap();
        assert!(fresh.node(added).id() > max);
    }

    #[test]
    fn test_bad_index_is_malformed() {
        let mut stream = ByteStream::new();
        stream.put_word(1);
        NodeKind::CompoundStmt.encode(&mut stream);
        stream.put_dword(1);
        stream.put_word(1);
        stream.put_word(1);
        stream.put_bool(false); // parent
        stream.put_word(1); // one child...
        stream.put_word(7); // ...that does not exist
        stream.put_word(0);
        stream.put_bool(false);
        stream.put_bool(false);
        stream.put_word(0);
        stream.put_bool(false);
        assert!(matches!(
            Ast::from_envelope(stream.as_bytes()),
            Err(WireError::Malformed { .. })
        ));
    }

    /// Encode an arena whose links are set by hand, bypassing the checks in
    /// `append_child`
    fn linked(links: &[(Option<usize>, &[usize])]) -> Vec<u8> {
        let nodes = links
            .iter()
            .map(|(parent, children)| {
                let mut node = AstNode::new(NodeKind::CompoundStmt, SourceLocation::dummy());
                node.parent = parent.map(NodeIndex);
                node.children = children.iter().copied().map(NodeIndex).collect();
                node
            })
            .collect();
        Ast { nodes, root: Some(NodeIndex(0)) }.to_envelope(&EncodeOptions::default())
    }

    fn malformed_message(bytes: &[u8]) -> String {
        match Ast::from_envelope(bytes) {
            Err(WireError::Malformed { message }) => message,
            other => panic!("expected a malformed envelope, got {other:?}"),
        }
    }

    #[test]
    fn test_hand_linked_tree_decodes() {
        let ast = Ast::deserialize(&linked(&[(None, &[1, 2]), (Some(0), &[]), (Some(0), &[])]));
        assert_eq!(ast.preorder(NodeIndex(0), Version::Live).count(), 3);
    }

    #[test]
    fn test_self_parent_is_malformed() {
        let message = malformed_message(&linked(&[(Some(0), &[0])]));
        assert!(message.contains("listed by") || message.contains("own parent"), "{message}");
        assert_eq!(
            malformed_message(&linked(&[(Some(0), &[])])),
            "node 0 is its own parent"
        );
    }

    #[test]
    fn test_parent_cycle_is_malformed() {
        let message = malformed_message(&linked(&[(Some(1), &[1]), (Some(0), &[0])]));
        assert_eq!(message, "parent chain from node 0 never reaches a root");
        let message = malformed_message(&linked(&[
            (None, &[]),
            (Some(3), &[2]),
            (Some(1), &[3]),
            (Some(2), &[1]),
        ]));
        assert_eq!(message, "parent chain from node 1 never reaches a root");
    }

    #[test]
    fn test_duplicate_child_is_malformed() {
        assert_eq!(
            malformed_message(&linked(&[(None, &[1, 1]), (Some(0), &[])])),
            "child 1 is listed by node 0 and again by node 0"
        );
        assert_eq!(
            malformed_message(&linked(&[(None, &[2]), (None, &[2]), (Some(0), &[])])),
            "child 2 is listed by node 0 and again by node 1"
        );
    }

    #[test]
    fn test_unlisted_child_is_malformed() {
        assert_eq!(
            malformed_message(&linked(&[(None, &[]), (Some(0), &[])])),
            "node 1 names parent 0, which does not list it"
        );
    }

    #[test]
    fn test_snapshot_children_are_checked() {
        let mut ast = Ast::new();
        let parent = ast.add_node(NodeKind::CompoundStmt, SourceLocation::dummy());
        let child = ast.add_node(NodeKind::BreakStmt, SourceLocation::dummy());
        ast.append_child(parent, child);
        ast.bump(parent);
        ast.set_root(parent);

        let mut twice = ast.clone();
        twice.nodes[0].history[0].children.push(child);
        assert_eq!(
            malformed_message(&twice.to_envelope(&EncodeOptions::default())),
            format!("snapshot of node 0 lists child {child} twice")
        );

        let mut itself = ast.clone();
        itself.nodes[0].history[0].children = vec![parent];
        assert_eq!(
            malformed_message(&itself.to_envelope(&EncodeOptions::default())),
            "snapshot of node 0 lists itself as a child"
        );

        let mut outside = ast;
        outside.nodes[0].history[0].children = vec![NodeIndex(5)];
        assert_eq!(
            malformed_message(&outside.to_envelope(&EncodeOptions::default())),
            "node index 5 outside an arena of 2 node(s)"
        );
    }

    #[test]
    fn test_unknown_kind() {
        let mut stream = ByteStream::new();
        stream.put_byte(200);
        assert_eq!(
            NodeKind::decode(&mut stream),
            Err(WireError::unknown_tag("node kind", 200))
        );
    }

    #[test]
    #[should_panic(expected = "corrupt ast envelope")]
    fn test_deserialize_truncated_is_fatal() {
        Ast::deserialize(&[AST_MAGIC, Endian::LITTLE_MARKER, 5, 0, 0, 0]);
    }
}
