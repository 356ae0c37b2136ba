//! Program envelopes
//!
//! ```text
//! [magic 0xC1][platform]            optional preamble
//! [name][phase][locked]
//! [symbol count] (name, node index)*
//! [has ast] [embedded ast envelope]
//! ```
//!
//! The embedded AST always carries its own preamble. Result sections are
//! scratch state and are not persisted.

use super::condition::{ConditionTracker, Phase};
use super::symbols::SymbolTable;
use super::Program;
use crate::ast::{Ast, NodeIndex, AST_MAGIC};
use cir_common::fatal;
use cir_wire::{ByteStream, EncodeOptions, WireDecode, WireEncode, WireError, WireResult};
use log::debug;

/// Magic byte of a program envelope
pub const PROGRAM_MAGIC: u8 = 0xC1;

impl WireEncode for Program {
    fn encode(&self, stream: &mut ByteStream) {
        stream.put_string(&self.name);
        stream.put_byte(self.condition.current().tag());
        stream.put_bool(self.locked);
        stream.write_iter(self.symbols.iter(), |s, (name, node)| {
            s.put_string(name);
            s.put_len(node.0);
        });
        stream.put_bool(self.ast.is_some());
        if let Some(ast) = &self.ast {
            let mut inner = ByteStream::with_endian(stream.endian());
            inner.set_magic(AST_MAGIC);
            inner.set_platform_compat();
            ast.encode(&mut inner);
            stream.put_stream(&inner);
        }
    }
}

impl WireDecode for Program {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        let name = stream.get_string()?;
        let tag = stream.get_byte()?;
        let phase = Phase::from_tag(tag).ok_or_else(|| WireError::unknown_tag("phase", tag))?;
        let locked = stream.get_bool()?;

        let entries = stream.read_seq(|s| {
            let name = s.get_string()?;
            let node = s.get_word()? as usize;
            Ok((name, node))
        })?;

        let ast = if stream.get_bool()? {
            let mut inner = stream.get_stream()?;
            Some(Ast::read_envelope(&mut inner)?)
        } else {
            None
        };

        let node_count = ast.as_ref().map_or(0, Ast::len);
        let mut symbols = SymbolTable::new();
        for (symbol, node) in entries {
            if node >= node_count {
                return Err(WireError::malformed(format!(
                    "symbol '{symbol}' names node {node} of {node_count}"
                )));
            }
            if symbols.insert(symbol.clone(), NodeIndex(node)).is_some() {
                return Err(WireError::malformed(format!("symbol '{symbol}' is declared twice")));
            }
        }

        debug!(
            "decoded program '{name}' at {phase} with {} symbol(s)",
            symbols.len()
        );
        let mut program = Program::new(name);
        program.condition = ConditionTracker::at(phase);
        program.symbols = symbols;
        program.ast = ast;
        program.locked = locked;
        Ok(program)
    }
}

impl Program {
    /// Encode as a standalone envelope, with the preamble when enabled
    pub fn to_envelope(&self, options: &EncodeOptions) -> Vec<u8> {
        let mut stream = options.begin(PROGRAM_MAGIC);
        self.encode(&mut stream);
        stream.into_bytes()
    }

    /// Decode a standalone envelope, with or without preamble
    pub fn from_envelope(bytes: &[u8]) -> WireResult<Program> {
        let mut stream = ByteStream::from_bytes(bytes);
        stream.validate_preamble(PROGRAM_MAGIC);
        let program = Program::decode(&mut stream)?;
        if !stream.is_exhausted() {
            return Err(WireError::malformed(format!(
                "{} trailing byte(s) after program",
                stream.remaining()
            )));
        }
        Ok(program)
    }

    /// Decode an envelope produced by [`Program::to_envelope`]. Corrupt input
    /// is an internal invariant violation.
    pub fn deserialize(bytes: &[u8]) -> Program {
        match Program::from_envelope(bytes) {
            Ok(program) => program,
            Err(err) => fatal!("corrupt program envelope: {err}"),
        }
    }
}
