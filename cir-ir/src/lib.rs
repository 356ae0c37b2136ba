//! C IR core - Types, Values, AST Node Graph and Program Container
//! 
//! This crate holds the in-memory representation a C-family compiler works
//! on between parsing and code generation. Every persistent object can be
//! written to and read back from the envelope format of `cir-wire`.

pub mod ast;
pub mod boundary;
pub mod program;
pub mod typesys;
pub mod value;

pub use ast::{Ast, AstNode, BinaryOp, NodeId, NodeIndex, NodeKind, UnaryOp, Version};
pub use boundary::{ChunkList, ChunkedSource, DiagnosticSink, Executor, ProgramHandle, SourceReader};
pub use program::{ConditionTracker, Phase, Program, ResultSection, Stage, StageContext, SymbolTable};
pub use typesys::{Specifier, Type, TypeFacade, TypeKind, TypeTraits};
pub use value::{
    make_array, make_bool, make_builtin, make_char, make_double, make_float, make_int, make_long,
    make_nil, make_offset, make_pointer, make_record, make_reference, make_short, make_uint,
    make_ulong, ArithOp, Value, ValueCategory, ValueData,
};
