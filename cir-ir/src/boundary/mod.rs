//! Interfaces to the collaborators around the IR: the front end that feeds
//! source text in and the executor that runs an encoded program.

pub mod exec;
pub mod frontend;

pub use exec::{ChunkList, Executor, ProgramHandle};
pub use frontend::{read_source, ChunkedSource, DiagnosticSink, SourceReader, UnitMetadata};
