pub mod assembler;
pub mod emit;
pub mod mnemonic;
pub mod source;
pub mod symbol;

pub use assembler::{Assembler, Options, Value};
pub use symbol::ListOrder;

use thiserror::Error;

/// Fatal assembler errors. Everything recoverable is a line-tagged warning
/// that substitutes 0 and carries on; these end the run with exit status 1.
#[derive(Debug, Error)]
pub enum AsmError {
    #[error("couldn't open the source file {path}: {source}")]
    Source {
        path: String,
        source: std::io::Error,
    },

    #[error("couldn't open {path} for output: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },

    #[error("token too long, probable syntax error [line {line} in {file}]")]
    TokenTooLong { line: usize, file: String },

    #[error("out of source file stack space [line {line} in {file}]")]
    IncludeDepth { line: usize, file: String },

    #[error("exceeded storage for name, value pairs [line {line} in {file}]")]
    SymbolTableFull { line: usize, file: String },

    #[error("unexpected end of input [line {line} in {file}]")]
    UnexpectedEof { line: usize, file: String },
}
