//! Errors surfaced by the text parser and binary codec.

/// A parser diagnostic: the (line, column) it failed at and a message.
#[derive(Debug, Clone)]
pub struct ParserInfo {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("KVS parse error at {}:{}: {}", .0.line, .0.column, .0.message)]
    Parse(ParserInfo),

    #[error("KVS binary version mismatch: expected 1, got {0}")]
    UnsupportedVersion(u32),
}
