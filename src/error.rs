//! Error kinds shared by every fallible operation in this crate.

/// Errors surfaced by configuration, WK, and Huffman operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid codec configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("corrupt frame: {0}")]
    CorruptFrame(String),

    #[error("invalid huffman code: {0}")]
    InvalidCode(String),

    #[error("bit packer format error: {0}")]
    FormatError(String),
}
