//! Codec error type shared across crates.

use thiserror::Error;

/// Failure to decode a fixed-width binary value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("unknown block type tag {0}")]
    UnknownBlockType(u8),

    #[error("vote carries no blocks")]
    EmptyVote,
}
