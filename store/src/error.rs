use thiserror::Error;

use btcb_types::CodecError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store could not be opened: {0}")]
    Initialization(String),

    #[error("migration {from} -> {to} failed: {reason}")]
    Migration { from: u32, to: u32, reason: String },

    #[error("database version {found} is newer than supported version {supported}")]
    VersionTooNew { found: u32, supported: u32 },

    #[error("a write transaction is already active")]
    WriteTransactionActive,

    #[error("mutation attempted through a read transaction")]
    ReadOnlyTransaction,

    #[error("vote rejected: {0}")]
    InvalidVote(String),

    #[error("store already holds ledger content")]
    AlreadyInitialized,
}

impl From<CodecError> for StoreError {
    fn from(e: CodecError) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
