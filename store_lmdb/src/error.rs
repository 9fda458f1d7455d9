use thiserror::Error;

use btcb_store::StoreError;
use btcb_types::CodecError;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("serialization error: {0}")]
    Codec(#[from] CodecError),

    #[error("transaction already finished")]
    Finished,
}

impl From<LmdbError> for StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Codec(e) => StoreError::Serialization(e.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
