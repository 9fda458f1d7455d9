//! LMDB implementation of ChecksumStore.
//!
//! Key: `ChecksumKey` (prefix u64 BE ‖ mask). Value: 32-byte checksum.

use btcb_store::{ChecksumKey, ChecksumStore, StoreError};
use btcb_types::{BlockHash, Decode, Encode};

use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

impl ChecksumStore<LmdbTransaction<'_>> for LmdbStore {
    fn checksum_get(
        &self,
        txn: &LmdbTransaction<'_>,
        key: &ChecksumKey,
    ) -> Result<Option<BlockHash>, StoreError> {
        let val = self
            .tables
            .checksum
            .get(txn.ro()?, &key.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(BlockHash::from_bytes).transpose()?)
    }

    fn checksum_put(
        &self,
        txn: &mut LmdbTransaction<'_>,
        key: &ChecksumKey,
        checksum: &BlockHash,
    ) -> Result<(), StoreError> {
        self.tables
            .checksum
            .put(txn.rw()?, &key.to_bytes(), checksum.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn checksum_del(&self, txn: &mut LmdbTransaction<'_>, key: &ChecksumKey) -> Result<(), StoreError> {
        self.tables
            .checksum
            .delete(txn.rw()?, &key.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }
}
