//! LMDB implementation of FrontierStore.
//!
//! Key: head block hash. Value: account (32 bytes).

use btcb_store::{FrontierStore, StoreError};
use btcb_types::{Account, BlockHash, Decode};

use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

impl FrontierStore<LmdbTransaction<'_>> for LmdbStore {
    fn frontier_put(
        &self,
        txn: &mut LmdbTransaction<'_>,
        hash: &BlockHash,
        account: &Account,
    ) -> Result<(), StoreError> {
        self.tables
            .frontiers
            .put(txn.rw()?, hash.as_bytes(), account.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn frontier_get(
        &self,
        txn: &LmdbTransaction<'_>,
        hash: &BlockHash,
    ) -> Result<Account, StoreError> {
        let val = self
            .tables
            .frontiers
            .get(txn.ro()?, hash.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Account::from_bytes(bytes)?),
            None => Ok(Account::ZERO),
        }
    }

    fn frontier_del(&self, txn: &mut LmdbTransaction<'_>, hash: &BlockHash) -> Result<(), StoreError> {
        self.tables
            .frontiers
            .delete(txn.rw()?, hash.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn frontier_count(&self, txn: &LmdbTransaction<'_>) -> Result<u64, StoreError> {
        let count = self
            .tables
            .frontiers
            .len(txn.ro()?)
            .map_err(LmdbError::from)?;
        Ok(count)
    }
}
