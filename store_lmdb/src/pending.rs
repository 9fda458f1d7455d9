//! LMDB implementation of PendingStore.
//!
//! Key: `PendingKey` (destination ‖ send hash, 64 bytes), so a prefix scan
//! over one destination finds all its receivable entries. Value:
//! `PendingInfo` (source ‖ amount). Epoch 0 rows live in `pending`, epoch 1
//! rows in `pending_v1`.

use btcb_store::{PendingInfo, PendingKey, PendingStore, StoreError};
use btcb_types::{Account, BlockHash, Encode, Epoch};

use crate::iterator::{MergedIterator, TableValue};
use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

impl PendingStore<LmdbTransaction<'_>> for LmdbStore {
    fn pending_put(
        &self,
        txn: &mut LmdbTransaction<'_>,
        key: &PendingKey,
        info: &PendingInfo,
    ) -> Result<(), StoreError> {
        let table = self.tables.pending(info.epoch);
        table
            .put(txn.rw()?, &key.to_bytes(), &info.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn pending_get(
        &self,
        txn: &LmdbTransaction<'_>,
        key: &PendingKey,
    ) -> Result<Option<PendingInfo>, StoreError> {
        let rtxn = txn.ro()?;
        let key = key.to_bytes();
        for epoch in [Epoch::Epoch0, Epoch::Epoch1] {
            let table = self.tables.pending(epoch);
            if let Some(bytes) = table.get(rtxn, &key).map_err(LmdbError::from)? {
                return Ok(Some(PendingInfo::decode_row(bytes, epoch)?));
            }
        }
        Ok(None)
    }

    fn pending_del(&self, txn: &mut LmdbTransaction<'_>, key: &PendingKey) -> Result<(), StoreError> {
        let wtxn = txn.rw()?;
        let key = key.to_bytes();
        for table in [self.tables.pending_v0, self.tables.pending_v1] {
            table.delete(wtxn, &key).map_err(LmdbError::from)?;
        }
        Ok(())
    }

    fn pending_any(&self, txn: &LmdbTransaction<'_>, account: &Account) -> Result<bool, StoreError> {
        let start = PendingKey::new(*account, BlockHash::ZERO);
        let iter = self.pending_begin(txn, Some(&start))?;
        Ok(iter.key().is_some_and(|key| key.account == *account))
    }
}

impl LmdbStore {
    /// Pending entries in key order across both epochs, starting at the
    /// first key at or after `start`.
    pub fn pending_begin<'t>(
        &self,
        txn: &'t LmdbTransaction<'_>,
        start: Option<&PendingKey>,
    ) -> Result<MergedIterator<'t, PendingKey, PendingInfo>, StoreError> {
        let start = start.map(PendingKey::to_bytes);
        MergedIterator::begin(
            txn.ro()?,
            self.tables.pending_v0,
            self.tables.pending_v1,
            start.as_deref(),
        )
    }

    pub fn pending_end<'t>(&self) -> MergedIterator<'t, PendingKey, PendingInfo> {
        MergedIterator::end()
    }
}
