//! LMDB implementation of VersionStore.

use btcb_store::{StoreError, VersionStore};
use btcb_types::CodecError;

use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

const VERSION_KEY: &[u8] = b"version";

impl VersionStore<LmdbTransaction<'_>> for LmdbStore {
    fn version_get(&self, txn: &LmdbTransaction<'_>) -> Result<Option<u32>, StoreError> {
        let val = self
            .tables
            .meta
            .get(txn.ro()?, VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| CodecError::Truncated {
                    needed: 4,
                    available: bytes.len(),
                })?;
                Ok(Some(u32::from_le_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    fn version_put(&self, txn: &mut LmdbTransaction<'_>, version: u32) -> Result<(), StoreError> {
        self.tables
            .meta
            .put(txn.rw()?, VERSION_KEY, &version.to_le_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::open_test_store;

    #[test]
    fn version_round_trip() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        store.version_put(&mut txn, 3).unwrap();
        assert_eq!(store.version_get(&txn).unwrap(), Some(3));
    }
}
