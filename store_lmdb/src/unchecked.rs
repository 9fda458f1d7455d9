//! LMDB implementation of UncheckedStore.
//!
//! Key: `UncheckedKey` (dependency ‖ waiting block hash). Value: the typed
//! block encoding. One row per (dependency, block) pair, so putting the same
//! block twice under a dependency overwrites rather than duplicates.

use std::ops::Bound;

use btcb_store::{StoreError, UncheckedKey, UncheckedStore};
use btcb_types::{Block, BlockHash, Encode, Epoch};

use crate::iterator::{StoreIterator, TableValue};
use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

impl UncheckedStore<LmdbTransaction<'_>> for LmdbStore {
    fn unchecked_put(
        &self,
        txn: &mut LmdbTransaction<'_>,
        dependency: &BlockHash,
        block: &Block,
    ) -> Result<(), StoreError> {
        let key = UncheckedKey::new(*dependency, block.hash());
        let mut value = Vec::with_capacity(1 + block.block_type().size());
        block.encode_typed(&mut value);
        self.tables
            .unchecked
            .put(txn.rw()?, &key.to_bytes(), &value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn unchecked_get(
        &self,
        txn: &LmdbTransaction<'_>,
        dependency: &BlockHash,
    ) -> Result<Vec<Block>, StoreError> {
        let lower = UncheckedKey::new(*dependency, BlockHash::ZERO).to_bytes();
        let upper = UncheckedKey::new(*dependency, BlockHash::new([0xFF; 32])).to_bytes();
        let bounds = (
            Bound::Included(lower.as_slice()),
            Bound::Included(upper.as_slice()),
        );
        let rtxn = txn.ro()?;
        let iter = self
            .tables
            .unchecked
            .range(rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut blocks = Vec::new();
        for result in iter {
            let (_key, value) = result.map_err(LmdbError::from)?;
            blocks.push(Block::decode_row(value, Epoch::Epoch0)?);
        }
        Ok(blocks)
    }

    fn unchecked_del(
        &self,
        txn: &mut LmdbTransaction<'_>,
        key: &UncheckedKey,
    ) -> Result<(), StoreError> {
        self.tables
            .unchecked
            .delete(txn.rw()?, &key.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn unchecked_exists(
        &self,
        txn: &LmdbTransaction<'_>,
        key: &UncheckedKey,
    ) -> Result<bool, StoreError> {
        let found = self
            .tables
            .unchecked
            .get(txn.ro()?, &key.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(found.is_some())
    }

    fn unchecked_count(&self, txn: &LmdbTransaction<'_>) -> Result<u64, StoreError> {
        Ok(self
            .tables
            .unchecked
            .len(txn.ro()?)
            .map_err(LmdbError::from)?)
    }

    fn unchecked_clear(&self, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
        self.tables
            .unchecked
            .clear(txn.rw()?)
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

impl LmdbStore {
    /// Unchecked entries in key order, starting at the first entry waiting
    /// on `dependency` (or the first entry).
    pub fn unchecked_begin<'t>(
        &self,
        txn: &'t LmdbTransaction<'_>,
        dependency: Option<&BlockHash>,
    ) -> Result<StoreIterator<'t, UncheckedKey, Block>, StoreError> {
        let start = dependency.map(|hash| UncheckedKey::new(*hash, BlockHash::ZERO).to_bytes());
        StoreIterator::begin(
            txn.ro()?,
            self.tables.unchecked,
            start.as_deref(),
            Epoch::Epoch0,
        )
    }

    pub fn unchecked_end<'t>(&self) -> StoreIterator<'t, UncheckedKey, Block> {
        StoreIterator::end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::open_test_store;
    use btcb_types::{Account, Amount, SendBlock};

    fn send(n: u64) -> Block {
        SendBlock::new(BlockHash::from_u64(n), Account::from_u64(n), Amount::new(n as u128), n)
            .into()
    }

    #[test]
    fn empty_iteration() {
        let (_dir, store) = open_test_store();
        let txn = store.tx_begin_read().unwrap();
        assert!(store.unchecked_begin(&txn, None).unwrap() == store.unchecked_end());
        assert_eq!(store.unchecked_count(&txn).unwrap(), 0);
    }

    #[test]
    fn identical_put_is_deduplicated() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let dependency = BlockHash::from_u64(1);
        store.unchecked_put(&mut txn, &dependency, &send(5)).unwrap();
        store.unchecked_put(&mut txn, &dependency, &send(5)).unwrap();
        assert_eq!(store.unchecked_count(&txn).unwrap(), 1);
        assert_eq!(store.unchecked_get(&txn, &dependency).unwrap(), vec![send(5)]);
    }

    #[test]
    fn distinct_blocks_share_a_dependency() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let dependency = BlockHash::from_u64(1);
        store.unchecked_put(&mut txn, &dependency, &send(5)).unwrap();
        store.unchecked_put(&mut txn, &dependency, &send(6)).unwrap();
        store.unchecked_put(&mut txn, &BlockHash::from_u64(2), &send(7)).unwrap();
        assert_eq!(store.unchecked_count(&txn).unwrap(), 3);

        let mut waiting = store.unchecked_get(&txn, &dependency).unwrap();
        waiting.sort_by_key(Block::hash);
        let mut expected = vec![send(5), send(6)];
        expected.sort_by_key(Block::hash);
        assert_eq!(waiting, expected);
    }

    #[test]
    fn multiple_get() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let (d1, d2, d3) = (send(1).hash(), send(2).hash(), send(3).hash());
        // Each dependency collects several blocks, some inserted twice.
        for (dependency, blocks) in [(d1, [1u64, 2, 3]), (d2, [2, 1, 3]), (d3, [3, 3, 3])] {
            for n in blocks {
                store.unchecked_put(&mut txn, &dependency, &send(n)).unwrap();
            }
        }
        assert_eq!(store.unchecked_count(&txn).unwrap(), 7);
        assert_eq!(store.unchecked_get(&txn, &d1).unwrap().len(), 3);
        assert_eq!(store.unchecked_get(&txn, &d2).unwrap().len(), 3);
        assert_eq!(store.unchecked_get(&txn, &d3).unwrap(), vec![send(3)]);
        assert!(store
            .unchecked_get(&txn, &BlockHash::from_u64(99))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delete_one_entry() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let dependency = BlockHash::from_u64(1);
        store.unchecked_put(&mut txn, &dependency, &send(5)).unwrap();
        store.unchecked_put(&mut txn, &dependency, &send(6)).unwrap();

        let key = UncheckedKey::new(dependency, send(5).hash());
        assert!(store.unchecked_exists(&txn, &key).unwrap());
        store.unchecked_del(&mut txn, &key).unwrap();
        assert!(!store.unchecked_exists(&txn, &key).unwrap());
        store.unchecked_del(&mut txn, &key).unwrap();
        assert_eq!(store.unchecked_get(&txn, &dependency).unwrap(), vec![send(6)]);
    }

    #[test]
    fn iteration_from_dependency() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        store.unchecked_put(&mut txn, &BlockHash::from_u64(1), &send(5)).unwrap();
        store.unchecked_put(&mut txn, &BlockHash::from_u64(3), &send(6)).unwrap();

        let rows: Vec<(UncheckedKey, Block)> = store
            .unchecked_begin(&txn, Some(&BlockHash::from_u64(2)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, UncheckedKey::new(BlockHash::from_u64(3), send(6).hash()));
        assert_eq!(rows[0].1, send(6));

        let all = store.unchecked_begin(&txn, None).unwrap().count();
        assert_eq!(all, 2);
    }

    #[test]
    fn clear_empties_table() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        store.unchecked_put(&mut txn, &BlockHash::from_u64(1), &send(5)).unwrap();
        store.unchecked_clear(&mut txn).unwrap();
        assert_eq!(store.unchecked_count(&txn).unwrap(), 0);
    }
}
