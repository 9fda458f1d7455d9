//! LMDB implementation of BlockStore and BlockInfoStore.
//!
//! Blocks are keyed by hash in one table per variant (`send`, `receive`,
//! `open`, `change`) plus `state`/`state_v1` for state blocks by epoch.
//! Value: the variant encoding followed by the 32-byte successor hash (zero
//! until a block is stored on top). Rows written before successors were
//! tracked have no suffix and read back with a zero successor.

use rand::Rng;

use btcb_store::{BlockCounts, BlockInfo, BlockInfoStore, BlockStore, StoreError};
use btcb_types::{Block, BlockHash, BlockType, CodecError, Decode, Encode, Epoch, Reader};

use crate::environment::Table;
use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

/// A block row as found in its sub-table.
pub(crate) struct StoredBlock {
    pub block: Block,
    pub successor: BlockHash,
    pub epoch: Epoch,
    pub table: Table,
}

pub(crate) fn encode_stored(block: &Block, successor: &BlockHash) -> Vec<u8> {
    let mut out = Vec::with_capacity(block.block_type().size() + 32);
    block.encode(&mut out);
    successor.encode(&mut out);
    out
}

pub(crate) fn decode_stored(
    block_type: BlockType,
    bytes: &[u8],
) -> Result<(Block, BlockHash), CodecError> {
    let mut reader = Reader::new(bytes);
    let block = Block::decode_variant(block_type, &mut reader)?;
    let successor = if reader.is_empty() {
        BlockHash::ZERO
    } else {
        BlockHash::decode(&mut reader)?
    };
    reader.finish()?;
    Ok((block, successor))
}

impl LmdbStore {
    /// Probe every block sub-table for `hash`.
    pub(crate) fn block_raw_get(
        &self,
        txn: &LmdbTransaction<'_>,
        hash: &BlockHash,
    ) -> Result<Option<StoredBlock>, StoreError> {
        let rtxn = txn.ro()?;
        for (block_type, epoch, table) in self.tables.blocks() {
            if let Some(bytes) = table.get(rtxn, hash.as_bytes()).map_err(LmdbError::from)? {
                let (block, successor) = decode_stored(block_type, bytes)?;
                return Ok(Some(StoredBlock {
                    block,
                    successor,
                    epoch,
                    table,
                }));
            }
        }
        Ok(None)
    }

    /// Rewrite the successor slot of a stored block. No-op when `hash` is
    /// not stored.
    pub(crate) fn block_successor_set(
        &self,
        txn: &mut LmdbTransaction<'_>,
        hash: &BlockHash,
        successor: &BlockHash,
    ) -> Result<(), StoreError> {
        let Some(stored) = self.block_raw_get(txn, hash)? else {
            return Ok(());
        };
        stored
            .table
            .put(
                txn.rw()?,
                hash.as_bytes(),
                &encode_stored(&stored.block, successor),
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// A uniformly chosen sub-table (weighted by size), then the first
    /// block at or after a random hash in it, wrapping to the first row.
    pub fn block_random<R: Rng>(
        &self,
        txn: &LmdbTransaction<'_>,
        rng: &mut R,
    ) -> Result<Option<Block>, StoreError> {
        let counts = self.block_count(txn)?;
        let total = counts.sum();
        if total == 0 {
            return Ok(None);
        }
        let sizes = [
            counts.send,
            counts.receive,
            counts.open,
            counts.change,
            counts.state_v0,
            counts.state_v1,
        ];
        let mut pick = rng.gen_range(0..total);
        let mut chosen = None;
        for ((block_type, _, table), size) in self.tables.blocks().into_iter().zip(sizes) {
            if pick < size {
                chosen = Some((block_type, table));
                break;
            }
            pick -= size;
        }
        let Some((block_type, table)) = chosen else {
            return Ok(None);
        };

        let mut probe = [0u8; 32];
        rng.fill(&mut probe);
        let rtxn = txn.ro()?;
        let row = match table
            .get_greater_than_or_equal_to(rtxn, &probe)
            .map_err(LmdbError::from)?
        {
            Some(row) => Some(row),
            None => table.first(rtxn).map_err(LmdbError::from)?,
        };
        match row {
            Some((_, bytes)) => Ok(Some(decode_stored(block_type, bytes)?.0)),
            None => Ok(None),
        }
    }
}

impl BlockStore<LmdbTransaction<'_>> for LmdbStore {
    fn block_put_with_epoch(
        &self,
        txn: &mut LmdbTransaction<'_>,
        hash: &BlockHash,
        block: &Block,
        epoch: Epoch,
    ) -> Result<(), StoreError> {
        let target = self
            .tables
            .block_table(block.block_type(), epoch)
            .ok_or_else(|| StoreError::Serialization("block has no storable type".into()))?;
        let successor = self
            .block_raw_get(txn, hash)?
            .map(|stored| stored.successor)
            .unwrap_or(BlockHash::ZERO);

        let wtxn = txn.rw()?;
        for (_, _, table) in self.tables.blocks() {
            table.delete(wtxn, hash.as_bytes()).map_err(LmdbError::from)?;
        }
        target
            .put(wtxn, hash.as_bytes(), &encode_stored(block, &successor))
            .map_err(LmdbError::from)?;

        let previous = block.previous();
        if !previous.is_zero() {
            self.block_successor_set(txn, &previous, hash)?;
        }
        Ok(())
    }

    fn block_get_with_epoch(
        &self,
        txn: &LmdbTransaction<'_>,
        hash: &BlockHash,
    ) -> Result<Option<(Block, Epoch)>, StoreError> {
        Ok(self
            .block_raw_get(txn, hash)?
            .map(|stored| (stored.block, stored.epoch)))
    }

    fn block_del(&self, txn: &mut LmdbTransaction<'_>, hash: &BlockHash) -> Result<(), StoreError> {
        let wtxn = txn.rw()?;
        for (_, _, table) in self.tables.blocks() {
            table.delete(wtxn, hash.as_bytes()).map_err(LmdbError::from)?;
        }
        Ok(())
    }

    fn block_type(
        &self,
        txn: &LmdbTransaction<'_>,
        hash: &BlockHash,
    ) -> Result<Option<BlockType>, StoreError> {
        let rtxn = txn.ro()?;
        for (block_type, _, table) in self.tables.blocks() {
            if table
                .get(rtxn, hash.as_bytes())
                .map_err(LmdbError::from)?
                .is_some()
            {
                return Ok(Some(block_type));
            }
        }
        Ok(None)
    }

    fn block_count(&self, txn: &LmdbTransaction<'_>) -> Result<BlockCounts, StoreError> {
        let rtxn = txn.ro()?;
        let len = |table: Table| table.len(rtxn).map_err(LmdbError::from);
        Ok(BlockCounts {
            send: len(self.tables.send)?,
            receive: len(self.tables.receive)?,
            open: len(self.tables.open)?,
            change: len(self.tables.change)?,
            state_v0: len(self.tables.state_v0)?,
            state_v1: len(self.tables.state_v1)?,
        })
    }

    fn block_successor(
        &self,
        txn: &LmdbTransaction<'_>,
        hash: &BlockHash,
    ) -> Result<Option<BlockHash>, StoreError> {
        Ok(self
            .block_raw_get(txn, hash)?
            .map(|stored| stored.successor)
            .filter(|successor| !successor.is_zero()))
    }

    fn block_successor_clear(
        &self,
        txn: &mut LmdbTransaction<'_>,
        hash: &BlockHash,
    ) -> Result<(), StoreError> {
        self.block_successor_set(txn, hash, &BlockHash::ZERO)
    }
}

impl BlockInfoStore<LmdbTransaction<'_>> for LmdbStore {
    fn block_info_put(
        &self,
        txn: &mut LmdbTransaction<'_>,
        hash: &BlockHash,
        info: &BlockInfo,
    ) -> Result<(), StoreError> {
        self.tables
            .blocks_info
            .put(txn.rw()?, hash.as_bytes(), &info.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn block_info_get(
        &self,
        txn: &LmdbTransaction<'_>,
        hash: &BlockHash,
    ) -> Result<Option<BlockInfo>, StoreError> {
        let bytes = self
            .tables
            .blocks_info
            .get(txn.ro()?, hash.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(bytes.map(BlockInfo::from_bytes).transpose()?)
    }

    fn block_info_del(
        &self,
        txn: &mut LmdbTransaction<'_>,
        hash: &BlockHash,
    ) -> Result<(), StoreError> {
        self.tables
            .blocks_info
            .delete(txn.rw()?, hash.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{open_test_store, test_genesis};
    use btcb_types::{
        Account, Amount, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock, Signature, StateBlock,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn send(previous: BlockHash) -> Block {
        SendBlock::new(previous, Account::from_u64(2), Amount::new(3), 4).into()
    }

    #[test]
    fn every_variant_round_trips() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let blocks: Vec<Block> = vec![
            send(BlockHash::from_u64(100)),
            ReceiveBlock::new(BlockHash::from_u64(101), BlockHash::from_u64(1), 5).into(),
            OpenBlock::new(BlockHash::from_u64(1), Account::from_u64(2), Account::from_u64(3), 6)
                .into(),
            ChangeBlock::new(BlockHash::from_u64(102), Account::from_u64(4), 7).into(),
            StateBlock::new(
                Account::from_u64(5),
                BlockHash::from_u64(103),
                Account::from_u64(6),
                Amount::new(7),
                BlockHash::from_u64(8),
                9,
            )
            .into(),
        ];
        for block in &blocks {
            let hash = block.hash();
            assert!(!store.block_exists(&txn, &hash).unwrap());
            store.block_put(&mut txn, &hash, block).unwrap();
            assert_eq!(store.block_get(&txn, &hash).unwrap().as_ref(), Some(block));
            assert_eq!(store.block_type(&txn, &hash).unwrap(), Some(block.block_type()));
            store.block_del(&mut txn, &hash).unwrap();
            assert!(!store.block_exists(&txn, &hash).unwrap());
        }
    }

    #[test]
    fn returned_blocks_are_independent_copies() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let block = send(BlockHash::from_u64(1));
        let hash = block.hash();
        store.block_put(&mut txn, &hash, &block).unwrap();
        let mut copy = store.block_get(&txn, &hash).unwrap().unwrap();
        copy.set_signature(Signature([1u8; 64]));
        assert_eq!(store.block_get(&txn, &hash).unwrap(), Some(block));
    }

    #[test]
    fn block_replace_last_write_wins() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let mut first = send(BlockHash::from_u64(1));
        first.set_work(1);
        let mut second = first.clone();
        second.set_work(2);
        let hash = first.hash();
        store.block_put(&mut txn, &hash, &first).unwrap();
        store.block_put(&mut txn, &hash, &second).unwrap();
        assert_eq!(store.block_get(&txn, &hash).unwrap().unwrap().work(), 2);
        assert_eq!(store.block_count(&txn).unwrap().sum(), 1);
    }

    #[test]
    fn put_under_unrelated_key_replaces_other_variant() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let key = BlockHash::from_u64(77);
        let change: Block = ChangeBlock::new(BlockHash::from_u64(1), Account::from_u64(1), 0).into();
        store.block_put(&mut txn, &key, &send(BlockHash::from_u64(1))).unwrap();
        store.block_put(&mut txn, &key, &change).unwrap();
        assert_eq!(store.block_get(&txn, &key).unwrap(), Some(change));
        assert_eq!(store.block_count(&txn).unwrap().send, 0);
    }

    #[test]
    fn successor_tracks_next_block() {
        let (_dir, store) = open_test_store();
        let genesis = test_genesis();
        let mut txn = store.tx_begin_write().unwrap();
        store.initialize(&mut txn, &genesis).unwrap();
        assert_eq!(store.block_successor(&txn, &genesis.hash()).unwrap(), None);

        let next = send(genesis.hash());
        store.block_put(&mut txn, &next.hash(), &next).unwrap();
        assert_eq!(
            store.block_successor(&txn, &genesis.hash()).unwrap(),
            Some(next.hash())
        );

        // Re-putting the predecessor keeps its successor.
        store.block_put(&mut txn, &genesis.hash(), &genesis.block()).unwrap();
        assert_eq!(
            store.block_successor(&txn, &genesis.hash()).unwrap(),
            Some(next.hash())
        );

        store.block_successor_clear(&mut txn, &genesis.hash()).unwrap();
        assert_eq!(store.block_successor(&txn, &genesis.hash()).unwrap(), None);
        assert_eq!(store.block_get(&txn, &genesis.hash()).unwrap(), Some(genesis.block()));
    }

    #[test]
    fn state_blocks_split_by_epoch() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let state = |n| -> Block {
            StateBlock::new(
                Account::from_u64(n),
                BlockHash::ZERO,
                Account::from_u64(n),
                Amount::new(n as u128),
                BlockHash::ZERO,
                0,
            )
            .into()
        };
        let (a, b) = (state(1), state(2));
        store.block_put(&mut txn, &a.hash(), &a).unwrap();
        store
            .block_put_with_epoch(&mut txn, &b.hash(), &b, Epoch::Epoch1)
            .unwrap();

        let counts = store.block_count(&txn).unwrap();
        assert_eq!(counts.state_v0, 1);
        assert_eq!(counts.state_v1, 1);
        assert_eq!(counts.sum(), 2);
        assert_eq!(
            store.block_get_with_epoch(&txn, &b.hash()).unwrap(),
            Some((b.clone(), Epoch::Epoch1))
        );
        assert_eq!(
            store.block_get_with_epoch(&txn, &a.hash()).unwrap().map(|(_, e)| e),
            Some(Epoch::Epoch0)
        );
    }

    #[test]
    fn random_block_on_genesis_ledger_is_genesis() {
        let (_dir, store) = open_test_store();
        let genesis = test_genesis();
        let mut txn = store.tx_begin_write().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(store.block_random(&txn, &mut rng).unwrap(), None);
        store.initialize(&mut txn, &genesis).unwrap();
        for _ in 0..8 {
            assert_eq!(
                store.block_random(&txn, &mut rng).unwrap(),
                Some(genesis.block())
            );
        }
    }

    #[test]
    fn legacy_row_without_successor_decodes() {
        let block = send(BlockHash::from_u64(1));
        let (decoded, successor) = decode_stored(BlockType::Send, &block.to_bytes()).unwrap();
        assert_eq!(decoded, block);
        assert!(successor.is_zero());
    }

    #[test]
    fn block_info_put_get_del() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let hash = BlockHash::from_u64(3);
        let info = BlockInfo {
            account: Account::from_u64(1),
            balance: Amount::new(99),
        };
        assert!(!store.block_info_exists(&txn, &hash).unwrap());
        store.block_info_put(&mut txn, &hash, &info).unwrap();
        assert_eq!(store.block_info_get(&txn, &hash).unwrap(), Some(info));
        store.block_info_del(&mut txn, &hash).unwrap();
        assert_eq!(store.block_info_get(&txn, &hash).unwrap(), None);
    }
}
