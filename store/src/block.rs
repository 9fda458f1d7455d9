//! Block storage traits.

use btcb_types::{Account, Amount, Block, BlockHash, BlockType, CodecError, Decode, Encode, Epoch, Reader};

use crate::transaction::Transaction;
use crate::StoreError;

/// A block-info sample is kept for every this-many blocks of an account chain.
pub const BLOCK_INFO_MAX: u64 = 32;

/// Row counts of each physical block sub-table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockCounts {
    pub send: u64,
    pub receive: u64,
    pub open: u64,
    pub change: u64,
    pub state_v0: u64,
    pub state_v1: u64,
}

impl BlockCounts {
    pub fn sum(&self) -> u64 {
        self.send + self.receive + self.open + self.change + self.state_v0 + self.state_v1
    }
}

/// Trait for block storage operations (the block-lattice).
///
/// Blocks are keyed by hash in one sub-table per variant, with state blocks
/// further split by epoch. Lookups probe the sub-tables in a fixed order.
pub trait BlockStore<T: Transaction> {
    /// Store `block` under `hash` (epoch 0 for state blocks).
    fn block_put(&self, txn: &mut T, hash: &BlockHash, block: &Block) -> Result<(), StoreError> {
        self.block_put_with_epoch(txn, hash, block, Epoch::Epoch0)
    }

    /// Store `block` under `hash`. Replaces any block stored under the same
    /// hash, keeps its recorded successor, and records `hash` as the
    /// successor of the block's predecessor when that is stored.
    fn block_put_with_epoch(
        &self,
        txn: &mut T,
        hash: &BlockHash,
        block: &Block,
        epoch: Epoch,
    ) -> Result<(), StoreError>;

    fn block_get(&self, txn: &T, hash: &BlockHash) -> Result<Option<Block>, StoreError> {
        Ok(self.block_get_with_epoch(txn, hash)?.map(|(block, _)| block))
    }

    /// The block and the epoch of the sub-table it was found in.
    fn block_get_with_epoch(
        &self,
        txn: &T,
        hash: &BlockHash,
    ) -> Result<Option<(Block, Epoch)>, StoreError>;

    /// Remove `hash` from every block sub-table.
    fn block_del(&self, txn: &mut T, hash: &BlockHash) -> Result<(), StoreError>;

    fn block_exists(&self, txn: &T, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self.block_type(txn, hash)?.is_some())
    }

    /// Variant of the stored block, without decoding it.
    fn block_type(&self, txn: &T, hash: &BlockHash) -> Result<Option<BlockType>, StoreError>;

    fn block_count(&self, txn: &T) -> Result<BlockCounts, StoreError>;

    /// Hash of the next block on the same chain, if one has been stored.
    fn block_successor(&self, txn: &T, hash: &BlockHash) -> Result<Option<BlockHash>, StoreError>;

    /// Forget the recorded successor of `hash`.
    fn block_successor_clear(&self, txn: &mut T, hash: &BlockHash) -> Result<(), StoreError>;
}

/// Sampled (account, balance) for a block, used to answer balance and
/// account queries without walking the chain from its head.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockInfo {
    pub account: Account,
    pub balance: Amount,
}

impl BlockInfo {
    pub const SIZE: usize = 48;
}

impl Encode for BlockInfo {
    fn encode(&self, out: &mut Vec<u8>) {
        self.account.encode(out);
        self.balance.encode(out);
    }
}

impl Decode for BlockInfo {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            account: Account::decode(reader)?,
            balance: Amount::decode(reader)?,
        })
    }
}

pub trait BlockInfoStore<T: Transaction> {
    fn block_info_put(
        &self,
        txn: &mut T,
        hash: &BlockHash,
        info: &BlockInfo,
    ) -> Result<(), StoreError>;

    fn block_info_get(&self, txn: &T, hash: &BlockHash) -> Result<Option<BlockInfo>, StoreError>;

    fn block_info_del(&self, txn: &mut T, hash: &BlockHash) -> Result<(), StoreError>;

    fn block_info_exists(&self, txn: &T, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self.block_info_get(txn, hash)?.is_some())
    }
}
