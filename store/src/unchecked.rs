//! Unchecked (dependency-waiting) block storage trait.

use btcb_types::{Block, BlockHash, CodecError, Decode, Encode, Reader};

use crate::transaction::Transaction;
use crate::StoreError;

/// Key of an unchecked entry: the missing dependency, then the hash of the
/// block waiting on it. One dependency maps to many waiting blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UncheckedKey {
    pub dependency: BlockHash,
    pub hash: BlockHash,
}

impl UncheckedKey {
    pub const SIZE: usize = 64;

    pub fn new(dependency: BlockHash, hash: BlockHash) -> Self {
        Self { dependency, hash }
    }
}

impl Encode for UncheckedKey {
    fn encode(&self, out: &mut Vec<u8>) {
        self.dependency.encode(out);
        self.hash.encode(out);
    }
}

impl Decode for UncheckedKey {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            dependency: BlockHash::decode(reader)?,
            hash: BlockHash::decode(reader)?,
        })
    }
}

/// Trait for blocks that cannot be applied until a dependency arrives.
pub trait UncheckedStore<T: Transaction> {
    /// Record `block` as waiting on `dependency`. Re-inserting the same
    /// block under the same dependency is a no-op.
    fn unchecked_put(
        &self,
        txn: &mut T,
        dependency: &BlockHash,
        block: &Block,
    ) -> Result<(), StoreError>;

    /// Every block waiting on `dependency`, in key order.
    fn unchecked_get(&self, txn: &T, dependency: &BlockHash) -> Result<Vec<Block>, StoreError>;

    /// Remove one waiting block. Removing an absent entry is a no-op.
    fn unchecked_del(&self, txn: &mut T, key: &UncheckedKey) -> Result<(), StoreError>;

    fn unchecked_exists(&self, txn: &T, key: &UncheckedKey) -> Result<bool, StoreError>;

    fn unchecked_count(&self, txn: &T) -> Result<u64, StoreError>;

    fn unchecked_clear(&self, txn: &mut T) -> Result<(), StoreError>;
}
