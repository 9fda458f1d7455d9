//! Range checksum storage trait.

use btcb_types::{BlockHash, CodecError, Decode, Encode, Reader};

use crate::transaction::Transaction;
use crate::StoreError;

/// Identifies a key range by its prefix and the mask width applied to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChecksumKey {
    pub prefix: u64,
    pub mask: u8,
}

impl ChecksumKey {
    pub fn new(prefix: u64, mask: u8) -> Self {
        Self { prefix, mask }
    }
}

impl Encode for ChecksumKey {
    fn encode(&self, out: &mut Vec<u8>) {
        self.prefix.encode(out);
        out.push(self.mask);
    }
}

impl Decode for ChecksumKey {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            prefix: u64::decode(reader)?,
            mask: reader.read_u8()?,
        })
    }
}

pub trait ChecksumStore<T: Transaction> {
    /// `None` when no checksum has been recorded for the range.
    fn checksum_get(&self, txn: &T, key: &ChecksumKey) -> Result<Option<BlockHash>, StoreError>;

    fn checksum_put(
        &self,
        txn: &mut T,
        key: &ChecksumKey,
        checksum: &BlockHash,
    ) -> Result<(), StoreError>;

    fn checksum_del(&self, txn: &mut T, key: &ChecksumKey) -> Result<(), StoreError>;
}
