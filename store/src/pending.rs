//! Pending receive storage trait.

use btcb_types::{Account, Amount, BlockHash, CodecError, Decode, Encode, Epoch, Reader};

use crate::transaction::Transaction;
use crate::StoreError;

/// Key of a receivable entry: the destination account, then the hash of the
/// send block that created it.
///
/// Field order matters: the derived ordering compares `account` first, the
/// same order as the encoded bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingKey {
    pub account: Account,
    pub hash: BlockHash,
}

impl PendingKey {
    pub const SIZE: usize = 64;

    pub fn new(account: Account, hash: BlockHash) -> Self {
        Self { account, hash }
    }
}

impl Encode for PendingKey {
    fn encode(&self, out: &mut Vec<u8>) {
        self.account.encode(out);
        self.hash.encode(out);
    }
}

impl Decode for PendingKey {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            account: Account::decode(reader)?,
            hash: BlockHash::decode(reader)?,
        })
    }
}

/// Information about a pending incoming transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingInfo {
    /// Account that sent the amount.
    pub source: Account,
    pub amount: Amount,
    /// Not part of the encoding; set from the sub-table the row was read from.
    pub epoch: Epoch,
}

impl PendingInfo {
    pub const SIZE: usize = 48;

    pub fn new(source: Account, amount: Amount, epoch: Epoch) -> Self {
        Self {
            source,
            amount,
            epoch,
        }
    }

    pub fn decode_with_epoch(bytes: &[u8], epoch: Epoch) -> Result<Self, CodecError> {
        let mut info = Self::from_bytes(bytes)?;
        info.epoch = epoch;
        Ok(info)
    }
}

impl Encode for PendingInfo {
    fn encode(&self, out: &mut Vec<u8>) {
        self.source.encode(out);
        self.amount.encode(out);
    }
}

impl Decode for PendingInfo {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            source: Account::decode(reader)?,
            amount: Amount::decode(reader)?,
            epoch: Epoch::Epoch0,
        })
    }
}

/// Trait for tracking pending receives.
///
/// Each entry represents a send that the destination account has not yet
/// received. Entries are routed to a sub-table by `info.epoch`.
pub trait PendingStore<T: Transaction> {
    fn pending_put(
        &self,
        txn: &mut T,
        key: &PendingKey,
        info: &PendingInfo,
    ) -> Result<(), StoreError>;

    fn pending_get(&self, txn: &T, key: &PendingKey) -> Result<Option<PendingInfo>, StoreError>;

    /// Delete from both sub-tables. Deleting an absent key is a no-op.
    fn pending_del(&self, txn: &mut T, key: &PendingKey) -> Result<(), StoreError>;

    fn pending_exists(&self, txn: &T, key: &PendingKey) -> Result<bool, StoreError> {
        Ok(self.pending_get(txn, key)?.is_some())
    }

    /// Whether `account` has at least one receivable entry.
    fn pending_any(&self, txn: &T, account: &Account) -> Result<bool, StoreError>;
}
