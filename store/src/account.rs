//! Account storage trait.

use btcb_types::{Account, Amount, BlockHash, CodecError, Decode, Encode, Epoch, Reader};

use crate::transaction::Transaction;
use crate::StoreError;

/// Per-account information stored in the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountInfo {
    /// Hash of the latest block in this account's chain.
    pub head: BlockHash,
    /// Latest block on the chain that names a representative.
    pub rep_block: BlockHash,
    /// First block of the chain.
    pub open_block: BlockHash,
    pub balance: Amount,
    /// Seconds since the Unix epoch of the last change.
    pub modified: u64,
    pub block_count: u64,
    /// Not part of the encoding; set from the sub-table the row was read from.
    pub epoch: Epoch,
}

impl AccountInfo {
    pub const SIZE: usize = 32 * 3 + 16 + 8 + 8;

    /// Decode a stored row, tagging it with the epoch of its sub-table.
    pub fn decode_with_epoch(bytes: &[u8], epoch: Epoch) -> Result<Self, CodecError> {
        let mut info = Self::from_bytes(bytes)?;
        info.epoch = epoch;
        Ok(info)
    }
}

impl Encode for AccountInfo {
    fn encode(&self, out: &mut Vec<u8>) {
        self.head.encode(out);
        self.rep_block.encode(out);
        self.open_block.encode(out);
        self.balance.encode(out);
        self.modified.encode(out);
        self.block_count.encode(out);
    }
}

impl Decode for AccountInfo {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            head: BlockHash::decode(reader)?,
            rep_block: BlockHash::decode(reader)?,
            open_block: BlockHash::decode(reader)?,
            balance: Amount::decode(reader)?,
            modified: u64::decode(reader)?,
            block_count: u64::decode(reader)?,
            epoch: Epoch::Epoch0,
        })
    }
}

/// Trait for account storage operations.
///
/// Accounts live in two sub-tables, one per epoch; `account_put` routes by
/// `info.epoch` and an account is only ever present in one of them.
pub trait AccountStore<T: Transaction> {
    fn account_put(
        &self,
        txn: &mut T,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), StoreError>;

    fn account_get(&self, txn: &T, account: &Account) -> Result<Option<AccountInfo>, StoreError>;

    fn account_del(&self, txn: &mut T, account: &Account) -> Result<(), StoreError>;

    fn account_exists(&self, txn: &T, account: &Account) -> Result<bool, StoreError> {
        Ok(self.account_get(txn, account)?.is_some())
    }

    /// Number of accounts across both sub-tables.
    fn account_count(&self, txn: &T) -> Result<u64, StoreError>;
}
