//! Frontier storage trait.

use btcb_types::{Account, BlockHash};

use crate::transaction::Transaction;
use crate::StoreError;

/// Legacy index from a chain's head block to its account.
///
/// Superseded by `AccountInfo::head`; kept so older data and callers that
/// still maintain it keep working.
pub trait FrontierStore<T: Transaction> {
    fn frontier_put(&self, txn: &mut T, hash: &BlockHash, account: &Account)
        -> Result<(), StoreError>;

    /// The account whose head is `hash`, or the zero account.
    fn frontier_get(&self, txn: &T, hash: &BlockHash) -> Result<Account, StoreError>;

    fn frontier_del(&self, txn: &mut T, hash: &BlockHash) -> Result<(), StoreError>;

    /// Total number of frontier entries.
    fn frontier_count(&self, txn: &T) -> Result<u64, StoreError>;
}
