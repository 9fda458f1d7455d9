//! Abstract storage traits for the btcb ledger.
//!
//! Every storage backend implements these traits over its own transaction
//! type. The entity types and their fixed binary layouts live here too, so
//! every backend persists identical bytes.

pub mod account;
pub mod block;
pub mod checksum;
pub mod error;
pub mod frontier;
pub mod meta;
pub mod pending;
pub mod representation;
pub mod transaction;
pub mod unchecked;
pub mod vote;

pub use account::{AccountInfo, AccountStore};
pub use block::{BlockCounts, BlockInfo, BlockInfoStore, BlockStore, BLOCK_INFO_MAX};
pub use checksum::{ChecksumKey, ChecksumStore};
pub use error::StoreError;
pub use frontier::FrontierStore;
pub use meta::VersionStore;
pub use pending::{PendingInfo, PendingKey, PendingStore};
pub use representation::RepresentationStore;
pub use transaction::Transaction;
pub use unchecked::{UncheckedKey, UncheckedStore};
pub use vote::VoteStore;

/// Every per-entity store over one transaction type.
pub trait Store<T: Transaction>:
    AccountStore<T>
    + BlockStore<T>
    + BlockInfoStore<T>
    + ChecksumStore<T>
    + FrontierStore<T>
    + PendingStore<T>
    + RepresentationStore<T>
    + UncheckedStore<T>
    + VersionStore<T>
    + VoteStore<T>
{
}

impl<T, S> Store<T> for S
where
    T: Transaction,
    S: AccountStore<T>
        + BlockStore<T>
        + BlockInfoStore<T>
        + ChecksumStore<T>
        + FrontierStore<T>
        + PendingStore<T>
        + RepresentationStore<T>
        + UncheckedStore<T>
        + VersionStore<T>
        + VoteStore<T>,
{
}
