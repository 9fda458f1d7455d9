//! Schema version storage trait.

use crate::transaction::Transaction;
use crate::StoreError;

pub trait VersionStore<T: Transaction> {
    /// The stored schema version, or `None` for a store never stamped.
    fn version_get(&self, txn: &T) -> Result<Option<u32>, StoreError>;

    fn version_put(&self, txn: &mut T, version: u32) -> Result<(), StoreError>;
}
