//! Representative weight storage trait.

use btcb_types::{Account, Amount};

use crate::transaction::Transaction;
use crate::StoreError;

/// Cached voting weight delegated to each representative.
pub trait RepresentationStore<T: Transaction> {
    /// Weight of `representative`; zero when nothing is recorded.
    fn representation_get(&self, txn: &T, representative: &Account) -> Result<Amount, StoreError>;

    fn representation_put(
        &self,
        txn: &mut T,
        representative: &Account,
        weight: Amount,
    ) -> Result<(), StoreError>;

    /// Add `delta` to the recorded weight (wrapping like the ledger's
    /// 128-bit arithmetic).
    fn representation_add(
        &self,
        txn: &mut T,
        representative: &Account,
        delta: Amount,
    ) -> Result<(), StoreError> {
        let current = self.representation_get(txn, representative)?;
        let updated = Amount::new(current.raw().wrapping_add(delta.raw()));
        self.representation_put(txn, representative, updated)
    }
}
