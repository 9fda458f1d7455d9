//! LMDB implementation of RepresentationStore.
//!
//! Key: representative account. Value: weight (16 bytes BE).

use btcb_store::{RepresentationStore, StoreError};
use btcb_types::{Account, Amount, Decode, Encode};

use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

impl RepresentationStore<LmdbTransaction<'_>> for LmdbStore {
    fn representation_get(
        &self,
        txn: &LmdbTransaction<'_>,
        representative: &Account,
    ) -> Result<Amount, StoreError> {
        let val = self
            .tables
            .representation
            .get(txn.ro()?, representative.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Amount::from_bytes(bytes)?),
            None => Ok(Amount::ZERO),
        }
    }

    fn representation_put(
        &self,
        txn: &mut LmdbTransaction<'_>,
        representative: &Account,
        weight: Amount,
    ) -> Result<(), StoreError> {
        self.tables
            .representation
            .put(txn.rw()?, representative.as_bytes(), &weight.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::open_test_store;

    #[test]
    fn absent_weight_is_zero() {
        let (_dir, store) = open_test_store();
        let txn = store.tx_begin_read().unwrap();
        assert_eq!(
            store.representation_get(&txn, &Account::from_u64(1)).unwrap(),
            Amount::ZERO
        );
    }

    #[test]
    fn put_and_add() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let rep = Account::from_u64(1);
        store.representation_put(&mut txn, &rep, Amount::new(10)).unwrap();
        store.representation_add(&mut txn, &rep, Amount::new(5)).unwrap();
        assert_eq!(store.representation_get(&txn, &rep).unwrap(), Amount::new(15));

        let other = Account::from_u64(2);
        store.representation_add(&mut txn, &other, Amount::new(3)).unwrap();
        assert_eq!(store.representation_get(&txn, &other).unwrap(), Amount::new(3));
    }
}
