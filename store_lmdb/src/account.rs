//! LMDB implementation of AccountStore.
//!
//! Key: account (32 bytes). Value: `AccountInfo` (128 bytes). The epoch is
//! the sub-table: `accounts` holds epoch 0, `accounts_v1` epoch 1.

use btcb_store::{AccountInfo, AccountStore, StoreError};
use btcb_types::{Account, Encode, Epoch};

use crate::iterator::{MergedIterator, TableValue};
use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

impl AccountStore<LmdbTransaction<'_>> for LmdbStore {
    fn account_put(
        &self,
        txn: &mut LmdbTransaction<'_>,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), StoreError> {
        let (target, other) = match info.epoch {
            Epoch::Epoch0 => (self.tables.accounts_v0, self.tables.accounts_v1),
            Epoch::Epoch1 => (self.tables.accounts_v1, self.tables.accounts_v0),
        };
        let wtxn = txn.rw()?;
        other
            .delete(wtxn, account.as_bytes())
            .map_err(LmdbError::from)?;
        target
            .put(wtxn, account.as_bytes(), &info.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn account_get(
        &self,
        txn: &LmdbTransaction<'_>,
        account: &Account,
    ) -> Result<Option<AccountInfo>, StoreError> {
        let rtxn = txn.ro()?;
        for epoch in [Epoch::Epoch0, Epoch::Epoch1] {
            let table = self.tables.accounts(epoch);
            if let Some(bytes) = table.get(rtxn, account.as_bytes()).map_err(LmdbError::from)? {
                return Ok(Some(AccountInfo::decode_row(bytes, epoch)?));
            }
        }
        Ok(None)
    }

    fn account_del(&self, txn: &mut LmdbTransaction<'_>, account: &Account) -> Result<(), StoreError> {
        let wtxn = txn.rw()?;
        for table in [self.tables.accounts_v0, self.tables.accounts_v1] {
            table
                .delete(wtxn, account.as_bytes())
                .map_err(LmdbError::from)?;
        }
        Ok(())
    }

    fn account_count(&self, txn: &LmdbTransaction<'_>) -> Result<u64, StoreError> {
        let rtxn = txn.ro()?;
        let v0 = self.tables.accounts_v0.len(rtxn).map_err(LmdbError::from)?;
        let v1 = self.tables.accounts_v1.len(rtxn).map_err(LmdbError::from)?;
        Ok(v0 + v1)
    }
}

impl LmdbStore {
    /// Accounts in key order across both epochs, starting at `start`
    /// (or the first account).
    pub fn latest_begin<'t>(
        &self,
        txn: &'t LmdbTransaction<'_>,
        start: Option<&Account>,
    ) -> Result<MergedIterator<'t, Account, AccountInfo>, StoreError> {
        MergedIterator::begin(
            txn.ro()?,
            self.tables.accounts_v0,
            self.tables.accounts_v1,
            start.map(|a| a.as_bytes().as_slice()),
        )
    }

    pub fn latest_end<'t>(&self) -> MergedIterator<'t, Account, AccountInfo> {
        MergedIterator::end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{open_test_store, test_genesis};
    use btcb_types::{Amount, BlockHash};

    fn info(n: u64, epoch: Epoch) -> AccountInfo {
        AccountInfo {
            head: BlockHash::from_u64(n),
            rep_block: BlockHash::from_u64(n + 1),
            open_block: BlockHash::from_u64(n + 2),
            balance: Amount::new(n as u128 * 10),
            modified: 100,
            block_count: n,
            epoch,
        }
    }

    #[test]
    fn put_get_del() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let account = Account::from_u64(1);
        assert_eq!(store.account_get(&txn, &account).unwrap(), None);
        store.account_put(&mut txn, &account, &info(1, Epoch::Epoch0)).unwrap();
        assert_eq!(
            store.account_get(&txn, &account).unwrap(),
            Some(info(1, Epoch::Epoch0))
        );
        assert!(store.account_exists(&txn, &account).unwrap());
        store.account_del(&mut txn, &account).unwrap();
        assert!(!store.account_exists(&txn, &account).unwrap());
    }

    #[test]
    fn epoch_routes_to_one_sub_table() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        let account = Account::from_u64(7);
        store.account_put(&mut txn, &account, &info(3, Epoch::Epoch0)).unwrap();
        store.account_put(&mut txn, &account, &info(4, Epoch::Epoch1)).unwrap();
        assert_eq!(store.account_count(&txn).unwrap(), 1);
        let stored = store.account_get(&txn, &account).unwrap().unwrap();
        assert_eq!(stored, info(4, Epoch::Epoch1));
    }

    #[test]
    fn empty_store_iteration() {
        let (_dir, store) = open_test_store();
        let txn = store.tx_begin_read().unwrap();
        assert!(store.latest_begin(&txn, None).unwrap() == store.latest_end());
    }

    #[test]
    fn iteration_merges_epochs_in_key_order() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        for n in [1u64, 3, 5] {
            store
                .account_put(&mut txn, &Account::from_u64(n), &info(n, Epoch::Epoch0))
                .unwrap();
        }
        for n in [2u64, 4] {
            store
                .account_put(&mut txn, &Account::from_u64(n), &info(n, Epoch::Epoch1))
                .unwrap();
        }

        let rows: Vec<(Account, AccountInfo)> = store
            .latest_begin(&txn, None)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let accounts: Vec<Account> = rows.iter().map(|(a, _)| *a).collect();
        assert_eq!(accounts, (1..=5).map(Account::from_u64).collect::<Vec<_>>());
        assert_eq!(rows[1].1.epoch, Epoch::Epoch1);
        assert_eq!(rows[2].1.epoch, Epoch::Epoch0);

        let from_three: Vec<Account> = store
            .latest_begin(&txn, Some(&Account::from_u64(3)))
            .unwrap()
            .map(|row| row.unwrap().0)
            .collect();
        assert_eq!(from_three.len(), 3);
        assert_eq!(from_three[0], Account::from_u64(3));
    }

    #[test]
    fn unreadable_row_after_tie_is_reported_next() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        for n in [1u64, 3, 4, 5] {
            store
                .account_put(&mut txn, &Account::from_u64(n), &info(n, Epoch::Epoch0))
                .unwrap();
        }
        // Account 1 is in both sub-tables; account 2 cannot be decoded.
        let (tie, bad) = (Account::from_u64(1), Account::from_u64(2));
        let tie_row = info(1, Epoch::Epoch1).to_bytes();
        let v1 = store.tables.accounts_v1;
        v1.put(txn.rw().unwrap(), tie.as_bytes().as_slice(), &tie_row).unwrap();
        v1.put(txn.rw().unwrap(), bad.as_bytes().as_slice(), &b"bad"[..]).unwrap();

        let mut iter = store.latest_begin(&txn, None).unwrap();
        let (first, _) = iter.next().unwrap().unwrap();
        assert_eq!(first, Account::from_u64(1));
        assert!(matches!(iter.next(), Some(Err(StoreError::Serialization(_)))));
    }

    #[test]
    fn genesis_only_iteration() {
        let (_dir, store) = open_test_store();
        let genesis = test_genesis();
        let mut txn = store.tx_begin_write().unwrap();
        store.initialize(&mut txn, &genesis).unwrap();
        let mut iter = store.latest_begin(&txn, None).unwrap();
        assert!(iter != store.latest_end());
        assert_eq!(iter.key(), Some(&genesis.account()));
        iter.next().unwrap().unwrap();
        assert!(iter == store.latest_end());
    }
}
