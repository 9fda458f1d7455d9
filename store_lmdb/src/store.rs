//! The LMDB-backed ledger store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use heed::Env;

use btcb_store::{
    AccountInfo, AccountStore, BlockStore, FrontierStore, RepresentationStore, StoreError,
    Transaction,
};
use btcb_types::{Account, Epoch, Genesis, Vote, GENESIS_AMOUNT};

use crate::config::LmdbConfig;
use crate::environment::{open_env, Tables};
use crate::integrity::check_data_dir;
use crate::migration::Migrator;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

/// Ledger store over a single LMDB environment.
///
/// Opening runs any pending schema migrations before the store is handed
/// out. All access goes through transactions from [`LmdbStore::tx_begin`].
pub struct LmdbStore {
    pub(crate) env: Env,
    pub(crate) tables: Tables,
    path: PathBuf,
    write_active: AtomicBool,
    /// Votes generated or adopted since the last flush, by voter.
    pub(crate) vote_cache: Mutex<HashMap<Account, Vote>>,
}

impl LmdbStore {
    /// Open or create the store at `path` and bring its schema up to date.
    pub fn open(path: &Path, config: &LmdbConfig) -> Result<Self, StoreError> {
        check_data_dir(path)?;
        std::fs::create_dir_all(path)
            .map_err(|e| StoreError::Initialization(format!("{}: {}", path.display(), e)))?;
        let env = open_env(path, config)
            .map_err(|e| StoreError::Initialization(format!("{}: {}", path.display(), e)))?;

        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let tables = Tables::create(&env, &mut wtxn)?;
        wtxn.commit().map_err(LmdbError::from)?;

        let store = Self {
            env,
            tables,
            path: path.to_path_buf(),
            write_active: AtomicBool::new(false),
            vote_cache: Mutex::new(HashMap::new()),
        };

        let mut txn = store.tx_begin_write()?;
        let version = Migrator::run(&store, &mut txn)?;
        txn.commit()?;

        tracing::info!(path = %store.path.display(), version, "ledger store opened");
        Ok(store)
    }

    /// Open with the default configuration.
    pub fn open_default(path: &Path) -> Result<Self, StoreError> {
        Self::open(path, &LmdbConfig::default())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tx_begin_read(&self) -> Result<LmdbTransaction<'_>, StoreError> {
        LmdbTransaction::begin_read(&self.env)
    }

    /// Fails with `WriteTransactionActive` while another write transaction
    /// is live.
    pub fn tx_begin_write(&self) -> Result<LmdbTransaction<'_>, StoreError> {
        LmdbTransaction::begin_write(&self.env, &self.write_active)
    }

    pub fn tx_begin(&self, write: bool) -> Result<LmdbTransaction<'_>, StoreError> {
        if write {
            self.tx_begin_write()
        } else {
            self.tx_begin_read()
        }
    }

    /// Make the work done under `txn` durable and visible without ending
    /// its scope. Cached votes are written out first.
    pub fn flush(&self, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
        if txn.is_write() {
            let votes: Vec<Vote> = self.votes().drain().map(|(_, vote)| vote).collect();
            tracing::debug!(votes = votes.len(), "flushing vote cache");
            for vote in &votes {
                self.vote_put(txn, vote)?;
            }
        }
        txn.refresh()
    }

    /// Write the genesis block and account as the store's first content.
    pub fn initialize(
        &self,
        txn: &mut LmdbTransaction<'_>,
        genesis: &Genesis,
    ) -> Result<(), StoreError> {
        if self.account_count(txn)? > 0 {
            return Err(StoreError::AlreadyInitialized);
        }
        let hash = genesis.hash();
        let account = genesis.account();
        self.block_put(txn, &hash, &genesis.block())?;
        let info = AccountInfo {
            head: hash,
            rep_block: hash,
            open_block: hash,
            balance: GENESIS_AMOUNT,
            modified: seconds_since_epoch(),
            block_count: 1,
            epoch: Epoch::Epoch0,
        };
        self.account_put(txn, &account, &info)?;
        self.representation_put(txn, &account, GENESIS_AMOUNT)?;
        self.frontier_put(txn, &hash, &account)?;
        tracing::info!(genesis = %hash, "ledger initialized");
        Ok(())
    }

    pub(crate) fn votes(&self) -> MutexGuard<'_, HashMap<Account, Vote>> {
        self.vote_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub(crate) fn seconds_since_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
