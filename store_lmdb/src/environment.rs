//! LMDB environment setup and the table set.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions, RoTxn, RwTxn};

use btcb_types::{BlockType, Epoch};

use crate::config::LmdbConfig;
use crate::LmdbError;

/// Raw key/value handle every table is opened as.
pub type Table = Database<Bytes, Bytes>;

/// Table names, as stored in the environment.
pub mod names {
    pub const FRONTIERS: &str = "frontiers";
    pub const ACCOUNTS_V0: &str = "accounts";
    pub const ACCOUNTS_V1: &str = "accounts_v1";
    pub const SEND: &str = "send";
    pub const RECEIVE: &str = "receive";
    pub const OPEN: &str = "open";
    pub const CHANGE: &str = "change";
    pub const STATE_V0: &str = "state";
    pub const STATE_V1: &str = "state_v1";
    pub const PENDING_V0: &str = "pending";
    pub const PENDING_V1: &str = "pending_v1";
    pub const BLOCKS_INFO: &str = "blocks_info";
    pub const REPRESENTATION: &str = "representation";
    pub const UNCHECKED: &str = "unchecked";
    pub const CHECKSUM: &str = "checksum";
    pub const VOTE: &str = "vote";
    pub const META: &str = "meta";

    /// Tables only older schema versions wrote. Migrations read and empty
    /// them; a fresh store never creates them.
    pub const LEGACY_UNCHECKED_DUP: &str = "unchecked_dup";
    pub const LEGACY_SEQUENCE: &str = "sequence";
    pub const LEGACY_UNSYNCED: &str = "unsynced";

    /// Every table a current store holds.
    pub const CURRENT: &[&str] = &[
        FRONTIERS,
        ACCOUNTS_V0,
        ACCOUNTS_V1,
        SEND,
        RECEIVE,
        OPEN,
        CHANGE,
        STATE_V0,
        STATE_V1,
        PENDING_V0,
        PENDING_V1,
        BLOCKS_INFO,
        REPRESENTATION,
        UNCHECKED,
        CHECKSUM,
        VOTE,
        META,
    ];
}

/// Open (creating if needed) the environment at `path`.
pub(crate) fn open_env(path: &Path, config: &LmdbConfig) -> Result<Env, LmdbError> {
    let mut options = EnvOpenOptions::new();
    options
        .map_size(config.map_size)
        .max_dbs(config.max_dbs)
        .max_readers(config.max_readers);
    if !config.sync {
        // NO_SYNC only relaxes durability; the map stays consistent.
        unsafe {
            options.flags(EnvFlags::NO_SYNC);
        }
    }
    let env = unsafe { options.open(path)? };
    Ok(env)
}

/// Handles to every current table. Opened once at store construction and
/// immutable afterwards.
#[derive(Clone, Copy)]
pub struct Tables {
    pub frontiers: Table,
    pub accounts_v0: Table,
    pub accounts_v1: Table,
    pub send: Table,
    pub receive: Table,
    pub open: Table,
    pub change: Table,
    pub state_v0: Table,
    pub state_v1: Table,
    pub pending_v0: Table,
    pub pending_v1: Table,
    pub blocks_info: Table,
    pub representation: Table,
    pub unchecked: Table,
    pub checksum: Table,
    pub vote: Table,
    pub meta: Table,
}

impl Tables {
    /// Create any missing table and return handles to all of them.
    pub(crate) fn create(env: &Env, wtxn: &mut RwTxn<'_>) -> Result<Self, LmdbError> {
        let mut create = |name: &str| -> Result<Table, LmdbError> {
            tracing::debug!(table = name, "opening table");
            Ok(env.create_database::<Bytes, Bytes>(wtxn, Some(name))?)
        };
        Ok(Self {
            frontiers: create(names::FRONTIERS)?,
            accounts_v0: create(names::ACCOUNTS_V0)?,
            accounts_v1: create(names::ACCOUNTS_V1)?,
            send: create(names::SEND)?,
            receive: create(names::RECEIVE)?,
            open: create(names::OPEN)?,
            change: create(names::CHANGE)?,
            state_v0: create(names::STATE_V0)?,
            state_v1: create(names::STATE_V1)?,
            pending_v0: create(names::PENDING_V0)?,
            pending_v1: create(names::PENDING_V1)?,
            blocks_info: create(names::BLOCKS_INFO)?,
            representation: create(names::REPRESENTATION)?,
            unchecked: create(names::UNCHECKED)?,
            checksum: create(names::CHECKSUM)?,
            vote: create(names::VOTE)?,
            meta: create(names::META)?,
        })
    }

    pub fn accounts(&self, epoch: Epoch) -> Table {
        match epoch {
            Epoch::Epoch0 => self.accounts_v0,
            Epoch::Epoch1 => self.accounts_v1,
        }
    }

    pub fn pending(&self, epoch: Epoch) -> Table {
        match epoch {
            Epoch::Epoch0 => self.pending_v0,
            Epoch::Epoch1 => self.pending_v1,
        }
    }

    /// Block sub-tables in probe order, each with the variant and epoch of
    /// the rows it holds.
    pub fn blocks(&self) -> [(BlockType, Epoch, Table); 6] {
        [
            (BlockType::Send, Epoch::Epoch0, self.send),
            (BlockType::Receive, Epoch::Epoch0, self.receive),
            (BlockType::Open, Epoch::Epoch0, self.open),
            (BlockType::Change, Epoch::Epoch0, self.change),
            (BlockType::State, Epoch::Epoch0, self.state_v0),
            (BlockType::State, Epoch::Epoch1, self.state_v1),
        ]
    }

    /// The sub-table a block of `block_type` in `epoch` is stored in. Epochs
    /// only split state blocks; legacy variants always live in their own table.
    pub fn block_table(&self, block_type: BlockType, epoch: Epoch) -> Option<Table> {
        match (block_type, epoch) {
            (BlockType::Send, _) => Some(self.send),
            (BlockType::Receive, _) => Some(self.receive),
            (BlockType::Open, _) => Some(self.open),
            (BlockType::Change, _) => Some(self.change),
            (BlockType::State, Epoch::Epoch0) => Some(self.state_v0),
            (BlockType::State, Epoch::Epoch1) => Some(self.state_v1),
            (BlockType::Invalid | BlockType::NotABlock, _) => None,
        }
    }
}

/// Open a legacy table if an older schema left one behind.
pub(crate) fn open_legacy(
    env: &Env,
    txn: &RoTxn<'_>,
    name: &str,
) -> Result<Option<Table>, LmdbError> {
    Ok(env.open_database::<Bytes, Bytes>(txn, Some(name))?)
}
