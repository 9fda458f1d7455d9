//! Database schema migration engine.
//!
//! The schema version lives in the `meta` table. Opening a store walks an
//! older database forward one version at a time, stamping the version after
//! each step. The whole chain runs inside the caller's write transaction, so
//! a failure at any step leaves the database at its original version.

use heed::types::Bytes;
use heed::DatabaseFlags;

use btcb_store::{
    AccountInfo, BlockInfo, BlockInfoStore, PendingInfo, PendingKey, RepresentationStore,
    StoreError, UncheckedStore, VersionStore, BLOCK_INFO_MAX,
};
use btcb_types::{
    Account, Amount, Block, BlockHash, BlockType, CodecError, Decode, Encode, Epoch, Reader,
    Signature, Vote, VoteBlock, GENESIS_AMOUNT,
};

use crate::block::{decode_stored, encode_stored};
use crate::environment::{names, open_legacy, Table};
use crate::iterator::TableValue;
use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

/// The schema version that the current code writes.
pub const CURRENT_VERSION: u32 = 12;

/// Runs schema migrations to bring a store up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored version and run every step between it and
    /// [`CURRENT_VERSION`]. Returns the version the store ends up at.
    ///
    /// A store with no version recorded is new and is stamped current.
    pub fn run(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<u32, StoreError> {
        let Some(mut version) = store.version_get(txn)? else {
            store.version_put(txn, CURRENT_VERSION)?;
            tracing::info!(version = CURRENT_VERSION, "new store stamped");
            return Ok(CURRENT_VERSION);
        };

        if version > CURRENT_VERSION {
            return Err(StoreError::VersionTooNew {
                found: version,
                supported: CURRENT_VERSION,
            });
        }
        if version == CURRENT_VERSION {
            tracing::info!(version, "store schema is up to date");
            return Ok(version);
        }

        while version < CURRENT_VERSION {
            let to = version + 1;
            tracing::info!(from = version, to, "running migration");
            if let Err(e) = run_step(store, txn, version, to) {
                tracing::error!(from = version, to, error = %e, "migration failed");
                return Err(StoreError::Migration {
                    from: version,
                    to,
                    reason: e.to_string(),
                });
            }
            store.version_put(txn, to)?;
            version = to;
        }

        tracing::info!(version, "migration complete");
        Ok(version)
    }
}

fn run_step(
    store: &LmdbStore,
    txn: &mut LmdbTransaction<'_>,
    from: u32,
    to: u32,
) -> Result<(), StoreError> {
    match (from, to) {
        (1, 2) => add_open_block(store, txn),
        (2, 3) => rebuild_representation(store, txn),
        (3, 4) => rekey_pending(store, txn),
        (4, 5) => add_successors(store, txn),
        (5, 6) => add_block_count(store, txn),
        (6, 7) => clear_unchecked(store, txn),
        (7, 8) => move_unchecked_to_dup(store, txn),
        (8, 9) => sequence_to_votes(store, txn),
        (9, 10) => populate_block_info(store, txn),
        (10, 11) => clear_unsynced(store, txn),
        (11, 12) => rekey_unchecked(store, txn),
        _ => Err(StoreError::Backend(format!(
            "no migration from version {} to {}",
            from, to
        ))),
    }
}

// ── Legacy row shapes ─────────────────────────────────────────────────────

/// Account rows from before `block_count` existed. Up to version 1 the row
/// has no `open_block` either.
struct LegacyAccount {
    head: BlockHash,
    rep_block: BlockHash,
    open_block: BlockHash,
    balance: Amount,
    modified: u64,
}

impl LegacyAccount {
    fn decode_v1(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);
        let account = Self {
            head: BlockHash::decode(&mut reader)?,
            rep_block: BlockHash::decode(&mut reader)?,
            open_block: BlockHash::ZERO,
            balance: Amount::decode(&mut reader)?,
            modified: u64::decode(&mut reader)?,
        };
        reader.finish()?;
        Ok(account)
    }

    fn decode_v2(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);
        let account = Self {
            head: BlockHash::decode(&mut reader)?,
            rep_block: BlockHash::decode(&mut reader)?,
            open_block: BlockHash::decode(&mut reader)?,
            balance: Amount::decode(&mut reader)?,
            modified: u64::decode(&mut reader)?,
        };
        reader.finish()?;
        Ok(account)
    }

    fn encode_v2(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(120);
        self.head.encode(&mut out);
        self.rep_block.encode(&mut out);
        self.open_block.encode(&mut out);
        self.balance.encode(&mut out);
        self.modified.encode(&mut out);
        out
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────

type Row = (Vec<u8>, Vec<u8>);

/// Copy out every row of `table` so the table can be rewritten while the
/// rows are processed.
fn rows(txn: &LmdbTransaction<'_>, table: Table) -> Result<Vec<Row>, StoreError> {
    let iter = table.iter(txn.ro()?).map_err(LmdbError::from)?;
    let mut rows = Vec::new();
    for row in iter {
        let (key, value) = row.map_err(LmdbError::from)?;
        rows.push((key.to_vec(), value.to_vec()));
    }
    Ok(rows)
}

fn put(txn: &mut LmdbTransaction<'_>, table: Table, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
    table.put(txn.rw()?, key, value).map_err(LmdbError::from)?;
    Ok(())
}

fn clear(txn: &mut LmdbTransaction<'_>, table: Table) -> Result<(), StoreError> {
    table.clear(txn.rw()?).map_err(LmdbError::from)?;
    Ok(())
}

fn require_block(
    store: &LmdbStore,
    txn: &LmdbTransaction<'_>,
    hash: &BlockHash,
) -> Result<Block, StoreError> {
    store
        .block_raw_get(txn, hash)?
        .map(|stored| stored.block)
        .ok_or_else(|| StoreError::Backend(format!("block {} is missing", hash)))
}

/// An account chain from `head` back to its first block.
fn chain(
    store: &LmdbStore,
    txn: &LmdbTransaction<'_>,
    head: &BlockHash,
) -> Result<Vec<(BlockHash, Block)>, StoreError> {
    let mut blocks = Vec::new();
    let mut current = *head;
    while !current.is_zero() {
        let block = require_block(store, txn, &current)?;
        let previous = block.previous();
        blocks.push((current, block));
        current = previous;
    }
    Ok(blocks)
}

/// Balance of the account right after block `hash`.
fn balance(
    store: &LmdbStore,
    txn: &LmdbTransaction<'_>,
    hash: &BlockHash,
) -> Result<Amount, StoreError> {
    let mut received = Amount::ZERO;
    let mut current = *hash;
    loop {
        let block = require_block(store, txn, &current)?;
        if let Some(balance) = block.balance() {
            return Ok(balance.saturating_add(received));
        }
        match block.block_type() {
            BlockType::Receive | BlockType::Open => {
                let source = block.source().unwrap_or(BlockHash::ZERO);
                received = received.saturating_add(sent_amount(store, txn, &source)?);
                if block.block_type() == BlockType::Open {
                    return Ok(received);
                }
            }
            _ => {}
        }
        current = block.previous();
        if current.is_zero() {
            return Ok(received);
        }
    }
}

/// Amount moved by the send `hash`. A source that is not stored is the
/// genesis, which holds the full supply.
fn sent_amount(
    store: &LmdbStore,
    txn: &LmdbTransaction<'_>,
    hash: &BlockHash,
) -> Result<Amount, StoreError> {
    let Some(stored) = store.block_raw_get(txn, hash)? else {
        return Ok(GENESIS_AMOUNT);
    };
    let after = balance(store, txn, hash)?;
    let previous = stored.block.previous();
    let before = if previous.is_zero() {
        Amount::ZERO
    } else {
        balance(store, txn, &previous)?
    };
    Ok(before.abs_diff(after))
}

// ── Steps ─────────────────────────────────────────────────────────────────

fn add_open_block(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    let table = store.tables.accounts_v0;
    for (key, value) in rows(txn, table)? {
        let mut account = LegacyAccount::decode_v1(&value)?;
        let blocks = chain(store, txn, &account.head)?;
        if let Some((open, _)) = blocks.last() {
            account.open_block = *open;
        }
        put(txn, table, &key, &account.encode_v2())?;
    }
    Ok(())
}

fn rebuild_representation(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    let table = store.tables.accounts_v0;
    clear(txn, store.tables.representation)?;
    for (key, value) in rows(txn, table)? {
        let mut account = LegacyAccount::decode_v2(&value)?;
        let representative = chain(store, txn, &account.head)?
            .into_iter()
            .find_map(|(hash, block)| block.representative().map(|rep| (hash, rep)));
        if let Some((rep_block, representative)) = representative {
            account.rep_block = rep_block;
            store.representation_add(txn, &representative, account.balance)?;
        }
        put(txn, table, &key, &account.encode_v2())?;
    }
    Ok(())
}

/// Old pending rows: send hash -> source ‖ amount ‖ destination.
fn rekey_pending(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    let table = store.tables.pending_v0;
    let old = rows(txn, table)?;
    clear(txn, table)?;
    for (key, value) in old {
        let hash = BlockHash::from_bytes(&key)?;
        let mut reader = Reader::new(&value);
        let source = Account::decode(&mut reader)?;
        let amount = Amount::decode(&mut reader)?;
        let destination = Account::decode(&mut reader)?;
        reader.finish()?;
        let info = PendingInfo::new(source, amount, Epoch::Epoch0);
        put(txn, table, &PendingKey::new(destination, hash).to_bytes(), &info.to_bytes())?;
    }
    Ok(())
}

fn add_successors(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    for (block_type, _, table) in store.tables.blocks() {
        for (key, value) in rows(txn, table)? {
            let (block, successor) = decode_stored(block_type, &value)?;
            put(txn, table, &key, &encode_stored(&block, &successor))?;
        }
    }
    for (_, value) in rows(txn, store.tables.accounts_v0)? {
        let account = LegacyAccount::decode_v2(&value)?;
        let blocks = chain(store, txn, &account.head)?;
        for pair in blocks.windows(2) {
            let (successor, _) = &pair[0];
            let (hash, _) = &pair[1];
            store.block_successor_set(txn, hash, successor)?;
        }
    }
    Ok(())
}

fn add_block_count(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    let table = store.tables.accounts_v0;
    for (key, value) in rows(txn, table)? {
        let legacy = LegacyAccount::decode_v2(&value)?;
        let block_count = chain(store, txn, &legacy.head)?.len() as u64;
        let info = AccountInfo {
            head: legacy.head,
            rep_block: legacy.rep_block,
            open_block: legacy.open_block,
            balance: legacy.balance,
            modified: legacy.modified,
            block_count,
            epoch: Epoch::Epoch0,
        };
        put(txn, table, &key, &info.to_bytes())?;
    }
    Ok(())
}

fn clear_unchecked(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    clear(txn, store.tables.unchecked)
}

fn move_unchecked_to_dup(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    let old = rows(txn, store.tables.unchecked)?;
    let dup = store
        .env
        .database_options()
        .types::<Bytes, Bytes>()
        .name(names::LEGACY_UNCHECKED_DUP)
        .flags(DatabaseFlags::DUP_SORT)
        .create(txn.rw()?)
        .map_err(LmdbError::from)?;
    for (key, value) in &old {
        put(txn, dup, key, value)?;
    }
    tracing::debug!(rows = old.len(), "unchecked rows moved");
    clear(txn, store.tables.unchecked)
}

/// Each voter's bare sequence number becomes a stored vote carrying that
/// sequence. The vote has no real content until the voter votes again.
fn sequence_to_votes(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    let Some(table) = open_legacy(&store.env, txn.ro()?, names::LEGACY_SEQUENCE)? else {
        return Ok(());
    };
    for (key, value) in rows(txn, table)? {
        let account = Account::from_bytes(&key)?;
        let mut reader = Reader::new(&value);
        let sequence = reader.read_u64_le()?;
        reader.finish()?;
        let vote = Vote {
            account,
            signature: Signature::ZERO,
            sequence,
            blocks: vec![VoteBlock::Hash(BlockHash::ZERO)],
        };
        store.vote_put(txn, &vote)?;
    }
    clear(txn, table)
}

fn populate_block_info(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    for (key, value) in rows(txn, store.tables.accounts_v0)? {
        let account = Account::from_bytes(&key)?;
        let info = AccountInfo::decode_row(&value, Epoch::Epoch0)?;
        let blocks = chain(store, txn, &info.head)?;
        let height = blocks.len() as u64;
        for (depth, (hash, _)) in blocks.iter().enumerate() {
            if (height - depth as u64) % BLOCK_INFO_MAX == 0 {
                let balance = balance(store, txn, hash)?;
                store.block_info_put(txn, hash, &BlockInfo { account, balance })?;
            }
        }
    }
    Ok(())
}

fn clear_unsynced(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    match open_legacy(&store.env, txn.ro()?, names::LEGACY_UNSYNCED)? {
        Some(unsynced) => clear(txn, unsynced),
        None => Ok(()),
    }
}

fn rekey_unchecked(store: &LmdbStore, txn: &mut LmdbTransaction<'_>) -> Result<(), StoreError> {
    let dup = store
        .env
        .database_options()
        .types::<Bytes, Bytes>()
        .name(names::LEGACY_UNCHECKED_DUP)
        .flags(DatabaseFlags::DUP_SORT)
        .open(txn.ro()?)
        .map_err(LmdbError::from)?;
    let Some(dup) = dup else {
        return Ok(());
    };
    let old = rows(txn, dup)?;
    clear(txn, dup)?;
    for (key, value) in old {
        let dependency = BlockHash::from_bytes(&key)?;
        let block = Block::decode_row(&value, Epoch::Epoch0)?;
        store.unchecked_put(txn, &dependency, &block)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{open_test_store, test_genesis};
    use btcb_store::{AccountStore, BlockStore};
    use btcb_types::{ChangeBlock, OpenBlock, ReceiveBlock, SendBlock};

    #[test]
    fn current_store_is_left_alone() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        assert_eq!(Migrator::run(&store, &mut txn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn newer_version_is_refused() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        store.version_put(&mut txn, CURRENT_VERSION + 1).unwrap();
        assert!(matches!(
            Migrator::run(&store, &mut txn),
            Err(StoreError::VersionTooNew { found: 13, supported: 12 })
        ));
    }

    #[test]
    fn unknown_step_fails() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        store.version_put(&mut txn, 0).unwrap();
        assert!(matches!(
            Migrator::run(&store, &mut txn),
            Err(StoreError::Migration { from: 0, to: 1, .. })
        ));
    }

    #[test]
    fn legacy_account_shapes() {
        let legacy = LegacyAccount {
            head: BlockHash::from_u64(1),
            rep_block: BlockHash::from_u64(2),
            open_block: BlockHash::from_u64(3),
            balance: Amount::new(4),
            modified: 5,
        };
        let bytes = legacy.encode_v2();
        assert_eq!(bytes.len(), 120);
        let decoded = LegacyAccount::decode_v2(&bytes).unwrap();
        assert_eq!(decoded.open_block, legacy.open_block);
        assert!(LegacyAccount::decode_v1(&bytes).is_err());

        let mut v1 = Vec::new();
        legacy.head.encode(&mut v1);
        legacy.rep_block.encode(&mut v1);
        legacy.balance.encode(&mut v1);
        legacy.modified.encode(&mut v1);
        let decoded = LegacyAccount::decode_v1(&v1).unwrap();
        assert_eq!(decoded.balance, Amount::new(4));
        assert!(decoded.open_block.is_zero());
    }

    /// Genesis sends 100 and 50 to `a`; `a` opens from the first, receives
    /// the second and changes representative.
    #[test]
    fn balances_follow_sources_across_chains() {
        let (_dir, store) = open_test_store();
        let genesis = test_genesis();
        let mut txn = store.tx_begin_write().unwrap();
        store.initialize(&mut txn, &genesis).unwrap();

        let a = Account::from_u64(7);
        let rep = Account::from_u64(8);
        let send1: Block =
            SendBlock::new(genesis.hash(), a, Amount::new(u128::MAX - 100), 0).into();
        let send2: Block =
            SendBlock::new(send1.hash(), a, Amount::new(u128::MAX - 150), 0).into();
        let open: Block = OpenBlock::new(send1.hash(), rep, a, 0).into();
        let receive: Block = ReceiveBlock::new(open.hash(), send2.hash(), 0).into();
        let change: Block = ChangeBlock::new(receive.hash(), rep, 0).into();
        for block in [&send1, &send2, &open, &receive, &change] {
            store.block_put(&mut txn, &block.hash(), block).unwrap();
        }

        let balance_of = |hash: BlockHash| balance(&store, &txn, &hash).unwrap();
        assert_eq!(balance_of(genesis.hash()), GENESIS_AMOUNT);
        assert_eq!(balance_of(send1.hash()), Amount::new(u128::MAX - 100));
        assert_eq!(balance_of(open.hash()), Amount::new(100));
        assert_eq!(balance_of(receive.hash()), Amount::new(150));
        assert_eq!(balance_of(change.hash()), Amount::new(150));
        assert_eq!(
            sent_amount(&store, &txn, &send2.hash()).unwrap(),
            Amount::new(50)
        );

        let walked: Vec<BlockHash> = chain(&store, &txn, &change.hash())
            .unwrap()
            .into_iter()
            .map(|(hash, _)| hash)
            .collect();
        assert_eq!(walked, vec![change.hash(), receive.hash(), open.hash()]);
        assert!(store.account_exists(&txn, &genesis.account()).unwrap());
    }

    #[test]
    fn failed_step_refuses_open_and_keeps_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger");
        {
            let store = LmdbStore::open(&path, &crate::store::tests::test_config()).unwrap();
            let mut txn = store.tx_begin_write().unwrap();
            store.version_put(&mut txn, 1).unwrap();
            // An account whose head is not stored cannot be walked.
            put(&mut txn, store.tables.accounts_v0, &[1u8; 32], &[2u8; 88]).unwrap();
            txn.commit().unwrap();
        }
        // The second attempt starts from the same version as the first.
        for _ in 0..2 {
            let result = LmdbStore::open(&path, &crate::store::tests::test_config());
            assert!(matches!(
                result,
                Err(StoreError::Migration { from: 1, to: 2, .. })
            ));
        }
    }
}
