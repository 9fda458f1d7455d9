//! LMDB implementation of VoteStore.
//!
//! Key: voter account. Value: the voter's latest vote. Votes generated or
//! adopted through `vote_max` sit in the store's cache until the next
//! flush writes them out.

use btcb_store::{StoreError, Transaction, VoteStore};
use btcb_types::{Account, Decode, Encode, PrivateKey, Vote, VoteBlock};

use crate::store::LmdbStore;
use crate::transaction::LmdbTransaction;
use crate::LmdbError;

fn require_blocks(blocks: &[VoteBlock]) -> Result<(), StoreError> {
    if blocks.is_empty() {
        return Err(StoreError::InvalidVote("vote carries no blocks".into()));
    }
    Ok(())
}

impl LmdbStore {
    pub(crate) fn vote_put(&self, txn: &mut LmdbTransaction<'_>, vote: &Vote) -> Result<(), StoreError> {
        self.tables
            .vote
            .put(txn.rw()?, vote.account.as_bytes(), &vote.to_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

impl VoteStore<LmdbTransaction<'_>> for LmdbStore {
    fn vote_get(&self, txn: &LmdbTransaction<'_>, account: &Account) -> Result<Option<Vote>, StoreError> {
        let val = self
            .tables
            .vote
            .get(txn.ro()?, account.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(Vote::from_bytes).transpose()?)
    }

    fn vote_current(
        &self,
        txn: &LmdbTransaction<'_>,
        account: &Account,
    ) -> Result<Option<Vote>, StoreError> {
        if let Some(vote) = self.votes().get(account) {
            return Ok(Some(vote.clone()));
        }
        self.vote_get(txn, account)
    }

    fn vote_generate(
        &self,
        txn: &mut LmdbTransaction<'_>,
        account: &Account,
        private_key: &PrivateKey,
        blocks: Vec<VoteBlock>,
    ) -> Result<Vote, StoreError> {
        if !txn.is_write() {
            return Err(StoreError::ReadOnlyTransaction);
        }
        require_blocks(&blocks)?;
        let sequence = self
            .vote_current(txn, account)?
            .map_or(0, |vote| vote.sequence)
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidVote("vote sequence exhausted".into()))?;
        let vote = btcb_crypto::create_vote(*account, private_key, sequence, blocks);
        self.votes().insert(*account, vote.clone());
        tracing::trace!(account = %account, sequence = vote.sequence, "vote generated");
        Ok(vote)
    }

    fn vote_max(&self, txn: &mut LmdbTransaction<'_>, candidate: Vote) -> Result<Vote, StoreError> {
        if !txn.is_write() {
            return Err(StoreError::ReadOnlyTransaction);
        }
        require_blocks(&candidate.blocks)?;
        let current = self.vote_current(txn, &candidate.account)?;
        let result = match current {
            Some(current) if current.sequence >= candidate.sequence => current,
            _ => candidate,
        };
        self.votes().insert(result.account, result.clone());
        Ok(result)
    }
}
