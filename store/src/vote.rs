//! Vote sequencing trait.

use btcb_types::{Account, BlockHash, PrivateKey, Vote, VoteBlock};

use crate::transaction::Transaction;
use crate::StoreError;

/// Per-voter monotonic sequence numbers and the latest vote for each voter.
///
/// The sequence counter is per voter, not per block: voting on a different
/// block still advances the same counter.
pub trait VoteStore<T: Transaction> {
    /// Latest durably stored vote by `account`.
    fn vote_get(&self, txn: &T, account: &Account) -> Result<Option<Vote>, StoreError>;

    /// Latest vote by `account`, including votes not yet flushed.
    fn vote_current(&self, txn: &T, account: &Account) -> Result<Option<Vote>, StoreError>;

    /// Sign a vote over `blocks` with a sequence one past the voter's last.
    ///
    /// Fails with `InvalidVote` when `blocks` is empty or the voter's
    /// sequence is already `u64::MAX`.
    fn vote_generate(
        &self,
        txn: &mut T,
        account: &Account,
        private_key: &PrivateKey,
        blocks: Vec<VoteBlock>,
    ) -> Result<Vote, StoreError>;

    /// `vote_generate` over bare block hashes.
    fn vote_generate_hashes(
        &self,
        txn: &mut T,
        account: &Account,
        private_key: &PrivateKey,
        hashes: &[BlockHash],
    ) -> Result<Vote, StoreError> {
        let blocks = hashes.iter().copied().map(VoteBlock::Hash).collect();
        self.vote_generate(txn, account, private_key, blocks)
    }

    /// Adopt `candidate` when its sequence is strictly greater than the
    /// voter's current one; otherwise return the current vote. A candidate
    /// without blocks is rejected.
    fn vote_max(&self, txn: &mut T, candidate: Vote) -> Result<Vote, StoreError>;
}
