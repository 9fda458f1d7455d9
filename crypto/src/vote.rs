//! Vote construction.

use btcb_types::{Account, PrivateKey, Signature, Vote, VoteBlock};

use crate::sign::{sign_message, verify_signature};

/// Build a vote by `account` over `blocks` at `sequence` and sign its hash.
pub fn create_vote(
    account: Account,
    private_key: &PrivateKey,
    sequence: u64,
    blocks: Vec<VoteBlock>,
) -> Vote {
    let mut vote = Vote {
        account,
        signature: Signature::ZERO,
        sequence,
        blocks,
    };
    vote.signature = sign_message(vote.hash().as_bytes(), private_key);
    vote
}

/// Check the vote's signature against its own account.
pub fn verify_vote(vote: &Vote) -> bool {
    verify_signature(vote.hash().as_bytes(), &vote.signature, &vote.account)
}
