//! Genesis description: the open block a network's ledger starts from.
//!
//! The genesis open block receives from its own account (the source field
//! holds the account bytes, not a stored send block) and starts with the
//! entire supply.

use crate::amount::Amount;
use crate::block::{Block, OpenBlock};
use crate::hash::BlockHash;
use crate::keys::{Account, Signature};

/// Total supply, held by the genesis account at initialization.
pub const GENESIS_AMOUNT: Amount = Amount::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Genesis {
    pub open: OpenBlock,
}

impl Genesis {
    /// Genesis for `account`, representing itself.
    pub fn new(account: Account, signature: Signature, work: u64) -> Self {
        let mut open = OpenBlock::new(BlockHash::new(*account.as_bytes()), account, account, work);
        open.signature = signature;
        Self { open }
    }

    pub fn hash(&self) -> BlockHash {
        self.open.hash()
    }

    pub fn account(&self) -> Account {
        self.open.hashables.account
    }

    pub fn block(&self) -> Block {
        Block::Open(self.open.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_self_sourced_open() {
        let account = Account::from_u64(42);
        let genesis = Genesis::new(account, Signature::ZERO, 0);
        let block = genesis.block();
        assert_eq!(block.source(), Some(BlockHash::new(*account.as_bytes())));
        assert_eq!(block.representative(), Some(account));
        assert_eq!(genesis.account(), account);
        assert_eq!(block.hash(), genesis.hash());
    }
}
