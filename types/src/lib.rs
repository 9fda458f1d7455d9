//! Fundamental types for the btcb ledger.
//!
//! This crate defines the values every other crate in the workspace stores
//! or exchanges: hashes, accounts, amounts, block variants, votes, epochs, and
//! the fixed binary codec they are persisted with.

pub mod amount;
pub mod block;
pub mod codec;
pub mod epoch;
pub mod error;
pub mod genesis;
pub mod hash;
pub mod keys;
pub mod vote;

pub use amount::Amount;
pub use block::{
    Block, BlockType, ChangeBlock, ChangeHashables, OpenBlock, OpenHashables, ReceiveBlock,
    ReceiveHashables, SendBlock, SendHashables, StateBlock, StateHashables,
};
pub use codec::{Decode, Encode, Reader};
pub use epoch::Epoch;
pub use error::CodecError;
pub use genesis::{Genesis, GENESIS_AMOUNT};
pub use hash::{blake2b_256_multi, BlockHash};
pub use keys::{Account, KeyPair, PrivateKey, PublicKey, Signature};
pub use vote::{Vote, VoteBlock};
