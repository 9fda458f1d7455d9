//! Cryptographic primitives for the btcb ledger.
//!
//! - **Ed25519** for signing blocks and votes and verifying them
//! - Hashing itself lives with the types (`btcb_types::blake2b_256_multi`),
//!   since every block and vote computes its own digest

pub mod keys;
pub mod sign;
pub mod vote;

pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_block, sign_message, verify_block, verify_signature};
pub use vote::{create_vote, verify_vote};
