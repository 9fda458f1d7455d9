//! LMDB storage backend for the btcb ledger.
//!
//! Implements every storage trait from `btcb-store` on [`LmdbStore`] using
//! the `heed` LMDB bindings. Each logical store maps to one or more tables
//! within a single environment; epoch-split entities are read back through
//! [`MergedIterator`].

pub mod account;
pub mod block;
pub mod checksum;
pub mod config;
pub mod environment;
pub mod error;
pub mod frontier;
pub mod integrity;
pub mod iterator;
pub mod meta;
pub mod migration;
pub mod pending;
pub mod representation;
pub mod store;
pub mod transaction;
pub mod unchecked;
pub mod vote;

pub use config::LmdbConfig;
pub use environment::names;
pub use error::LmdbError;
pub use integrity::{check_data_dir, IntegrityReport};
pub use iterator::{MergedIterator, StoreIterator};
pub use migration::CURRENT_VERSION;
pub use store::LmdbStore;
pub use transaction::LmdbTransaction;
