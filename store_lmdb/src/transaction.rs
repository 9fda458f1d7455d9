//! Read and write transactions over the LMDB environment.
//!
//! At most one write transaction is live per store. The slot is an atomic
//! flag owned by the store: taking it fails immediately instead of blocking,
//! and it is released when the write transaction commits or is dropped.
//! Dropping a write transaction without committing aborts it.

use std::sync::atomic::{AtomicBool, Ordering};

use heed::{Env, RoTxn, RwTxn};

use btcb_store::{StoreError, Transaction};

use crate::LmdbError;

enum Txn<'env> {
    Read(RoTxn<'env>),
    Write(RwTxn<'env>),
    Finished,
}

pub struct LmdbTransaction<'env> {
    env: &'env Env,
    txn: Txn<'env>,
    /// Held while this is a write transaction.
    write_slot: Option<&'env AtomicBool>,
}

impl<'env> LmdbTransaction<'env> {
    pub(crate) fn begin_read(env: &'env Env) -> Result<Self, StoreError> {
        let txn = env.read_txn().map_err(LmdbError::from)?;
        Ok(Self {
            env,
            txn: Txn::Read(txn),
            write_slot: None,
        })
    }

    pub(crate) fn begin_write(env: &'env Env, slot: &'env AtomicBool) -> Result<Self, StoreError> {
        if slot
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::WriteTransactionActive);
        }
        match env.write_txn() {
            Ok(txn) => Ok(Self {
                env,
                txn: Txn::Write(txn),
                write_slot: Some(slot),
            }),
            Err(e) => {
                slot.store(false, Ordering::Release);
                Err(LmdbError::from(e).into())
            }
        }
    }

    /// Snapshot to read through. A write transaction reads its own writes.
    pub(crate) fn ro(&self) -> Result<&RoTxn<'env>, LmdbError> {
        match &self.txn {
            Txn::Read(txn) => Ok(txn),
            Txn::Write(txn) => Ok(&**txn),
            Txn::Finished => Err(LmdbError::Finished),
        }
    }

    pub(crate) fn rw(&mut self) -> Result<&mut RwTxn<'env>, StoreError> {
        match &mut self.txn {
            Txn::Write(txn) => Ok(txn),
            Txn::Read(_) => Err(StoreError::ReadOnlyTransaction),
            Txn::Finished => Err(LmdbError::Finished.into()),
        }
    }

    /// Commit a write transaction. A read transaction just ends.
    pub fn commit(mut self) -> Result<(), StoreError> {
        match std::mem::replace(&mut self.txn, Txn::Finished) {
            Txn::Write(txn) => txn.commit().map_err(LmdbError::from)?,
            Txn::Read(_) | Txn::Finished => {}
        }
        Ok(())
    }

    /// Make everything done so far durable and visible to new readers
    /// without ending the transaction's scope: a write transaction commits
    /// and reopens in place, a read transaction moves to a fresh snapshot.
    pub(crate) fn refresh(&mut self) -> Result<(), StoreError> {
        match std::mem::replace(&mut self.txn, Txn::Finished) {
            Txn::Write(txn) => {
                txn.commit().map_err(LmdbError::from)?;
                self.txn = Txn::Write(self.env.write_txn().map_err(LmdbError::from)?);
            }
            Txn::Read(txn) => {
                drop(txn);
                self.txn = Txn::Read(self.env.read_txn().map_err(LmdbError::from)?);
            }
            Txn::Finished => return Err(LmdbError::Finished.into()),
        }
        Ok(())
    }
}

impl Transaction for LmdbTransaction<'_> {
    fn is_write(&self) -> bool {
        matches!(self.txn, Txn::Write(_))
    }
}

impl Drop for LmdbTransaction<'_> {
    fn drop(&mut self) {
        // Abort before handing the slot to the next writer.
        self.txn = Txn::Finished;
        if let Some(slot) = self.write_slot.take() {
            slot.store(false, Ordering::Release);
        }
    }
}
