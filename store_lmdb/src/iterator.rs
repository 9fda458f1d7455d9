//! Ordered iteration over one table, and over a pair of epoch sub-tables
//! presented as one keyspace.

use std::cmp::Ordering;
use std::ops::Bound;

use heed::types::Bytes;
use heed::{RoRange, RoTxn};

use btcb_store::{AccountInfo, PendingInfo, StoreError};
use btcb_types::{Block, CodecError, Decode, Epoch, Reader};

use crate::environment::Table;
use crate::LmdbError;

/// Values that can be decoded from a row, given the epoch of its sub-table.
pub trait TableValue: Sized {
    fn decode_row(bytes: &[u8], epoch: Epoch) -> Result<Self, CodecError>;
}

impl TableValue for AccountInfo {
    fn decode_row(bytes: &[u8], epoch: Epoch) -> Result<Self, CodecError> {
        AccountInfo::decode_with_epoch(bytes, epoch)
    }
}

impl TableValue for PendingInfo {
    fn decode_row(bytes: &[u8], epoch: Epoch) -> Result<Self, CodecError> {
        PendingInfo::decode_with_epoch(bytes, epoch)
    }
}

/// Unchecked rows hold a typed block.
impl TableValue for Block {
    fn decode_row(bytes: &[u8], _epoch: Epoch) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);
        let block = Block::decode_typed(&mut reader)?;
        reader.finish()?;
        Ok(block)
    }
}

/// Cursor over one table, positioned on its current row.
///
/// Two iterators are equal when they sit on the same key; every exhausted
/// iterator equals [`StoreIterator::end`].
pub struct StoreIterator<'txn, K, V> {
    range: Option<RoRange<'txn, Bytes, Bytes>>,
    current: Option<(K, V)>,
    error: Option<StoreError>,
    epoch: Epoch,
}

impl<'txn, K: Decode, V: TableValue> StoreIterator<'txn, K, V> {
    /// Position on the first row whose key is at or after `start`.
    pub(crate) fn begin(
        txn: &'txn RoTxn<'_>,
        table: Table,
        start: Option<&[u8]>,
        epoch: Epoch,
    ) -> Result<Self, StoreError> {
        let lower = match start {
            Some(key) => Bound::Included(key),
            None => Bound::Unbounded,
        };
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (lower, Bound::Unbounded);
        let range = table.range(txn, &bounds).map_err(LmdbError::from)?;
        let mut iter = Self {
            range: Some(range),
            current: None,
            error: None,
            epoch,
        };
        iter.load_next()?;
        Ok(iter)
    }

    pub fn end() -> Self {
        Self {
            range: None,
            current: None,
            error: None,
            epoch: Epoch::Epoch0,
        }
    }

    pub fn current(&self) -> Option<&(K, V)> {
        self.current.as_ref()
    }

    pub fn key(&self) -> Option<&K> {
        self.current.as_ref().map(|(key, _)| key)
    }

    fn load_next(&mut self) -> Result<(), StoreError> {
        let row = match self.range.as_mut().and_then(Iterator::next) {
            Some(row) => row.map_err(LmdbError::from)?,
            None => {
                self.range = None;
                self.current = None;
                return Ok(());
            }
        };
        let (key, value) = row;
        self.current = Some((K::from_bytes(key)?, V::decode_row(value, self.epoch)?));
        Ok(())
    }
}

impl<K: Decode, V: TableValue> Iterator for StoreIterator<'_, K, V> {
    type Item = Result<(K, V), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.error.take() {
            return Some(Err(err));
        }
        let item = self.current.take()?;
        if let Err(err) = self.load_next() {
            self.range = None;
            self.error = Some(err);
        }
        Some(Ok(item))
    }
}

impl<K: PartialEq, V> PartialEq for StoreIterator<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.current.as_ref().map(|(k, _)| k) == other.current.as_ref().map(|(k, _)| k)
    }
}

/// Iteration over the two epoch sub-tables of one entity as a single
/// ordered keyspace.
///
/// Sides are compared on the decoded key alone, never on the value. The
/// smaller key is emitted first; on a tie the epoch-0 row is emitted and
/// both sides move past the key.
pub struct MergedIterator<'txn, K, V> {
    v0: StoreIterator<'txn, K, V>,
    v1: StoreIterator<'txn, K, V>,
}

impl<'txn, K: Decode + Ord, V: TableValue> MergedIterator<'txn, K, V> {
    pub(crate) fn begin(
        txn: &'txn RoTxn<'_>,
        v0: Table,
        v1: Table,
        start: Option<&[u8]>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            v0: StoreIterator::begin(txn, v0, start, Epoch::Epoch0)?,
            v1: StoreIterator::begin(txn, v1, start, Epoch::Epoch1)?,
        })
    }

    pub fn end() -> Self {
        Self {
            v0: StoreIterator::end(),
            v1: StoreIterator::end(),
        }
    }

    fn order(&self) -> Option<Ordering> {
        match (self.v0.key(), self.v1.key()) {
            (None, None) => None,
            (Some(_), None) => Some(Ordering::Less),
            (None, Some(_)) => Some(Ordering::Greater),
            (Some(a), Some(b)) => Some(a.cmp(b)),
        }
    }

    /// The row the next call to `next` yields.
    pub fn current(&self) -> Option<&(K, V)> {
        match self.order()? {
            Ordering::Greater => self.v1.current(),
            Ordering::Less | Ordering::Equal => self.v0.current(),
        }
    }

    pub fn key(&self) -> Option<&K> {
        self.current().map(|(key, _)| key)
    }
}

impl<K: Decode + Ord, V: TableValue> Iterator for MergedIterator<'_, K, V> {
    type Item = Result<(K, V), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        // A side that failed to load its next row reports before any more
        // rows from the other side.
        if let Some(err) = self.v0.error.take().or_else(|| self.v1.error.take()) {
            return Some(Err(err));
        }
        match self.order() {
            None => self.v0.next().or_else(|| self.v1.next()),
            Some(Ordering::Less) => self.v0.next(),
            Some(Ordering::Greater) => self.v1.next(),
            Some(Ordering::Equal) => {
                if let Some(Err(err)) = self.v1.next() {
                    return Some(Err(err));
                }
                self.v0.next()
            }
        }
    }
}

impl<K: Decode + Ord, V: TableValue> PartialEq for MergedIterator<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
