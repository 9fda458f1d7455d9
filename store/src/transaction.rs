//! Transaction handle trait.

/// A scoped read or read-write view of the store.
///
/// Every store operation takes one. Reads accept either kind; mutations
/// require `is_write()` and fail with `StoreError::ReadOnlyTransaction`
/// otherwise.
pub trait Transaction {
    fn is_write(&self) -> bool;
}
