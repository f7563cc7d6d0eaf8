//! Leaf storage capability
//!
//! A leaf page never touches its elements directly; it goes through a
//! [`Storage`]. That is what lets the same tree run over a bounded in-memory
//! array ([`SortedArraySet`](super::SortedArraySet)) or over out-of-core
//! storage that spills to disk
//! ([`FileBackedStorage`](crate::storage::FileBackedStorage)).

use crate::Result;

/// Ordered container backing a leaf page
///
/// Elements are kept ordered by key without duplicates; inserting an element
/// whose key is already present replaces the stored element.
pub trait Storage<E>: Sized {
    /// Whether the next insert of a new key requires a split
    fn is_full(&self) -> bool;

    /// Insert `e`, overwriting an element with an equal key
    fn insert(&mut self, e: E) -> Result<()>;

    /// Partition `self` in two and insert `e` into the half it belongs to
    ///
    /// `self` keeps the lower half and the upper half is returned, so every
    /// key left in `self` is below every key in the returned storage. The
    /// split is destructive: implementations may reorder `self` arbitrarily
    /// while choosing the split point, since it is being partitioned anyway.
    /// Both halves are non-full afterwards.
    fn split(&mut self, e: E) -> Result<Self>;

    /// Lowest element, `None` while empty
    fn lowest(&self) -> Option<&E>;

    /// Stored element comparing equal to `e`
    fn get(&self, e: &E) -> Result<Option<E>>;

    /// Whether an element comparing equal to `e` is stored
    fn contains(&self, e: &E) -> Result<bool> {
        Ok(self.get(e)?.is_some())
    }
}
