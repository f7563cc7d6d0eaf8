//! B+Tree set with pluggable leaf storage
//!
//! ## Design Principles
//! - **Set semantics**: elements are their own keys; adding an element equal to a
//!   stored one replaces it, so lookups return the most recently added object.
//! - **Pluggable leaves**: leaves hold any [`Storage`]; internal pages always use a
//!   [`SortedArraySet`] of routing entries.
//! - **Grow at the root**: a split that reaches the root is the only way the tree
//!   gets taller, so all leaves stay at the same depth.
//!
//! ## Root promotion
//! ```text
//! before:  root = [a b c ... p]            (full leaf, add q)
//! after:   root = [ (Unbounded, L) | (i, R) ]
//!                     L = [a .. h]   R = [i .. p q]
//! ```

use super::page::{Entry, Internal, Leaf, LowerBound, Page};
use super::sorted_array::SortedArraySet;
use super::storage::Storage;
use crate::Result;
use log::debug;

/// Ordered set over a B+Tree
///
/// `S` is the leaf storage; the default is the in-memory [`SortedArraySet`].
/// Use [`BTreeSet::with_storage`] to start from another backend such as
/// [`FileBackedStorage`](crate::storage::FileBackedStorage); leaves created by
/// splits come from [`Storage::split`] of that backend.
pub struct BTreeSet<E, S = SortedArraySet<E>> {
    root: Page<E, S>,
}

impl<E: Ord + Clone> BTreeSet<E> {
    /// Create an empty set with in-memory leaves
    pub fn new() -> Self {
        Self::with_storage(SortedArraySet::new())
    }
}

impl<E: Ord + Clone> Default for BTreeSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Ord + Clone, S: Storage<E>> BTreeSet<E, S> {
    /// Create a set whose first leaf is `storage`
    pub fn with_storage(storage: S) -> Self {
        Self {
            root: Page::Leaf(Leaf::new(storage)),
        }
    }

    /// Add `e`, replacing an equal element if one exists
    ///
    /// # Errors
    /// Propagates storage failures (e.g. spilling a leaf to disk) and
    /// `InvariantViolation` if the tree structure is found to be broken.
    pub fn add(&mut self, e: E) -> Result<()> {
        let Some(split) = self.root.add(e)? else {
            return Ok(());
        };

        // The root is a leaf for the first splits and has no meaningful lower bound
        let lower = match &self.root {
            Page::Internal(internal) => internal.lower_bound(),
            Page::Leaf(_) => LowerBound::Unbounded,
        };

        let old_root = std::mem::replace(&mut self.root, Page::Internal(Internal::new()));
        self.root = Page::Internal(Internal::promote(Entry::new(lower, old_root), split));
        debug!("root promoted, height now {}", self.height());

        Ok(())
    }

    /// Stored element equal to `key`, if any
    pub fn get(&self, key: &E) -> Result<Option<E>> {
        self.root.get(key)
    }

    /// Whether an element equal to `key` is stored
    ///
    /// Answered by the leaf storage, so it inherits that storage's contract
    /// (see [`FileBackedStorage`](crate::storage::FileBackedStorage) for a
    /// weaker one).
    pub fn contains(&self, key: &E) -> Result<bool> {
        self.root.contains(key)
    }

    /// Number of page levels, 1 for a lone leaf
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut page = &self.root;
        while let Page::Internal(internal) = page {
            match internal.entries().first() {
                Some(entry) => page = entry.page(),
                None => break,
            }
            height += 1;
        }
        height
    }

    /// Walk the whole tree and verify its structural invariants
    ///
    /// Checks that every bounded entry key equals the lowest key of its child,
    /// that `Unbounded` only appears on the leftmost spine, that entries are
    /// ordered, and that every leaf sits at the same depth.
    pub fn check_invariants(&self) -> Result<()> {
        self.root.check(true).map(|_| ())
    }

    /// Storage of the root page while the tree is still a single leaf
    pub fn root_storage(&self) -> Option<&S> {
        match &self.root {
            Page::Leaf(leaf) => Some(leaf.storage()),
            Page::Internal(_) => None,
        }
    }
}
