//! Fixed-capacity sorted array
//!
//! The default container for both leaf and internal pages. Holds at most
//! [`M`] elements, compact and ordered, and splits with a bias toward the side
//! that receives the new element:
//!
//! ```text
//! full, M = 16, mid = 8, new element at insertion index idx
//!
//!   idx <= mid:  [0..8) + e  |  [8..16)        9 | 8
//!   idx >  mid:  [0..8)      |  [8..16) + e    8 | 9
//! ```

use super::storage::Storage;
use super::{HALF_M, M};
use crate::{IndexError, Result};
use std::cmp::Ordering;

/// Ordered set of at most [`M`] elements
#[derive(Debug, Clone)]
pub struct SortedArraySet<T> {
    items: Vec<T>,
}

impl<T> SortedArraySet<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(M),
        }
    }

    /// Two-element set for root promotion; `lower` must sort before `upper`
    pub(crate) fn pair(lower: T, upper: T) -> Self {
        let mut items = Vec::with_capacity(M);
        items.push(lower);
        items.push(upper);
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        M
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == M
    }

    pub fn get_at(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub(crate) fn get_at_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.items.get_mut(idx)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Binary search with a caller-supplied comparison
    ///
    /// `Ok(idx)` if an element compares equal, `Err(insertion_point)` otherwise.
    pub fn find_by<F>(&self, f: F) -> std::result::Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.items.binary_search_by(f)
    }
}

impl<T: Ord> SortedArraySet<T> {
    pub fn find(&self, e: &T) -> std::result::Result<usize, usize> {
        self.items.binary_search(e)
    }

    /// Insert `e`, overwriting an equal element in place
    ///
    /// # Errors
    /// `InvalidArgument` if `e` is a new element and the set is full.
    pub fn insert(&mut self, e: T) -> Result<()> {
        match self.find(&e) {
            Ok(idx) => {
                self.items[idx] = e;
                Ok(())
            }
            Err(_) if self.is_full() => Err(IndexError::InvalidArgument(format!(
                "insert into full sorted array (capacity {})",
                M
            ))),
            Err(idx) => {
                self.items.insert(idx, e);
                Ok(())
            }
        }
    }

    /// Split a full set and insert `e` into the half it belongs to
    ///
    /// `self` keeps the lower `mid` elements and the returned set holds the
    /// rest; `e` goes left when its insertion index is at most `mid`.
    pub fn split(&mut self, e: T) -> Result<Self> {
        if !self.is_full() {
            return Err(IndexError::InvalidArgument(format!(
                "split of a non-full sorted array ({} of {})",
                self.len(),
                M
            )));
        }

        let idx = match self.find(&e) {
            Ok(idx) | Err(idx) => idx,
        };

        let mut other = Self::new();
        other.items.extend(self.items.drain(HALF_M..));

        if idx <= HALF_M {
            self.insert(e)?;
        } else {
            other.insert(e)?;
        }

        Ok(other)
    }
}

impl<T> Default for SortedArraySet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Ord + Clone> Storage<E> for SortedArraySet<E> {
    fn is_full(&self) -> bool {
        SortedArraySet::is_full(self)
    }

    fn insert(&mut self, e: E) -> Result<()> {
        SortedArraySet::insert(self, e)
    }

    fn split(&mut self, e: E) -> Result<Self> {
        SortedArraySet::split(self, e)
    }

    fn lowest(&self) -> Option<&E> {
        self.first()
    }

    fn get(&self, e: &E) -> Result<Option<E>> {
        Ok(self.find(e).ok().map(|idx| self.items[idx].clone()))
    }

    fn contains(&self, e: &E) -> Result<bool> {
        Ok(self.find(e).is_ok())
    }
}
