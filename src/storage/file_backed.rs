//! Out-of-core leaf storage
//!
//! Each leaf owns a [`FileCacheRefTable`]; all leaves of one tree share the
//! [`LeafCache`] they were created from, so only a bounded number of leaves is
//! in memory at any time.
//!
//! Inserts append without sorting; repeated ids are collapsed once the table
//! reaches [`MAX_SIZE`]. A leaf splits once it holds [`MAX_SIZE`] distinct
//! elements: the median is found by quickselect, the upper half moves to a new
//! table on the same cache, and the pending element goes to whichever half its
//! key belongs to.

use super::file_cache::{FileCacheRefTable, LeafCache};
use super::ref_table::RefTable;
use super::select::select;
use crate::index::{BTreeSet, Storage};
use crate::types::Entity;
use crate::{IndexError, Result};
use ahash::AHashSet;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Elements per leaf before it splits
pub const MAX_SIZE: usize = 256;

/// Element that can be spilled to a temp file
pub trait SpillableEntity: Entity + Clone + Serialize + DeserializeOwned {}

impl<T: Entity + Clone + Serialize + DeserializeOwned> SpillableEntity for T {}

/// Leaf storage whose elements live in a file-backed reference table
pub struct FileBackedStorage<E> {
    table: FileCacheRefTable<E>,
    lowest: Option<E>,
}

impl<E: SpillableEntity> FileBackedStorage<E> {
    /// Empty leaf registered in `cache`
    pub fn new(cache: &LeafCache<E>) -> Result<Self> {
        Ok(Self {
            table: FileCacheRefTable::new(cache)?,
            lowest: None,
        })
    }
}

impl<E> FileBackedStorage<E> {
    /// Stored elements, counting duplicates not yet collapsed by a sort
    pub fn len(&self) -> usize {
        self.table.stored_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table(&self) -> &FileCacheRefTable<E> {
        &self.table
    }

    pub fn cache(&self) -> &LeafCache<E> {
        self.table.cache()
    }
}

/// Keep one element per id, the one put last; order is not preserved
fn dedup_latest_wins<E: Entity>(values: &mut Vec<E>) {
    let mut seen = AHashSet::with_capacity(values.len());
    let mut kept = Vec::with_capacity(values.len());
    for value in values.drain(..).rev() {
        if seen.insert(value.id()) {
            kept.push(value);
        }
    }
    *values = kept;
}

impl<E: SpillableEntity> Storage<E> for FileBackedStorage<E> {
    fn is_full(&self) -> bool {
        self.len() >= MAX_SIZE
    }

    fn insert(&mut self, e: E) -> Result<()> {
        if self.lowest.as_ref().map_or(true, |lowest| e <= *lowest) {
            self.lowest = Some(e.clone());
        }

        // Overwrite in place and keep the table sorted
        let pending = if self.table.is_sorted() {
            self.table.with_values(|values| match values.binary_search(&e) {
                Ok(idx) => {
                    values[idx] = e;
                    None
                }
                Err(_) => Some(e),
            })?
        } else {
            Some(e)
        };
        let Some(e) = pending else {
            return Ok(());
        };
        self.table.put(e)?;

        // Appends may repeat ids; only distinct ids count toward a full leaf
        if self.len() >= MAX_SIZE {
            self.table.ensure_sorted()?;
        }
        Ok(())
    }

    /// Move the upper half to a new leaf and insert `e` where it belongs
    ///
    /// The new leaf is registered before `self` is changed, and each half is
    /// rewritten in a single access, so a failed split leaves every element of
    /// `self` in place.
    fn split(&mut self, e: E) -> Result<Self> {
        let mut other = FileBackedStorage::new(self.cache())?;

        let sorted = self.table.is_sorted();
        let (mid, median, upper) = self.table.with_values(|values| -> Result<(usize, E, Vec<E>)> {
            if !sorted {
                dedup_latest_wins(values);
            }
            if values.len() < 2 {
                return Err(IndexError::InvalidArgument(format!(
                    "cannot split a leaf of {} elements",
                    values.len()
                )));
            }

            let mid = values.len() / 2;
            let median = select(values, mid)?.clone();
            Ok((mid, median, values[mid..].to_vec()))
        })??;
        // Reordered by quickselect
        self.table.mark_unsorted();

        let (left, right) = if e < median {
            (Some(e), None)
        } else {
            (None, Some(e))
        };

        let moved = upper.len();
        other.table.with_values(|values| {
            values.extend(upper);
            values.extend(right);
        })?;
        other.lowest = Some(median.clone());

        self.lowest = self.table.with_values(|values| {
            values.truncate(mid);
            values.extend(left);
            values.iter().min().cloned()
        })?;

        debug!(
            "file-backed leaf split {} | {} at id {}",
            self.len(),
            moved,
            median.id()
        );
        Ok(other)
    }

    fn lowest(&self) -> Option<&E> {
        self.lowest.as_ref()
    }

    fn get(&self, e: &E) -> Result<Option<E>> {
        self.table.get(e.id())
    }

    /// Whether `e` is stored, answered only when the table is already sorted
    ///
    /// An unsorted table reports `false` without sorting, even if `e` is
    /// present. Use [`Storage::get`] for an exact answer.
    fn contains(&self, e: &E) -> Result<bool> {
        if !self.table.is_sorted() {
            return Ok(false);
        }
        Ok(self.table.get(e.id())?.is_some())
    }
}

impl<E: SpillableEntity> BTreeSet<E, FileBackedStorage<E>> {
    /// Empty set whose leaves spill through `cache`
    pub fn file_backed(cache: &LeafCache<E>) -> Result<Self> {
        Ok(Self::with_storage(FileBackedStorage::new(cache)?))
    }
}
