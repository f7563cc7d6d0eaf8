//! Reference tables
//!
//! A reference table is an append-only list of entities looked up by id. Puts
//! are cheap appends; the first lookup after any put sorts the whole list and
//! binary-searches it, and the table stays sorted until the next put. Sorting is
//! never incremental.
//!
//! If the same id is put twice between sorts, the sort keeps only the most
//! recently put element.

use crate::types::Entity;
use crate::Result;
use std::cell::{Cell, RefCell};

/// Append-then-lazy-sort table keyed by entity id
///
/// Implementors provide access to the backing list and the sorted flag; the
/// lookup algorithm is shared.
pub trait RefTable<E: Entity + Clone> {
    /// Run `f` on the backing list
    fn with_values<R>(&self, f: impl FnOnce(&mut Vec<E>) -> R) -> Result<R>;

    /// Flag recording whether the backing list is currently sorted
    fn sorted_flag(&self) -> &Cell<bool>;

    /// Number of stored elements (duplicates not yet collapsed by a sort included)
    fn len(&self) -> Result<usize> {
        self.with_values(|values| values.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn is_sorted(&self) -> bool {
        self.sorted_flag().get()
    }

    /// Append `value`
    fn put(&self, value: E) -> Result<()> {
        self.sorted_flag().set(false);
        self.with_values(|values| values.push(value))
    }

    /// Sort now instead of on the next lookup, collapsing repeated ids
    fn ensure_sorted(&self) -> Result<()> {
        let sorted = self.sorted_flag();
        if sorted.get() {
            return Ok(());
        }
        self.with_values(sort_latest_wins)?;
        sorted.set(true);
        Ok(())
    }

    /// Element with the given id, sorting the table first if needed
    fn get(&self, id: i64) -> Result<Option<E>> {
        self.ensure_sorted()?;
        self.with_values(|values| {
            values
                .binary_search_by_key(&id, |e| e.id())
                .ok()
                .map(|idx| values[idx].clone())
        })
    }
}

/// Stable sort by id, then collapse equal ids keeping the last one put
pub(crate) fn sort_latest_wins<E: Ord>(values: &mut Vec<E>) {
    values.sort();
    // `later` is removed; move its value into the retained slot first
    values.dedup_by(|later, earlier| {
        if later == earlier {
            std::mem::swap(later, earlier);
            true
        } else {
            false
        }
    });
}

/// In-memory reference table
#[derive(Debug)]
pub struct VecRefTable<E> {
    values: RefCell<Vec<E>>,
    sorted: Cell<bool>,
}

impl<E> VecRefTable<E> {
    pub fn new() -> Self {
        Self {
            values: RefCell::new(Vec::new()),
            sorted: Cell::new(false),
        }
    }

    /// Snapshot of the stored elements in their current order
    pub fn to_vec(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.values.borrow().clone()
    }
}

impl<E> Default for VecRefTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity + Clone> RefTable<E> for VecRefTable<E> {
    fn with_values<R>(&self, f: impl FnOnce(&mut Vec<E>) -> R) -> Result<R> {
        Ok(f(&mut self.values.borrow_mut()))
    }

    fn sorted_flag(&self) -> &Cell<bool> {
        &self.sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_entity_ord;

    #[derive(Debug, Clone)]
    struct Row {
        id: i64,
        label: &'static str,
    }

    impl Entity for Row {
        fn id(&self) -> i64 {
            self.id
        }
    }
    impl_entity_ord!(Row);

    fn row(id: i64, label: &'static str) -> Row {
        Row { id, label }
    }

    #[test]
    fn test_put_then_get() {
        let table = VecRefTable::new();
        for id in [5, 3, 9, 1] {
            table.put(row(id, "x")).unwrap();
        }

        assert!(!table.is_sorted());
        assert_eq!(table.get(9).unwrap().map(|r| r.id), Some(9));
        assert!(table.is_sorted());
        assert!(table.get(4).unwrap().is_none());
        assert_eq!(table.len().unwrap(), 4);
    }

    #[test]
    fn test_put_marks_unsorted() {
        let table = VecRefTable::new();
        table.put(row(2, "a")).unwrap();
        table.get(2).unwrap();
        assert!(table.is_sorted());

        table.put(row(1, "b")).unwrap();
        assert!(!table.is_sorted());
        assert_eq!(table.get(1).unwrap().map(|r| r.label), Some("b"));
    }

    #[test]
    fn test_sort_keeps_latest_duplicate() {
        let table = VecRefTable::new();
        table.put(row(1, "old")).unwrap();
        table.put(row(2, "two")).unwrap();
        table.put(row(1, "mid")).unwrap();
        table.put(row(1, "new")).unwrap();

        assert_eq!(table.get(1).unwrap().map(|r| r.label), Some("new"));
        assert_eq!(table.len().unwrap(), 2);
    }

    #[test]
    fn test_ensure_sorted_collapses_duplicates() {
        let table = VecRefTable::new();
        for label in ["a", "b", "c"] {
            table.put(row(4, label)).unwrap();
        }
        assert_eq!(table.len().unwrap(), 3);

        table.ensure_sorted().unwrap();
        assert!(table.is_sorted());
        assert_eq!(table.len().unwrap(), 1);
        assert_eq!(table.to_vec()[0].label, "c");
    }

    #[test]
    fn test_sort_latest_wins_plain_values() {
        let mut values = vec![3i64, 1, 2, 1, 3];
        sort_latest_wins(&mut values);
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_table() {
        let table: VecRefTable<i64> = VecRefTable::new();
        assert!(table.is_empty().unwrap());
        assert_eq!(table.get(0).unwrap(), None);
        assert!(table.to_vec().is_empty());
    }
}
