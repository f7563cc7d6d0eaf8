//! B+Tree pages
//!
//! ## Structure
//! ```text
//! Internal: [ (Unbounded, p0) | (k1, p1) | (k2, p2) | ... ]   at most M entries
//!              ↓                  ↓
//! Leaf:     [ Storage<E> ]      [ Storage<E> ]               data lives here
//! ```
//!
//! Each entry owns its child page. A bounded entry key always equals the lowest
//! key reachable through its child; only the leftmost spine of the tree carries
//! [`LowerBound::Unbounded`].

use super::sorted_array::SortedArraySet;
use super::storage::Storage;
use crate::{IndexError, Result};
use std::cmp::Ordering;
use std::marker::PhantomData;

/// Lower bound of the key range routed to a child page
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LowerBound<E> {
    /// Below every key; used for the first child of the leftmost pages
    Unbounded,
    Bounded(E),
}

impl<E: Ord> LowerBound<E> {
    /// Compare this bound against an element
    pub fn cmp_element(&self, e: &E) -> Ordering {
        match self {
            LowerBound::Unbounded => Ordering::Less,
            LowerBound::Bounded(key) => key.cmp(e),
        }
    }
}

/// Routing entry of an internal page
pub(crate) struct Entry<E, S> {
    key: LowerBound<E>,
    page: Page<E, S>,
}

impl<E: Ord, S> Entry<E, S> {
    pub(crate) fn new(key: LowerBound<E>, page: Page<E, S>) -> Self {
        Self { key, page }
    }

    pub(crate) fn key(&self) -> &LowerBound<E> {
        &self.key
    }

    pub(crate) fn page(&self) -> &Page<E, S> {
        &self.page
    }

    /// Replace the key with an equal one (the most recently added element)
    ///
    /// # Errors
    /// `InvariantViolation` if `key` does not compare equal to the current key.
    pub(crate) fn set_key(&mut self, key: E) -> Result<()> {
        if self.key.cmp_element(&key) != Ordering::Equal {
            return Err(IndexError::InvariantViolation(
                "entry key replaced with a non-equal key".into(),
            ));
        }
        self.key = LowerBound::Bounded(key);
        Ok(())
    }
}

impl<E: Ord, S> PartialEq for Entry<E, S> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<E: Ord, S> Eq for Entry<E, S> {}

impl<E: Ord, S> PartialOrd for Entry<E, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: Ord, S> Ord for Entry<E, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Tree node: routing or data
pub(crate) enum Page<E, S> {
    Internal(Internal<E, S>),
    Leaf(Leaf<E, S>),
}

impl<E: Ord + Clone, S: Storage<E>> Page<E, S> {
    /// Add `e` below this page
    ///
    /// Returns the entry for a new right sibling if this page had to split.
    pub(crate) fn add(&mut self, e: E) -> Result<Option<Entry<E, S>>> {
        match self {
            Page::Internal(internal) => internal.add(e),
            Page::Leaf(leaf) => leaf.add(e),
        }
    }

    pub(crate) fn get(&self, key: &E) -> Result<Option<E>> {
        match self {
            Page::Internal(internal) => match internal.route(key) {
                Some(child) => child.get(key),
                None => Ok(None),
            },
            Page::Leaf(leaf) => leaf.storage.get(key),
        }
    }

    pub(crate) fn contains(&self, key: &E) -> Result<bool> {
        match self {
            Page::Internal(internal) => match internal.route(key) {
                Some(child) => child.contains(key),
                None => Ok(false),
            },
            Page::Leaf(leaf) => leaf.storage.contains(key),
        }
    }

    /// Lowest element reachable from this page
    pub(crate) fn lowest(&self) -> Option<&E> {
        match self {
            Page::Internal(internal) => internal.entries.first().and_then(|entry| entry.page.lowest()),
            Page::Leaf(leaf) => leaf.storage.lowest(),
        }
    }

    /// Verify entry keys and leaf depth below this page, returning the depth
    pub(crate) fn check(&self, leftmost: bool) -> Result<usize> {
        let internal = match self {
            Page::Leaf(_) => return Ok(1),
            Page::Internal(internal) => internal,
        };

        if internal.entries.len() < 2 {
            return Err(IndexError::InvariantViolation(format!(
                "internal page with {} entries",
                internal.entries.len()
            )));
        }

        let mut depth = None;
        let mut previous: Option<&LowerBound<E>> = None;
        for (idx, entry) in internal.entries.iter().enumerate() {
            match &entry.key {
                LowerBound::Unbounded if !(leftmost && idx == 0) => {
                    return Err(IndexError::InvariantViolation(
                        "unbounded key outside the leftmost spine".into(),
                    ));
                }
                LowerBound::Unbounded => {}
                LowerBound::Bounded(key) => {
                    if entry.page.lowest() != Some(key) {
                        return Err(IndexError::InvariantViolation(
                            "entry key differs from its child's lowest key".into(),
                        ));
                    }
                }
            }

            if previous.is_some_and(|prev| prev >= &entry.key) {
                return Err(IndexError::InvariantViolation("entries out of order".into()));
            }
            previous = Some(&entry.key);

            let child_depth = entry.page.check(leftmost && idx == 0)?;
            match depth {
                None => depth = Some(child_depth),
                Some(d) if d != child_depth => {
                    return Err(IndexError::InvariantViolation(format!(
                        "leaves at depths {} and {}",
                        d + 1,
                        child_depth + 1
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(depth.unwrap_or(0) + 1)
    }
}

/// Routing page: ordered entries, each owning one child
pub(crate) struct Internal<E, S> {
    entries: SortedArraySet<Entry<E, S>>,
}

impl<E: Ord + Clone, S: Storage<E>> Internal<E, S> {
    pub(crate) fn new() -> Self {
        Self {
            entries: SortedArraySet::new(),
        }
    }

    /// New root over exactly two children
    pub(crate) fn promote(lower: Entry<E, S>, upper: Entry<E, S>) -> Self {
        debug_assert!(lower < upper);
        Self {
            entries: SortedArraySet::pair(lower, upper),
        }
    }

    /// Key of the first entry, the lower bound of this whole page
    pub(crate) fn lower_bound(&self) -> LowerBound<E> {
        self.entries
            .first()
            .map(|entry| entry.key().clone())
            .unwrap_or(LowerBound::Unbounded)
    }

    pub(crate) fn entries(&self) -> &SortedArraySet<Entry<E, S>> {
        &self.entries
    }

    /// Child owning the range that contains `key`
    fn route(&self, key: &E) -> Option<&Page<E, S>> {
        let idx = match self.entries.find_by(|entry| entry.key.cmp_element(key)) {
            Ok(idx) => idx,
            Err(0) => return None,
            Err(idx) => idx - 1,
        };
        self.entries.get_at(idx).map(|entry| &entry.page)
    }

    fn add(&mut self, e: E) -> Result<Option<Entry<E, S>>> {
        // Rightmost entry whose key is <= e
        let idx = match self.entries.find_by(|entry| entry.key.cmp_element(&e)) {
            Ok(idx) => {
                if let Some(entry) = self.entries.get_at_mut(idx) {
                    entry.set_key(e.clone())?;
                }
                idx
            }
            Err(0) => {
                return Err(IndexError::InvariantViolation(
                    "element below the lower bound of its page".into(),
                ))
            }
            Err(idx) => idx - 1,
        };

        let split = match self.entries.get_at_mut(idx) {
            Some(entry) => entry.page.add(e)?,
            None => return Err(IndexError::InvariantViolation("routing index out of range".into())),
        };
        let Some(split) = split else {
            return Ok(None);
        };

        if !self.entries.is_full() {
            self.entries.insert(split)?;
            return Ok(None);
        }

        let upper = self.entries.split(split)?;
        let key = upper
            .first()
            .map(|entry| entry.key.clone())
            .ok_or_else(|| IndexError::InvariantViolation("empty internal split".into()))?;
        log::debug!(
            "internal page split {} | {}",
            self.entries.len(),
            upper.len()
        );

        Ok(Some(Entry::new(key, Page::Internal(Internal { entries: upper }))))
    }
}

/// Data page: delegates to its storage
pub(crate) struct Leaf<E, S> {
    storage: S,
    _marker: PhantomData<E>,
}

impl<E: Ord + Clone, S: Storage<E>> Leaf<E, S> {
    pub(crate) fn new(storage: S) -> Self {
        Self {
            storage,
            _marker: PhantomData,
        }
    }

    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    fn add(&mut self, e: E) -> Result<Option<Entry<E, S>>> {
        // Not full, or an overwrite that needs no room
        if !self.storage.is_full() || self.storage.contains(&e)? {
            self.storage.insert(e)?;
            return Ok(None);
        }

        let upper = self.storage.split(e)?;
        let key = upper
            .lowest()
            .cloned()
            .ok_or_else(|| IndexError::InvariantViolation("empty leaf split".into()))?;
        log::debug!("leaf split");

        Ok(Some(Entry::new(
            LowerBound::Bounded(key),
            Page::Leaf(Leaf::new(upper)),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type IntPage = Page<i32, SortedArraySet<i32>>;

    fn leaf_with(values: &[i32]) -> IntPage {
        let mut storage = SortedArraySet::new();
        for &v in values {
            storage.insert(v).unwrap();
        }
        Page::Leaf(Leaf::new(storage))
    }

    #[test]
    fn test_unbounded_sorts_first() {
        assert!(LowerBound::Unbounded < LowerBound::Bounded(i32::MIN));
        assert_eq!(LowerBound::<i32>::Unbounded.cmp_element(&i32::MIN), Ordering::Less);
        assert_eq!(LowerBound::Bounded(3).cmp_element(&3), Ordering::Equal);
    }

    #[test]
    fn test_set_key_accepts_equal() {
        let mut entry = Entry::new(LowerBound::Bounded(5), leaf_with(&[5]));
        assert!(entry.set_key(5).is_ok());
        assert_eq!(entry.key(), &LowerBound::Bounded(5));
    }

    #[test]
    fn test_set_key_rejects_different() {
        let mut entry = Entry::new(LowerBound::Bounded(i32::MIN), leaf_with(&[i32::MIN]));
        let result = entry.set_key(0);
        assert!(matches!(result, Err(IndexError::InvariantViolation(_))));
        assert_eq!(entry.key(), &LowerBound::Bounded(i32::MIN));
    }

    #[test]
    fn test_set_key_rejects_unbounded() {
        let mut entry = Entry::new(LowerBound::Unbounded, leaf_with(&[]));
        assert!(entry.set_key(1).is_err());
    }

    #[test]
    fn test_route_below_first_key() {
        let internal = Internal::promote(
            Entry::new(LowerBound::Bounded(10), leaf_with(&[10, 11])),
            Entry::new(LowerBound::Bounded(20), leaf_with(&[20, 21])),
        );
        let page: IntPage = Page::Internal(internal);

        assert_eq!(page.get(&5).unwrap(), None);
        assert_eq!(page.get(&11).unwrap(), Some(11));
        assert_eq!(page.get(&21).unwrap(), Some(21));
        assert!(!page.contains(&15).unwrap());
        assert_eq!(page.lowest(), Some(&10));
    }

    #[test]
    fn test_leaf_split_returns_upper_entry() {
        let values: Vec<i32> = (0..16).collect();
        let mut page = leaf_with(&values);

        let split = page.add(100).unwrap().expect("full leaf must split");
        assert_eq!(split.key(), &LowerBound::Bounded(8));
        assert_eq!(split.page().get(&100).unwrap(), Some(100));
        assert_eq!(page.get(&7).unwrap(), Some(7));
        assert_eq!(page.get(&8).unwrap(), None);
    }

    #[test]
    fn test_full_leaf_overwrite_does_not_split() {
        let values: Vec<i32> = (0..16).collect();
        let mut page = leaf_with(&values);
        assert!(page.add(3).unwrap().is_none());
    }

    #[test]
    fn test_check_detects_wrong_key() {
        let internal = Internal::promote(
            Entry::new(LowerBound::Unbounded, leaf_with(&[1, 2])),
            Entry::new(LowerBound::Bounded(9), leaf_with(&[10, 11])),
        );
        let page: IntPage = Page::Internal(internal);
        assert!(matches!(page.check(true), Err(IndexError::InvariantViolation(_))));
    }

    #[test]
    fn test_check_detects_stray_unbounded() {
        let internal = Internal::promote(
            Entry::new(LowerBound::Unbounded, leaf_with(&[1, 2])),
            Entry::new(LowerBound::Bounded(10), leaf_with(&[10, 11])),
        );
        let page: IntPage = Page::Internal(internal);
        assert_eq!(page.check(true).unwrap(), 2);
        assert!(page.check(false).is_err());
    }
}
