//! Eviction-aware LRU cache
//!
//! Thin layer over [`lru::LruCache`] that adds two things the plain crate does
//! not offer:
//!
//! - **Eviction hooks**: every value that is pushed out by capacity pressure,
//!   by [`Cache::set_capacity`] or by [`Cache::clear`] gets its
//!   [`EvictionAware::on_evicted`] called exactly once, synchronously, right after
//!   it has been unlinked from the cache.
//! - **Fallible capacity changes**: a capacity of zero is rejected instead of
//!   being unrepresentable.
//!
//! The recency list is ordered front (most recent) to back (least recent);
//! `set` and `get` move the touched entry to the front, eviction always takes
//! the back.

use crate::{IndexError, Result};
use ahash::RandomState;
use lru::LruCache as RawLruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Default capacity for [`LruCache::default`]
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// A value that wants to know when a cache drops it
///
/// The hook receives the value after it has left the cache, so it is free to
/// persist itself. Errors are handed back to the caller of the cache operation
/// that caused the eviction.
pub trait EvictionAware {
    fn on_evicted(&mut self) -> Result<()> {
        Ok(())
    }
}

macro_rules! impl_noop_eviction {
    ($($ty:ty),* $(,)?) => {
        $(impl EvictionAware for $ty {})*
    };
}

impl_noop_eviction!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, bool, String, &'static str);

impl<T> EvictionAware for Vec<T> {}

/// Capacity-bounded key/value cache
pub trait Cache<K, V> {
    /// Number of resident entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Change the capacity, evicting least-recently-used entries if it shrinks
    ///
    /// Fails with `InvalidArgument` (leaving the cache untouched) if `capacity < 1`.
    fn set_capacity(&mut self, capacity: usize) -> Result<()>;

    /// Evict every entry
    fn clear(&mut self) -> Result<()>;

    /// Insert or update `key`, making it the most recently used entry
    fn set(&mut self, key: K, value: V) -> Result<()>;

    /// Look up `key`, making it the most recently used entry on a hit
    fn get(&mut self, key: &K) -> Option<&V>;
}

/// LRU cache with eviction hooks
pub struct LruCache<K, V> {
    inner: RawLruCache<K, V, RandomState>,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Create a new cache
    ///
    /// # Errors
    /// `InvalidArgument` if `capacity < 1`.
    pub fn new(capacity: usize) -> Result<Self> {
        let cap = non_zero(capacity)?;
        Ok(Self {
            inner: RawLruCache::with_hasher(cap, RandomState::new()),
        })
    }

    /// Mutable lookup; touches the entry like [`Cache::get`]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(key)
    }

    /// Presence test without touching the entry
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    /// Remove `key` without running its eviction hook
    ///
    /// Used by owners that are going away and have no use for the value anymore.
    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }
}

impl<K: Hash + Eq, V: EvictionAware> LruCache<K, V> {
    /// Pop entries from the back until at most `size` remain
    ///
    /// Every popped value is evicted even if an earlier hook failed; the first
    /// hook error is returned once the cache is back within `size`.
    fn ensure_size(&mut self, size: usize) -> Result<()> {
        let mut first_err = None;

        while self.inner.len() > size {
            let Some((_, mut evicted)) = self.inner.pop_lru() else {
                break;
            };
            if let Err(e) = evicted.on_evicted() {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<K: Hash + Eq, V> Default for LruCache<K, V> {
    fn default() -> Self {
        Self {
            inner: RawLruCache::with_hasher(
                NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
                RandomState::new(),
            ),
        }
    }
}

impl<K: Hash + Eq, V: EvictionAware> Cache<K, V> for LruCache<K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        let cap = non_zero(capacity)?;

        // Evict through the hooks first; `resize` would drop the values silently
        let result = self.ensure_size(capacity);
        self.inner.resize(cap);
        result
    }

    fn clear(&mut self) -> Result<()> {
        self.ensure_size(0)
    }

    fn set(&mut self, key: K, value: V) -> Result<()> {
        // Update existing
        if let Some(slot) = self.inner.get_mut(&key) {
            *slot = value;
            return Ok(());
        }

        // Add new; `push` hands back the displaced back entry when full
        match self.inner.push(key, value) {
            Some((_, mut evicted)) => evicted.on_evicted(),
            None => Ok(()),
        }
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }
}

fn non_zero(capacity: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(capacity)
        .ok_or_else(|| IndexError::InvalidArgument("capacity must be greater than 0".into()))
}
