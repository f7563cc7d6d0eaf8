//! File-backed reference tables sharing one LRU cache
//!
//! ## Layout
//! ```text
//! LeafCache (shared, capacity N)
//!   ├─ TableId(0) → ResidentList { values, path }   (in memory)
//!   ├─ TableId(3) → ResidentList { values, path }
//!   └─ ...                                          at most N resident
//!
//! FileCacheRefTable ─ id ─┐
//!                         └─ temp file: bincode(Vec<E>) of the last eviction
//! ```
//!
//! A table's list lives in the cache while resident. When the cache evicts it,
//! the list is written to the table's own temp file; the next access reads the
//! file back and re-admits the list, which may evict another table.
//!
//! The temp file is deleted when its table is dropped.

use super::ref_table::RefTable;
use crate::cache::{Cache, EvictionAware, LruCache};
use crate::config::IndexConfig;
use crate::types::Entity;
use crate::{IndexError, Result};
use log::{trace, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempPath;

/// Identity of a table inside its cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(u64);

#[derive(Debug, Default)]
struct Counters {
    hits: Cell<u64>,
    reloads: Cell<u64>,
    write_backs: Cell<u64>,
}

impl Counters {
    fn bump(counter: &Cell<u64>) {
        counter.set(counter.get() + 1);
    }
}

/// Snapshot of cache activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeafCacheStats {
    /// Accesses served from memory
    pub hits: u64,
    /// Accesses that had to read a temp file
    pub reloads: u64,
    /// Evictions written to a temp file
    pub write_backs: u64,
    /// Tables currently in memory
    pub resident: usize,
    pub capacity: usize,
}

/// In-memory list of one table, the value type of the cache
pub(crate) struct ResidentList<E> {
    values: Vec<E>,
    path: PathBuf,
    counters: Rc<Counters>,
}

impl<E: Serialize> EvictionAware for ResidentList<E> {
    fn on_evicted(&mut self) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &self.values)?;
        writer.flush()?;

        Counters::bump(&self.counters.write_backs);
        trace!("wrote {} values to {}", self.values.len(), self.path.display());
        Ok(())
    }
}

fn read_values<E: DeserializeOwned>(path: &Path) -> Result<Vec<E>> {
    let file = File::open(path)?;
    let values: Vec<E> = bincode::deserialize_from(BufReader::new(file))?;
    trace!("read {} values from {}", values.len(), path.display());
    Ok(values)
}

struct Shared<E> {
    lru: RefCell<LruCache<TableId, ResidentList<E>>>,
    next_id: Cell<u64>,
    counters: Rc<Counters>,
    /// Resident count and capacity as of the last cache access
    last_seen: Cell<(usize, usize)>,
    config: IndexConfig,
}

/// Handle to an LRU cache of table contents
///
/// Cloning the handle shares the cache. Every table created from the same
/// handle (directly or through a leaf split) competes for the same capacity.
/// The handle is single-threaded.
pub struct LeafCache<E> {
    shared: Rc<Shared<E>>,
}

impl<E> Clone for LeafCache<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<E> LeafCache<E> {
    /// Cache holding at most `capacity` tables in memory
    ///
    /// # Errors
    /// `InvalidArgument` if `capacity < 1`.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(&IndexConfig::default().with_leaf_cache_capacity(capacity))
    }

    pub fn with_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Rc::new(Shared {
                lru: RefCell::new(LruCache::new(config.leaf_cache_capacity)?),
                next_id: Cell::new(0),
                counters: Rc::new(Counters::default()),
                last_seen: Cell::new((0, config.leaf_cache_capacity)),
                config: config.clone(),
            }),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.shared.config
    }

    /// Create an empty temp file for a new table
    fn create_temp_file(&self) -> Result<TempPath> {
        let config = &self.shared.config;
        let mut builder = tempfile::Builder::new();
        builder.prefix(&config.temp_file_prefix).suffix(".bin");

        let file = match &config.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file.into_temp_path())
    }

    fn lru(&self) -> Result<std::cell::RefMut<'_, LruCache<TableId, ResidentList<E>>>> {
        self.shared
            .lru
            .try_borrow_mut()
            .map_err(|_| IndexError::InvariantViolation("leaf cache accessed re-entrantly".into()))
    }

    /// Drop a table's resident list without writing it back
    fn forget(&self, id: TableId) {
        match self.shared.lru.try_borrow_mut() {
            Ok(mut lru) => {
                if lru.invalidate(&id).is_some() {
                    let (resident, capacity) = self.shared.last_seen.get();
                    self.shared.last_seen.set((resident.saturating_sub(1), capacity));
                }
            }
            Err(_) => warn!("leaf cache busy, table {:?} stays registered", id),
        }
    }
}

impl<E: Serialize + DeserializeOwned> LeafCache<E> {
    fn remember(&self, lru: &LruCache<TableId, ResidentList<E>>) {
        self.shared.last_seen.set((lru.len(), lru.capacity()));
    }

    /// Register a new, empty table whose list is persisted at `path`
    fn register(&self, path: PathBuf) -> Result<TableId> {
        let id = TableId(self.shared.next_id.get());
        self.shared.next_id.set(id.0 + 1);

        let list = ResidentList {
            values: Vec::new(),
            path,
            counters: Rc::clone(&self.shared.counters),
        };
        let mut lru = self.lru()?;
        if let Err(e) = lru.set(id, list) {
            lru.invalidate(&id);
            self.remember(&lru);
            return Err(e);
        }
        self.remember(&lru);
        Ok(id)
    }

    /// Run `f` on the list of table `id`, reading it from `path` if it was evicted
    fn with_resident<R>(
        &self,
        id: TableId,
        path: &Path,
        f: impl FnOnce(&mut Vec<E>) -> R,
    ) -> Result<R> {
        let counters = &self.shared.counters;
        let mut lru = self.lru()?;

        let admitted = if lru.contains(&id) {
            Counters::bump(&counters.hits);
            Ok(())
        } else {
            let values = read_values(path)?;
            Counters::bump(&counters.reloads);
            lru.set(
                id,
                ResidentList {
                    values,
                    path: path.to_path_buf(),
                    counters: Rc::clone(counters),
                },
            )
        };
        self.remember(&lru);
        admitted?;

        let list = lru
            .get_mut(&id)
            .ok_or_else(|| IndexError::InvariantViolation(format!("table {:?} not resident", id)))?;
        Ok(f(&mut list.values))
    }

    /// Change how many tables may be resident, writing back any excess
    pub fn set_capacity(&self, capacity: usize) -> Result<()> {
        let mut lru = self.lru()?;
        let result = lru.set_capacity(capacity);
        self.remember(&lru);
        result
    }

    /// Write every resident table to its file and empty the cache
    pub fn flush(&self) -> Result<()> {
        let mut lru = self.lru()?;
        let result = lru.clear();
        self.remember(&lru);
        result
    }

    /// Activity counters and occupancy
    ///
    /// Called while a table is being accessed (from inside
    /// [`RefTable::with_values`]), `resident` and `capacity` are the values
    /// recorded by the last completed cache access.
    pub fn stats(&self) -> LeafCacheStats {
        let counters = &self.shared.counters;
        let (resident, capacity) = match self.shared.lru.try_borrow() {
            Ok(lru) => (lru.len(), lru.capacity()),
            Err(_) => self.shared.last_seen.get(),
        };
        LeafCacheStats {
            hits: counters.hits.get(),
            reloads: counters.reloads.get(),
            write_backs: counters.write_backs.get(),
            resident,
            capacity,
        }
    }
}

/// Reference table whose list lives in a [`LeafCache`] and spills to a temp file
pub struct FileCacheRefTable<E> {
    id: TableId,
    path: TempPath,
    cache: LeafCache<E>,
    sorted: Cell<bool>,
    len: Cell<usize>,
}

impl<E: Serialize + DeserializeOwned> FileCacheRefTable<E> {
    /// Create an empty table registered in `cache`
    ///
    /// # Errors
    /// `Io` if the temp file cannot be created, or any write-back error of the
    /// table this one displaced from the cache.
    pub fn new(cache: &LeafCache<E>) -> Result<Self> {
        let path = cache.create_temp_file()?;
        let id = cache.register(path.to_path_buf())?;
        Ok(Self {
            id,
            path,
            cache: cache.clone(),
            sorted: Cell::new(false),
            len: Cell::new(0),
        })
    }
}

impl<E> FileCacheRefTable<E> {
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Temp file holding the list while evicted
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cache(&self) -> &LeafCache<E> {
        &self.cache
    }

    /// Length as of the last access, without touching the cache
    pub fn stored_len(&self) -> usize {
        self.len.get()
    }

    /// Force the next lookup to sort again
    pub(crate) fn mark_unsorted(&self) {
        self.sorted.set(false);
    }
}

impl<E: Entity + Clone + Serialize + DeserializeOwned> RefTable<E> for FileCacheRefTable<E> {
    fn with_values<R>(&self, f: impl FnOnce(&mut Vec<E>) -> R) -> Result<R> {
        let len = &self.len;
        self.cache.with_resident(self.id, &self.path, |values| {
            let out = f(values);
            len.set(values.len());
            out
        })
    }

    fn sorted_flag(&self) -> &Cell<bool> {
        &self.sorted
    }

    fn len(&self) -> Result<usize> {
        Ok(self.len.get())
    }
}

impl<E> Drop for FileCacheRefTable<E> {
    fn drop(&mut self) {
        // The temp file itself goes with `self.path`
        self.cache.forget(self.id);
    }
}
