//! mapindex
//!
//! Ordered indexes for map data that may not fit in memory.
//!
//! ## Components
//! - B+Tree set with pluggable leaf storage (`index`)
//! - Eviction-aware LRU cache (`cache`)
//! - File-backed leaves that spill to temp files through a shared cache (`storage`)
//! - OSM node tables fed by a reader observer (`osm`)
//!
//! ```
//! use mapindex::{BTreeSet, LeafCache};
//!
//! let cache = LeafCache::new(4)?;
//! let mut set = BTreeSet::file_backed(&cache)?;
//! for id in 0..1000i64 {
//!     set.add(id)?;
//! }
//! assert_eq!(set.get(&500)?, Some(500));
//! # Ok::<(), mapindex::IndexError>(())
//! ```

pub mod cache;
pub mod config;
pub mod index;
pub mod osm;
pub mod storage;
pub mod types;

mod error;

pub use cache::{Cache, EvictionAware, LruCache};
pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use index::{BTreeSet, LowerBound, SortedArraySet, Storage};
pub use storage::{FileBackedStorage, LeafCache, RefTable, VecRefTable};
pub use types::Entity;
