//! Storage layer implementation
//!
//! Reference tables and the out-of-core leaf storage built on them:
//!
//! - [`ref_table`]: append-then-lazy-sort tables keyed by entity id
//! - [`file_cache`]: tables whose contents spill to temp files through a shared LRU
//! - [`file_backed`]: [`Storage`](crate::index::Storage) over a file-backed table
//! - [`select`](mod@select): quickselect used to split file-backed leaves

pub mod file_backed;
pub mod file_cache;
pub mod ref_table;
pub mod select;

pub use file_backed::{FileBackedStorage, SpillableEntity, MAX_SIZE};
pub use file_cache::{FileCacheRefTable, LeafCache, LeafCacheStats, TableId};
pub use ref_table::{RefTable, VecRefTable};
pub use select::select;
