//! Cache module - eviction-aware LRU caches

pub mod lru_cache;

pub use lru_cache::{Cache, EvictionAware, LruCache, DEFAULT_CACHE_CAPACITY};
