//! Index layer implementation
//!
//! A B+Tree set whose leaves are backed by a pluggable [`Storage`]. Internal
//! pages and the default leaves are fixed-capacity [`SortedArraySet`]s of `M`
//! elements.

pub mod btree;
mod page;
pub mod sorted_array;
pub mod storage;

pub use btree::BTreeSet;
pub use page::LowerBound;
pub use sorted_array::SortedArraySet;
pub use storage::Storage;

/// Capacity of internal pages and of in-memory leaves
pub const M: usize = 16;

/// Split point of a full page
pub const HALF_M: usize = M / 2;

const _: () = assert!(M % 2 == 0, "M must be even");
