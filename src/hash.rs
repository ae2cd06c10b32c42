//! Hash tables from `u64` keys to `Copy` values.
//!
//! Entries live in one array and chains are threaded through it by index,
//! so the storage can be reallocated or compacted without chasing pointers.
//! The tables never hash: callers reduce their keys to `u64` themselves and
//! the bucket is `key % bucket_count`.

mod dense;
mod free_list;
mod raw;

pub use dense::DenseHashTable;
pub use free_list::{HashTable, UNUSED_KEY};

/// Marks an empty bucket and the end of a chain.
pub const END_OF_LIST: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<T> {
    pub key: u64,
    pub(crate) next: u32,
    pub value: T,
}
