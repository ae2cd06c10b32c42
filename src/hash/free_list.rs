use std::fmt;

use foundation_alloc::MemAllocator;

use super::{END_OF_LIST, Entry, raw::RawTable};
use crate::error::Result;

/// Key written into removed entries. Never use it as a real key.
pub const UNUSED_KEY: u64 = 0xffff_ffff_eeee_eeee;

/// Hash table that keeps removed entries in place as tombstones and hands
/// their slots out again through a free list.
///
/// Entry indices stay stable until the next rehash, at the cost of holes in
/// the entry array; see [`DenseHashTable`](super::DenseHashTable) for the
/// hole-free variant.
pub struct HashTable<'a, T: Copy, A: MemAllocator + ?Sized> {
    raw: RawTable<'a, T, A>,
    free_list: u32,
    len: usize,
}

impl<'a, T: Copy, A: MemAllocator + ?Sized> HashTable<'a, T, A> {
    pub fn new(allocator: &'a A) -> Self {
        Self {
            raw: RawTable::new(allocator),
            free_list: END_OF_LIST,
            len: 0,
        }
    }

    pub fn allocator(&self) -> &'a A {
        self.raw.allocator()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.raw.buckets.len()
    }

    pub fn has(&self, key: u64) -> bool {
        self.raw.find(key).is_some()
    }

    pub fn get(&self, key: u64) -> Option<&T> {
        self.raw.get(key).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, key: u64) -> Option<&mut T> {
        self.raw.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Value stored under `key`, or `default` when there is none.
    pub fn get_or(&self, key: u64, default: T) -> T {
        self.get(key).copied().unwrap_or(default)
    }

    pub fn set(&mut self, key: u64, value: T) -> Result<()> {
        debug_assert_ne!(key, UNUSED_KEY, "UNUSED_KEY cannot be stored");

        if self.raw.buckets.is_empty() {
            self.grow()?;
        }

        if let Some(entry) = self.raw.get_mut(key) {
            entry.value = value;
            return Ok(());
        }

        let ei = self.add_entry(key, value)?;
        let bucket = self.raw.bucket_of(key);
        self.raw.link_tail(bucket, ei);
        self.len += 1;

        if self.raw.is_full() {
            self.grow()?;
        }
        Ok(())
    }

    fn add_entry(&mut self, key: u64, value: T) -> Result<u32> {
        let entry = Entry {
            key,
            next: END_OF_LIST,
            value,
        };

        if self.free_list == END_OF_LIST {
            let ei = self.raw.next_index()?;
            self.raw.entries.push(entry)?;
            return Ok(ei);
        }

        let ei = self.free_list;
        self.free_list = self.raw.entries[ei as usize].next;
        self.raw.entries[ei as usize] = entry;
        Ok(ei)
    }

    /// Removes `key` and returns its value. Absent keys are ignored.
    pub fn remove(&mut self, key: u64) -> Option<T> {
        let slot = self.raw.find(key)?;
        self.raw.unlink(slot);

        let entry = &mut self.raw.entries[slot.entry as usize];
        entry.key = UNUSED_KEY;
        entry.next = self.free_list;
        let value = entry.value;

        self.free_list = slot.entry;
        self.len -= 1;
        Some(value)
    }

    /// Rebuilds the table with `bucket_count` buckets.
    pub fn reserve(&mut self, bucket_count: usize) -> Result<()> {
        self.rehash(bucket_count)
    }

    fn grow(&mut self) -> Result<()> {
        self.rehash(self.raw.grown_bucket_count())
    }

    // Live entries are re-inserted in array order, which drops the tombstones
    // and the free list along the way.
    fn rehash(&mut self, bucket_count: usize) -> Result<()> {
        tracing::debug!(
            "rehash free-list table: {} -> {} buckets, {} live entries",
            self.bucket_count(),
            bucket_count,
            self.len
        );

        let mut fresh = Self {
            raw: RawTable::with_buckets(self.allocator(), bucket_count, self.len)?,
            free_list: END_OF_LIST,
            len: 0,
        };
        for entry in self.raw.entries.iter().filter(|e| e.key != UNUSED_KEY) {
            fresh.set(entry.key, entry.value)?;
        }

        *self = fresh;
        Ok(())
    }

    /// Drops every entry but keeps the buckets.
    pub fn clear(&mut self) {
        self.raw.clear();
        self.free_list = END_OF_LIST;
        self.len = 0;
    }

    /// Live entries in storage order, tombstones skipped.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
        self.raw
            .entries
            .iter()
            .filter(|e| e.key != UNUSED_KEY)
            .map(|e| (e.key, &e.value))
    }

    /// Number of slots in the entry array, tombstones included.
    pub fn slot_count(&self) -> usize {
        self.raw.entries.len()
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            raw: self.raw.try_clone()?,
            free_list: self.free_list,
            len: self.len,
        })
    }
}

impl<T: Copy + fmt::Debug, A: MemAllocator + ?Sized> fmt::Debug for HashTable<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
