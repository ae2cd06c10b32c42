use std::fmt;

use foundation_alloc::MemAllocator;

use super::{END_OF_LIST, Entry, raw::RawTable};
use crate::error::Result;

/// Hash table whose entry array never has holes.
///
/// Removal moves the last entry into the freed slot, so `entries()` is
/// always exactly the live set and can be walked directly. Entry indices are
/// not stable across removals.
pub struct DenseHashTable<'a, T: Copy, A: MemAllocator + ?Sized> {
    raw: RawTable<'a, T, A>,
}

impl<'a, T: Copy, A: MemAllocator + ?Sized> DenseHashTable<'a, T, A> {
    pub fn new(allocator: &'a A) -> Self {
        Self {
            raw: RawTable::new(allocator),
        }
    }

    pub fn allocator(&self) -> &'a A {
        self.raw.allocator()
    }

    pub fn len(&self) -> usize {
        self.raw.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.entries.is_empty()
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
        if self.raw.buckets.is_empty() {
            self.grow()?;
        }

        if let Some(entry) = self.raw.get_mut(key) {
            entry.value = value;
            return Ok(());
        }

        let ei = self.raw.next_index()?;
        self.raw.entries.push(Entry {
            key,
            next: END_OF_LIST,
            value,
        })?;
        let bucket = self.raw.bucket_of(key);
        self.raw.link_tail(bucket, ei);

        if self.raw.is_full() {
            self.grow()?;
        }
        Ok(())
    }

    /// Removes `key` and returns its value. Absent keys are ignored.
    pub fn remove(&mut self, key: u64) -> Option<T> {
        let slot = self.raw.find(key)?;
        self.raw.unlink(slot);

        let value = self.raw.entries[slot.entry as usize].value;
        let last = (self.raw.entries.len() - 1) as u32;
        let moved = self.raw.entries.pop()?;
        if slot.entry != last {
            self.raw.entries[slot.entry as usize] = moved;
            self.raw.relink(moved.key, last, slot.entry);
        }
        Some(value)
    }

    /// Rebuilds the table with `bucket_count` buckets.
    pub fn reserve(&mut self, bucket_count: usize) -> Result<()> {
        self.rehash(bucket_count)
    }

    fn grow(&mut self) -> Result<()> {
        self.rehash(self.raw.grown_bucket_count())
    }

    fn rehash(&mut self, bucket_count: usize) -> Result<()> {
        tracing::debug!(
            "rehash dense table: {} -> {} buckets, {} entries",
            self.bucket_count(),
            bucket_count,
            self.len()
        );

        let mut fresh = Self {
            raw: RawTable::with_buckets(self.allocator(), bucket_count, self.len())?,
        };
        for entry in self.raw.entries.iter() {
            fresh.set(entry.key, entry.value)?;
        }

        *self = fresh;
        Ok(())
    }

    /// Drops every entry but keeps the buckets.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// The live entries, nothing else.
    pub fn entries(&self) -> &[Entry<T>] {
        &self.raw.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
        self.raw.entries.iter().map(|e| (e.key, &e.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u64, &mut T)> {
        self.raw.entries.iter_mut().map(|e| (e.key, &mut e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = u64> {
        self.raw.entries.iter().map(|e| e.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.raw.entries.iter().map(|e| &e.value)
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            raw: self.raw.try_clone()?,
        })
    }
}

impl<T: Copy + fmt::Debug, A: MemAllocator + ?Sized> fmt::Debug for DenseHashTable<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
