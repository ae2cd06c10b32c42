use foundation_alloc::MemAllocator;

use super::{END_OF_LIST, Entry};
use crate::{
    array::Array,
    error::{Error, Result},
};

const MAX_LOAD_FACTOR: f64 = 0.7;

/// Where a key sits: its bucket, the entry before it in the chain
/// (`END_OF_LIST` for the head) and its own entry.
#[derive(Debug, Clone, Copy)]
pub(super) struct Slot {
    pub(super) bucket: usize,
    pub(super) prev: u32,
    pub(super) entry: u32,
}

/// Bucket heads plus the entry array the chains run through. Both variants
/// share this; they differ only in what happens to a slot after removal.
pub(super) struct RawTable<'a, T: Copy, A: MemAllocator + ?Sized> {
    pub(super) buckets: Array<'a, u32, A>,
    pub(super) entries: Array<'a, Entry<T>, A>,
}

impl<'a, T: Copy, A: MemAllocator + ?Sized> RawTable<'a, T, A> {
    pub(super) fn new(allocator: &'a A) -> Self {
        Self {
            buckets: Array::new(allocator),
            entries: Array::new(allocator),
        }
    }

    pub(super) fn with_buckets(
        allocator: &'a A,
        bucket_count: usize,
        entry_capacity: usize,
    ) -> Result<Self> {
        let mut raw = Self::new(allocator);
        raw.buckets.resize(bucket_count, END_OF_LIST)?;
        raw.entries.reserve(entry_capacity)?;
        Ok(raw)
    }

    pub(super) fn allocator(&self) -> &'a A {
        self.buckets.allocator()
    }

    pub(super) fn bucket_of(&self, key: u64) -> usize {
        (key % self.buckets.len() as u64) as usize
    }

    pub(super) fn find(&self, key: u64) -> Option<Slot> {
        if self.buckets.is_empty() {
            return None;
        }

        let bucket = self.bucket_of(key);
        let mut prev = END_OF_LIST;
        let mut ei = self.buckets[bucket];
        while ei != END_OF_LIST {
            let entry = &self.entries[ei as usize];
            if entry.key == key {
                return Some(Slot {
                    bucket,
                    prev,
                    entry: ei,
                });
            }
            prev = ei;
            ei = entry.next;
        }
        None
    }

    pub(super) fn get(&self, key: u64) -> Option<&Entry<T>> {
        self.find(key).map(|slot| &self.entries[slot.entry as usize])
    }

    pub(super) fn get_mut(&mut self, key: u64) -> Option<&mut Entry<T>> {
        let slot = self.find(key)?;
        Some(&mut self.entries[slot.entry as usize])
    }

    /// Index the next pushed entry will get.
    pub(super) fn next_index(&self) -> Result<u32> {
        u32::try_from(self.entries.len())
            .ok()
            .filter(|&ei| ei != END_OF_LIST)
            .ok_or(Error::CapacityOverflow)
    }

    /// Appends `ei` to the end of its bucket's chain.
    pub(super) fn link_tail(&mut self, bucket: usize, ei: u32) {
        let mut cur = self.buckets[bucket];
        if cur == END_OF_LIST {
            self.buckets[bucket] = ei;
            return;
        }

        loop {
            let next = self.entries[cur as usize].next;
            if next == END_OF_LIST {
                break;
            }
            cur = next;
        }
        self.entries[cur as usize].next = ei;
    }

    pub(super) fn unlink(&mut self, slot: Slot) {
        let next = self.entries[slot.entry as usize].next;
        if slot.prev == END_OF_LIST {
            self.buckets[slot.bucket] = next;
        } else {
            self.entries[slot.prev as usize].next = next;
        }
    }

    /// Points whatever referenced entry `from` in `key`'s chain at `to`.
    pub(super) fn relink(&mut self, key: u64, from: u32, to: u32) {
        let bucket = self.bucket_of(key);
        if self.buckets[bucket] == from {
            self.buckets[bucket] = to;
            return;
        }

        let mut cur = self.buckets[bucket];
        while cur != END_OF_LIST {
            let next = self.entries[cur as usize].next;
            if next == from {
                self.entries[cur as usize].next = to;
                return;
            }
            cur = next;
        }
        debug_assert!(false, "entry {from} is not linked in the chain of key {key}");
    }

    pub(super) fn is_full(&self) -> bool {
        self.entries.len() as f64 >= self.buckets.len() as f64 * MAX_LOAD_FACTOR
    }

    pub(super) fn grown_bucket_count(&self) -> usize {
        self.entries.len() * 2 + 10
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
        self.buckets.fill(END_OF_LIST);
    }

    pub(super) fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            buckets: self.buckets.try_clone()?,
            entries: self.entries.try_clone()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use foundation_alloc::HeapAllocator;

    use super::*;

    fn push(raw: &mut RawTable<'_, u32, HeapAllocator>, key: u64) -> anyhow::Result<u32> {
        let ei = raw.next_index()?;
        raw.entries.push(Entry {
            key,
            next: END_OF_LIST,
            value: key as u32,
        })?;
        let bucket = raw.bucket_of(key);
        raw.link_tail(bucket, ei);
        Ok(ei)
    }

    fn chain(raw: &RawTable<'_, u32, HeapAllocator>, bucket: usize) -> Vec<u64> {
        let mut keys = Vec::new();
        let mut ei = raw.buckets[bucket];
        while ei != END_OF_LIST {
            keys.push(raw.entries[ei as usize].key);
            ei = raw.entries[ei as usize].next;
        }
        keys
    }

    #[test]
    fn test_tail_linking_and_unlink() -> anyhow::Result<()> {
        let a = HeapAllocator::new();
        let mut raw = RawTable::with_buckets(&a, 4, 8)?;

        for key in [1, 5, 9, 2] {
            push(&mut raw, key)?;
        }
        assert_eq!(chain(&raw, 1), vec![1, 5, 9]);
        assert_eq!(chain(&raw, 2), vec![2]);

        let slot = raw.find(5).unwrap();
        assert_eq!((slot.bucket, slot.prev, slot.entry), (1, 0, 1));
        raw.unlink(slot);
        assert_eq!(chain(&raw, 1), vec![1, 9]);

        let head = raw.find(1).unwrap();
        assert_eq!(head.prev, END_OF_LIST);
        raw.unlink(head);
        assert_eq!(chain(&raw, 1), vec![9]);
        assert!(raw.find(1).is_none());
        assert!(raw.find(5).is_none());
        Ok(())
    }

    #[test]
    fn test_relink() -> anyhow::Result<()> {
        let a = HeapAllocator::new();
        let mut raw = RawTable::with_buckets(&a, 4, 8)?;
        for key in [3, 7, 11] {
            push(&mut raw, key)?;
        }

        // Pretend entry 2 (key 11) moved to slot 0.
        let moved = raw.entries[2];
        raw.unlink(raw.find(3).unwrap());
        raw.entries[0] = moved;
        raw.entries.pop();
        raw.relink(11, 2, 0);

        assert_eq!(chain(&raw, 3), vec![7, 11]);
        assert_eq!(raw.find(11).unwrap().entry, 0);
        Ok(())
    }

    #[test]
    fn test_load_factor() -> anyhow::Result<()> {
        let a = HeapAllocator::new();
        let mut raw = RawTable::with_buckets(&a, 10, 0)?;
        for key in 0..6 {
            push(&mut raw, key)?;
        }
        assert!(!raw.is_full());
        push(&mut raw, 6)?;
        assert!(raw.is_full());
        assert_eq!(raw.grown_bucket_count(), 24);
        Ok(())
    }
}
