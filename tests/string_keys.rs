use foundation::{Array, DenseHashTable, HashTable, HeapAllocator, MemAllocator, ScratchAllocator};
use foundation_utils::hash::MurmurHash;

const WORDS: &[&str] = &[
    "allocator", "array", "bucket", "chain", "compaction", "entry", "free", "grow", "hash",
    "header", "index", "load", "padding", "rehash", "ring", "scratch", "sentinel", "slot",
    "tombstone", "value",
];

#[test]
fn test_word_lengths_by_hashed_key() -> anyhow::Result<()> {
    let heap = HeapAllocator::new();
    {
        let mut lengths = HashTable::new(&heap);
        let mut dense = DenseHashTable::new(&heap);
        for word in WORDS {
            lengths.set(word.murmur_hash(), word.len())?;
            dense.set(word.murmur_hash(), word.len())?;
        }
        assert_eq!(lengths.len(), WORDS.len());
        assert_eq!(dense.entries().len(), WORDS.len());

        for word in WORDS {
            assert_eq!(lengths.get_or(word.murmur_hash(), 0), word.len());
            assert_eq!(dense.get(word.murmur_hash()), Some(&word.len()));
        }

        for word in WORDS.iter().step_by(3) {
            lengths.remove(word.murmur_hash());
            dense.remove(word.murmur_hash());
        }
        for (i, word) in WORDS.iter().enumerate() {
            let present = i % 3 != 0;
            assert_eq!(lengths.has(word.murmur_hash()), present);
            assert_eq!(dense.has(word.murmur_hash()), present);
        }
        assert_eq!(dense.entries().len(), lengths.len());
        assert!(!lengths.has("missing".murmur_hash()));
    }
    assert_eq!(heap.total_allocated(), 0);
    Ok(())
}

#[test]
fn test_tables_share_a_scratch_allocator() -> anyhow::Result<()> {
    let heap = HeapAllocator::new();
    {
        let scratch = ScratchAllocator::new(&heap, 32 * 1024)?;
        let mut ids = HashTable::new(&scratch);
        let mut order = Array::new(&scratch);

        for (i, word) in WORDS.iter().enumerate() {
            ids.set(word.murmur_hash(), i as u32)?;
            order.push(word.murmur_hash())?;
        }
        for (i, key) in order.iter().enumerate() {
            assert_eq!(ids.get(*key), Some(&(i as u32)));
        }

        drop(ids);
        drop(order);
        assert_eq!(scratch.total_allocated(), 0);
    }
    assert_eq!(heap.total_allocated(), 0);
    Ok(())
}
