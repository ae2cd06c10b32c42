const DEFAULT_SEED: u64 = 0;

/// Reduces a byte key to the `u64` used by the hash tables.
pub trait MurmurHash {
    fn murmur_hash(&self) -> u64;
}

impl<T> MurmurHash for T
where
    T: AsRef<[u8]>,
{
    fn murmur_hash(&self) -> u64 {
        murmur_hash_64(self.as_ref(), DEFAULT_SEED)
    }
}

/// MurmurHash64A over little-endian words.
pub fn murmur_hash_64(data: &[u8], seed: u64) -> u64 {
    const M: u64 = 0xc6a4_a793_5bd1_e995;
    const R: u32 = 47;

    let mut h = seed ^ (data.len() as u64).wrapping_mul(M);

    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        let mut bytes = [0; 8];
        bytes.copy_from_slice(chunk);
        let mut k = u64::from_le_bytes(bytes);

        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);

        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        for (i, &byte) in tail.iter().enumerate() {
            h ^= (byte as u64) << (8 * i);
        }
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h
}
