mod array;
mod error;
pub mod hash;

#[cfg(test)]
mod test_utils;

pub use array::Array;
pub use error::{Error, Result};
pub use hash::{DenseHashTable, HashTable};

pub use foundation_alloc::{
    DEFAULT_ALIGN, HeapAllocator, MemAllocator, MemoryOptions, ScratchAllocator, globals,
};
