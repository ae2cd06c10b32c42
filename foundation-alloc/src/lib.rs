mod error;
mod mem_allocator;
mod options;

pub mod globals;

pub use error::{Error, Result};
pub use mem_allocator::prelude::*;
pub use options::MemoryOptions;
