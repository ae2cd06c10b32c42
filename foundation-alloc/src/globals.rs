//! Process-wide default allocators.
//!
//! Nothing here is created implicitly: [`init`] builds the allocators,
//! [`shutdown`] tears them down and checks that every byte handed out came
//! back. Call sites that cannot have an allocator threaded through to them
//! fetch one with [`default_allocator`] in between.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    mem_allocator::prelude::*,
    options::MemoryOptions,
};

pub type DefaultScratchAllocator = ScratchAllocator<Arc<HeapAllocator>>;

struct MemoryGlobals {
    default_allocator: Arc<HeapAllocator>,
    default_scratch_allocator: Arc<DefaultScratchAllocator>,
}

static MEMORY_GLOBALS: Mutex<Option<MemoryGlobals>> = parking_lot::const_mutex(None);

pub fn init(options: &MemoryOptions) -> Result<()> {
    let mut globals = MEMORY_GLOBALS.lock();
    if globals.is_some() {
        return Err(Error::AlreadyInitialized);
    }

    let default_allocator = Arc::new(HeapAllocator::new());
    let default_scratch_allocator = Arc::new(ScratchAllocator::new(
        Arc::clone(&default_allocator),
        options.scratch_buffer_size,
    )?);

    *globals = Some(MemoryGlobals {
        default_allocator,
        default_scratch_allocator,
    });
    tracing::info!(
        "memory globals initialized, scratch buffer {} bytes",
        options.scratch_buffer_size
    );
    Ok(())
}

pub fn default_allocator() -> Result<Arc<HeapAllocator>> {
    MEMORY_GLOBALS
        .lock()
        .as_ref()
        .map(|globals| Arc::clone(&globals.default_allocator))
        .ok_or(Error::NotInitialized)
}

/// Ring allocator for memory that is released shortly after it is taken.
pub fn default_scratch_allocator() -> Result<Arc<DefaultScratchAllocator>> {
    MEMORY_GLOBALS
        .lock()
        .as_ref()
        .map(|globals| Arc::clone(&globals.default_scratch_allocator))
        .ok_or(Error::NotInitialized)
}

/// Tears the globals down. Fails with [`Error::Leaked`] when memory obtained
/// from them is still outstanding.
pub fn shutdown() -> Result<()> {
    let MemoryGlobals {
        default_allocator,
        default_scratch_allocator,
    } = MEMORY_GLOBALS.lock().take().ok_or(Error::NotInitialized)?;

    drop(default_scratch_allocator);

    let leaked = default_allocator.total_allocated();
    if leaked != 0 {
        tracing::error!("memory globals shut down with {} bytes leaked", leaked);
        return Err(Error::Leaked { bytes: leaked });
    }

    tracing::info!("memory globals shut down");
    Ok(())
}
