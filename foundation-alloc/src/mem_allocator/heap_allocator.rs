use std::{
    alloc::{self, Layout},
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::{
    MemAllocator,
    header::{self, HEADER_ALIGN, Header},
};
use crate::error::{Error, Result};

/// Allocator over the system heap.
///
/// Each block records its own size in a header in front of the payload, so
/// freeing needs nothing but the pointer and the only state kept here is the
/// running byte count.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    total_allocated: AtomicUsize,
}

impl HeapAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemAllocator for HeapAllocator {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        let align = header::effective_align(size, align)?;
        let total = header::size_with_header(size, align)?;
        let layout = Layout::from_size_align(total, HEADER_ALIGN)
            .map_err(|_| Error::InvalidLayout { size, align })?;

        let block = unsafe { alloc::alloc(layout) } as *mut Header;
        if block.is_null() {
            return Err(Error::OutOfMemory { size, align });
        }

        let data = header::data_pointer(block, align);
        unsafe { header::fill(block, data, total as u32) };
        self.total_allocated.fetch_add(total, Ordering::Relaxed);

        Ok(unsafe { NonNull::new_unchecked(data) })
    }

    unsafe fn deallocate(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        unsafe {
            let block = header::header(ptr);
            let total = (*block).size as usize;
            self.total_allocated.fetch_sub(total, Ordering::Relaxed);
            alloc::dealloc(
                block as *mut u8,
                Layout::from_size_align_unchecked(total, HEADER_ALIGN),
            );
        }
    }

    unsafe fn allocated_size(&self, ptr: NonNull<u8>) -> usize {
        unsafe { (*header::header(ptr.as_ptr())).size as usize }
    }

    fn total_allocated(&self) -> usize {
        self.total_allocated.load(Ordering::Relaxed)
    }
}

impl Drop for HeapAllocator {
    fn drop(&mut self) {
        let leaked = *self.total_allocated.get_mut();
        if leaked != 0 {
            tracing::error!("heap allocator dropped with {} bytes still allocated", leaked);
        }
        debug_assert!(
            leaked == 0 || std::thread::panicking(),
            "heap allocator dropped with {leaked} bytes still allocated"
        );
    }
}
