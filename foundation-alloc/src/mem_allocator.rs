use std::{alloc::Layout, ptr::NonNull, sync::Arc};

use crate::error::Result;

mod header;
mod heap_allocator;
mod scratch_allocator;

pub mod prelude {
    pub use super::DEFAULT_ALIGN;
    pub use super::MemAllocator;
    pub use super::heap_allocator::HeapAllocator;
    pub use super::scratch_allocator::ScratchAllocator;
}

/// Alignment used when the caller has no stronger requirement.
pub const DEFAULT_ALIGN: usize = 4;

/// Source of raw memory for containers.
///
/// Containers are bound to one allocator for their whole lifetime and never
/// touch a global allocation function directly, so an arena, a ring buffer or
/// a tracking allocator can be swapped in wherever a `MemAllocator` is taken.
pub trait MemAllocator {
    /// Returns `size` bytes aligned to `align`, which must be a power of two.
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>>;

    /// # Safety
    ///
    /// `ptr` must be null or a live pointer returned by `allocate` on this
    /// allocator. A null pointer is ignored.
    unsafe fn deallocate(&self, ptr: *mut u8);

    /// Bytes reserved for the block behind `ptr`, never less than requested.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live pointer returned by `allocate` on this allocator.
    unsafe fn allocated_size(&self, ptr: NonNull<u8>) -> usize;

    /// Bytes currently held on behalf of callers.
    fn total_allocated(&self) -> usize;

    fn allocate_layout(&self, layout: Layout) -> Result<NonNull<u8>> {
        self.allocate(layout.size(), layout.align())
    }
}

impl<A: MemAllocator + ?Sized> MemAllocator for &A {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        (**self).allocate(size, align)
    }

    unsafe fn deallocate(&self, ptr: *mut u8) {
        unsafe { (**self).deallocate(ptr) }
    }

    unsafe fn allocated_size(&self, ptr: NonNull<u8>) -> usize {
        unsafe { (**self).allocated_size(ptr) }
    }

    fn total_allocated(&self) -> usize {
        (**self).total_allocated()
    }
}

impl<A: MemAllocator + ?Sized> MemAllocator for Arc<A> {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        self.as_ref().allocate(size, align)
    }

    unsafe fn deallocate(&self, ptr: *mut u8) {
        unsafe { self.as_ref().deallocate(ptr) }
    }

    unsafe fn allocated_size(&self, ptr: NonNull<u8>) -> usize {
        unsafe { self.as_ref().allocated_size(ptr) }
    }

    fn total_allocated(&self) -> usize {
        self.as_ref().total_allocated()
    }
}
