use std::{fmt, ptr::NonNull};

use parking_lot::Mutex;

use super::{
    MemAllocator,
    header::{self, HEADER_ALIGN, HEADER_SIZE, Header},
};
use crate::error::{Error, Result};

/// Set in a block header once the block has been released.
const FREE_BIT: u32 = 0x8000_0000;
const SIZE_MASK: u32 = !FREE_BIT;

const MIN_BUFFER_SIZE: usize = 64;

/// Cursor state of the ring, as offsets from `buffer`.
///
/// Live blocks sit in `[free, allocate)`, wrapping past the end of the buffer
/// when `allocate < free`. `allocate == free` means the ring is empty, so an
/// allocation may never move `allocate` onto `free` or onto `len`.
struct Ring {
    buffer: NonNull<u8>,
    len: usize,
    allocate: usize,
    free: usize,
    in_use: usize,
    fallback: usize,
}

// Only reachable through the allocator's mutex.
unsafe impl Send for Ring {}

impl Ring {
    fn ptr(&self, offset: usize) -> *mut u8 {
        self.buffer.as_ptr().wrapping_add(offset)
    }

    fn contains(&self, p: *mut u8) -> bool {
        let base = self.buffer.as_ptr().addr();
        p.addr() >= base && p.addr() < base + self.len
    }

    /// Returns `(data, stop)` offsets for a block whose header sits at `at`.
    fn place(&self, at: usize, size: usize, align: usize) -> Option<(usize, usize)> {
        let base = self.buffer.as_ptr().addr();
        let data = (base + at + HEADER_SIZE).checked_next_multiple_of(align)? - base;
        let stop = data.checked_add(size)?;
        Some((data, stop))
    }

    fn carve(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if self.allocate == self.free {
            self.allocate = 0;
            self.free = 0;
        }

        let wrapped = self.allocate < self.free;
        let limit = if wrapped { self.free } else { self.len };

        let (start, data, stop) = match self.place(self.allocate, size, align) {
            Some((data, stop)) if stop < limit => (self.allocate, data, stop),
            _ if !wrapped && self.allocate != 0 => {
                let (data, stop) = self.place(0, size, align)?;
                if stop >= self.free {
                    return None;
                }
                // The tail becomes a released block so `free` skips over it.
                let tail = self.allocate;
                unsafe {
                    (self.ptr(tail) as *mut Header).write(Header {
                        size: (self.len - tail) as u32 | FREE_BIT,
                    })
                };
                (0, data, stop)
            }
            _ => return None,
        };

        let block = stop - start;
        let data = self.ptr(data);
        unsafe { header::fill(self.ptr(start) as *mut Header, data, block as u32) };
        self.allocate = stop;
        self.in_use += block;

        NonNull::new(data)
    }

    /// # Safety
    ///
    /// `data` must be a live block carved from this ring.
    unsafe fn release(&mut self, data: *mut u8) {
        unsafe {
            let h = header::header(data);
            let size = (*h).size;
            debug_assert_eq!(size & FREE_BIT, 0, "scratch block released twice");
            (*h).size = size | FREE_BIT;
            self.in_use -= (size & SIZE_MASK) as usize;

            while self.free != self.allocate {
                let size = (*(self.ptr(self.free) as *mut Header)).size;
                if size & FREE_BIT == 0 {
                    break;
                }
                self.free += (size & SIZE_MASK) as usize;
                if self.free == self.len {
                    self.free = 0;
                }
            }
        }
    }
}

/// Ring-buffer allocator for short-lived memory.
///
/// Blocks are carved in order from a fixed buffer taken from the backing
/// allocator and released memory is reclaimed in the same order. A request
/// that would overrun data still in use goes to the backing allocator
/// instead, so a slow consumer degrades to heap allocation rather than
/// failing.
pub struct ScratchAllocator<A: MemAllocator> {
    backing: A,
    ring: Mutex<Ring>,
}

impl<A: MemAllocator> ScratchAllocator<A> {
    pub fn new(backing: A, size: usize) -> Result<Self> {
        let len = size & !(HEADER_ALIGN - 1);
        if !(MIN_BUFFER_SIZE..=SIZE_MASK as usize).contains(&len) {
            return Err(Error::InvalidLayout {
                size,
                align: HEADER_ALIGN,
            });
        }

        let buffer = backing.allocate(len, HEADER_ALIGN)?;
        Ok(Self {
            backing,
            ring: Mutex::new(Ring {
                buffer,
                len,
                allocate: 0,
                free: 0,
                in_use: 0,
                fallback: 0,
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().len
    }

    pub fn backing(&self) -> &A {
        &self.backing
    }

    /// Whether `ptr` points into the ring rather than to a backing block.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.ring.lock().contains(ptr as *mut u8)
    }
}

impl<A: MemAllocator> MemAllocator for ScratchAllocator<A> {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        let align = header::effective_align(size, align)?;
        let rounded = size
            .checked_next_multiple_of(HEADER_ALIGN)
            .ok_or(Error::InvalidLayout { size, align })?;

        let mut ring = self.ring.lock();
        if let Some(data) = ring.carve(rounded, align) {
            return Ok(data);
        }

        tracing::debug!(
            "scratch ring exhausted, {} bytes aligned to {} from backing allocator",
            size,
            align
        );
        let data = self.backing.allocate(size, align)?;
        ring.fallback += unsafe { self.backing.allocated_size(data) };
        Ok(data)
    }

    unsafe fn deallocate(&self, ptr: *mut u8) {
        let Some(data) = NonNull::new(ptr) else {
            return;
        };

        let mut ring = self.ring.lock();
        if ring.contains(ptr) {
            unsafe { ring.release(ptr) };
        } else {
            unsafe {
                ring.fallback -= self.backing.allocated_size(data);
                self.backing.deallocate(ptr);
            }
        }
    }

    unsafe fn allocated_size(&self, ptr: NonNull<u8>) -> usize {
        let ring = self.ring.lock();
        if !ring.contains(ptr.as_ptr()) {
            return unsafe { self.backing.allocated_size(ptr) };
        }

        unsafe {
            let h = header::header(ptr.as_ptr());
            ((*h).size & SIZE_MASK) as usize - (ptr.as_ptr().addr() - h.addr())
        }
    }

    fn total_allocated(&self) -> usize {
        let ring = self.ring.lock();
        ring.in_use + ring.fallback
    }
}

impl<A: MemAllocator> Drop for ScratchAllocator<A> {
    fn drop(&mut self) {
        let ring = self.ring.get_mut();
        let (in_use, fallback) = (ring.in_use, ring.fallback);
        if in_use != 0 || fallback != 0 {
            tracing::error!(
                "scratch allocator dropped with {} ring bytes and {} backing bytes still allocated",
                in_use,
                fallback
            );
        }
        unsafe { self.backing.deallocate(ring.buffer.as_ptr()) };

        debug_assert!(
            (in_use == 0 && fallback == 0) || std::thread::panicking(),
            "scratch allocator dropped with {in_use} ring bytes and {fallback} backing bytes still allocated"
        );
    }
}

impl<A: MemAllocator> fmt::Debug for ScratchAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring.lock();
        f.debug_struct("ScratchAllocator")
            .field("capacity", &ring.len)
            .field("allocate", &ring.allocate)
            .field("free", &ring.free)
            .field("in_use", &ring.in_use)
            .field("fallback", &ring.fallback)
            .finish()
    }
}
