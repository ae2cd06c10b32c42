//! `[header][padding][payload]` block layout shared by the header-based
//! allocators.
//!
//! ```text
//!   ┌──────────┬──────────────────────────┬──────────────────────┐
//!   │  size    │ PAD  PAD  ...  PAD       │  payload             │
//!   │  (u32)   │ (u32 words, may be none) │  (aligned)           │
//!   └──────────┴──────────────────────────┴──────────────────────┘
//!                                          ▲
//!                                          └── pointer handed out
//! ```
//!
//! The header is found again from the payload pointer alone by walking back
//! over padding words. A block size may therefore never equal the pad value.

use std::mem;

use crate::error::{Error, Result};

#[repr(C)]
pub(super) struct Header {
    pub(super) size: u32,
}

pub(super) const HEADER_SIZE: usize = mem::size_of::<Header>();
pub(super) const HEADER_ALIGN: usize = mem::align_of::<Header>();
pub(super) const HEADER_PAD_VALUE: u32 = 0xffff_ffff;

/// Validates `align` and raises it to the header alignment, so the padding is
/// always a whole number of pad words.
pub(super) fn effective_align(size: usize, align: usize) -> Result<usize> {
    if !align.is_power_of_two() {
        return Err(Error::InvalidLayout { size, align });
    }
    Ok(align.max(HEADER_ALIGN))
}

/// Bytes needed to place `size` payload bytes at `align` behind a header.
pub(super) fn size_with_header(size: usize, align: usize) -> Result<usize> {
    size.checked_add(align)
        .and_then(|total| total.checked_add(HEADER_SIZE))
        .filter(|&total| total < HEADER_PAD_VALUE as usize)
        .ok_or(Error::InvalidLayout { size, align })
}

/// First `align`-aligned address behind the header.
pub(super) fn data_pointer(header: *mut Header, align: usize) -> *mut u8 {
    let p = header.wrapping_add(1) as *mut u8;
    let addr = p.addr();
    let aligned = (addr + align - 1) & !(align - 1);
    p.wrapping_add(aligned - addr)
}

/// Writes the header and pads the gap up to `data`.
///
/// # Safety
///
/// `header..data` must be writable and `header` aligned for `Header`.
pub(super) unsafe fn fill(header: *mut Header, data: *mut u8, size: u32) {
    debug_assert_ne!(size, HEADER_PAD_VALUE);
    unsafe {
        header.write(Header { size });
        let mut p = header.add(1) as *mut u32;
        while (p as *mut u8) < data {
            p.write(HEADER_PAD_VALUE);
            p = p.add(1);
        }
    }
}

/// Recovers the header of a payload pointer.
///
/// # Safety
///
/// `data` must be a payload pointer laid out by [`fill`].
pub(super) unsafe fn header(data: *mut u8) -> *mut Header {
    unsafe {
        let mut p = data as *mut u32;
        while p.sub(1).read() == HEADER_PAD_VALUE {
            p = p.sub(1);
        }
        p.sub(1) as *mut Header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_align() {
        assert_eq!(effective_align(8, 1).unwrap(), HEADER_ALIGN);
        assert_eq!(effective_align(8, 4).unwrap(), 4);
        assert_eq!(effective_align(8, 64).unwrap(), 64);
        assert!(matches!(
            effective_align(8, 3),
            Err(Error::InvalidLayout { size: 8, align: 3 })
        ));
        assert!(effective_align(8, 0).is_err());
    }

    #[test]
    fn test_size_with_header_rejects_pad_value() {
        assert_eq!(size_with_header(100, 4).unwrap(), 100 + 4 + HEADER_SIZE);
        assert!(size_with_header(usize::MAX, 4).is_err());
        assert!(size_with_header(HEADER_PAD_VALUE as usize - HEADER_SIZE - 4, 4).is_err());
    }

    #[test]
    fn test_header_recovery() {
        for align in [4, 8, 16, 32, 64] {
            let mut buf = vec![0u32; 64];
            let h = buf.as_mut_ptr() as *mut Header;
            let data = data_pointer(h, align);

            assert_eq!(data.addr() % align, 0);
            assert!(data.addr() >= h.addr() + HEADER_SIZE);
            assert!(data.addr() < h.addr() + HEADER_SIZE + align);

            unsafe {
                fill(h, data, 77);
                let found = header(data);
                assert_eq!(found, h);
                assert_eq!((*found).size, 77);
            }
        }
    }
}
