use std::{
    alloc::Layout,
    fmt,
    ops::{Deref, DerefMut},
    ptr::{self, NonNull},
    slice,
};

use foundation_alloc::MemAllocator;

use crate::error::{Error, Result};

/// Growable contiguous buffer bound to one allocator.
///
/// Elements are moved around with raw byte copies and never dropped, which is
/// what the `Copy` bound stands for: no owned resources, no self references.
pub struct Array<'a, T: Copy, A: MemAllocator + ?Sized> {
    allocator: &'a A,
    len: usize,
    capacity: usize,
    // Dangling while `capacity == 0`.
    data: NonNull<T>,
}

impl<'a, T: Copy, A: MemAllocator + ?Sized> Array<'a, T, A> {
    pub fn new(allocator: &'a A) -> Self {
        Self {
            allocator,
            len: 0,
            capacity: 0,
            data: NonNull::dangling(),
        }
    }

    pub fn with_capacity(allocator: &'a A, capacity: usize) -> Result<Self> {
        let mut array = Self::new(allocator);
        array.set_capacity(capacity)?;
        Ok(array)
    }

    pub fn allocator(&self) -> &'a A {
        self.allocator
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    /// Start of the buffer, valid for `capacity` elements.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_ptr()
    }

    /// Makes room for at least `capacity` elements without the usual
    /// growth slack.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity > self.capacity {
            self.set_capacity(capacity)?;
        }
        Ok(())
    }

    /// Moves the live prefix into a buffer of exactly `capacity` elements.
    /// Shrinking below `len` truncates.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity == self.capacity {
            return Ok(());
        }

        let len = self.len.min(capacity);
        let data = if capacity > 0 {
            let layout = Layout::array::<T>(capacity).map_err(|_| Error::CapacityOverflow)?;
            let data = self.allocator.allocate_layout(layout)?.cast::<T>();
            unsafe { ptr::copy_nonoverlapping(self.data.as_ptr(), data.as_ptr(), len) };
            data
        } else {
            NonNull::dangling()
        };

        self.release();
        self.data = data;
        self.capacity = capacity;
        self.len = len;
        Ok(())
    }

    fn grow(&mut self, min_capacity: usize) -> Result<()> {
        let capacity = self
            .capacity
            .checked_mul(2)
            .and_then(|c| c.checked_add(10))
            .ok_or(Error::CapacityOverflow)?
            .max(min_capacity);
        self.set_capacity(capacity)
    }

    /// Sets the length to `len`, filling new slots with `value`.
    pub fn resize(&mut self, len: usize, value: T) -> Result<()> {
        if len > self.capacity {
            self.grow(len)?;
        }
        for i in self.len..len {
            unsafe { self.data.as_ptr().add(i).write(value) };
        }
        self.len = len;
        Ok(())
    }

    /// # Safety
    ///
    /// `len` must not exceed the capacity and every element below `len` must
    /// have been written.
    pub unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity);
        self.len = len;
    }

    pub fn push(&mut self, item: T) -> Result<()> {
        if self.len == self.capacity {
            self.grow(0)?;
        }
        unsafe { self.data.as_ptr().add(self.len).write(item) };
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { self.data.as_ptr().add(self.len).read() })
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shrinks the capacity to the length.
    pub fn trim(&mut self) -> Result<()> {
        self.set_capacity(self.len)
    }

    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<()> {
        let len = self
            .len
            .checked_add(items.len())
            .ok_or(Error::CapacityOverflow)?;
        if len > self.capacity {
            self.grow(len)?;
        }
        unsafe {
            ptr::copy_nonoverlapping(items.as_ptr(), self.data.as_ptr().add(self.len), items.len())
        };
        self.len = len;
        Ok(())
    }

    /// Deep copy of the live elements, bound to the same allocator.
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::with_capacity(self.allocator, self.len)?;
        copy.extend_from_slice(self)?;
        Ok(copy)
    }

    /// Replaces the contents with a copy of `items`.
    pub fn assign(&mut self, items: &[T]) -> Result<()> {
        if items.len() > self.capacity {
            self.grow(items.len())?;
        }
        unsafe { ptr::copy_nonoverlapping(items.as_ptr(), self.data.as_ptr(), items.len()) };
        self.len = items.len();
        Ok(())
    }

    fn release(&mut self) {
        if self.capacity > 0 {
            unsafe { self.allocator.deallocate(self.data.as_ptr().cast()) };
        }
    }
}

impl<T: Copy, A: MemAllocator + ?Sized> Drop for Array<'_, T, A> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Copy, A: MemAllocator + ?Sized> Deref for Array<'_, T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy, A: MemAllocator + ?Sized> DerefMut for Array<'_, T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'b, T: Copy, A: MemAllocator + ?Sized> IntoIterator for &'b Array<'_, T, A> {
    type Item = &'b T;
    type IntoIter = slice::Iter<'b, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Copy, A: MemAllocator + ?Sized> Clone for Array<'_, T, A> {
    fn clone(&self) -> Self {
        self.try_clone()
            .unwrap_or_else(|err| panic!("failed to clone array: {err}"))
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign(source)
            .unwrap_or_else(|err| panic!("failed to assign array: {err}"))
    }
}

impl<T: Copy + fmt::Debug, A: MemAllocator + ?Sized> fmt::Debug for Array<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
