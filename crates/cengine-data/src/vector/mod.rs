// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A generic growable array with a fixed, observable grow/shrink policy.
//!
//! `Vector` keeps its bookkeeping in a private [`Header`] of two sizes,
//! `capacity` and `length`, next to a single contiguous element buffer. It
//! dereferences to `[T]`, so indexing, iteration, `first`/`last`, `swap` and
//! sorting come from the slice API.
//!
//! Capacity only ever changes at the mutation that needs it:
//!
//! * **Growth**: an insertion that would take `length` past `capacity`
//!   doubles the capacity (an unallocated vector starts at
//!   [`DEFAULT_CAPACITY`]). Inserting many elements at once keeps doubling
//!   until they fit.
//! * **Shrink**: after a removal leaves `length <= capacity / 4`, the
//!   capacity is halved once. A shrink never goes below `length` and never
//!   takes an allocated vector to zero capacity.
//! * [`Vector::reserve`] and [`Vector::fit`] are the only operations that
//!   change capacity without changing length.
//!
//! Every allocating operation returns [`AllocError`] on failure and leaves
//! the vector exactly as it was. Out-of-range indices are programmer errors
//! and panic, as slice indexing does.
//!
//! Not safe for concurrent mutation: growth moves the buffer, so the usual
//! `&mut` rules are what keep other references from dangling.

use crate::allocators::SystemAllocator;
use cengine_core::{AllocError, RawAllocator};
use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut, Range};
use std::ptr::{self, NonNull};
use std::slice;

#[cfg(test)]
mod tests;

/// Capacity given to a vector created with [`Vector::try_new`] and to an
/// unallocated vector on its first insertion.
pub const DEFAULT_CAPACITY: usize = 8;

/// The two size fields tracked for every buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Header {
    capacity: usize,
    length: usize,
}

/// A contiguous growable array of `T`, allocated through `A`.
pub struct Vector<T, A: RawAllocator = SystemAllocator> {
    ptr: NonNull<T>,
    header: Header,
    alloc: A,
    _marker: PhantomData<T>,
}

// SAFETY: `Vector` owns its elements like `Vec<T>` does.
unsafe impl<T: Send, A: RawAllocator + Send> Send for Vector<T, A> {}
// SAFETY: shared access only hands out `&T` and `&A`.
unsafe impl<T: Sync, A: RawAllocator + Sync> Sync for Vector<T, A> {}

impl<T> Vector<T> {
    /// Creates an unallocated vector (capacity 0) on the process heap.
    pub const fn new() -> Self {
        Self::new_in(SystemAllocator)
    }

    /// Creates a vector with [`DEFAULT_CAPACITY`] slots on the process heap.
    pub fn try_new() -> Result<Self, AllocError> {
        Self::try_new_in(SystemAllocator)
    }

    /// Creates a vector with room for `capacity` elements on the process heap.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::with_capacity_in(capacity, SystemAllocator)
    }

    /// Creates a vector holding clones of `items`, with exactly that capacity.
    pub fn from_slice(items: &[T]) -> Result<Self, AllocError>
    where
        T: Clone,
    {
        Self::from_slice_in(items, SystemAllocator)
    }
}

impl<T, A: RawAllocator> Vector<T, A> {
    /// Creates an unallocated vector that will allocate through `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            header: Header {
                capacity: 0,
                length: 0,
            },
            alloc,
            _marker: PhantomData,
        }
    }

    /// Creates a vector with [`DEFAULT_CAPACITY`] slots allocated through `alloc`.
    pub fn try_new_in(alloc: A) -> Result<Self, AllocError> {
        Self::with_capacity_in(DEFAULT_CAPACITY, alloc)
    }

    /// Creates a vector with room for `capacity` elements. A capacity of zero
    /// yields an unallocated vector.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, AllocError> {
        let mut vector = Self::new_in(alloc);
        if capacity > 0 {
            vector.resize_storage(capacity)?;
        }
        Ok(vector)
    }

    /// Creates a vector holding clones of `items`, with exactly that capacity.
    pub fn from_slice_in(items: &[T], alloc: A) -> Result<Self, AllocError>
    where
        T: Clone,
    {
        let mut vector = Self::with_capacity_in(items.len(), alloc)?;
        vector.append_slice(items)?;
        Ok(vector)
    }

    /// Drops every element and releases the buffer.
    pub fn free(self) {
        drop(self)
    }

    /// Returns the number of elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.header.length
    }

    /// Alias of [`Vector::size`].
    #[inline]
    pub fn len(&self) -> usize {
        self.header.length
    }

    /// Returns the number of elements the buffer can hold without growing.
    /// Zero for an unallocated vector.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.header.capacity
    }

    /// Returns `true` once a buffer has been allocated.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.header.capacity > 0
    }

    /// Returns `true` if the next insertion will grow the buffer.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.header.length == self.header.capacity
    }

    /// Returns `true` if the vector holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.header.length == 0
    }

    /// Returns the allocator backing this vector.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Pointer to the first element (`begin`).
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to the first element.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// `begin..end`, where `end` is one past the last element and must not
    /// be dereferenced.
    pub fn as_ptr_range(&self) -> Range<*const T> {
        self.as_slice().as_ptr_range()
    }

    /// Views the elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `length` slots are initialized; `ptr` is dangling
        // but aligned when nothing is allocated, which is valid for len 0.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.header.length) }
    }

    /// Views the elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: see `as_slice`.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.header.length) }
    }

    /// Grows the capacity to exactly `capacity` if it is larger than the
    /// current one. Never shrinks.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), AllocError> {
        if capacity > self.header.capacity {
            self.resize_storage(capacity)?;
        }
        Ok(())
    }

    /// Shrinks the capacity down to the current size (at least one slot).
    pub fn fit(&mut self) -> Result<(), AllocError> {
        let target = self.header.length.max(1);
        if self.is_allocated() && target < self.header.capacity {
            self.resize_storage(target)?;
        }
        Ok(())
    }

    /// Appends `value`, growing first if the vector is full.
    pub fn push(&mut self, value: T) -> Result<(), AllocError> {
        self.insert(self.header.length, value)
    }

    /// Inserts `value` at the front. This shifts every element: O(n).
    pub fn push_front(&mut self, value: T) -> Result<(), AllocError> {
        self.insert(0, value)
    }

    /// Appends `count` elements produced by `fill(i)` for `i in 0..count` and
    /// returns them as a slice.
    pub fn push_n_with<F>(&mut self, count: usize, fill: F) -> Result<&mut [T], AllocError>
    where
        F: FnMut(usize) -> T,
    {
        self.insert_n_with(self.header.length, count, fill)
    }

    /// Removes and returns the last element, then halves the capacity if the
    /// vector has dropped to a quarter full. Returns `None`, without touching
    /// the vector, when it is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.header.length == 0 {
            return None;
        }
        self.header.length -= 1;
        // SAFETY: the slot at the old last index is initialized and is now
        // outside `length`, so it is read exactly once.
        let value = unsafe { ptr::read(self.ptr.as_ptr().add(self.header.length)) };
        self.shrink_maybe();
        Some(value)
    }

    /// Inserts `value` at `index`, shifting the tail right by one slot.
    ///
    /// # Panics
    ///
    /// Panics if `index > size`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), AllocError> {
        let length = self.header.length;
        assert!(
            index <= length,
            "insertion index (is {index}) should be <= size (is {length})"
        );
        self.grow_for(1)?;
        // SAFETY: capacity >= length + 1; the tail move stays in bounds and
        // leaves `index` free for the write.
        unsafe {
            let slot = self.ptr.as_ptr().add(index);
            ptr::copy(slot, slot.add(1), length - index);
            slot.write(value);
        }
        self.header.length = length + 1;
        Ok(())
    }

    /// Inserts `count` elements produced by `fill(i)` at `index`, moving the
    /// tail once, and returns the new elements as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `index > size`. If `fill` panics, the elements after
    /// `index` are leaked rather than dropped.
    pub fn insert_n_with<F>(
        &mut self,
        index: usize,
        count: usize,
        mut fill: F,
    ) -> Result<&mut [T], AllocError>
    where
        F: FnMut(usize) -> T,
    {
        let length = self.header.length;
        assert!(
            index <= length,
            "insertion index (is {index}) should be <= size (is {length})"
        );
        self.grow_for(count)?;
        // SAFETY: capacity >= length + count. While the gap is open the
        // length is cut back to `index`, so a panicking `fill` can only leak.
        unsafe {
            let start = self.ptr.as_ptr().add(index);
            ptr::copy(start, start.add(count), length - index);
            self.header.length = index;
            for offset in 0..count {
                start.add(offset).write(fill(offset));
            }
            self.header.length = length + count;
            Ok(slice::from_raw_parts_mut(start, count))
        }
    }

    /// Removes and returns the element at `index`, shifting the tail left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= size`.
    pub fn delete(&mut self, index: usize) -> T {
        let length = self.header.length;
        assert!(
            index < length,
            "removal index (is {index}) should be < size (is {length})"
        );
        // SAFETY: `index` is initialized; the tail move stays within `length`.
        let value = unsafe {
            let slot = self.ptr.as_ptr().add(index);
            let value = ptr::read(slot);
            ptr::copy(slot.add(1), slot, length - index - 1);
            value
        };
        self.header.length = length - 1;
        self.shrink_maybe();
        value
    }

    /// Drops the `count` elements starting at `index`, shifting the tail left
    /// once.
    ///
    /// # Panics
    ///
    /// Panics if `index + count > size`.
    pub fn delete_n(&mut self, index: usize, count: usize) {
        let length = self.header.length;
        let end = index.checked_add(count);
        assert!(
            matches!(end, Some(end) if end <= length),
            "removal range {index}+{count} out of bounds for size {length}"
        );
        if count == 0 {
            return;
        }
        // SAFETY: `index..index + count` is initialized. The length is cut
        // back to `index` first, so a panicking destructor can only leak.
        unsafe {
            let start = self.ptr.as_ptr().add(index);
            self.header.length = index;
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, count));
            ptr::copy(start.add(count), start, length - index - count);
        }
        self.header.length = length - count;
        self.shrink_maybe();
    }

    /// Drops every element, then applies the shrink policy once.
    pub fn clear(&mut self) {
        self.delete_n(0, self.header.length);
    }

    /// Sets every element to a clone of `value`.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.as_mut_slice().fill(value);
    }

    /// Appends clones of `items`, growing at most once.
    pub fn append_slice(&mut self, items: &[T]) -> Result<(), AllocError>
    where
        T: Clone,
    {
        self.push_n_with(items.len(), |i| items[i].clone())?;
        Ok(())
    }

    /// Replaces the contents with clones of `items`. Capacity is reserved
    /// before anything is dropped, so a failure leaves the vector unchanged.
    pub fn copy_from(&mut self, items: &[T]) -> Result<(), AllocError>
    where
        T: Clone,
    {
        self.reserve(items.len())?;
        let length = self.header.length;
        self.header.length = 0;
        // SAFETY: the old elements are dropped once; the buffer holds at
        // least `items.len()` slots after the reserve above.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), length));
            for (offset, item) in items.iter().enumerate() {
                self.ptr.as_ptr().add(offset).write(item.clone());
                self.header.length = offset + 1;
            }
        }
        Ok(())
    }

    /// Appends every item yielded by `items`. Items pushed before a failing
    /// allocation stay in the vector.
    pub fn try_extend<I>(&mut self, items: I) -> Result<(), AllocError>
    where
        I: IntoIterator<Item = T>,
    {
        for item in items {
            self.push(item)?;
        }
        Ok(())
    }

    /// Clones the vector, keeping its capacity, through a clone of its allocator.
    pub fn try_clone(&self) -> Result<Self, AllocError>
    where
        T: Clone,
        A: Clone,
    {
        let mut copy = Self::with_capacity_in(self.header.capacity, self.alloc.clone())?;
        copy.append_slice(self)?;
        Ok(copy)
    }

    /// Makes room for `additional` more elements, doubling the capacity as
    /// many times as needed.
    fn grow_for(&mut self, additional: usize) -> Result<(), AllocError> {
        let required = self
            .header
            .length
            .checked_add(additional)
            .ok_or(AllocError::CapacityOverflow)?;
        if required <= self.header.capacity {
            return Ok(());
        }

        let mut capacity = if self.header.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            self.header.capacity
        };
        while capacity < required {
            capacity = capacity
                .checked_mul(2)
                .ok_or(AllocError::CapacityOverflow)?;
        }
        self.resize_storage(capacity)
    }

    /// Halves the capacity if the vector is at most a quarter full.
    fn shrink_maybe(&mut self) {
        let Header { capacity, length } = self.header;
        if capacity == 0 || length > capacity / 4 {
            return;
        }
        let target = capacity / 2;
        if target == 0 || target < length {
            return;
        }
        if let Err(err) = self.resize_storage(target) {
            // The larger buffer is still valid; keep it.
            log::warn!("Vector shrink from {capacity} to {target} failed: {err}");
        }
    }

    /// Moves the elements into a buffer of exactly `capacity` slots. Only the
    /// capacity field changes; on failure nothing does.
    fn resize_storage(&mut self, capacity: usize) -> Result<(), AllocError> {
        debug_assert!(capacity > 0 && capacity >= self.header.length);

        if mem::size_of::<T>() != 0 {
            let new_layout = Layout::array::<T>(capacity).map_err(|_| AllocError::CapacityOverflow)?;
            let ptr = if self.header.capacity == 0 {
                self.alloc.allocate(new_layout)?
            } else {
                // SAFETY: the current buffer came from `alloc` with this
                // layout, and `new_layout` passed the size checks above.
                unsafe {
                    self.alloc
                        .reallocate(self.ptr.cast(), self.current_layout(), new_layout.size())?
                }
            };
            self.ptr = ptr.cast();
        }

        log::trace!(
            "Vector<{}> capacity {} -> {}",
            std::any::type_name::<T>(),
            self.header.capacity,
            capacity
        );
        self.header.capacity = capacity;
        Ok(())
    }

    fn current_layout(&self) -> Layout {
        // SAFETY: this exact layout was validated by `Layout::array` when the
        // buffer was last resized.
        unsafe {
            Layout::from_size_align_unchecked(
                mem::size_of::<T>() * self.header.capacity,
                mem::align_of::<T>(),
            )
        }
    }
}

impl<T, A: RawAllocator> Drop for Vector<T, A> {
    fn drop(&mut self) {
        // SAFETY: the first `length` slots are initialized and dropped once;
        // the buffer came from `alloc` with `current_layout`.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.header.length,
            ));
            if self.header.capacity > 0 && mem::size_of::<T>() != 0 {
                self.alloc.release(self.ptr.cast(), self.current_layout());
            }
        }
    }
}

impl<T, A: RawAllocator> Deref for Vector<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: RawAllocator> DerefMut for Vector<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: RawAllocator + Default> Default for Vector<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Clone, A: RawAllocator + Clone> Clone for Vector<T, A> {
    /// # Panics
    ///
    /// Panics if the copy cannot be allocated. Use [`Vector::try_clone`] to
    /// handle that case.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("Vector clone failed: {err}"),
        }
    }
}

impl<T: fmt::Debug, A: RawAllocator> fmt::Debug for Vector<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, A, B> PartialEq<Vector<U, B>> for Vector<T, A>
where
    T: PartialEq<U>,
    A: RawAllocator,
    B: RawAllocator,
{
    fn eq(&self, other: &Vector<U, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: RawAllocator> Eq for Vector<T, A> {}

impl<T: PartialEq<U>, U, A: RawAllocator> PartialEq<[U]> for Vector<T, A> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U, A: RawAllocator> PartialEq<&[U]> for Vector<T, A> {
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: PartialEq<U>, U, A: RawAllocator, const N: usize> PartialEq<[U; N]> for Vector<T, A> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a, T, A: RawAllocator> IntoIterator for &'a Vector<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: RawAllocator> IntoIterator for &'a mut Vector<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
