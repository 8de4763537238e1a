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

//! Allocators that record every request into a [`MemoryCounters`] set.

use super::SystemAllocator;
use cengine_core::{AllocError, MemoryCounters, RawAllocator, GLOBAL_COUNTERS};
use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr::NonNull;
use std::sync::Arc;

/// A [`RawAllocator`] wrapper that records allocations, reallocations,
/// releases and failures into the counter set it was given.
///
/// The counters are injected rather than global, so two containers (or two
/// tests) built on different `TrackingAllocator`s never see each other's
/// traffic.
///
/// # Usage
///
/// ```rust
/// use std::sync::Arc;
/// use cengine_core::MemoryCounters;
/// use cengine_data::{TrackingAllocator, Vector};
///
/// let counters = Arc::new(MemoryCounters::new());
/// let mut v = Vector::try_new_in(TrackingAllocator::new(counters.clone())).unwrap();
/// v.push(1u32).unwrap();
/// assert_eq!(counters.current_bytes(), 8 * 4);
/// ```
#[derive(Debug, Clone)]
pub struct TrackingAllocator<A = SystemAllocator> {
    inner: A,
    counters: Arc<MemoryCounters>,
}

impl TrackingAllocator<SystemAllocator> {
    /// Creates a tracking allocator over the process heap.
    pub fn new(counters: Arc<MemoryCounters>) -> Self {
        Self::with_inner(SystemAllocator, counters)
    }
}

impl<A> TrackingAllocator<A> {
    /// Creates a tracking allocator that wraps the given inner allocator.
    pub fn with_inner(inner: A, counters: Arc<MemoryCounters>) -> Self {
        Self { inner, counters }
    }

    /// Returns the counter set this allocator records into.
    pub fn counters(&self) -> &Arc<MemoryCounters> {
        &self.counters
    }
}

impl<A: RawAllocator> RawAllocator for TrackingAllocator<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        match self.inner.allocate(layout) {
            Ok(ptr) => {
                self.counters.record_allocation(layout.size());
                Ok(ptr)
            }
            Err(err) => {
                self.counters.record_failure();
                log::error!("Could not allocate {} B", layout.size());
                Err(err)
            }
        }
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        match self.inner.reallocate(ptr, old_layout, new_size) {
            Ok(new_ptr) => {
                self.counters
                    .record_reallocation(old_layout.size(), new_size);
                Ok(new_ptr)
            }
            Err(err) => {
                self.counters.record_failure();
                log::error!(
                    "Could not reallocate {} B to {} B",
                    old_layout.size(),
                    new_size
                );
                Err(err)
            }
        }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        self.counters.record_deallocation(layout.size());
        self.inner.release(ptr, layout);
    }
}

/// A `GlobalAlloc` wrapper (around `std::alloc::System` by default) that
/// records every heap allocation of the process into [`GLOBAL_COUNTERS`].
///
/// # Usage
///
/// ```rust,ignore
/// use cengine_data::GlobalTrackingAllocator;
///
/// #[global_allocator]
/// static GLOBAL: GlobalTrackingAllocator = GlobalTrackingAllocator::new(std::alloc::System);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalTrackingAllocator<G = System> {
    inner: G,
}

impl<G> GlobalTrackingAllocator<G> {
    /// Creates a new tracking allocator that wraps the given inner allocator.
    pub const fn new(inner: G) -> Self {
        Self { inner }
    }
}

// Nothing in here may log: the logger itself allocates. `GLOBAL_COUNTERS` is quiet.
unsafe impl<G: GlobalAlloc> GlobalAlloc for GlobalTrackingAllocator<G> {
    /// Allocates memory and updates the global counters.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `layout` has a non-zero size.
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if ptr.is_null() {
            GLOBAL_COUNTERS.record_failure();
        } else {
            GLOBAL_COUNTERS.record_allocation(layout.size());
        }
        ptr
    }

    /// Deallocates memory and updates the global counters.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` was allocated by this allocator with the same `layout`.
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        GLOBAL_COUNTERS.record_deallocation(layout.size());
        self.inner.dealloc(ptr, layout);
    }

    /// Allocates zero-initialized memory and updates the global counters.
    ///
    /// # Safety
    ///
    /// This function is unsafe for the same reasons as `alloc`.
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if ptr.is_null() {
            GLOBAL_COUNTERS.record_failure();
        } else {
            GLOBAL_COUNTERS.record_allocation(layout.size());
        }
        ptr
    }

    /// Reallocates memory and updates the global counters.
    ///
    /// # Safety
    ///
    /// This function is unsafe for the same reasons as `realloc` in `GlobalAlloc`.
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        if new_ptr.is_null() {
            GLOBAL_COUNTERS.record_failure();
        } else {
            GLOBAL_COUNTERS.record_reallocation(layout.size(), new_size);
        }
        new_ptr
    }
}
