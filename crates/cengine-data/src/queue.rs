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

//! A FIFO queue over [`Vector`].
//!
//! Items enter at the front of the vector and leave from the back, so
//! [`Queue::dequeue`] is O(1) and [`Queue::enqueue`] shifts every queued item:
//! O(n). Suited to the short queues the engine uses (input events, pending
//! commands); long-lived deep queues should use a ring buffer instead.

use crate::allocators::SystemAllocator;
use crate::vector::Vector;
use cengine_core::{AllocError, RawAllocator};
use std::fmt;

/// First-in, first-out queue.
pub struct Queue<T, A: RawAllocator = SystemAllocator> {
    items: Vector<T, A>,
}

impl<T> Queue<T> {
    /// Creates an empty, unallocated queue.
    pub const fn new() -> Self {
        Self {
            items: Vector::new(),
        }
    }

    /// Creates a queue with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::with_capacity_in(capacity, SystemAllocator)
    }
}

impl<T, A: RawAllocator> Queue<T, A> {
    /// Creates a queue with room for `capacity` items allocated through `alloc`.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, AllocError> {
        Ok(Self {
            items: Vector::with_capacity_in(capacity, alloc)?,
        })
    }

    /// Adds `value` behind every queued item. O(n).
    pub fn enqueue(&mut self, value: T) -> Result<(), AllocError> {
        self.items.push_front(value)
    }

    /// Removes the oldest item, or returns `None` if the queue is empty.
    pub fn dequeue(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// The item the next [`Queue::dequeue`] will return.
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.size()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every queued item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterates from the oldest item to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().rev()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, A: RawAllocator> fmt::Debug for Queue<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
