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

//! A LIFO stack over [`Vector`].

use crate::allocators::SystemAllocator;
use crate::vector::Vector;
use cengine_core::{AllocError, RawAllocator};
use std::fmt;

/// Last-in, first-out stack. Push and pop work at the end of the underlying
/// vector, so both are amortized O(1) and follow its grow/shrink policy.
pub struct Stack<T, A: RawAllocator = SystemAllocator> {
    items: Vector<T, A>,
}

impl<T> Stack<T> {
    /// Creates an empty, unallocated stack.
    pub const fn new() -> Self {
        Self {
            items: Vector::new(),
        }
    }

    /// Creates a stack with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::with_capacity_in(capacity, SystemAllocator)
    }
}

impl<T, A: RawAllocator> Stack<T, A> {
    /// Creates a stack with room for `capacity` items allocated through `alloc`.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, AllocError> {
        Ok(Self {
            items: Vector::with_capacity_in(capacity, alloc)?,
        })
    }

    /// Pushes `value` on top.
    pub fn push(&mut self, value: T) -> Result<(), AllocError> {
        self.items.push(value)
    }

    /// Removes the top item, or returns `None` if the stack is empty.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// The top item.
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    /// The top item, mutably.
    pub fn peek_mut(&mut self) -> Option<&mut T> {
        self.items.last_mut()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.size()
    }

    /// Returns `true` if the stack holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Capacity of the underlying vector.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, A: RawAllocator> fmt::Debug for Stack<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
