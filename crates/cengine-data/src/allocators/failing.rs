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

//! Test double: an allocator that refuses requests once its budget is spent.

use super::SystemAllocator;
use cengine_core::{AllocError, RawAllocator};
use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

/// Grants `budget` allocate/reallocate calls, then fails every further one.
/// Clones share the budget.
#[derive(Debug, Clone)]
pub(crate) struct FailingAllocator {
    remaining: Rc<Cell<usize>>,
}

impl FailingAllocator {
    pub(crate) fn new(budget: usize) -> Self {
        Self {
            remaining: Rc::new(Cell::new(budget)),
        }
    }

    /// Replaces the remaining budget.
    pub(crate) fn set_budget(&self, budget: usize) {
        self.remaining.set(budget);
    }

    fn take_one(&self, bytes: usize) -> Result<(), AllocError> {
        match self.remaining.get() {
            0 => Err(AllocError::OutOfMemory {
                requested_bytes: bytes,
            }),
            n => {
                self.remaining.set(n - 1);
                Ok(())
            }
        }
    }
}

impl RawAllocator for FailingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.take_one(layout.size())?;
        SystemAllocator.allocate(layout)
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        self.take_one(new_size)?;
        SystemAllocator.reallocate(ptr, old_layout, new_size)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        SystemAllocator.release(ptr, layout);
    }
}
