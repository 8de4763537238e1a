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

//! # CEngine Data
//!
//! The engine's generic growable array and the containers composed from it:
//! dynamic strings, stacks, queues and a separately chained hash table. Also
//! hosts the allocator implementations the containers are parameterized by.

#![warn(missing_docs)]

pub mod allocators;
pub mod hash;
pub mod hashtable;
pub mod list;
pub mod queue;
pub mod stack;
pub mod string;
pub mod vector;

pub use allocators::{GlobalTrackingAllocator, SystemAllocator, TrackingAllocator};
pub use hashtable::{EqFn, HashTable, KeyEq, KeyEquality};
pub use list::List;
pub use queue::Queue;
pub use stack::Stack;
pub use string::DString;
pub use vector::{Vector, DEFAULT_CAPACITY};
