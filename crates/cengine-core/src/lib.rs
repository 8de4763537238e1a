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

//! # CEngine Core
//!
//! Foundational crate containing the allocator contract, the allocation
//! counters, the shared error types, the engine configuration and timing.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod memory;
pub mod time;

pub use config::{CollectionsConfig, EngineConfig, LoggingConfig, ModuleFilter};
pub use error::{AllocError, CollectionError, ConfigError};
pub use memory::{MemoryCounters, MemoryStats, RawAllocator, GLOBAL_COUNTERS};
pub use time::{timestamp, Timer};
