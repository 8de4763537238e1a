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

//! Defines the error types shared by the containers and the configuration layer.

use std::fmt;

/// An error returned when the backing storage of a container could not be
/// obtained or resized.
///
/// Containers that return this error leave their contents and capacity exactly
/// as they were before the failing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The underlying allocator refused the request.
    OutOfMemory {
        /// The size of the rejected request, in bytes.
        requested_bytes: usize,
    },
    /// The requested element count does not fit in the address space.
    CapacityOverflow,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::OutOfMemory { requested_bytes } => {
                write!(f, "Could not allocate {requested_bytes} B")
            }
            AllocError::CapacityOverflow => write!(f, "Requested capacity overflows usize"),
        }
    }
}

impl std::error::Error for AllocError {}

/// An error raised by a container operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// Storage could not be allocated or resized.
    Alloc(AllocError),
    /// A hash table was requested with a bucket directory of size zero.
    ZeroBuckets,
    /// A formatting trait implementation returned an error while writing
    /// into a dynamic string.
    Format,
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::Alloc(err) => write!(f, "Allocation failed: {err}"),
            CollectionError::ZeroBuckets => {
                write!(f, "A hash table needs at least one bucket")
            }
            CollectionError::Format => write!(f, "Formatting into a string failed"),
        }
    }
}

impl std::error::Error for CollectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectionError::Alloc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocError> for CollectionError {
    fn from(err: AllocError) -> Self {
        CollectionError::Alloc(err)
    }
}

/// An error related to loading or validating the engine configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        /// The path of the file that failed to load.
        path: String,
        /// The underlying I/O error.
        source_error: std::io::Error,
    },
    /// The configuration text is not valid JSON for [`crate::EngineConfig`].
    Parse(serde_json::Error),
    /// The configuration parsed but holds a value the engine cannot use.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source_error } => {
                write!(f, "Failed to read config from '{path}': {source_error}")
            }
            ConfigError::Parse(err) => write!(f, "Failed to parse config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "Invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source_error, .. } => Some(source_error),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
