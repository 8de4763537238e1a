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

//! Engine configuration, loaded from JSON.
//!
//! Every field has a default, so an empty object `{}` is a valid config and
//! a file only needs to name the values it overrides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logger setup.
    pub logging: LoggingConfig,
    /// Initial sizes used when the engine creates containers.
    pub collections: CollectionsConfig,
    /// Print the allocation statistics when the application shuts down.
    pub memory_report_on_exit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            collections: CollectionsConfig::default(),
            memory_report_on_exit: true,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source_error| ConfigError::Io {
            path: path.display().to_string(),
            source_error,
        })?;
        log::debug!("Loaded engine config from '{}'", path.display());
        Self::from_json_str(&text)
    }

    /// Checks the values that deserialization alone cannot reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collections.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level is empty".to_string()));
        }
        Ok(())
    }
}

/// Logger setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter, in `env_logger` syntax (`"info"`, `"debug"`, ...).
    /// `RUST_LOG` still takes precedence when it is set.
    pub level: String,
    /// Per-module level overrides.
    pub module_filters: Vec<ModuleFilter>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            module_filters: Vec::new(),
        }
    }
}

/// A level override for one module path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFilter {
    /// Module path prefix, e.g. `cengine_data::vector`.
    pub module: String,
    /// Level name: `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
}

/// Initial sizes used when the engine creates containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    /// Capacity given to vectors created from this config.
    pub vector_capacity: usize,
    /// Fixed directory size of hash tables created from this config.
    pub hashtable_buckets: usize,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            vector_capacity: 8,
            hashtable_buckets: 64,
        }
    }
}

impl CollectionsConfig {
    /// Rejects a zero bucket count; a table directory can never be resized.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hashtable_buckets == 0 {
            return Err(ConfigError::Invalid(
                "collections.hashtable_buckets must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
