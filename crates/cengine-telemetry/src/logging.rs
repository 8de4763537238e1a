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

//! `env_logger` setup from a [`LoggingConfig`].

use anyhow::{anyhow, bail, Result};
use cengine_core::LoggingConfig;
use env_logger::{Builder, Env};
use log::LevelFilter;
use std::str::FromStr;

/// Builds a logger for `config` without installing it.
///
/// `config.level` is the default filter; `RUST_LOG` overrides it when set.
/// Module filters are applied on top of either.
pub fn build_logger(config: &LoggingConfig) -> Result<Builder> {
    let level = config.level.trim();
    if level.is_empty() {
        bail!("logging level is empty");
    }

    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    for filter in &config.module_filters {
        let module_level = LevelFilter::from_str(filter.level.trim()).map_err(|_| {
            anyhow!(
                "invalid level '{}' for module '{}'",
                filter.level,
                filter.module
            )
        })?;
        builder.filter_module(&filter.module, module_level);
    }
    Ok(builder)
}

/// Installs the global logger for `config`.
///
/// Returns `Ok(false)` if a logger was already installed, which leaves the
/// existing one in place. Only configuration errors are reported as `Err`.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let mut builder = build_logger(config)?;
    match builder.try_init() {
        Ok(()) => {
            log::debug!("Logger initialized at level '{}'", config.level);
            Ok(true)
        }
        Err(_) => {
            log::debug!("Logger already initialized; keeping the existing one");
            Ok(false)
        }
    }
}
