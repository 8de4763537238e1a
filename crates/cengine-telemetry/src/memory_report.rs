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

//! The allocation report an application prints on shutdown.

use cengine_core::{MemoryCounters, MemoryStats, GLOBAL_COUNTERS};
use serde::Serialize;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const RULE: &str = "---------------------------------------";

/// A summary of one [`MemoryCounters`] set at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryReport {
    /// The snapshot the report was built from.
    pub stats: MemoryStats,
    /// Bytes still live when the snapshot was taken.
    pub leaked_bytes: usize,
}

impl MemoryReport {
    /// Builds a report from an existing snapshot.
    pub fn from_stats(stats: MemoryStats) -> Self {
        Self {
            stats,
            leaked_bytes: stats.current_bytes,
        }
    }

    /// Snapshots `counters` and builds a report from them.
    pub fn from_counters(counters: &MemoryCounters) -> Self {
        Self::from_stats(counters.snapshot())
    }

    /// Reports on the counters fed by the `#[global_allocator]`.
    pub fn global() -> Self {
        Self::from_counters(&GLOBAL_COUNTERS)
    }

    /// Total bytes ever handed out, in megabytes.
    pub fn total_allocated_mb(&self) -> f64 {
        self.stats.bytes_allocated_lifetime as f64 / BYTES_PER_MB
    }

    /// Peak live bytes, in megabytes.
    pub fn peak_usage_mb(&self) -> f64 {
        self.stats.peak_bytes as f64 / BYTES_PER_MB
    }

    /// Bytes still live, in megabytes.
    pub fn leaked_mb(&self) -> f64 {
        self.leaked_bytes as f64 / BYTES_PER_MB
    }

    /// Returns `true` if anything is still allocated.
    pub fn has_leaks(&self) -> bool {
        !self.stats.is_balanced()
    }

    /// Renders the multi-line statistics banner.
    pub fn render(&self) -> String {
        let stats = &self.stats;
        format!(
            "{RULE}\n\
             ---------- MEMORY STATISTICS ----------\n\
             {RULE}\n\
             \n\
             Total allocated:    {:>20} B ({:.3} MB)\n\
             Peak memory usage:  {:>20} B ({:.3} MB)\n\
             Leaked memory:      {:>20} B ({:.3} MB)\n\
             \n\
             Failed allocations: {:>5}\n\
             Alloc calls:        {:>5}\n\
             Realloc calls:      {:>5}\n\
             Free calls:         {:>5}\n\
             \n\
             {RULE}",
            stats.bytes_allocated_lifetime,
            self.total_allocated_mb(),
            stats.peak_bytes,
            self.peak_usage_mb(),
            self.leaked_bytes,
            self.leaked_mb(),
            stats.failed_allocations,
            stats.allocations,
            stats.reallocations,
            stats.deallocations,
        )
    }

    /// Logs the banner at `info`, or at `warn` when memory is still live.
    pub fn log(&self) {
        let level = if self.has_leaks() {
            log::Level::Warn
        } else {
            log::Level::Info
        };
        log::log!(level, "\n{}", self.render());
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_counters() -> MemoryCounters {
        let counters = MemoryCounters::new();
        counters.record_allocation(1024);
        counters.record_allocation(512);
        counters.record_reallocation(512, 1024);
        counters.record_deallocation(1024);
        counters.record_failure();
        counters
    }

    #[test]
    fn report_reflects_counters() {
        let report = MemoryReport::from_counters(&sample_counters());
        assert_eq!(report.leaked_bytes, 1024);
        assert_eq!(report.stats.allocations, 2);
        assert_eq!(report.stats.reallocations, 1);
        assert_eq!(report.stats.deallocations, 1);
        assert_eq!(report.stats.failed_allocations, 1);
        assert!(report.has_leaks());
    }

    #[test]
    fn banner_lists_every_figure() {
        let text = MemoryReport::from_counters(&sample_counters()).render();
        assert!(text.starts_with(RULE));
        assert!(text.contains("MEMORY STATISTICS"));
        assert!(text.contains("Peak memory usage:"));
        assert!(text.contains("Leaked memory:"));
        assert!(text.contains("Failed allocations:     1"));
        assert!(text.contains("Alloc calls:            2"));
        assert!(text.contains("Realloc calls:          1"));
        assert!(text.contains("Free calls:             1"));
        assert!(text.contains("1024 B (0.001 MB)"));
    }

    #[test]
    fn balanced_counters_report_no_leak() {
        let counters = MemoryCounters::new();
        counters.record_allocation(64);
        counters.record_deallocation(64);
        let report = MemoryReport::from_counters(&counters);
        assert!(!report.has_leaks());
        assert_eq!(report.leaked_mb(), 0.0);
    }

    #[test]
    fn json_carries_raw_and_derived_fields() {
        let json = MemoryReport::from_counters(&sample_counters())
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["leaked_bytes"], 1024);
        assert_eq!(value["stats"]["allocations"], 2);
        assert_eq!(value["stats"]["net_allocations"], 1);
    }
}
