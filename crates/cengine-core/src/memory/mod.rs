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

//! Provides the allocator contract used by every container and the counters
//! that an instrumented allocator feeds.
//!
//! Counters are plain values rather than process-wide state: a tracking
//! allocator is handed the [`MemoryCounters`] it should update, so tests and
//! subsystems can each observe their own allocations in isolation.
//! [`GLOBAL_COUNTERS`] exists for the one case that cannot take a context,
//! the `#[global_allocator]` of a binary.

mod allocator;

pub use allocator::RawAllocator;

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// The counter set updated by a `#[global_allocator]` registered by a binary.
///
/// It is quiet: the logger allocates, so a corrupted update from inside the
/// global allocator must not reach it.
pub static GLOBAL_COUNTERS: MemoryCounters = MemoryCounters::quiet();

/// A set of atomic allocation counters.
///
/// All updates use `Ordering::Relaxed`; readers get a consistent-enough view
/// for reporting through [`MemoryCounters::snapshot`]. An update that would
/// overflow or underflow the live byte count is rejected and, unless the set
/// is [quiet](MemoryCounters::quiet), logged at `error`.
#[derive(Debug, Default)]
pub struct MemoryCounters {
    current_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
    allocations: AtomicU64,
    reallocations: AtomicU64,
    deallocations: AtomicU64,
    failed_allocations: AtomicU64,
    bytes_allocated_lifetime: AtomicU64,
    bytes_deallocated_lifetime: AtomicU64,
    quiet: bool,
}

impl MemoryCounters {
    /// Creates a counter set with every value at zero.
    pub const fn new() -> Self {
        Self::with_quiet(false)
    }

    /// Creates a counter set that never logs, for use inside a global allocator.
    pub const fn quiet() -> Self {
        Self::with_quiet(true)
    }

    const fn with_quiet(quiet: bool) -> Self {
        Self {
            current_bytes: AtomicUsize::new(0),
            peak_bytes: AtomicUsize::new(0),
            allocations: AtomicU64::new(0),
            reallocations: AtomicU64::new(0),
            deallocations: AtomicU64::new(0),
            failed_allocations: AtomicU64::new(0),
            bytes_allocated_lifetime: AtomicU64::new(0),
            bytes_deallocated_lifetime: AtomicU64::new(0),
            quiet,
        }
    }

    /// Returns `true` if rejected updates are dropped without logging.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Records a successful allocation of `size` bytes.
    pub fn record_allocation(&self, size: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.add_live_bytes(size);
    }

    /// Records a successful reallocation from `old_size` to `new_size` bytes.
    pub fn record_reallocation(&self, old_size: usize, new_size: usize) {
        self.reallocations.fetch_add(1, Ordering::Relaxed);
        match new_size.cmp(&old_size) {
            std::cmp::Ordering::Greater => self.add_live_bytes(new_size - old_size),
            std::cmp::Ordering::Less => self.remove_live_bytes(old_size - new_size),
            std::cmp::Ordering::Equal => {}
        }
    }

    /// Records the release of a block of `size` bytes.
    pub fn record_deallocation(&self, size: usize) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.remove_live_bytes(size);
    }

    /// Records an allocation or reallocation request that the allocator refused.
    pub fn record_failure(&self) {
        self.failed_allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of bytes currently live.
    pub fn current_bytes(&self) -> usize {
        self.current_bytes.load(Ordering::Relaxed)
    }

    /// Returns the highest number of bytes that were live at the same time.
    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes.load(Ordering::Relaxed)
    }

    /// Takes a snapshot of every counter and computes the derived metrics.
    pub fn snapshot(&self) -> MemoryStats {
        let mut stats = MemoryStats {
            current_bytes: self.current_bytes.load(Ordering::Relaxed),
            peak_bytes: self.peak_bytes.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            reallocations: self.reallocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            failed_allocations: self.failed_allocations.load(Ordering::Relaxed),
            bytes_allocated_lifetime: self.bytes_allocated_lifetime.load(Ordering::Relaxed),
            bytes_deallocated_lifetime: self.bytes_deallocated_lifetime.load(Ordering::Relaxed),
            ..MemoryStats::default()
        };
        stats.calculate_derived_metrics();
        stats
    }

    /// Sets every counter back to zero.
    pub fn reset(&self) {
        self.current_bytes.store(0, Ordering::Relaxed);
        self.peak_bytes.store(0, Ordering::Relaxed);
        self.allocations.store(0, Ordering::Relaxed);
        self.reallocations.store(0, Ordering::Relaxed);
        self.deallocations.store(0, Ordering::Relaxed);
        self.failed_allocations.store(0, Ordering::Relaxed);
        self.bytes_allocated_lifetime.store(0, Ordering::Relaxed);
        self.bytes_deallocated_lifetime.store(0, Ordering::Relaxed);
    }

    fn add_live_bytes(&self, size: usize) {
        self.bytes_allocated_lifetime
            .fetch_add(size as u64, Ordering::Relaxed);
        let result =
            self.current_bytes
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    current.checked_add(size)
                });

        match result {
            Ok(previous) => {
                self.peak_bytes
                    .fetch_max(previous + size, Ordering::Relaxed);
            }
            Err(_) if !self.quiet => {
                log::error!("Memory tracking counter overflowed! Size: {size}")
            }
            Err(_) => {}
        }
    }

    fn remove_live_bytes(&self, size: usize) {
        self.bytes_deallocated_lifetime
            .fetch_add(size as u64, Ordering::Relaxed);
        let result =
            self.current_bytes
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    current.checked_sub(size)
                });

        if result.is_err() && !self.quiet {
            log::error!("Memory tracking counter underflowed! Size: {size}");
        }
    }
}

/// A snapshot of a [`MemoryCounters`] set, including derived metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    /// The number of bytes live when the snapshot was taken.
    pub current_bytes: usize,
    /// The highest number of bytes ever live at once.
    pub peak_bytes: usize,
    /// The number of successful allocations.
    pub allocations: u64,
    /// The number of successful reallocations.
    pub reallocations: u64,
    /// The number of releases.
    pub deallocations: u64,
    /// The number of requests the allocator refused.
    pub failed_allocations: u64,
    /// The cumulative number of bytes ever handed out, growth included.
    pub bytes_allocated_lifetime: u64,
    /// The cumulative number of bytes ever given back, shrinking included.
    pub bytes_deallocated_lifetime: u64,

    /// `allocations - deallocations`; non-zero at exit means a leak.
    pub net_allocations: i64,
    /// `bytes_allocated_lifetime / (allocations + reallocations)`.
    pub average_allocation_size: f64,
}

impl MemoryStats {
    /// Populates the derived metrics based on the raw counter values.
    pub fn calculate_derived_metrics(&mut self) {
        self.net_allocations = self.allocations as i64 - self.deallocations as i64;

        let requests = self.allocations + self.reallocations;
        if requests > 0 {
            self.average_allocation_size = self.bytes_allocated_lifetime as f64 / requests as f64;
        }
    }

    /// Returns `true` if every allocated byte has been released.
    pub fn is_balanced(&self) -> bool {
        self.current_bytes == 0 && self.net_allocations == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn counters_track_live_and_peak_bytes() {
        let counters = MemoryCounters::new();
        counters.record_allocation(64);
        counters.record_allocation(32);
        counters.record_deallocation(64);

        assert_eq!(counters.current_bytes(), 32);
        assert_eq!(counters.peak_bytes(), 96);
    }

    #[test]
    fn reallocation_adjusts_live_bytes_both_ways() {
        let counters = MemoryCounters::new();
        counters.record_allocation(16);
        counters.record_reallocation(16, 64);
        assert_eq!(counters.current_bytes(), 64);
        counters.record_reallocation(64, 8);
        assert_eq!(counters.current_bytes(), 8);

        let stats = counters.snapshot();
        assert_eq!(stats.reallocations, 2);
        assert_eq!(stats.peak_bytes, 64);
        assert_eq!(stats.bytes_allocated_lifetime, 64);
        assert_eq!(stats.bytes_deallocated_lifetime, 56);
    }

    #[test]
    fn snapshot_derives_net_allocations_and_average() {
        let counters = MemoryCounters::new();
        counters.record_allocation(10);
        counters.record_allocation(30);
        counters.record_deallocation(10);
        counters.record_failure();

        let stats = counters.snapshot();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.deallocations, 1);
        assert_eq!(stats.failed_allocations, 1);
        assert_eq!(stats.net_allocations, 1);
        assert_eq!(stats.average_allocation_size, 20.0);
        assert!(!stats.is_balanced());
    }

    #[test]
    fn underflow_is_rejected_without_wrapping() {
        let counters = MemoryCounters::new();
        counters.record_deallocation(8);
        assert_eq!(counters.current_bytes(), 0);
    }

    thread_local! {
        static ERRORS_LOGGED: Cell<usize> = const { Cell::new(0) };
    }

    struct CountingLogger;

    impl log::Log for CountingLogger {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            if record.level() == log::Level::Error {
                ERRORS_LOGGED.with(|count| count.set(count.get() + 1));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CountingLogger = CountingLogger;

    fn errors_logged_by(f: impl FnOnce()) -> usize {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
        let before = ERRORS_LOGGED.with(Cell::get);
        f();
        ERRORS_LOGGED.with(Cell::get) - before
    }

    #[test]
    fn quiet_counters_reject_underflow_without_logging() {
        let quiet = MemoryCounters::quiet();
        assert_eq!(errors_logged_by(|| quiet.record_deallocation(8)), 0);
        assert_eq!(quiet.current_bytes(), 0);

        let loud = MemoryCounters::new();
        assert_eq!(errors_logged_by(|| loud.record_deallocation(8)), 1);
    }

    #[test]
    fn global_counters_are_quiet() {
        assert!(GLOBAL_COUNTERS.is_quiet());
        assert!(!MemoryCounters::new().is_quiet());
    }

    #[test]
    fn reset_zeroes_everything() {
        let counters = MemoryCounters::new();
        counters.record_allocation(128);
        counters.reset();
        assert_eq!(counters.snapshot(), MemoryStats::default());
    }
}
