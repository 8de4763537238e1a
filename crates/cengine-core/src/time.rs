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

//! Monotonic interval timing and wall-clock timestamps.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// A monotonic timer measuring the time since it was started or last split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timer {
    started: Instant,
}

impl Timer {
    /// Starts a new timer.
    #[inline]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Returns the time elapsed since the last start or split, then restarts
    /// the timer from now.
    pub fn split(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.started);
        self.started = now;
        elapsed
    }

    /// Returns the time elapsed since the last start or split.
    #[inline]
    pub fn read(&self) -> Duration {
        self.started.elapsed()
    }

    /// Same as [`Timer::read`], in seconds.
    #[inline]
    pub fn read_secs_f64(&self) -> f64 {
        self.read().as_secs_f64()
    }

    /// The instant the current interval began.
    pub fn started_at(&self) -> Instant {
        self.started
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Formats the current UTC time of day as `HH:MM:SS.mmm`.
pub fn timestamp() -> String {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    format_time_of_day(since_epoch)
}

/// Formats the time of day of `since_epoch` as `HH:MM:SS.mmm`.
pub fn format_time_of_day(since_epoch: Duration) -> String {
    let seconds = since_epoch.as_secs() % SECONDS_PER_DAY;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60,
        since_epoch.subsec_millis()
    )
}
