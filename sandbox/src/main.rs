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

use anyhow::{Context, Result};
use cengine_core::{timestamp, EngineConfig, Timer};
use cengine_data::{DString, GlobalTrackingAllocator, HashTable, List, Queue, Stack, Vector};
use cengine_telemetry::{init_logging, MemoryReport};
use std::alloc::System;

#[global_allocator]
static GLOBAL: GlobalTrackingAllocator<System> = GlobalTrackingAllocator::new(System);

fn main() -> Result<()> {
    let config = load_config()?;
    init_logging(&config.logging)?;
    log::info!("Sandbox starting at {} UTC", timestamp());

    let mut timer = Timer::start();
    run(&config)?;
    log::info!("Container demo took {:?}", timer.split());

    if config.memory_report_on_exit {
        MemoryReport::global().log();
    }
    Ok(())
}

/// Reads the config file named by the first argument, or uses the defaults.
fn load_config() -> Result<EngineConfig> {
    match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config from '{path}'")),
        None => Ok(EngineConfig::default()),
    }
}

fn run(config: &EngineConfig) -> Result<()> {
    let collections = &config.collections;

    let mut frame_times = Vector::with_capacity(collections.vector_capacity)?;
    for frame in 1..=5u32 {
        frame_times.push(16 + frame % 3)?;
    }
    log::info!(
        "Frame times {:?} (size {}, capacity {})",
        frame_times,
        frame_times.size(),
        frame_times.capacity()
    );
    while frame_times.size() > 1 {
        frame_times.pop();
    }
    log::info!("After draining: capacity {}", frame_times.capacity());

    let mut title = DString::create("hi")?;
    title.push(b'!')?;
    title.append_fmt(format_args!(" {} frames", 5))?;
    log::info!("Title {title:?} ({} bytes with terminator)", title.size());

    let command_line = DString::create("load level_01 --fast")?;
    let words = command_line.tokenize(b" ")?;
    log::info!("Command tokens: {words:?}");

    let mut scenes = Stack::new();
    scenes.push("menu")?;
    scenes.push("level_01")?;
    scenes.push("pause")?;
    log::info!("Leaving scene {:?}, back to {:?}", scenes.pop(), scenes.peek());

    let mut input = Queue::new();
    for key in ['w', 'a', 's', 'd'] {
        input.enqueue(key)?;
    }
    while let Some(key) = input.dequeue() {
        log::debug!("Handling key '{key}'");
    }

    let mut assets = HashTable::with_buckets(collections.hashtable_buckets)?;
    for (id, name) in ["player.mesh", "grass.png", "theme.ogg"].into_iter().enumerate() {
        assets.insert(DString::create(name)?, id)?;
    }
    let lookup = DString::create("grass.png")?;
    log::info!(
        "Asset '{lookup}' -> {:?} ({} entries, {} collisions)",
        assets.find(&lookup),
        assets.len(),
        assets.collisions()
    );

    let mut waypoints = List::new();
    waypoints.push((0, 0));
    waypoints.push((4, 2));
    waypoints.prepend((-1, 0));
    let reversed = waypoints.collect_rev()?;
    log::info!("Waypoints {waypoints:?}, reversed {reversed:?}");

    Ok(())
}
