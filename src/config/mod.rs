// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod env;
mod loader;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use env::parse_flag;
pub use loader::{load_config, EngineConfig, OrchestratorConfig, StorageConfig, WatchOptions};
