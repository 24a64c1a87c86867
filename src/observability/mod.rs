// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic emitted by the orchestrator goes through a message type in
//! [`messages`]. Message types follow a struct-based pattern with a `Display`
//! implementation so that:
//!
//! * log text lives in one place instead of format strings scattered around
//! * each event carries the same structured fields every time it is logged
//! * the level of an event is decided by the event, not by the call site
//!
//! # Usage
//!
//! ```rust
//! use ngiab_orchestrator::observability::messages::StructuredLog;
//! use ngiab_orchestrator::observability::messages::watch::PollTimedOut;
//!
//! let msg = PollTimedOut {
//!     run_id: "20250101-000000-abcd1234",
//!     engine_handle: "ngiab-chain-x7k2p",
//!     pending_nodes: 2,
//! };
//!
//! msg.log();
//! ```

pub mod messages;

/// Install the global `tracing` subscriber used by the binary.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
