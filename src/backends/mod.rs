// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution engine backends and the stage templates they run.
//!
//! ## Argo Backend
//! [`ArgoEngine`] talks to the Argo Workflows REST API. Stage templates are
//! registered as `WorkflowTemplate`s and every run is submitted as a
//! `Workflow` whose single DAG template references them.
//!
//! ## Stub Backend (Test-Only)
//! `ScriptedEngine` replays scripted phase snapshots so the watcher and the
//! orchestrator can be tested without a cluster.

pub mod argo;
#[cfg(test)]
pub mod stub;
pub mod templates;

pub use argo::ArgoEngine;
pub use templates::TemplateRegistry;
