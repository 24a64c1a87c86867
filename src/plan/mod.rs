// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Turning a working set into executable task instances.

mod instancer;
mod params;
mod pointer;
mod task;

pub use instancer::{slug, FanOutInstancer};
pub use params::{ParameterResolver, ResolvedParams, RunContext, ENGINE_RUN_NAME_PLACEHOLDER};
pub use pointer::{parse_s3_uri, DatasetPointer};
pub use task::{ExecutionPlan, TaskInstance};
