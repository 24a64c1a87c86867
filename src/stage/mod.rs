// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage classification and the parent-selection policy between stages.

mod classifier;
mod policy;

pub use classifier::{classify, is_dataset_consumer, StageTag};
pub use policy::ParentPolicy;
