// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Task phase as reported by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Error,
    Terminated,
    Skipped,
    Omitted,
    Unknown(String),
}

impl Phase {
    /// A missing or blank phase means the engine has not started the task yet.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "Pending" => Phase::Pending,
            "Running" => Phase::Running,
            "Succeeded" => Phase::Succeeded,
            "Failed" => Phase::Failed,
            "Error" => Phase::Error,
            "Terminated" => Phase::Terminated,
            "Skipped" => Phase::Skipped,
            "Omitted" => Phase::Omitted,
            other => Phase::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Error => "Error",
            Phase::Terminated => "Terminated",
            Phase::Skipped => "Skipped",
            Phase::Omitted => "Omitted",
            Phase::Unknown(raw) => raw,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Phase::Failed | Phase::Error | Phase::Terminated)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Phase::Succeeded)
    }
}

impl From<String> for Phase {
    fn from(raw: String) -> Self {
        Phase::parse(&raw)
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.as_str().to_string()
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
