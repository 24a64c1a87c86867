// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Environment overrides for [`OrchestratorConfig`].

use std::time::Duration;

use crate::config::consts::{
    ENV_ARGO_FORCE_TEMPLATE_UPDATE, ENV_ARGO_HOST, ENV_ARGO_NAMESPACE, ENV_ARGO_POLL_SEC,
    ENV_ARGO_POLL_TIMEOUT_SEC, ENV_ARGO_TOKEN, ENV_ARGO_VERIFY_SSL, ENV_S3_BUCKET,
};
use crate::config::OrchestratorConfig;
use crate::errors::ConfigError;

impl OrchestratorConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().apply_lookup(lookup)
    }

    /// Layer the process environment on top of a loaded file.
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_lookup(|key| std::env::var(key).ok())
    }

    pub fn apply_lookup<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = get(ENV_ARGO_HOST) {
            self.engine.host = host;
        }
        if let Some(token) = get(ENV_ARGO_TOKEN) {
            self.engine.token = token;
        }
        if let Some(namespace) = get(ENV_ARGO_NAMESPACE) {
            self.engine.namespace = namespace;
        }
        if let Some(value) = get(ENV_ARGO_VERIFY_SSL) {
            self.engine.verify_ssl = parse_flag(ENV_ARGO_VERIFY_SSL, &value)?;
        }
        if let Some(value) = get(ENV_ARGO_FORCE_TEMPLATE_UPDATE) {
            self.engine.force_template_update = parse_flag(ENV_ARGO_FORCE_TEMPLATE_UPDATE, &value)?;
        }
        if let Some(value) = get(ENV_ARGO_POLL_SEC) {
            self.watch.poll_interval = parse_seconds(ENV_ARGO_POLL_SEC, &value)?;
        }
        if let Some(value) = get(ENV_ARGO_POLL_TIMEOUT_SEC) {
            self.watch.timeout = parse_seconds(ENV_ARGO_POLL_TIMEOUT_SEC, &value)?;
        }
        if let Some(bucket) = get(ENV_S3_BUCKET) {
            self.storage.default_bucket = bucket;
        }
        Ok(self)
    }
}

/// `1`, `true` and `yes` are on; `0`, `false` and `no` are off (case-insensitive).
pub fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected one of 1/true/yes or 0/false/no".to_string(),
        }),
    }
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };
    let seconds: f64 = value.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| invalid(e.to_string()))
}
