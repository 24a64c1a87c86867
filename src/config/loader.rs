// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::{
    DEFAULT_ARGO_HOST, DEFAULT_ARGO_NAMESPACE, DEFAULT_BUCKET, DEFAULT_POLL_SEC,
    DEFAULT_POLL_TIMEOUT_SEC, DEFAULT_REQUEST_TIMEOUT_SEC,
};
use crate::errors::ConfigError;
use crate::stage::ParentPolicy;

/// Complete orchestrator configuration.
///
/// Every section is optional; missing values fall back to the defaults in
/// [`consts`](crate::config::consts). Built once at startup and passed by
/// reference from then on.
///
/// # Example
/// ```yaml
/// engine:
///   host: https://argo.example.org:2746
///   namespace: ngiab
///   verify_ssl: true
/// watch:
///   poll_sec: 5
///   poll_timeout_sec: 7200
/// storage:
///   default_bucket: ngiab-results
/// parent_policy:
///   evaluation: [model_run, calibration_run]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub engine: EngineConfig,
    pub watch: WatchOptions,
    pub storage: StorageConfig,
    pub parent_policy: ParentPolicy,
}

/// Connection settings for the execution engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub host: String,
    /// Bearer token; empty means unauthenticated
    pub token: String,
    pub namespace: String,
    pub verify_ssl: bool,
    /// Delete and recreate stage templates on every submission
    pub force_template_update: bool,
    pub request_timeout_sec: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ARGO_HOST.to_string(),
            token: String::new(),
            namespace: DEFAULT_ARGO_NAMESPACE.to_string(),
            verify_ssl: false,
            force_template_update: false,
            request_timeout_sec: DEFAULT_REQUEST_TIMEOUT_SEC,
        }
    }
}

/// Polling cadence of run watchers.
///
/// In config files both values are seconds (`poll_sec`, `poll_timeout_sec`).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    #[serde(rename = "poll_sec", deserialize_with = "seconds")]
    pub poll_interval: Duration,
    #[serde(rename = "poll_timeout_sec", deserialize_with = "seconds")]
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_SEC),
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SEC),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket for outputs and for inputs given without a bucket
    pub default_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(value).map_err(serde::de::Error::custom)
}

/// Load a config file; `.toml` files are read as TOML, anything else as YAML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<OrchestratorConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}
