// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use crate::config::{load_config, OrchestratorConfig};
use crate::errors::ConfigError;
use crate::stage::{ParentPolicy, StageTag};

/// The shipped YAML config matches the built-in defaults
#[test]
fn test_bundled_yaml_config_matches_defaults() {
    let config = load_config("configs/orchestrator.yaml").unwrap();

    assert_eq!(config.engine.host, "https://localhost:2746");
    assert_eq!(config.watch.poll_interval, Duration::from_secs(3));
    assert_eq!(config.parent_policy, ParentPolicy::default());
    assert_eq!(config, OrchestratorConfig::default());
}

#[test]
fn test_bundled_toml_config() {
    let config = load_config("configs/orchestrator.toml").unwrap();

    assert_eq!(config.engine.namespace, "ngiab");
    assert!(config.engine.verify_ssl);
    assert_eq!(config.watch.timeout, Duration::from_secs(3600));
    assert_eq!(config.storage.default_bucket, "ngiab-results");
    assert!(config
        .parent_policy
        .allowed_parent(StageTag::CalibrationRun, StageTag::Evaluation));
    // stages the file does not mention keep their default parents
    assert!(config
        .parent_policy
        .allowed_parent(StageTag::CalibrationConfig, StageTag::ModelRun));
    assert!(!config
        .parent_policy
        .allowed_parent(StageTag::Preprocess, StageTag::CalibrationRun));
}

#[test]
fn test_env_overrides_file_values() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "engine:\n  namespace: from-file\n  token: file-token").unwrap();

    let vars = HashMap::from([("ARGO_NAMESPACE", "from-env")]);
    let config = load_config(file.path())
        .unwrap()
        .apply_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.engine.namespace, "from-env");
    assert_eq!(config.engine.token, "file-token");
}

#[test]
fn test_invalid_yaml_is_reported() {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    writeln!(file, "watch: [not, a, map]").unwrap();

    assert!(matches!(load_config(file.path()), Err(ConfigError::Yaml(_))));
}

#[test]
fn test_invalid_toml_is_reported() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[engine\nhost = ").unwrap();

    assert!(matches!(load_config(file.path()), Err(ConfigError::Toml(_))));
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");

    let err = load_config(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::Io { ref path, .. } if path == &missing));
}
