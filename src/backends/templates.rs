// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage template definitions bundled into the binary.

use std::collections::BTreeMap;

use crate::errors::EngineError;
use crate::traits::StageTemplate;

const BUNDLED: [(&str, &str); 5] = [
    (
        "ngiab-data-preprocess",
        include_str!("../../templates/ngiab-data-preprocess.yaml"),
    ),
    (
        "ngiab-calibration-config",
        include_str!("../../templates/ngiab-calibration-config.yaml"),
    ),
    (
        "ngiab-calibration-run",
        include_str!("../../templates/ngiab-calibration-run.yaml"),
    ),
    ("ngiab-run", include_str!("../../templates/ngiab-run.yaml")),
    ("ngiab-teehr", include_str!("../../templates/ngiab-teehr.yaml")),
];

/// Stage templates keyed by template name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, StageTemplate>,
}

impl TemplateRegistry {
    /// The templates shipped in `templates/`.
    pub fn bundled() -> Result<Self, EngineError> {
        Self::from_sources(BUNDLED)
    }

    /// Parse `(name, yaml)` pairs. Each manifest's `metadata.name` must match
    /// the name it is registered under.
    pub fn from_sources<'a, I>(sources: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut templates = BTreeMap::new();
        for (name, yaml) in sources {
            let definition: serde_json::Value =
                serde_yaml::from_str(yaml).map_err(|e| EngineError::InvalidTemplate {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;

            let declared = definition
                .pointer("/metadata/name")
                .and_then(|value| value.as_str());
            if declared != Some(name) {
                return Err(EngineError::InvalidTemplate {
                    name: name.to_string(),
                    reason: format!("metadata.name is {declared:?}"),
                });
            }

            templates.insert(
                name.to_string(),
                StageTemplate {
                    name: name.to_string(),
                    definition,
                },
            );
        }
        Ok(Self { templates })
    }

    pub fn get(&self, name: &str) -> Option<&StageTemplate> {
        self.templates.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}
