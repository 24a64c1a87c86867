// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of stage kinds a graph node can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTag {
    Preprocess,
    CalibrationConfig,
    CalibrationRun,
    ModelRun,
    Evaluation,
    Other,
}

impl StageTag {
    pub const ALL: [StageTag; 6] = [
        StageTag::Preprocess,
        StageTag::CalibrationConfig,
        StageTag::CalibrationRun,
        StageTag::ModelRun,
        StageTag::Evaluation,
        StageTag::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageTag::Preprocess => "preprocess",
            StageTag::CalibrationConfig => "calibration_config",
            StageTag::CalibrationRun => "calibration_run",
            StageTag::ModelRun => "model_run",
            StageTag::Evaluation => "evaluation",
            StageTag::Other => "other",
        }
    }

    /// Name of the stage template registered with the execution engine.
    pub fn template_name(self) -> &'static str {
        match self {
            StageTag::Preprocess => "ngiab-data-preprocess",
            StageTag::CalibrationConfig => "ngiab-calibration-config",
            StageTag::CalibrationRun => "ngiab-calibration-run",
            StageTag::ModelRun | StageTag::Other => "ngiab-run",
            StageTag::Evaluation => "ngiab-teehr",
        }
    }
}

impl fmt::Display for StageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token that identifies the model in a "run" label.
const MODEL_TOKEN: &str = "ngiab";

fn is_preprocess(label: &str) -> bool {
    label.contains("preprocess") || label.contains("pre-process")
}

fn is_calibration_config(label: &str) -> bool {
    label.contains("calibration-config")
}

fn is_calibration_run(label: &str) -> bool {
    label.contains("calibration-run")
}

fn is_model_run(label: &str) -> bool {
    label.contains("run") && label.contains(MODEL_TOKEN)
}

fn is_evaluation(label: &str) -> bool {
    label.contains("teehr") || label.contains("evaluation")
}

/// Ordered rules; the first rule whose predicate matches wins.
const RULES: [(StageTag, fn(&str) -> bool); 5] = [
    (StageTag::Preprocess, is_preprocess),
    (StageTag::CalibrationConfig, is_calibration_config),
    (StageTag::CalibrationRun, is_calibration_run),
    (StageTag::ModelRun, is_model_run),
    (StageTag::Evaluation, is_evaluation),
];

/// Map a free-text stage label to a [`StageTag`].
///
/// Matching is case-insensitive and treats `_` and whitespace as `-`, so
/// `"Calibration Config"` and `"calibration_config"` both classify as
/// [`StageTag::CalibrationConfig`]. Labels matching no rule are [`StageTag::Other`].
///
/// ```
/// use ngiab_orchestrator::stage::{classify, StageTag};
///
/// assert_eq!(classify("Pre-Process"), StageTag::Preprocess);
/// assert_eq!(classify("run ngiab"), StageTag::ModelRun);
/// assert_eq!(classify("something else"), StageTag::Other);
/// ```
pub fn classify(label: &str) -> StageTag {
    let normalized: String = label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
        .collect();

    RULES
        .iter()
        .find(|(_, matches)| matches(&normalized))
        .map(|(tag, _)| *tag)
        .unwrap_or(StageTag::Other)
}

/// Stages that read a dataset produced upstream.
pub fn is_dataset_consumer(tag: StageTag) -> bool {
    matches!(
        tag,
        StageTag::CalibrationConfig
            | StageTag::CalibrationRun
            | StageTag::ModelRun
            | StageTag::Evaluation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_labels() {
        assert_eq!(classify("pre-process"), StageTag::Preprocess);
        assert_eq!(classify("Data Preprocess"), StageTag::Preprocess);
        assert_eq!(classify("calibration-config"), StageTag::CalibrationConfig);
        assert_eq!(classify("Calibration Config"), StageTag::CalibrationConfig);
        assert_eq!(classify("calibration_run"), StageTag::CalibrationRun);
        assert_eq!(classify("NGIAB Run"), StageTag::ModelRun);
        assert_eq!(classify("teehr"), StageTag::Evaluation);
        assert_eq!(classify("Evaluation"), StageTag::Evaluation);
    }

    #[test]
    fn test_rule_order_prefers_specific_stage() {
        // contains "run" and "ngiab" but calibration-run is checked first
        assert_eq!(classify("ngiab calibration-run"), StageTag::CalibrationRun);
        // "run" without the model token is not a model run
        assert_eq!(classify("run"), StageTag::Other);
    }

    #[test]
    fn test_classify_is_total_and_idempotent() {
        let labels = ["", "   ", "x", "pre-process", "ngiab-run", "teehr eval", "???"];
        for label in labels {
            let tag = classify(label);
            assert!(StageTag::ALL.contains(&tag));
            assert_eq!(classify(label), tag);
        }
        assert_eq!(classify(""), StageTag::Other);
    }

    #[test]
    fn test_dataset_consumers() {
        assert!(!is_dataset_consumer(StageTag::Preprocess));
        assert!(is_dataset_consumer(StageTag::CalibrationConfig));
        assert!(is_dataset_consumer(StageTag::CalibrationRun));
        assert!(is_dataset_consumer(StageTag::ModelRun));
        assert!(is_dataset_consumer(StageTag::Evaluation));
        assert!(!is_dataset_consumer(StageTag::Other));
    }

    #[test]
    fn test_template_names() {
        assert_eq!(StageTag::Preprocess.template_name(), "ngiab-data-preprocess");
        assert_eq!(StageTag::Other.template_name(), "ngiab-run");
        assert_eq!(StageTag::Evaluation.template_name(), "ngiab-teehr");
    }
}
