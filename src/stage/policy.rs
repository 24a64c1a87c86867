// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stage::StageTag;

/// Which upstream stages a stage may inherit work from, most preferred first.
///
/// Stages without an entry accept any parent. An entry with an empty list
/// accepts none. When several allowed parent stages are connected to a node,
/// only the parents of the highest-preference stage are used.
///
/// Entries read from config replace the default entry for that stage only.
///
/// ```yaml
/// parent_policy:
///   model_run: [calibration_run, calibration_config, preprocess]
///   evaluation: [model_run]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<StageTag, Vec<StageTag>>",
    into = "BTreeMap<StageTag, Vec<StageTag>>"
)]
pub struct ParentPolicy(pub BTreeMap<StageTag, Vec<StageTag>>);

impl Default for ParentPolicy {
    /// `preprocess -> calibration_config -> calibration_run -> model_run -> evaluation`,
    /// with `model_run` falling back to `calibration_config` and then `preprocess`.
    fn default() -> Self {
        Self(BTreeMap::from([
            (StageTag::Preprocess, vec![]),
            (StageTag::CalibrationConfig, vec![StageTag::Preprocess]),
            (StageTag::CalibrationRun, vec![StageTag::CalibrationConfig]),
            (
                StageTag::ModelRun,
                vec![
                    StageTag::CalibrationRun,
                    StageTag::CalibrationConfig,
                    StageTag::Preprocess,
                ],
            ),
            (StageTag::Evaluation, vec![StageTag::ModelRun]),
        ]))
    }
}

impl From<BTreeMap<StageTag, Vec<StageTag>>> for ParentPolicy {
    fn from(overrides: BTreeMap<StageTag, Vec<StageTag>>) -> Self {
        let mut policy = Self::default();
        policy.0.extend(overrides);
        policy
    }
}

impl From<ParentPolicy> for BTreeMap<StageTag, Vec<StageTag>> {
    fn from(policy: ParentPolicy) -> Self {
        policy.0
    }
}

impl ParentPolicy {
    pub fn allowed_parent(&self, parent: StageTag, child: StageTag) -> bool {
        match self.0.get(&child) {
            Some(preferences) => preferences.contains(&parent),
            None => true,
        }
    }

    /// Keep only the parents the policy lets `child` inherit from.
    ///
    /// `parents` pairs each parent node id with its stage. The returned ids keep
    /// their input order.
    pub fn select_parents<'a>(
        &self,
        child: StageTag,
        parents: &[(&'a str, StageTag)],
    ) -> Vec<&'a str> {
        let Some(preferences) = self.0.get(&child) else {
            return parents.iter().map(|(id, _)| *id).collect();
        };

        preferences
            .iter()
            .find(|preferred| parents.iter().any(|(_, tag)| tag == *preferred))
            .map(|preferred| {
                parents
                    .iter()
                    .filter(|(_, tag)| tag == preferred)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_edges() {
        let policy = ParentPolicy::default();
        assert!(policy.allowed_parent(StageTag::Preprocess, StageTag::CalibrationConfig));
        assert!(policy.allowed_parent(StageTag::CalibrationConfig, StageTag::CalibrationRun));
        assert!(policy.allowed_parent(StageTag::CalibrationRun, StageTag::ModelRun));
        assert!(policy.allowed_parent(StageTag::ModelRun, StageTag::Evaluation));

        assert!(!policy.allowed_parent(StageTag::Preprocess, StageTag::CalibrationRun));
        assert!(!policy.allowed_parent(StageTag::Evaluation, StageTag::Preprocess));
        assert!(!policy.allowed_parent(StageTag::Other, StageTag::ModelRun));
    }

    #[test]
    fn test_model_run_fallback_parents() {
        let policy = ParentPolicy::default();
        assert!(policy.allowed_parent(StageTag::CalibrationConfig, StageTag::ModelRun));
        assert!(policy.allowed_parent(StageTag::Preprocess, StageTag::ModelRun));
    }

    #[test]
    fn test_other_accepts_anything() {
        let policy = ParentPolicy::default();
        for tag in StageTag::ALL {
            assert!(policy.allowed_parent(tag, StageTag::Other));
        }
    }

    #[test]
    fn test_select_parents_prefers_most_downstream_stage() {
        let policy = ParentPolicy::default();
        let parents = [
            ("prep", StageTag::Preprocess),
            ("cal-run-1", StageTag::CalibrationRun),
            ("cfg", StageTag::CalibrationConfig),
            ("cal-run-2", StageTag::CalibrationRun),
        ];
        assert_eq!(
            policy.select_parents(StageTag::ModelRun, &parents),
            vec!["cal-run-1", "cal-run-2"]
        );

        let only_prep = [("prep", StageTag::Preprocess), ("x", StageTag::Other)];
        assert_eq!(policy.select_parents(StageTag::ModelRun, &only_prep), vec!["prep"]);
    }

    #[test]
    fn test_select_parents_without_allowed_stage_is_empty() {
        let policy = ParentPolicy::default();
        let parents = [("x", StageTag::Other)];
        assert!(policy.select_parents(StageTag::CalibrationConfig, &parents).is_empty());
        assert!(policy.select_parents(StageTag::Preprocess, &parents).is_empty());
        assert_eq!(policy.select_parents(StageTag::Other, &parents), vec!["x"]);
    }

    #[test]
    fn test_policy_from_yaml() {
        let yaml = "model_run: [preprocess]\n";
        let policy: ParentPolicy = serde_yaml::from_str(yaml).unwrap();
        assert!(policy.allowed_parent(StageTag::Preprocess, StageTag::ModelRun));
        assert!(!policy.allowed_parent(StageTag::CalibrationRun, StageTag::ModelRun));
        // stages missing from the file keep their default entry
        assert!(policy.allowed_parent(StageTag::ModelRun, StageTag::Evaluation));
        assert!(!policy.allowed_parent(StageTag::Other, StageTag::Evaluation));
    }
}
