use serde::{Deserialize, Serialize};

use crate::scores::Weights;

/// One weighted criterion evaluated by the rubric judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub criterion: String,
    #[serde(default = "RubricCriterion::default_weight")]
    pub weight: f64,
}

impl RubricCriterion {
    const fn default_weight() -> f64 {
        1.0
    }
}

/// Immutable description of one coding task.
///
/// The starting state is the commit at `tag` (shallow clone, depth 1).
/// `reference_tag`, when present, names a known-good solution used only for
/// ceiling baselining by the reporter, never by trial execution itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub repo: String,
    pub tag: String,
    #[serde(default)]
    pub reference_tag: Option<String>,
    #[serde(default)]
    pub category: String,
    pub validation_image: String,
    #[serde(default)]
    pub install_cmd: Option<String>,
    pub test_cmd: String,
    #[serde(default)]
    pub lint_cmd: Option<String>,
    #[serde(default)]
    pub rubric: Vec<RubricCriterion>,
    #[serde(default)]
    pub weights: Option<Weights>,
    #[serde(default = "TaskSpec::default_time_limit_minutes")]
    pub time_limit_minutes: u64,
}

impl TaskSpec {
    const fn default_time_limit_minutes() -> u64 {
        30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rubric_criterion_default_weight() {
        let yaml = "criterion: tests pass without cheating\n";
        let criterion: RubricCriterion = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(criterion.weight, 1.0);
    }
}
