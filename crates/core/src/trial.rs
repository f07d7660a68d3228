use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scores::Scores;

/// Identifies one unit of work: an (orchestrator, task, index) triple.
/// `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrialId {
    pub orchestrator: String,
    pub task: String,
    pub index: u32,
}

impl TrialId {
    #[must_use]
    pub fn new(orchestrator: impl Into<String>, task: impl Into<String>, index: u32) -> Self {
        Self {
            orchestrator: orchestrator.into(),
            task: task.into(),
            index,
        }
    }

    /// Directory name for this trial's artifacts, e.g. `trial-3`.
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("trial-{}", self.index)
    }
}

/// Deterministic classification of how a trial ended, derived once from
/// the adapter's exit code and never revised afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Completed,
    Crashed,
    GaveUp,
    Timeout,
    BudgetExceeded,
}

impl ExitReason {
    /// Derive the exit reason from the container's exit code and whether the
    /// container was killed for exceeding its deadline.
    ///
    /// Budget exhaustion always wins regardless of the underlying exit code;
    /// a container-runner timeout is reported as `exit_code == 124`, so that
    /// code is also checked
    /// directly in case a caller forgot to thread `timed_out` through.
    #[must_use]
    pub fn derive(exit_code: i32, timed_out: bool, budget_exceeded: bool) -> Self {
        if budget_exceeded {
            return Self::BudgetExceeded;
        }
        if timed_out || exit_code == 124 {
            return Self::Timeout;
        }
        match exit_code {
            0 => Self::Completed,
            2 => Self::GaveUp,
            _ => Self::Crashed,
        }
    }
}

/// The durable per-trial record, written once to `meta.json` and never
/// mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialMeta {
    pub orchestrator: String,
    pub task: String,
    pub trial_index: u32,
    pub duration_seconds: f64,
    pub exit_code: i32,
    pub exit_reason: ExitReason,
    pub scores: Scores,
    pub composite_score: f64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default)]
    pub budget_exceeded: bool,
    /// Per-criterion median rubric scores, kept for debugging alongside the
    /// blended `scores.rubric` value. Absent (and defaulted) in `meta.json`
    /// files written before this field existed.
    #[serde(default)]
    pub rubric_scores: Option<BTreeMap<String, f64>>,
}
