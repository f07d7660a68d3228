use std::collections::BTreeMap;

use serde::Serialize;
use thunderdome_core::ExitReason;

use crate::collect::CollectedTrial;

/// Aggregate statistics for one (orchestrator, task) pair.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorTaskSummary {
    pub orchestrator: String,
    pub task: String,
    pub trial_count: usize,
    pub pass_rate: f64,
    pub mean_composite_score: f64,
    pub mean_cost_usd: f64,
    pub mean_duration_seconds: f64,
}

/// Group trials by (orchestrator, task) and compute pass rate, mean
/// composite score, mean cost, and mean duration for each group. Pass rate
/// is the fraction of trials with `exit_reason == completed`.
#[must_use]
pub fn aggregate(trials: &[CollectedTrial]) -> Vec<OrchestratorTaskSummary> {
    let mut groups: BTreeMap<(String, String), Vec<&CollectedTrial>> = BTreeMap::new();
    for trial in trials {
        groups
            .entry((trial.meta.orchestrator.clone(), trial.meta.task.clone()))
            .or_default()
            .push(trial);
    }

    groups
        .into_iter()
        .map(|((orchestrator, task), group)| {
            let trial_count = group.len();
            let completed = group
                .iter()
                .filter(|t| t.meta.exit_reason == ExitReason::Completed)
                .count();

            let sum_composite: f64 = group.iter().map(|t| t.meta.composite_score).sum();
            let sum_cost: f64 = group.iter().map(|t| t.cost_usd).sum();
            let sum_duration: f64 = group.iter().map(|t| t.meta.duration_seconds).sum();
            let n = trial_count as f64;

            OrchestratorTaskSummary {
                orchestrator,
                task,
                trial_count,
                pass_rate: completed as f64 / n,
                mean_composite_score: sum_composite / n,
                mean_cost_usd: sum_cost / n,
                mean_duration_seconds: sum_duration / n,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use thunderdome_core::{Scores, TrialMeta};

    use super::*;

    fn trial(orch: &str, task: &str, index: u32, exit_reason: ExitReason, composite: f64) -> CollectedTrial {
        CollectedTrial {
            meta: TrialMeta {
                orchestrator: orch.to_owned(),
                task: task.to_owned(),
                trial_index: index,
                duration_seconds: 10.0,
                exit_code: 0,
                exit_reason,
                scores: Scores::default(),
                composite_score: composite,
                total_tokens: 0,
                total_cost_usd: 0.0,
                budget_exceeded: false,
                rubric_scores: None,
            },
            cost_usd: 1.0,
        }
    }

    #[test]
    fn groups_by_orchestrator_and_task() {
        let trials = vec![
            trial("claude-code", "fix-bug", 1, ExitReason::Completed, 0.9),
            trial("claude-code", "fix-bug", 2, ExitReason::Crashed, 0.0),
            trial("aider", "fix-bug", 1, ExitReason::Completed, 0.8),
        ];

        let summaries = aggregate(&trials);
        assert_eq!(summaries.len(), 2);

        let claude_code = summaries
            .iter()
            .find(|s| s.orchestrator == "claude-code")
            .unwrap();
        assert_eq!(claude_code.trial_count, 2);
        assert_eq!(claude_code.pass_rate, 0.5);
        assert!((claude_code.mean_composite_score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn empty_input_produces_no_summaries() {
        assert!(aggregate(&[]).is_empty());
    }
}
