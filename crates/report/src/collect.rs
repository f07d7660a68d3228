use std::path::{Path, PathBuf};

use thiserror::Error;
use thunderdome_config::PricingTable;
use thunderdome_core::{TrialMeta, UsageRecord};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read trials directory {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read trial metadata: {0}")]
    Store(#[from] thunderdome_store::StoreError),
}

/// One trial's metadata plus its cost, computed by joining the trial's
/// usage log against the pricing table (never persisted back to disk).
#[derive(Debug, Clone)]
pub struct CollectedTrial {
    pub meta: TrialMeta,
    pub cost_usd: f64,
}

/// Walk `{run_dir}/trials/<orch>/<task>/trial-N/` and load every trial's
/// metadata.
pub fn collect_trials(
    run_dir: &Path,
    pricing: Option<&PricingTable>,
) -> Result<Vec<CollectedTrial>, ReportError> {
    let trials_root = run_dir.join("trials");
    let mut collected = Vec::new();

    for orchestrator_dir in list_dirs(&trials_root)? {
        for task_dir in list_dirs(&orchestrator_dir)? {
            for trial_dir in list_dirs(&task_dir)? {
                let meta_path = trial_dir.join("meta.json");
                if !meta_path.is_file() {
                    continue;
                }
                let meta = thunderdome_store::read_trial_meta(&meta_path)?;
                let cost_usd = compute_cost(&trial_dir, pricing);
                collected.push(CollectedTrial { meta, cost_usd });
            }
        }
    }

    Ok(collected)
}

fn compute_cost(trial_dir: &Path, pricing: Option<&PricingTable>) -> f64 {
    let Some(pricing) = pricing else {
        return 0.0;
    };
    let Ok(log) = std::fs::read_to_string(trial_dir.join("proxy-log.jsonl")) else {
        return 0.0;
    };
    let records: Vec<UsageRecord> = thunderdome_core::usage::parse_usage_log(&log);
    pricing.total_cost(&records)
}

fn list_dirs(parent: &Path) -> Result<Vec<PathBuf>, ReportError> {
    if !parent.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(parent).map_err(|source| ReportError::ReadDir {
        path: parent.display().to_string(),
        source,
    })? {
        let entry = entry.map_err(|source| ReportError::ReadDir {
            path: parent.display().to_string(),
            source,
        })?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use thunderdome_core::{ExitReason, Scores};

    use super::*;

    fn write_trial(run_dir: &Path, orch: &str, task: &str, index: u32, proxy_log: &str) {
        let trial_dir = run_dir
            .join("trials")
            .join(orch)
            .join(task)
            .join(format!("trial-{index}"));
        std::fs::create_dir_all(&trial_dir).unwrap();

        let meta = TrialMeta {
            orchestrator: orch.to_owned(),
            task: task.to_owned(),
            trial_index: index,
            duration_seconds: 10.0,
            exit_code: 0,
            exit_reason: ExitReason::Completed,
            scores: Scores {
                tests: 1.0,
                static_analysis: 1.0,
                rubric: 1.0,
            },
            composite_score: 1.0,
            total_tokens: 100,
            total_cost_usd: 0.0,
            budget_exceeded: false,
            rubric_scores: None,
        };
        thunderdome_store::write_trial_meta(&trial_dir, &meta).unwrap();
        std::fs::write(trial_dir.join("proxy-log.jsonl"), proxy_log).unwrap();
    }

    #[test]
    fn collects_every_trial_across_orchestrators_and_tasks() {
        let tmp = tempfile::tempdir().unwrap();
        write_trial(tmp.path(), "claude-code", "fix-bug", 1, "");
        write_trial(tmp.path(), "claude-code", "fix-bug", 2, "");
        write_trial(tmp.path(), "aider", "fix-bug", 1, "");

        let collected = collect_trials(tmp.path(), None).unwrap();
        assert_eq!(collected.len(), 3);
    }

    #[test]
    fn cost_is_zero_without_a_pricing_table() {
        let tmp = tempfile::tempdir().unwrap();
        write_trial(
            tmp.path(),
            "claude-code",
            "fix-bug",
            1,
            r#"{"provider":"anthropic","model":"claude","input_tokens":1000,"output_tokens":1000}"#,
        );

        let collected = collect_trials(tmp.path(), None).unwrap();
        assert_eq!(collected[0].cost_usd, 0.0);
    }

    #[test]
    fn cost_is_joined_against_pricing_table_when_given() {
        let tmp = tempfile::tempdir().unwrap();
        write_trial(
            tmp.path(),
            "claude-code",
            "fix-bug",
            1,
            r#"{"provider":"anthropic","model":"claude","input_tokens":1000,"output_tokens":1000}"#,
        );

        let pricing = PricingTable::load(
            "anthropic:\n  claude:\n    input: 1.0\n    output: 2.0\n",
        )
        .unwrap();
        let collected = collect_trials(tmp.path(), Some(&pricing)).unwrap();
        assert_eq!(collected[0].cost_usd, 3.0);
    }
}
