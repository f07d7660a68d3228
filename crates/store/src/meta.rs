use std::path::Path;

use thunderdome_core::TrialMeta;

use crate::StoreError;

/// Write `meta` as indented JSON to `{trial_dir}/meta.json`. Written once
/// and never mutated afterward, except by the `validate` re-score command
/// which overwrites it wholesale.
pub fn write_trial_meta(trial_dir: &Path, meta: &TrialMeta) -> Result<(), StoreError> {
    let path = trial_dir.join("meta.json");
    let json = serde_json::to_string_pretty(meta)?;
    std::fs::write(&path, json).map_err(|source| StoreError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Read and decode a `meta.json` file. Tolerates older files with a subset
/// of fields; missing optional fields default to their zero value
/// at read time.
pub fn read_trial_meta(path: &Path) -> Result<TrialMeta, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use thunderdome_core::{ExitReason, Scores};

    use super::*;

    fn sample_meta() -> TrialMeta {
        TrialMeta {
            orchestrator: "claude-code".into(),
            task: "fix-bug".into(),
            trial_index: 1,
            duration_seconds: 42.0,
            exit_code: 0,
            exit_reason: ExitReason::Completed,
            scores: Scores {
                tests: 1.0,
                static_analysis: 0.9,
                rubric: 0.8,
            },
            composite_score: 0.92,
            total_tokens: 1500,
            total_cost_usd: 0.05,
            budget_exceeded: false,
            rubric_scores: Some(BTreeMap::from([("clarity".to_owned(), 0.8)])),
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let meta = sample_meta();

        write_trial_meta(dir.path(), &meta).unwrap();
        let read_back = read_trial_meta(&dir.path().join("meta.json")).unwrap();

        assert_eq!(read_back.orchestrator, meta.orchestrator);
        assert_eq!(read_back.composite_score, meta.composite_score);
        assert_eq!(read_back.rubric_scores, meta.rubric_scores);
    }

    #[test]
    fn write_produces_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        write_trial_meta(dir.path(), &sample_meta()).unwrap();
        let contents = std::fs::read_to_string(dir.path().join("meta.json")).unwrap();
        assert!(contents.contains("\n  "));
    }
}
