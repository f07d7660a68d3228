use std::path::Path;

use thunderdome_core::TaskSpec;
use thunderdome_validate::{LintOutcome, TestOutcome};
use tracing::warn;

use crate::TrialError;

/// Parameters needed to re-run the validation pipeline (C4–C7) over an
/// already-executed trial and fold the results back into its `TrialMeta`.
pub struct RescoreRequest<'a> {
    pub trial_dir: &'a Path,
    pub task: &'a TaskSpec,
    pub gateway_client: &'a reqwest::Client,
    pub gateway_url: &'a str,
    pub judge_model: &'a str,
    /// Count of lint findings present at the task's starting state, used as
    /// the Lint Runner's baseline.
    pub baseline_lint_findings: u64,
}

/// Re-run tests, lint, and the rubric judge against a trial's workspace and
/// merge the resulting `Scores` into its existing `meta.json`. Running this
/// twice over the same trial produces byte-identical output — scoring is a
/// pure function of the workspace, the diff, and the task spec, none of
/// which this mutates.
pub async fn rescore_trial(
    request: RescoreRequest<'_>,
) -> Result<thunderdome_core::TrialMeta, TrialError> {
    let meta_path = request.trial_dir.join("meta.json");
    let mut meta = thunderdome_store::read_trial_meta(&meta_path)?;

    let workspace_dir = request.trial_dir.join("workspace");
    let timeout = std::time::Duration::from_secs(request.task.time_limit_minutes * 60);

    let test_outcome = match thunderdome_validate::run_tests(
        &request.task.validation_image,
        request.task.install_cmd.as_deref(),
        &request.task.test_cmd,
        &workspace_dir,
        timeout,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(source) => {
            warn!(error = %source, "test runner failed; scoring this layer 0");
            TestOutcome {
                score: 0.0,
                exit_code: -1,
                output: source.to_string(),
            }
        }
    };
    tokio::fs::write(
        request.trial_dir.join("test-output.txt"),
        &test_outcome.output,
    )
    .await
    .map_err(|source| TrialError::Artifact {
        path: request.trial_dir.join("test-output.txt").display().to_string(),
        source,
    })?;

    let lint_outcome = match thunderdome_validate::run_lint(
        &request.task.validation_image,
        request.task.lint_cmd.as_deref(),
        &workspace_dir,
        request.baseline_lint_findings,
        timeout,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(source) => {
            warn!(error = %source, "lint runner failed; scoring this layer 0");
            LintOutcome {
                score: 0.0,
                exit_code: -1,
                output: source.to_string(),
            }
        }
    };
    tokio::fs::write(
        request.trial_dir.join("lint-output.txt"),
        &lint_outcome.output,
    )
    .await
    .map_err(|source| TrialError::Artifact {
        path: request.trial_dir.join("lint-output.txt").display().to_string(),
        source,
    })?;

    let diff = tokio::fs::read_to_string(request.trial_dir.join("diff.patch"))
        .await
        .unwrap_or_default();
    let task_description = tokio::fs::read_to_string(request.trial_dir.join("task.md"))
        .await
        .unwrap_or_default();

    let rubric_scores = thunderdome_validate::judge_rubric(
        request.gateway_client,
        request.gateway_url,
        request.judge_model,
        &request.task.rubric,
        &task_description,
        &diff,
    )
    .await
    .map_err(|source| TrialError::Artifact {
        path: request
            .trial_dir
            .join("rubric-scores.json")
            .display()
            .to_string(),
        source: std::io::Error::other(source),
    })?;

    if let Some(scores) = &rubric_scores {
        let json = serde_json::to_string_pretty(scores).unwrap_or_default();
        tokio::fs::write(request.trial_dir.join("rubric-scores.json"), json)
            .await
            .map_err(|source| TrialError::Artifact {
                path: request
                    .trial_dir
                    .join("rubric-scores.json")
                    .display()
                    .to_string(),
                source,
            })?;
    }

    meta.scores = thunderdome_validate::combine_scores(&test_outcome, &lint_outcome, &rubric_scores);
    meta.composite_score = meta.scores.composite(request.task.weights.unwrap_or_default());
    meta.rubric_scores = rubric_scores;

    thunderdome_store::write_trial_meta(request.trial_dir, &meta)?;

    Ok(meta)
}
