//! Trial Runner (C8): composes the Workspace Manager, Container Runner,
//! Gateway Manager's usage log, and the validation pipeline into a single
//! trial, producing one `TrialMeta`.
//!
//! Validation (C4–C7) is intentionally *not* invoked from [`run_trial`]: per
//! convention it may run immediately after the adapter exits or later via
//! a re-score pass, and both orderings must converge on the same
//! `meta.json`. [`run_trial`] writes a `TrialMeta` with zeroed scores; a
//! caller that wants validation inlined calls [`rescore_trial`] right after.

mod budget;
mod rescore;

use std::{collections::BTreeMap, path::Path, time::Duration};

use thiserror::Error;
use thunderdome_core::{ExitReason, OrchestratorSpec, Scores, TaskSpec, TrialMeta};
use tracing::info;

pub use budget::budget_exceeded_in_usage_log;
pub use rescore::{RescoreRequest, rescore_trial};

#[derive(Debug, Error)]
pub enum TrialError {
    #[error("failed to create trial directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to prepare workspace: {0}")]
    Workspace(#[from] thunderdome_workspace::WorkspaceError),
    #[error("failed to run container: {0}")]
    Container(#[from] thunderdome_container::ContainerError),
    #[error("failed to persist trial artifacts at {path}: {source}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to persist trial metadata: {0}")]
    Store(#[from] thunderdome_store::StoreError),
}

/// Everything [`run_trial`] needs beyond the orchestrator/task specs
/// themselves to run one trial end to end.
pub struct TrialRequest<'a> {
    pub orchestrator: &'a OrchestratorSpec,
    pub task: &'a TaskSpec,
    pub trial_index: u32,
    pub gateway_url: &'a str,
    pub run_dir: &'a Path,
    pub allowlist: &'a [String],
    pub limits: thunderdome_container::Limits,
}

/// Run one (orchestrator, task, trial_index) trial to completion and
/// persist its `TrialMeta`. Any failure before the container launches
/// (step 5) propagates as [`TrialError`] and no `meta.json` is written;
/// any outcome from or after the container launch always produces a
/// `TrialMeta`.
pub async fn run_trial(request: TrialRequest<'_>) -> Result<TrialMeta, TrialError> {
    let trial_dir = request
        .run_dir
        .join("trials")
        .join(&request.orchestrator.name)
        .join(&request.task.name)
        .join(format!("trial-{}", request.trial_index));
    tokio::fs::create_dir_all(&trial_dir)
        .await
        .map_err(|source| TrialError::CreateDir {
            path: trial_dir.display().to_string(),
            source,
        })?;

    let workspace_dir = trial_dir.join("workspace");
    thunderdome_workspace::prepare(&request.task.repo, &request.task.tag, &workspace_dir).await?;

    let task_md_dest = trial_dir.join("task.md");
    install_task_description(&workspace_dir, &task_md_dest).await?;

    let mut defaults = BTreeMap::new();
    defaults.insert("TASK_DIR".to_owned(), "/workspace".to_owned());
    defaults.insert("TASK_DESCRIPTION".to_owned(), "/task.md".to_owned());
    defaults.insert("PROXY_URL".to_owned(), request.gateway_url.to_owned());
    let env = request.orchestrator.merged_env(&defaults);

    let run_spec = thunderdome_container::RunSpec {
        image: request.orchestrator.image.clone(),
        command: vec!["sh".to_owned(), "/adapter.sh".to_owned()],
        workspace: workspace_dir.clone(),
        workdir: "/workspace".into(),
        env,
        mounts: vec![
            thunderdome_container::Mount {
                host_path: request.orchestrator.adapter.clone(),
                container_path: "/adapter.sh".into(),
                read_only: true,
            },
            thunderdome_container::Mount {
                host_path: task_md_dest.clone(),
                container_path: "/task.md".into(),
                read_only: true,
            },
        ],
        network: thunderdome_container::NetworkPolicy {
            allowlist: request.allowlist.to_vec(),
        },
        limits: request.limits,
        timeout: Duration::from_secs(request.task.time_limit_minutes * 60),
        user: None,
        trial_label: format!(
            "{}/{}/trial-{}",
            request.orchestrator.name, request.task.name, request.trial_index
        ),
    };

    let outcome = thunderdome_container::run(run_spec).await?;

    let diff = thunderdome_workspace::capture(&workspace_dir).await?;
    tokio::fs::write(trial_dir.join("diff.patch"), &diff)
        .await
        .map_err(|source| TrialError::Artifact {
            path: trial_dir.join("diff.patch").display().to_string(),
            source,
        })?;

    let usage_log_path = trial_dir.join("proxy-log.jsonl");
    let usage_log = tokio::fs::read_to_string(&usage_log_path)
        .await
        .unwrap_or_default();
    let usage_records = thunderdome_core::usage::parse_usage_log(&usage_log);
    let total_tokens = thunderdome_core::usage::total_tokens(&usage_records);
    let budget_exceeded = budget_exceeded_in_usage_log(&usage_log);

    let exit_reason = ExitReason::derive(outcome.exit_code, outcome.timed_out, budget_exceeded);

    let meta = TrialMeta {
        orchestrator: request.orchestrator.name.clone(),
        task: request.task.name.clone(),
        trial_index: request.trial_index,
        duration_seconds: outcome.duration.as_secs_f64(),
        exit_code: outcome.exit_code,
        exit_reason,
        scores: Scores::default(),
        composite_score: 0.0,
        total_tokens,
        total_cost_usd: 0.0,
        budget_exceeded,
        rubric_scores: None,
    };

    thunderdome_store::write_trial_meta(&trial_dir, &meta)?;

    info!(
        orchestrator = %meta.orchestrator,
        task = %meta.task,
        trial_index = meta.trial_index,
        exit_reason = ?meta.exit_reason,
        duration_secs = meta.duration_seconds,
        "trial finished"
    );

    Ok(meta)
}

/// Copy `TASK.md` from the workspace root into `dest`, or create an empty
/// file there if the task repo doesn't carry one.
async fn install_task_description(workspace_dir: &Path, dest: &Path) -> Result<(), TrialError> {
    let source = workspace_dir.join("TASK.md");
    match tokio::fs::copy(&source, dest).await {
        Ok(_) => Ok(()),
        Err(_) => tokio::fs::write(dest, b"")
            .await
            .map_err(|source| TrialError::Artifact {
                path: dest.display().to_string(),
                source,
            }),
    }
}
