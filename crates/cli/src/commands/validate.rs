use std::{collections::HashMap, path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::Args;
use thunderdome_core::TaskSpec;

/// Re-score stored trials in place (tests, lint, rubric). Idempotent:
/// running it twice over the same run directory yields byte-identical
/// `meta.json` files, since scoring is a pure function of each trial's
/// already-captured workspace, diff, and task spec.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Run directory to re-score.
    run_dir: PathBuf,
    /// Path to the harness YAML config the run was produced from.
    #[arg(long, default_value = "thunderdome.yaml")]
    config: PathBuf,
}

pub async fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let config = thunderdome_config::load_harness_config(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    let tasks_by_name: HashMap<&str, &TaskSpec> =
        config.tasks.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut gateway = thunderdome_gateway::start(thunderdome_gateway::GatewayConfig {
        command: config.proxy.gateway.clone(),
        log_dir: config.proxy.log_dir.clone(),
        budget_per_trial_usd: config.proxy.budget_per_trial_usd,
        secrets_env_file: config.secrets.env_file.clone(),
        extra_env: Vec::new(),
    })
    .await
    .context("starting gateway")?;

    let judge_model = config
        .proxy
        .judge_model
        .clone()
        .unwrap_or_else(|| "gpt-4o".to_owned());
    let client = reqwest::Client::new();

    let mut baseline_cache: HashMap<String, u64> = HashMap::new();
    let mut rescored = 0usize;
    let mut skipped = 0usize;

    for trial_dir in discover_trial_dirs(&args.run_dir)? {
        let Some(task_name) = trial_dir
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        else {
            skipped += 1;
            continue;
        };

        let Some(task) = tasks_by_name.get(task_name) else {
            tracing::warn!(task_name, "no task in config matches this trial; skipping");
            skipped += 1;
            continue;
        };

        let baseline = match baseline_cache.get(task_name) {
            Some(count) => *count,
            None => {
                let count = baseline_lint_findings(task).await;
                baseline_cache.insert(task_name.to_owned(), count);
                count
            }
        };

        let gateway_url = gateway.url();
        let request = thunderdome_trial::RescoreRequest {
            trial_dir: &trial_dir,
            task,
            gateway_client: &client,
            gateway_url: &gateway_url,
            judge_model: &judge_model,
            baseline_lint_findings: baseline,
        };

        match thunderdome_trial::rescore_trial(request).await {
            Ok(meta) => {
                tracing::info!(
                    trial_dir = %trial_dir.display(),
                    composite_score = meta.composite_score,
                    "re-scored trial"
                );
                rescored += 1;
            }
            Err(source) => {
                tracing::warn!(trial_dir = %trial_dir.display(), error = %source, "failed to re-score trial");
                skipped += 1;
            }
        }
    }

    gateway.stop().await;

    tracing::info!(rescored, skipped, "validate finished");
    Ok(())
}

/// Walk `{run_dir}/trials/<orch>/<task>/trial-N/` and return every trial
/// directory that has a `meta.json`.
fn discover_trial_dirs(run_dir: &std::path::Path) -> anyhow::Result<Vec<PathBuf>> {
    let trials_root = run_dir.join("trials");
    let mut dirs = Vec::new();
    for orchestrator_dir in list_subdirs(&trials_root)? {
        for task_dir in list_subdirs(&orchestrator_dir)? {
            for trial_dir in list_subdirs(&task_dir)? {
                if trial_dir.join("meta.json").is_file() {
                    dirs.push(trial_dir);
                }
            }
        }
    }
    Ok(dirs)
}

fn list_subdirs(parent: &std::path::Path) -> anyhow::Result<Vec<PathBuf>> {
    if !parent.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(parent)
        .with_context(|| format!("reading directory {}", parent.display()))?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Measure the lint finding count at a task's pristine starting state by
/// cloning its tag into a scratch directory and running `lint_cmd` once.
/// Best-effort: any failure along the way falls back to a baseline of 0.
async fn baseline_lint_findings(task: &TaskSpec) -> u64 {
    let Some(lint_cmd) = task.lint_cmd.as_deref() else {
        return 0;
    };

    let Ok(scratch) = tempfile::tempdir() else {
        return 0;
    };
    let workspace = scratch.path().join("workspace");
    if thunderdome_workspace::prepare(&task.repo, &task.tag, &workspace)
        .await
        .is_err()
    {
        return 0;
    }

    let timeout = Duration::from_secs(task.time_limit_minutes * 60);
    match thunderdome_validate::run_lint(&task.validation_image, Some(lint_cmd), &workspace, 0, timeout)
        .await
    {
        Ok(outcome) => thunderdome_validate::count_findings(&outcome.output),
        Err(_) => 0,
    }
}
