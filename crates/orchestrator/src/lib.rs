//! Execution Orchestrator (C11): the top of the control-flow chain
//! (`C11 → C9 → C8 → {C1..C7} → C10`). Applies CLI filters, creates the Run
//! directory, boots the gateway, dispatches the trial cross-product to the
//! worker pool, and prints a summary.

mod cleanup;
mod filters;
mod jobs;

pub use cleanup::aggressive_cleanup;
pub use filters::{CliFilters, FilteredConfig, apply_filters};

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use thiserror::Error;
use thunderdome_config::HarnessConfig;
use thunderdome_core::TrialMeta;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no orchestrator in the config matches the requested filter")]
    NoMatchingOrchestrators,
    #[error("no task in the config matches the requested filters")]
    NoMatchingTasks,
    #[error("failed to create run directory: {0}")]
    Store(#[from] thunderdome_store::StoreError),
    #[error("failed to write run config snapshot: {0}")]
    ConfigSnapshot(#[from] serde_yaml::Error),
    #[error("failed to persist config snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to start the gateway: {0}")]
    Gateway(#[from] thunderdome_gateway::GatewayError),
}

/// Everything `execute` needs beyond the loaded config itself.
pub struct ExecuteRequest {
    pub config: HarnessConfig,
    pub filters: CliFilters,
    pub results_root: PathBuf,
    pub parallel: usize,
    pub limits: thunderdome_container::Limits,
    pub cleanup_aggressive: bool,
}

/// What one `Execute` call produced.
pub struct ExecuteOutcome {
    pub run_dir: PathBuf,
    pub trial_metas: Vec<TrialMeta>,
    pub job_errors: Vec<String>,
}

/// Run a full benchmark pass: filter the config, build the trial
/// cross-product, and drive it through the worker pool.
pub async fn execute(request: ExecuteRequest) -> Result<ExecuteOutcome, OrchestratorError> {
    let filtered = apply_filters(&request.config, &request.filters);
    if filtered.orchestrators.is_empty() {
        return Err(OrchestratorError::NoMatchingOrchestrators);
    }
    if filtered.tasks.is_empty() {
        return Err(OrchestratorError::NoMatchingTasks);
    }

    let run_id = thunderdome_core::format_run_id(chrono::Utc::now());
    let layout = thunderdome_store::RunLayout::new(&request.results_root, run_id.clone());
    layout.create()?;
    thunderdome_store::install_latest_marker(&request.results_root, &layout.run_dir())?;

    let config_snapshot = serde_yaml::to_string(&request.config)?;
    std::fs::write(layout.config_path(), config_snapshot)?;

    info!(run_id, "starting run");

    let gateway = thunderdome_gateway::start(thunderdome_gateway::GatewayConfig {
        command: request.config.proxy.gateway.clone(),
        log_dir: request.config.proxy.log_dir.clone(),
        budget_per_trial_usd: request.config.proxy.budget_per_trial_usd,
        secrets_env_file: request.config.secrets.env_file.clone(),
        extra_env: Vec::new(),
    })
    .await?;

    let trial_metas = Arc::new(Mutex::new(Vec::new()));
    let trial_jobs = jobs::build_trial_jobs(
        &filtered,
        gateway.url(),
        layout.run_dir(),
        request.config.network.allowlist.clone(),
        request.limits,
        Arc::clone(&trial_metas),
    );

    let job_errors = thunderdome_pool::run_pool(request.parallel, trial_jobs).await;
    for error in &job_errors {
        warn!(error, "trial setup failed");
    }

    let mut gateway = gateway;
    gateway.stop().await;

    if request.cleanup_aggressive {
        cleanup::aggressive_cleanup().await;
    }

    let trial_metas = Arc::try_unwrap(trial_metas)
        .map(|mutex| mutex.into_inner().unwrap_or_default())
        .unwrap_or_default();

    print_summary(&layout.run_dir(), &trial_metas);

    Ok(ExecuteOutcome {
        run_dir: layout.run_dir(),
        trial_metas,
        job_errors,
    })
}

/// Summary printing is delegated to the report crate's pure aggregation,
/// kept deliberately thin here — full aggregation is the report crate's job.
fn print_summary(run_dir: &std::path::Path, trial_metas: &[TrialMeta]) {
    let collected: Vec<thunderdome_report::CollectedTrial> = trial_metas
        .iter()
        .cloned()
        .map(|meta| thunderdome_report::CollectedTrial { meta, cost_usd: 0.0 })
        .collect();
    let summaries = thunderdome_report::aggregate(&collected);
    let table = thunderdome_report::render(&summaries, thunderdome_report::ReportFormat::Table);
    info!(run_dir = %run_dir.display(), "run complete\n{table}");
}
