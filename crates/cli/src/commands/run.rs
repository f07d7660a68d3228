use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use thunderdome_orchestrator::CliFilters;

/// Execute a Run against the configured orchestrators and tasks.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the harness YAML config.
    #[arg(long, default_value = "thunderdome.yaml")]
    config: PathBuf,
    /// Restrict the run to this orchestrator name.
    #[arg(long = "orchestrator")]
    orchestrator: Option<String>,
    /// Restrict the run to this task name.
    #[arg(long = "task")]
    task: Option<String>,
    /// Restrict the run to tasks whose category matches this `*`-glob.
    #[arg(long = "category")]
    category: Option<String>,
    /// Override the configured trial count for every task. `0` is ignored.
    #[arg(long = "trials")]
    trials: Option<u32>,
    /// Maximum number of trials to run concurrently.
    #[arg(long, default_value_t = 4)]
    parallel: usize,
    /// Prune dangling harness-labelled containers/images after the run.
    #[arg(long)]
    cleanup_aggressive: bool,
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = thunderdome_config::load_harness_config(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    let results_root = config.results.dir.clone();

    let request = thunderdome_orchestrator::ExecuteRequest {
        config,
        filters: CliFilters {
            orchestrator: args.orchestrator,
            task: args.task,
            category: args.category,
            trials: args.trials,
        },
        results_root,
        parallel: args.parallel,
        limits: thunderdome_container::Limits::default(),
        cleanup_aggressive: args.cleanup_aggressive,
    };

    let outcome = thunderdome_orchestrator::execute(request)
        .await
        .context("executing run")?;

    tracing::info!(
        run_dir = %outcome.run_dir.display(),
        trials = outcome.trial_metas.len(),
        setup_failures = outcome.job_errors.len(),
        "run finished"
    );

    // The harness exit code reflects setup/configuration failure, not
    // individual trial outcomes (including per-trial setup aborts, which
    // are still just one of many trials in the run).
    Ok(())
}
