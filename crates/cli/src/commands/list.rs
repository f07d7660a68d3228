use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;

/// Print the orchestrators and tasks declared in the config.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Path to the harness YAML config.
    #[arg(long, default_value = "thunderdome.yaml")]
    config: PathBuf,
}

pub fn run(args: ListArgs) -> anyhow::Result<()> {
    let config = thunderdome_config::load_harness_config(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    println!("orchestrators:");
    for orchestrator in &config.orchestrators {
        println!(
            "  {} (adapter={}, image={})",
            orchestrator.name,
            orchestrator.adapter.display(),
            orchestrator.image
        );
    }

    println!("tasks:");
    for task in &config.tasks {
        println!(
            "  {} (category={}, repo={}, tag={})",
            task.name, task.category, task.repo, task.tag
        );
    }

    Ok(())
}
