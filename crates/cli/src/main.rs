//! Command-line entry point for the Thunderdome benchmark harness.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Benchmark harness for agentic coding orchestrators.
#[derive(Parser, Debug)]
#[command(name = "thunderdome", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a Run against the configured orchestrators and tasks.
    Run(commands::run::RunArgs),
    /// Print the orchestrators and tasks declared in the config.
    List(commands::list::ListArgs),
    /// Aggregate and print results from a stored Run.
    Report(commands::report::ReportArgs),
    /// Re-score stored trials in place (tests, lint, rubric). Idempotent.
    Validate(commands::validate::ValidateArgs),
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::List(args) => commands::list::run(args),
        Commands::Report(args) => commands::report::run(args),
        Commands::Validate(args) => commands::validate::run(args).await,
    };

    // 0 on success regardless of individual trial outcomes, 1 on setup
    // or configuration failure.
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "thunderdome failed");
            ExitCode::FAILURE
        }
    }
}
