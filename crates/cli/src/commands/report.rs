use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, ValueEnum};
use thunderdome_config::PricingTable;
use thunderdome_report::ReportFormat;

/// Output format for `report`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Table,
    Markdown,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Table => ReportFormat::Table,
            FormatArg::Markdown => ReportFormat::Markdown,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// Aggregate and print results from a stored Run.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Run directory to report on. Defaults to `<results.dir>/latest`.
    run_dir: Option<PathBuf>,
    /// Path to the harness YAML config, used to resolve `latest` when
    /// `run-dir` is omitted.
    #[arg(long, default_value = "thunderdome.yaml")]
    config: PathBuf,
    /// Pricing table YAML, joined against each trial's usage log to
    /// compute cost. Omit to report `cost_usd = 0.0` for every trial.
    #[arg(long)]
    pricing: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = FormatArg::Table)]
    format: FormatArg,
}

pub fn run(args: ReportArgs) -> anyhow::Result<()> {
    let run_dir = match args.run_dir {
        Some(dir) => dir,
        None => resolve_latest(&args.config)?,
    };

    let pricing = match &args.pricing {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading pricing table {}", path.display()))?;
            Some(PricingTable::load(&contents).context("parsing pricing table")?)
        }
        None => None,
    };

    let trials = thunderdome_report::collect_trials(&run_dir, pricing.as_ref())
        .with_context(|| format!("collecting trials from {}", run_dir.display()))?;
    let summaries = thunderdome_report::aggregate(&trials);
    let rendered = thunderdome_report::render(&summaries, args.format.into());

    println!("{rendered}");
    Ok(())
}

fn resolve_latest(config_path: &std::path::Path) -> anyhow::Result<PathBuf> {
    let config = thunderdome_config::load_harness_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let latest = config.results.dir.join("latest");
    std::fs::canonicalize(&latest)
        .with_context(|| format!("resolving latest run at {}", latest.display()))
}
