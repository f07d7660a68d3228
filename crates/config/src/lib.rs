//! Ambient configuration loading: the harness YAML config (A1) and the
//! pricing table used at report time to cost out token usage.

mod harness;
mod pricing;

pub use harness::{
    HarnessConfig, NetworkConfig, ProxyConfig, ResultsConfig, SecretsConfig,
};
pub use pricing::PricingTable;

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("config must declare at least one orchestrator")]
    NoOrchestrators,
    #[error("config must declare at least one task")]
    NoTasks,
    #[error("trials must be >= 1, got {0}")]
    InvalidTrialCount(u32),
}

/// Load and validate the harness configuration from `path`. Required
/// per-orchestrator and per-task fields (`name`/`adapter`/`image`,
/// `repo`/`tag`/`validation_image`/`test_cmd`) are enforced by plain
/// deserialization since they are non-optional fields on the target
/// structs; the checks here cover what deserialization alone cannot
/// express.
pub fn load_harness_config(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: HarnessConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &HarnessConfig) -> Result<(), ConfigError> {
    if config.orchestrators.is_empty() {
        return Err(ConfigError::NoOrchestrators);
    }
    if config.tasks.is_empty() {
        return Err(ConfigError::NoTasks);
    }
    if config.trials < 1 {
        return Err(ConfigError::InvalidTrialCount(config.trials));
    }
    Ok(())
}
