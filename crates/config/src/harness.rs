use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thunderdome_core::{OrchestratorSpec, TaskSpec};

/// Top-level harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub orchestrators: Vec<OrchestratorSpec>,
    pub tasks: Vec<TaskSpec>,
    pub trials: u32,
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub results: ResultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub gateway: Vec<String>,
    pub log_dir: PathBuf,
    pub budget_per_trial_usd: f64,
    #[serde(default)]
    pub judge_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub allowlist: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsConfig {
    #[serde(default = "ResultsConfig::default_dir")]
    pub dir: PathBuf,
}

impl ResultsConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("results")
    }
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}
