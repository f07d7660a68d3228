//! Container Runner (C2): creates, runs, waits on, and tears down a single
//! Docker container per call, enforcing an isolated network, bind mounts,
//! resource limits, and a hard deadline.
//!
//! Every call is independent: each creates and later removes its own
//! network and container, so concurrent calls never collide on naming, and
//! nothing besides the Docker daemon itself is shared between them.

mod labels;
mod network;
mod process;

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use thiserror::Error;

pub use labels::HARNESS_LABEL;

/// One extra bind mount beyond the workspace mount, e.g. the adapter script
/// or the task description file.
#[derive(Debug, Clone)]
pub struct Mount {
    pub host_path: PathBuf,
    pub container_path: PathBuf,
    pub read_only: bool,
}

/// CPU/memory caps. `None` (or `Some(0.0)` / `Some(0)`) means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    pub cpus: Option<f64>,
    pub memory_mb: Option<u64>,
}

/// Egress policy for the container's network. The container always gets an
/// isolated bridge network with a host-gateway alias injected so it can
/// reach the locally running LLM gateway; `allowlist` is carried through
/// for a future forward-proxy sidecar and has no effect on the bridge
/// network itself; wiring it into an actual proxy is future work.
#[derive(Debug, Clone, Default)]
pub struct NetworkPolicy {
    pub allowlist: Vec<String>,
}

/// Everything needed to run one container to completion.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub image: String,
    pub command: Vec<String>,
    pub workspace: PathBuf,
    pub workdir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub mounts: Vec<Mount>,
    pub network: NetworkPolicy,
    pub limits: Limits,
    pub timeout: Duration,
    /// Override the container's user, so files written into the bind mount
    /// are owned by the host user rather than root.
    pub user: Option<String>,
    /// Identifies which trial this container belongs to, for the harness
    /// label and for aggressive cleanup to target.
    pub trial_label: String,
}

/// Outcome of one container run.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub timed_out: bool,
    pub duration: Duration,
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("failed to create isolated network: {source}")]
    NetworkCreate {
        #[source]
        source: process::DockerCommandError,
    },
    #[error("failed to start container: {source}")]
    ContainerStart {
        #[source]
        source: process::DockerCommandError,
    },
}

/// Run `image` running `command` to completion (or until `spec.timeout`
/// elapses).
pub async fn run(spec: RunSpec) -> Result<RunOutcome, ContainerError> {
    let net = network::IsolatedNetwork::create(&spec.trial_label)
        .await
        .map_err(|source| ContainerError::NetworkCreate { source })?;

    let outcome = process::run_container(&spec, net.name()).await;

    // The network is always torn down regardless of how the container run
    // went; failure to remove it is logged, never fatal.
    net.remove().await;

    outcome.map_err(|source| ContainerError::ContainerStart { source })
}
