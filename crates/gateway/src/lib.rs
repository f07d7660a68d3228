//! Gateway Manager (C3): spawns the local LLM gateway process on a
//! dynamically allocated port, isolates model-provider secrets from the
//! containers it serves, and attributes usage to whichever trial is
//! currently running through it.

mod secrets;

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use thiserror::Error;
use tokio::{
    net::TcpStream,
    process::{Child, Command},
    time::{sleep, timeout},
};
use tracing::{debug, info, warn};

pub use secrets::{SecretsError, load_secrets_env_file};

const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);
const READINESS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind an ephemeral port: {source}")]
    PortAllocation {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open gateway log file at {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn gateway process '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("gateway did not become ready on port {port} within {timeout:?}")]
    ReadinessTimeout { port: u16, timeout: Duration },
    #[error(transparent)]
    Secrets(#[from] SecretsError),
}

/// Parameters for starting the gateway process.
pub struct GatewayConfig {
    /// Executable (and leading args) that starts the gateway, e.g. the
    /// `proxy.gateway` value from the harness YAML config.
    pub command: Vec<String>,
    pub log_dir: PathBuf,
    pub budget_per_trial_usd: f64,
    pub secrets_env_file: Option<PathBuf>,
    /// Extra environment forwarded to the gateway beyond the harness
    /// process's own environment and the secrets file.
    pub extra_env: Vec<(String, String)>,
}

/// A running gateway process. `stop()` is idempotent; dropping a handle
/// that was never stopped also stops it, so a trial panic never leaks the
/// process.
pub struct GatewayHandle {
    port: u16,
    child: Option<Child>,
    stopped: bool,
}

impl GatewayHandle {
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Stop the gateway process. Safe to call more than once.
    pub async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Some(mut child) = self.child.take() {
            if let Err(source) = child.kill().await {
                warn!(error = %source, "failed to kill gateway process");
            }
            let _ = child.wait().await;
        }
        info!(port = self.port, "gateway stopped");
    }
}

impl Drop for GatewayHandle {
    fn drop(&mut self) {
        if !self.stopped {
            if let Some(child) = &mut self.child {
                let _ = child.start_kill();
            }
        }
    }
}

/// Bind an ephemeral port and immediately release it, committing the
/// allocation via the spawned child's own bind. There is a small race
/// window between this and the child binding; the child's bind is the
/// authoritative commit.
fn allocate_port() -> Result<u16, GatewayError> {
    let listener = StdTcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|source| GatewayError::PortAllocation { source })?;
    let port = listener
        .local_addr()
        .map_err(|source| GatewayError::PortAllocation { source })?
        .port();
    drop(listener);
    Ok(port)
}

/// Spawn the gateway process on a dynamically allocated port, wait for it
/// to accept TCP connections, and return a handle to it.
pub async fn start(config: GatewayConfig) -> Result<GatewayHandle, GatewayError> {
    let port = allocate_port()?;
    debug!(port, "allocated gateway port");

    tokio::fs::create_dir_all(&config.log_dir)
        .await
        .map_err(|source| GatewayError::LogFile {
            path: config.log_dir.clone(),
            source,
        })?;
    let log_path = config.log_dir.join("gateway.log");
    let log_file = std::fs::File::create(&log_path).map_err(|source| GatewayError::LogFile {
        path: log_path.clone(),
        source,
    })?;
    let log_file_err = log_file
        .try_clone()
        .map_err(|source| GatewayError::LogFile {
            path: log_path.clone(),
            source,
        })?;

    let Some((program, args)) = config.command.split_first() else {
        return Err(GatewayError::Spawn {
            command: String::new(),
            source: std::io::Error::other("empty gateway command"),
        });
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .env("PORT", port.to_string())
        .env(
            "THUNDERDOME_BUDGET_PER_TRIAL_USD",
            config.budget_per_trial_usd.to_string(),
        )
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_file_err));

    if let Some(secrets_path) = &config.secrets_env_file {
        for (key, value) in load_secrets_env_file(secrets_path).await? {
            command.env(key, value);
        }
    }
    for (key, value) in &config.extra_env {
        command.env(key, value);
    }

    let label = config.command.join(" ");
    let child = command.spawn().map_err(|source| GatewayError::Spawn {
        command: label,
        source,
    })?;

    let mut handle = GatewayHandle {
        port,
        child: Some(child),
        stopped: false,
    };

    if let Err(err) = wait_ready(port, READINESS_TIMEOUT).await {
        handle.stop().await;
        return Err(err);
    }

    info!(port, "gateway ready");
    Ok(handle)
}

async fn wait_ready(port: u16, deadline: Duration) -> Result<(), GatewayError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    timeout(thunderdome_core::adjust_timeout(deadline), async {
        loop {
            if TcpStream::connect(addr).await.is_ok() {
                return;
            }
            sleep(READINESS_POLL_INTERVAL).await;
        }
    })
    .await
    .map_err(|_| GatewayError::ReadinessTimeout {
        port,
        timeout: deadline,
    })
}

/// Path convention for one trial's usage log.
#[must_use]
pub fn usage_log_path(trial_dir: &Path) -> PathBuf {
    trial_dir.join("proxy-log.jsonl")
}
