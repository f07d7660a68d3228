use std::{path::Path, process::Stdio, time::Duration};

use thiserror::Error;
use tokio::{process::Command, time::timeout};

#[derive(Debug, Error)]
pub enum DockerRunError {
    #[error("failed to spawn validation container: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
    #[error("validation container timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Run `command` inside `image` with `workspace` bind-mounted read-only at
/// `/workspace`, returning the exit code and combined stdout+stderr. This is
/// the shared container-shelling idiom for the Test Runner and Lint Runner;
/// unlike the trial Container Runner it is fire-and-forget (`--rm`, no
/// isolated network, no label bookkeeping) because validation containers
/// never touch the network and are never targeted by aggressive cleanup.
pub async fn run_validation_container(
    image: &str,
    workspace: &Path,
    command: &str,
    deadline: Duration,
) -> Result<(i32, String), DockerRunError> {
    let mut docker = Command::new("docker");
    docker
        .args([
            "run",
            "--rm",
            "-v",
            &format!("{}:/workspace:ro", workspace.display()),
            "-w",
            "/workspace",
            image,
            "sh",
            "-c",
            command,
        ])
        .stdin(Stdio::null());

    let output = timeout(thunderdome_core::adjust_timeout(deadline), docker.output())
        .await
        .map_err(|_| DockerRunError::Timeout { timeout: deadline })?
        .map_err(|source| DockerRunError::Spawn { source })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let exit_code = output.status.code().unwrap_or(-1);
    Ok((exit_code, combined))
}
