use std::{process::Stdio, time::Duration};

use thiserror::Error;
use tokio::{process::Command, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    RunOutcome, RunSpec,
    labels::{HARNESS_LABEL, trial_label},
};

const CONTAINER_START_TIMEOUT: Duration = Duration::from_secs(60);
const CONTAINER_REMOVE_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum DockerCommandError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Run a `docker` subcommand to completion within `deadline`, returning its
/// trimmed stdout. This is the shared CLI-shelling idiom every Docker
/// interaction in this crate builds on.
pub async fn run_docker<'a, I>(args: I, deadline: Duration) -> Result<String, DockerCommandError>
where
    I: IntoIterator<Item = &'a str>,
{
    let args: Vec<&str> = args.into_iter().collect();
    let label = format!("docker {}", args.join(" "));

    let mut command = Command::new("docker");
    command.args(&args).stdin(Stdio::null());

    let output = timeout(
        thunderdome_core::adjust_timeout(deadline),
        command.output(),
    )
    .await
    .map_err(|_| DockerCommandError::Timeout {
        command: label.clone(),
        timeout: deadline,
    })?
    .map_err(|source| DockerCommandError::Spawn {
        command: label.clone(),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(DockerCommandError::Failed {
            command: label,
            status: output.status,
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

/// Run the container described by `spec` on network `network_name` to
/// completion (or until it times out), always force-removing the container
/// on the way out.
pub async fn run_container(
    spec: &RunSpec,
    network_name: &str,
) -> Result<RunOutcome, DockerCommandError> {
    let args = build_run_args(spec, network_name);
    let args_ref: Vec<&str> = args.iter().map(String::as_str).collect();

    let container_id = run_docker(args_ref, CONTAINER_START_TIMEOUT).await?;
    debug!(container_id, image = %spec.image, "container started");

    let start = std::time::Instant::now();
    let wait_result = timeout(
        thunderdome_core::adjust_timeout(spec.timeout),
        run_docker(["wait", &container_id], spec.timeout + Duration::from_secs(5)),
    )
    .await;

    let outcome = match wait_result {
        Ok(Ok(stdout)) => {
            let exit_code = stdout.trim().parse::<i32>().unwrap_or(-1);
            RunOutcome {
                exit_code,
                timed_out: false,
                duration: start.elapsed(),
            }
        }
        Ok(Err(source)) => {
            warn!(container_id, error = %source, "docker wait failed");
            RunOutcome {
                exit_code: -1,
                timed_out: false,
                duration: start.elapsed(),
            }
        }
        Err(_) => {
            warn!(container_id, "container exceeded its deadline; killing");
            kill_and_drain(&container_id).await;
            RunOutcome {
                exit_code: 124,
                timed_out: true,
                duration: start.elapsed(),
            }
        }
    };

    remove_container(&container_id).await;

    info!(
        container_id,
        exit_code = outcome.exit_code,
        timed_out = outcome.timed_out,
        duration_secs = outcome.duration.as_secs_f64(),
        "container finished"
    );

    Ok(outcome)
}

fn build_run_args(spec: &RunSpec, network_name: &str) -> Vec<String> {
    let mut args: Vec<String> = vec!["run".into(), "-d".into()];

    args.extend(["--network".into(), network_name.into()]);
    args.extend([
        "--add-host".into(),
        "host.docker.internal:host-gateway".into(),
    ]);
    args.extend(["--label".into(), HARNESS_LABEL.into()]);
    args.extend(["--label".into(), trial_label(&spec.trial_label)]);

    args.extend([
        "-v".into(),
        format!("{}:/workspace:rw", spec.workspace.display()),
    ]);
    for mount in &spec.mounts {
        let mode = if mount.read_only { ":ro" } else { ":rw" };
        args.extend([
            "-v".into(),
            format!(
                "{}:{}{mode}",
                mount.host_path.display(),
                mount.container_path.display()
            ),
        ]);
    }

    args.extend(["-w".into(), spec.workdir.display().to_string()]);

    for (key, value) in &spec.env {
        args.extend(["-e".into(), format!("{key}={value}")]);
    }

    if let Some(cpus) = spec.limits.cpus.filter(|c| *c > 0.0) {
        args.extend(["--cpus".into(), cpus.to_string()]);
    }
    if let Some(mem_mb) = spec.limits.memory_mb.filter(|m| *m > 0) {
        args.extend(["--memory".into(), format!("{mem_mb}m")]);
    }
    if let Some(user) = &spec.user {
        args.extend(["--user".into(), user.clone()]);
    }

    args.push(spec.image.clone());
    args.extend(spec.command.clone());

    args
}

async fn kill_and_drain(container_id: &str) {
    if let Err(source) = run_docker(["kill", container_id], CONTAINER_REMOVE_TIMEOUT).await {
        warn!(container_id, error = %source, "failed to kill timed-out container");
    }
    // Drain logs so we don't leak an unread pipe while the container is
    // being removed.
    let _ = run_docker(["logs", container_id], LOG_DRAIN_TIMEOUT).await;
}

async fn remove_container(container_id: &str) {
    if let Err(source) = run_docker(["rm", "-f", container_id], CONTAINER_REMOVE_TIMEOUT).await {
        warn!(container_id, error = %source, "failed to remove container");
    }
}
