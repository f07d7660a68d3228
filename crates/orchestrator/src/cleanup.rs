use std::process::Stdio;

use tokio::process::Command;
use tracing::warn;

const HARNESS_LABEL: &str = thunderdome_container::HARNESS_LABEL;

/// Prune any dangling containers and images still carrying the harness
/// label after a run. Best-effort: failures are logged, never fatal.
pub async fn aggressive_cleanup() {
    prune_containers().await;
    prune_images().await;
}

async fn prune_containers() {
    let Some(ids) = list_ids("ps", ["-a", "-q", "--filter", &format!("label={HARNESS_LABEL}")]).await
    else {
        return;
    };
    if ids.is_empty() {
        return;
    }
    run_docker_best_effort(["rm", "-f"].into_iter().chain(ids.iter().map(String::as_str))).await;
}

async fn prune_images() {
    let Some(ids) = list_ids("images", ["-q", "--filter", &format!("label={HARNESS_LABEL}")]).await
    else {
        return;
    };
    if ids.is_empty() {
        return;
    }
    run_docker_best_effort(["rmi", "-f"].into_iter().chain(ids.iter().map(String::as_str))).await;
}

async fn list_ids<'a, I>(subcommand: &str, args: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut command = Command::new("docker");
    command.arg(subcommand).args(args).stdin(Stdio::null());

    match command.output().await {
        Ok(output) if output.status.success() => Some(
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_owned)
                .collect(),
        ),
        Ok(output) => {
            warn!(
                subcommand,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "docker list command failed during aggressive cleanup"
            );
            None
        }
        Err(source) => {
            warn!(subcommand, error = %source, "failed to spawn docker during aggressive cleanup");
            None
        }
    }
}

async fn run_docker_best_effort<'a, I>(args: I)
where
    I: IntoIterator<Item = &'a str>,
{
    let args: Vec<&str> = args.into_iter().collect();
    let mut command = Command::new("docker");
    command.args(&args).stdin(Stdio::null());

    if let Err(source) = command.status().await {
        warn!(args = ?args, error = %source, "aggressive cleanup command failed to run");
    }
}
