//! Workspace Manager (C1): clones a task's repository at its starting tag
//! into a trial's workspace directory, and captures the adapter's mutations
//! as a unified diff.
//!
//! Staging before diffing is non-negotiable: orchestrators routinely create
//! new files, which an unstaged diff would silently omit. Staging never
//! commits anything, and nothing here is ever pushed.

use std::{path::Path, process::Stdio, time::Duration};

use thiserror::Error;
use tokio::{process::Command, time::timeout};
use tracing::{debug, warn};

const CLONE_TIMEOUT: Duration = Duration::from_secs(120);
const GIT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from preparing or capturing a workspace. Both are *setup* errors:
/// non-retryable at this level, they abort the owning trial rather than
/// producing a `TrialMeta`.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to spawn git for '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("git {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("git {command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("captured diff was not valid UTF-8: {source}")]
    NotUtf8 {
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Shallow-clone `repo` at `tag` (depth 1) into `dest`, which must not
/// already exist. Fails with [`WorkspaceError`] if the repo is unreachable
/// or the tag is missing.
pub async fn prepare(repo: &str, tag: &str, dest: &Path) -> Result<(), WorkspaceError> {
    debug!(repo, tag, dest = %dest.display(), "cloning task repository");

    let dest_str = dest.to_string_lossy().into_owned();
    run_git(
        None,
        ["clone", "--depth", "1", "--branch", tag, repo, &dest_str],
        CLONE_TIMEOUT,
    )
    .await?;

    Ok(())
}

/// Stage every change in `dest` (tracked and untracked) and return the bytes
/// of the resulting unified diff. An empty result means the adapter did not
/// touch the workspace; this is a valid outcome, never an error.
pub async fn capture(dest: &Path) -> Result<Vec<u8>, WorkspaceError> {
    debug!(dest = %dest.display(), "staging workspace changes");
    run_git(Some(dest), ["add", "-A"], GIT_COMMAND_TIMEOUT).await?;

    debug!(dest = %dest.display(), "capturing staged diff");
    let output = run_git_output(dest, ["diff", "--cached", "--no-color"], GIT_COMMAND_TIMEOUT).await?;

    if output.is_empty() {
        debug!("no work was done; empty diff");
    }

    Ok(output)
}

async fn run_git<'a, I>(cwd: Option<&Path>, args: I, deadline: Duration) -> Result<(), WorkspaceError>
where
    I: IntoIterator<Item = &'a str>,
{
    let _ = run_git_inner(cwd, args, deadline).await?;
    Ok(())
}

async fn run_git_output<'a, I>(
    cwd: &Path,
    args: I,
    deadline: Duration,
) -> Result<Vec<u8>, WorkspaceError>
where
    I: IntoIterator<Item = &'a str>,
{
    run_git_inner(Some(cwd), args, deadline).await
}

async fn run_git_inner<'a, I>(
    cwd: Option<&Path>,
    args: I,
    deadline: Duration,
) -> Result<Vec<u8>, WorkspaceError>
where
    I: IntoIterator<Item = &'a str>,
{
    let args: Vec<&str> = args.into_iter().collect();
    let label = format!("git {}", args.join(" "));

    let mut command = Command::new("git");
    command.args(&args).stdin(Stdio::null());
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = timeout(thunderdome_core::adjust_timeout(deadline), command.output())
        .await
        .map_err(|_| WorkspaceError::Timeout {
            command: label.clone(),
            timeout: deadline,
        })?
        .map_err(|source| WorkspaceError::Spawn {
            command: label.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        warn!(command = %label, status = ?output.status, stderr, "git command failed");
        return Err(WorkspaceError::Failed {
            command: label,
            status: output.status,
            stderr,
        });
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command as TokioCommand;

    async fn git(dir: &Path, args: &[&str]) {
        let status = TokioCommand::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .await
            .expect("git available in test environment");
        assert!(status.success(), "git {args:?} failed");
    }

    #[tokio::test]
    async fn capture_on_untouched_clone_is_empty() {
        let origin = tempfile::tempdir().unwrap();
        git(origin.path(), &["init", "-q"]).await;
        git(origin.path(), &["config", "user.email", "t@example.test"]).await;
        git(origin.path(), &["config", "user.name", "tester"]).await;
        std::fs::write(origin.path().join("README.md"), "hello\n").unwrap();
        git(origin.path(), &["add", "-A"]).await;
        git(origin.path(), &["commit", "-q", "-m", "init"]).await;
        git(origin.path(), &["tag", "v1"]).await;

        let dest = tempfile::tempdir().unwrap();
        let clone_dir = dest.path().join("workspace");
        prepare(&origin.path().to_string_lossy(), "v1", &clone_dir)
            .await
            .unwrap();

        let diff = capture(&clone_dir).await.unwrap();
        assert!(diff.is_empty());
    }

    #[tokio::test]
    async fn capture_sees_new_untracked_files() {
        let origin = tempfile::tempdir().unwrap();
        git(origin.path(), &["init", "-q"]).await;
        git(origin.path(), &["config", "user.email", "t@example.test"]).await;
        git(origin.path(), &["config", "user.name", "tester"]).await;
        std::fs::write(origin.path().join("README.md"), "hello\n").unwrap();
        git(origin.path(), &["add", "-A"]).await;
        git(origin.path(), &["commit", "-q", "-m", "init"]).await;
        git(origin.path(), &["tag", "v1"]).await;

        let dest = tempfile::tempdir().unwrap();
        let clone_dir = dest.path().join("workspace");
        prepare(&origin.path().to_string_lossy(), "v1", &clone_dir)
            .await
            .unwrap();

        std::fs::write(clone_dir.join("fix.patch.rs"), "fn fixed() {}\n").unwrap();

        let diff = capture(&clone_dir).await.unwrap();
        assert!(!diff.is_empty());
        let diff_text = String::from_utf8(diff).unwrap();
        assert!(diff_text.contains("fix.patch.rs"));
    }
}
