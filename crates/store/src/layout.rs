use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::StoreError;

/// The directory layout for one Run, rooted at the configured results
/// directory.
#[derive(Debug, Clone)]
pub struct RunLayout {
    results_root: PathBuf,
    run_id: String,
}

impl RunLayout {
    #[must_use]
    pub fn new(results_root: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            results_root: results_root.into(),
            run_id: run_id.into(),
        }
    }

    #[must_use]
    pub fn run_dir(&self) -> PathBuf {
        self.results_root.join("runs").join(&self.run_id)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.run_dir().join("config.yaml")
    }

    #[must_use]
    pub fn trial_dir(&self, orchestrator: &str, task: &str, trial_index: u32) -> PathBuf {
        self.run_dir()
            .join("trials")
            .join(orchestrator)
            .join(task)
            .join(format!("trial-{trial_index}"))
    }

    #[must_use]
    pub fn latest_link(&self) -> PathBuf {
        self.results_root.join("latest")
    }

    /// Create the run directory tree. Idempotent.
    pub fn create(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.run_dir()).map_err(|source| StoreError::CreateDir {
            path: self.run_dir().display().to_string(),
            source,
        })
    }
}

/// Atomically point `latest` at `run_dir`: create a symlink under a
/// temporary name alongside `latest`, then rename it over `latest` in a
/// single filesystem operation. `latest` is never observably missing
/// during the rename.
pub fn install_latest_marker(results_root: &Path, run_dir: &Path) -> Result<(), StoreError> {
    let latest = results_root.join("latest");
    let tmp = results_root.join(format!(".latest-{}", Uuid::new_v4()));

    // `run_dir` is made relative to `results_root` so the symlink keeps
    // working if the whole results tree is moved.
    let target = run_dir
        .strip_prefix(results_root)
        .unwrap_or(run_dir)
        .to_path_buf();

    symlink(&target, &tmp).map_err(|source| StoreError::LatestMarker { source })?;

    std::fs::rename(&tmp, &latest).map_err(|source| {
        // Best-effort cleanup of the temp link; a stray one is harmless but
        // worth removing so it doesn't accumulate across runs.
        if let Err(cleanup_err) = std::fs::remove_file(&tmp) {
            warn!(error = %cleanup_err, "failed to clean up stray latest-marker temp file");
        }
        StoreError::LatestMarker { source }
    })
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
