use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use crate::{
    labels::{HARNESS_LABEL, trial_label},
    process::{DockerCommandError, run_docker},
};

const NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

/// An isolated bridge network created for exactly one container run and
/// removed when dropped/explicitly removed. No external egress; only a
/// host-gateway alias is reachable, so the container can talk to the
/// locally running LLM gateway.
pub struct IsolatedNetwork {
    name: String,
}

impl IsolatedNetwork {
    pub async fn create(trial: &str) -> Result<Self, DockerCommandError> {
        let name = format!("thunderdome-net-{}", Uuid::new_v4());

        run_docker(
            [
                "network",
                "create",
                "--internal",
                "--label",
                HARNESS_LABEL,
                "--label",
                &trial_label(trial),
                &name,
            ],
            NETWORK_TIMEOUT,
        )
        .await?;

        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the network. Failure is logged, never fatal — a leaked
    /// network does not poison the trial.
    pub async fn remove(self) {
        if let Err(source) = run_docker(["network", "rm", &self.name], NETWORK_TIMEOUT).await {
            warn!(network = %self.name, error = %source, "failed to remove isolated network");
        }
    }
}
