use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Immutable description of one orchestrator under test.
///
/// `name` must be unique within a Run; `adapter` is bind-mounted read-only
/// into the container at a known path, and `env` is merged over the
/// harness-provided defaults (never replacing them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSpec {
    pub name: String,
    pub adapter: PathBuf,
    pub image: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl OrchestratorSpec {
    /// Merge this orchestrator's env overlay over a set of harness defaults,
    /// with the overlay winning on key collision.
    #[must_use]
    pub fn merged_env(&self, defaults: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut merged = defaults.clone();
        merged.extend(self.env.clone());
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_wins_on_collision() {
        let spec = OrchestratorSpec {
            name: "claude-code".into(),
            adapter: PathBuf::from("/adapters/claude.sh"),
            image: "thunderdome/claude-code:latest".into(),
            env: BTreeMap::from([("PROXY_URL".into(), "http://overlay".into())]),
        };
        let defaults = BTreeMap::from([
            ("PROXY_URL".into(), "http://default".into()),
            ("TASK_DIR".into(), "/workspace".into()),
        ]);

        let merged = spec.merged_env(&defaults);
        assert_eq!(merged["PROXY_URL"], "http://overlay");
        assert_eq!(merged["TASK_DIR"], "/workspace");
    }
}
