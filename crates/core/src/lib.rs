//! Shared data model, error taxonomy, and small timing helpers used across
//! every Thunderdome crate.

pub mod orchestrator;
pub mod scores;
pub mod task;
pub mod trial;
pub mod usage;

pub use orchestrator::OrchestratorSpec;
pub use scores::{Scores, Weights};
pub use task::{RubricCriterion, TaskSpec};
pub use trial::{ExitReason, TrialId, TrialMeta};
pub use usage::UsageRecord;

use std::{env, ops::Mul as _, sync::LazyLock, time::Duration};

static IS_SLOW_TEST_ENV: LazyLock<bool> =
    LazyLock::new(|| env::var("THUNDERDOME_SLOW_ENV").is_ok_and(|s| s == "true"));

/// In slow CI environments, double every wait so flaky timeouts don't trip.
#[must_use]
pub fn adjust_timeout(d: Duration) -> Duration {
    if *IS_SLOW_TEST_ENV { d.mul(2) } else { d }
}

/// Format a UTC instant the way Run identifiers are named on disk:
/// `YYYY-MM-DDThh-mm-ss`.
#[must_use]
pub fn format_run_id(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn run_id_format_matches_contract() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 7, 28, 9, 5, 3).unwrap();
        assert_eq!(format_run_id(at), "2026-07-28T09-05-03");
    }

    #[test]
    fn adjust_timeout_doubles_only_when_slow_env_set() {
        let base = Duration::from_secs(10);
        // SAFETY: none; this just reads env, no unsafe needed, but tests run
        // serially enough in this crate that mutating the process env here is
        // acceptable.
        unsafe {
            env::remove_var("THUNDERDOME_SLOW_ENV");
        }
        assert_eq!(adjust_timeout(base), base);
    }
}
