use std::{path::Path, time::Duration};

use crate::docker::{DockerRunError, run_validation_container};

const PENALTY_PER_FINDING: f64 = 0.1;

/// Outcome of the Lint Runner: a score in `[0, 1]` plus the raw captured
/// output, persisted verbatim to `lint-output.txt`.
#[derive(Debug, Clone)]
pub struct LintOutcome {
    pub score: f64,
    pub exit_code: i32,
    pub output: String,
}

/// Run `lint_cmd` inside a fresh validation container and score the delta
/// against `baseline_findings`. An empty `lint_cmd` always
/// scores 1.0 without spawning a container.
pub async fn run_lint(
    validation_image: &str,
    lint_cmd: Option<&str>,
    workspace: &Path,
    baseline_findings: u64,
    timeout: Duration,
) -> Result<LintOutcome, DockerRunError> {
    let Some(lint_cmd) = lint_cmd.filter(|cmd| !cmd.trim().is_empty()) else {
        return Ok(LintOutcome {
            score: 1.0,
            exit_code: 0,
            output: String::new(),
        });
    };

    let (exit_code, output) =
        run_validation_container(validation_image, workspace, lint_cmd, timeout).await?;

    let score = if exit_code == 0 && output.trim().is_empty() {
        1.0
    } else {
        score_from_findings(&output, baseline_findings)
    };

    Ok(LintOutcome {
        score,
        exit_code,
        output,
    })
}

fn score_from_findings(output: &str, baseline_findings: u64) -> f64 {
    let findings = count_findings(output);
    let net_new = findings.saturating_sub(baseline_findings);
    (1.0 - PENALTY_PER_FINDING * net_new as f64).max(0.0)
}

/// Count lines that look like lint findings ("error"/"warning", case
/// insensitive). Exposed so callers can measure a task's baseline finding
/// count at its starting state before diffing against a post-trial run.
#[must_use]
pub fn count_findings(output: &str) -> u64 {
    output
        .lines()
        .filter(|line| {
            let lower = line.to_ascii_lowercase();
            lower.contains("error") || lower.contains("warning")
        })
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lint_cmd_scores_one_without_running() {
        let findings = count_findings("");
        assert_eq!(findings, 0);
    }

    #[test]
    fn clean_exit_with_no_output_scores_one() {
        assert_eq!(score_from_findings("", 0), 1.0);
    }

    #[test]
    fn net_new_findings_reduce_score_by_fixed_increment() {
        let output = "src/a.rs:1: warning: unused variable\nsrc/b.rs:2: error: missing semicolon\n";
        assert_eq!(count_findings(output), 2);
        assert_eq!(score_from_findings(output, 0), 0.8);
    }

    #[test]
    fn baseline_findings_are_subtracted() {
        let output = "1: warning\n2: warning\n3: warning\n";
        assert_eq!(score_from_findings(output, 3), 1.0);
        assert_eq!(score_from_findings(output, 2), 0.9);
    }

    #[test]
    fn score_floors_at_zero() {
        let mut output = String::new();
        for _ in 0..20 {
            output.push_str("x: error: bad\n");
        }
        assert_eq!(score_from_findings(&output, 0), 0.0);
    }
}
