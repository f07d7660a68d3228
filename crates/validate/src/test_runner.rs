use std::{path::Path, time::Duration};

use regex::Regex;
use std::sync::OnceLock;

use crate::docker::{DockerRunError, run_validation_container};

/// Outcome of the Test Runner: a score in `[0, 1]` plus the raw captured
/// output, persisted verbatim to `test-output.txt`.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub score: f64,
    pub exit_code: i32,
    pub output: String,
}

/// Run `test_cmd` (preceded by a best-effort `install_cmd`, if any) inside a
/// fresh validation container and score the result.
pub async fn run_tests(
    validation_image: &str,
    install_cmd: Option<&str>,
    test_cmd: &str,
    workspace: &Path,
    timeout: Duration,
) -> Result<TestOutcome, DockerRunError> {
    let command = match install_cmd {
        Some(install) if !install.trim().is_empty() => format!("{install}; {test_cmd}"),
        _ => test_cmd.to_owned(),
    };

    let (exit_code, output) =
        run_validation_container(validation_image, workspace, &command, timeout).await?;

    let score = score_test_output(exit_code, &output);

    Ok(TestOutcome {
        score,
        exit_code,
        output,
    })
}

/// Apply the Test Runner's ordered scoring rules. The first rule whose
/// inputs are present decides the score; rules are never combined.
fn score_test_output(exit_code: i32, output: &str) -> f64 {
    if exit_code == 0 {
        return 1.0;
    }
    if let Some(score) = score_from_junit(output) {
        return score;
    }
    if let Some(score) = score_from_pass_fail_counts(output) {
        return score;
    }
    0.0
}

fn junit_testsuite_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<testsuite\b[^>]*>").expect("static regex is valid"))
}

fn junit_attr_re(name: &str) -> Regex {
    Regex::new(&format!(r#"{name}="(\d+)""#)).expect("static regex is valid")
}

/// Locate a `<testsuite ...>` tag and derive a pass fraction from its
/// `tests`/`failures`/`errors` attributes.
fn score_from_junit(output: &str) -> Option<f64> {
    let tag = junit_testsuite_re().find(output)?.as_str();

    let tests: f64 = junit_attr_re("tests")
        .captures(tag)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    if tests <= 0.0 {
        return None;
    }
    let failures: f64 = junit_attr_re("failures")
        .captures(tag)
        .and_then(|c| c.get(1)?.as_str().parse().ok())
        .unwrap_or(0.0);
    let errors: f64 = junit_attr_re("errors")
        .captures(tag)
        .and_then(|c| c.get(1)?.as_str().parse().ok())
        .unwrap_or(0.0);

    Some(((tests - failures - errors) / tests).max(0.0))
}

fn passed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d+)\s+passed\b").expect("static regex is valid"))
}

fn failed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d+)\s+failed\b").expect("static regex is valid"))
}

/// Scan for the common "N passed, M failed" summary line emitted by test
/// frameworks (pytest, go test, jest, ...).
fn score_from_pass_fail_counts(output: &str) -> Option<f64> {
    let passed: f64 = passed_re().captures(output)?.get(1)?.as_str().parse().ok()?;
    let failed: f64 = failed_re()
        .captures(output)
        .and_then(|c| c.get(1)?.as_str().parse().ok())
        .unwrap_or(0.0);

    let total = passed + failed;
    if total <= 0.0 {
        return None;
    }
    Some(passed / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_zero_always_scores_one() {
        assert_eq!(score_test_output(0, "anything, even failures=5"), 1.0);
    }

    #[test]
    fn junit_testsuite_drives_score_when_exit_nonzero() {
        let output = r#"<testsuite name="pkg" tests="10" failures="2" errors="1"></testsuite>"#;
        assert_eq!(score_test_output(1, output), 0.7);
    }

    #[test]
    fn junit_without_failures_or_errors_attr_defaults_to_zero() {
        let output = r#"<testsuite name="pkg" tests="4"></testsuite>"#;
        assert_eq!(score_test_output(1, output), 1.0);
    }

    #[test]
    fn pass_fail_pattern_used_when_no_junit() {
        let output = "3 passed, 1 failed in 0.42s";
        assert_eq!(score_from_pass_fail_counts(output), Some(0.75));
        assert_eq!(score_test_output(1, output), 0.75);
    }

    #[test]
    fn falls_back_to_zero_when_nothing_recognizable() {
        assert_eq!(score_test_output(1, "panic: segmentation fault"), 0.0);
    }

    #[test]
    fn junit_rule_takes_priority_over_pass_fail_text() {
        let output = r#"noise 3 passed, 1 failed <testsuite tests="2" failures="0" errors="0">"#;
        assert_eq!(score_test_output(1, output), 1.0);
    }
}
