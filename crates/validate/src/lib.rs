//! Validation pipeline: Test Runner (C4), Lint Runner (C5), and Rubric
//! Judge (C6). Each layer scores independently and a failure in one never
//! blocks the others — a failed layer's score defaults to 0 and its raw
//! output (if any) is still returned for persistence.

mod docker;
mod lint_runner;
mod rubric;
mod test_runner;

pub use docker::DockerRunError;
pub use lint_runner::{LintOutcome, count_findings, run_lint};
pub use rubric::{RubricError, judge_rubric};
pub use test_runner::{TestOutcome, run_tests};

use std::collections::BTreeMap;

use thunderdome_core::Scores;

/// Bundle the three validation layers into the `Scores` triple (C7 wiring).
/// `rubric_scores` is the raw per-criterion map; its contribution to the
/// composite is the mean of its values, or 0 when the rubric was empty or
/// every attempt failed.
#[must_use]
pub fn combine_scores(
    test_outcome: &TestOutcome,
    lint_outcome: &LintOutcome,
    rubric_scores: &Option<BTreeMap<String, f64>>,
) -> Scores {
    let rubric = rubric_scores
        .as_ref()
        .filter(|map| !map.is_empty())
        .map(|map| map.values().sum::<f64>() / map.len() as f64)
        .unwrap_or(0.0);

    Scores {
        tests: test_outcome.score,
        static_analysis: lint_outcome.score,
        rubric,
    }
}
