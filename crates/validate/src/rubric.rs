use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use thunderdome_core::RubricCriterion;
use tracing::{debug, warn};

const JUDGE_ATTEMPTS: usize = 3;
const JUDGE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum RubricError {
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Score `diff` against `rubric` by querying the LLM gateway. Returns
/// `None` immediately for an empty rubric. Each
/// criterion present in the result reflects the median of however many of
/// the three attempts succeeded and parsed; a criterion with zero
/// successful attempts is omitted from the map entirely.
pub async fn judge_rubric(
    client: &reqwest::Client,
    gateway_url: &str,
    judge_model: &str,
    rubric: &[RubricCriterion],
    task_description: &str,
    diff: &str,
) -> Result<Option<BTreeMap<String, f64>>, RubricError> {
    if rubric.is_empty() {
        return Ok(None);
    }

    let prompt = build_prompt(rubric, task_description, diff);

    let mut per_criterion: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for attempt in 0..JUDGE_ATTEMPTS {
        match run_one_attempt(client, gateway_url, judge_model, &prompt).await {
            Ok(scores) => {
                for (criterion, score) in scores {
                    per_criterion.entry(criterion).or_default().push(score);
                }
            }
            Err(source) => {
                warn!(attempt, error = %source, "rubric judge attempt failed");
            }
        }
    }

    let mut result = BTreeMap::new();
    for criterion in rubric {
        if let Some(scores) = per_criterion.get(&criterion.criterion) {
            result.insert(criterion.criterion.clone(), median(scores));
        }
    }

    Ok(Some(result))
}

async fn run_one_attempt(
    client: &reqwest::Client,
    gateway_url: &str,
    judge_model: &str,
    prompt: &str,
) -> Result<BTreeMap<String, f64>, RubricError> {
    let request = ChatRequest {
        model: judge_model,
        temperature: 0.0,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt.to_owned(),
        }],
    };

    let response = client
        .post(format!("{gateway_url}/v1/chat/completions"))
        .json(&request)
        .timeout(JUDGE_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .json::<ChatResponse>()
        .await?;

    let content = response
        .choices
        .first()
        .map(|choice| choice.message.content.as_str())
        .unwrap_or_default();

    let scores = parse_scores(content).unwrap_or_default();
    debug!(count = scores.len(), "parsed rubric judge response");
    Ok(scores)
}

fn build_prompt(rubric: &[RubricCriterion], task_description: &str, diff: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are scoring a code change against a rubric. ");
    prompt.push_str(
        "Reply with a single JSON object mapping each criterion name to a numeric score in [0, 1]. \
         Do not include any other text.\n\n",
    );
    prompt.push_str("Task description:\n");
    prompt.push_str(task_description);
    prompt.push_str("\n\nRubric:\n");
    for criterion in rubric {
        prompt.push_str(&format!("- {} (weight {})\n", criterion.criterion, criterion.weight));
    }
    prompt.push_str("\nDiff:\n");
    prompt.push_str(diff);
    prompt
}

/// Strip optional Markdown code fences, then decode a JSON object of
/// criterion → score.
fn parse_scores(content: &str) -> Option<BTreeMap<String, f64>> {
    let stripped = strip_code_fences(content);
    serde_json::from_str(&stripped).ok()
}

fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_owned();
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").unwrap_or(rest).trim().to_owned()
}

/// Median of a non-empty slice; ties on even length are broken as the mean
/// of the two middle values.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let len = sorted.len();
    if len % 2 == 1 {
        sorted[len / 2]
    } else {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_count_is_middle_value() {
        assert_eq!(median(&[0.2, 0.8, 0.5]), 0.5);
    }

    #[test]
    fn median_of_even_count_is_mean_of_two_middle() {
        assert_eq!(median(&[0.2, 0.4, 0.6, 0.8]), 0.5);
    }

    #[test]
    fn strip_code_fences_removes_json_fence() {
        let content = "```json\n{\"correctness\": 0.9}\n```";
        assert_eq!(strip_code_fences(content), "{\"correctness\": 0.9}");
    }

    #[test]
    fn strip_code_fences_is_noop_without_fence() {
        let content = "{\"correctness\": 0.9}";
        assert_eq!(strip_code_fences(content), content);
    }

    #[test]
    fn parse_scores_decodes_fenced_json() {
        let content = "```json\n{\"clarity\": 0.75, \"correctness\": 1.0}\n```";
        let scores = parse_scores(content).unwrap();
        assert_eq!(scores.get("clarity"), Some(&0.75));
        assert_eq!(scores.get("correctness"), Some(&1.0));
    }

    #[test]
    fn parse_scores_returns_none_on_garbage() {
        assert_eq!(parse_scores("not json at all"), None);
    }
}
