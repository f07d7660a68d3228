use serde::Deserialize;

/// One LLM request, parsed from a per-trial gateway usage log line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UsageRecord {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Parse one `proxy-log.jsonl` line into a [`UsageRecord`], tolerating
/// non-JSON noise (startup banners, warnings) and records with an empty
/// `model` by returning `None` rather than propagating an error.
///
/// The single parsing rule applied here: only lines that
/// decode successfully *and* have a non-empty model count.
#[must_use]
pub fn parse_usage_line(line: &str) -> Option<UsageRecord> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let record: UsageRecord = serde_json::from_str(trimmed).ok()?;
    if record.model.is_empty() {
        return None;
    }
    Some(record)
}

/// Parse every line of a usage log, skipping anything that fails to parse.
#[must_use]
pub fn parse_usage_log(contents: &str) -> Vec<UsageRecord> {
    contents.lines().filter_map(parse_usage_line).collect()
}

/// Sum the input+output tokens across a slice of usage records.
#[must_use]
pub fn total_tokens(records: &[UsageRecord]) -> u64 {
    records
        .iter()
        .map(|r| r.input_tokens + r.output_tokens)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_noise_lines() {
        let log = r#"
Thunderdome gateway listening on :4173
{"provider":"anthropic","model":"claude-opus","input_tokens":100,"output_tokens":50}
WARN: rate limiter cold start
not json at all
{"provider":"openai","model":"","input_tokens":1,"output_tokens":1}
{"provider":"","model":"gpt-4","input_tokens":1,"output_tokens":1}
{"provider":"openai","model":"gpt-4","input_tokens":200,"output_tokens":75}
"#;
        let records = parse_usage_log(log);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].model, "claude-opus");
        assert_eq!(records[1].model, "gpt-4");
        assert_eq!(records[1].provider, "");
        assert_eq!(records[2].model, "gpt-4");
        assert_eq!(total_tokens(&records), 150 + 2 + 275);
    }

    #[test]
    fn empty_log_yields_no_records() {
        assert!(parse_usage_log("").is_empty());
        assert_eq!(total_tokens(&[]), 0);
    }
}
