use serde_json::Value;

/// Scan a trial's raw usage log for a gateway-reported budget rejection.
/// Budget exhaustion may be signaled either by the gateway
/// rejecting a request (surfaced here) or by a report-time cost computation
/// exceeding the cap (outside this crate's scope); the first of the two to
/// trip wins, so this scan alone is sufficient at trial time.
#[must_use]
pub fn budget_exceeded_in_usage_log(usage_log: &str) -> bool {
    usage_log.lines().any(|line| {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            return false;
        };
        line_signals_rejection(&value)
    })
}

fn line_signals_rejection(value: &Value) -> bool {
    if value.get("rejected").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    if value.get("status").and_then(Value::as_u64) == Some(429) {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_explicit_rejected_flag() {
        let log = r#"{"provider":"anthropic","model":"claude","rejected":true}"#;
        assert!(budget_exceeded_in_usage_log(log));
    }

    #[test]
    fn detects_429_status() {
        let log = r#"{"provider":"openai","model":"gpt","status":429}"#;
        assert!(budget_exceeded_in_usage_log(log));
    }

    #[test]
    fn normal_usage_lines_do_not_trip_budget() {
        let log = r#"{"provider":"openai","model":"gpt","input_tokens":10,"output_tokens":20}"#;
        assert!(!budget_exceeded_in_usage_log(log));
    }

    #[test]
    fn noise_lines_are_ignored() {
        assert!(!budget_exceeded_in_usage_log("not json\n\n"));
    }
}
