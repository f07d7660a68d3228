use crate::aggregate::OrchestratorTaskSummary;

/// Output format for `report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Table,
    Markdown,
    Json,
}

/// Render a set of (orchestrator, task) summaries in the requested format.
#[must_use]
pub fn render(summaries: &[OrchestratorTaskSummary], format: ReportFormat) -> String {
    match format {
        ReportFormat::Table => render_table(summaries),
        ReportFormat::Markdown => render_markdown(summaries),
        ReportFormat::Json => render_json(summaries),
    }
}

const HEADERS: [&str; 6] = [
    "orchestrator",
    "task",
    "trials",
    "pass_rate",
    "composite",
    "cost_usd",
];

fn row(summary: &OrchestratorTaskSummary) -> [String; 6] {
    [
        summary.orchestrator.clone(),
        summary.task.clone(),
        summary.trial_count.to_string(),
        format!("{:.2}", summary.pass_rate),
        format!("{:.2}", summary.mean_composite_score),
        format!("{:.4}", summary.mean_cost_usd),
    ]
}

fn render_table(summaries: &[OrchestratorTaskSummary]) -> String {
    let rows: Vec<[String; 6]> = summaries.iter().map(row).collect();
    let mut widths = HEADERS.map(str::len);
    for r in &rows {
        for (i, cell) in r.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    push_padded_row(&mut out, &HEADERS.map(str::to_owned), &widths);
    for r in &rows {
        push_padded_row(&mut out, r, &widths);
    }
    out
}

fn push_padded_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    for (i, cell) in cells.iter().enumerate() {
        out.push_str(&format!("{cell:<width$}  ", width = widths[i]));
    }
    out.push('\n');
}

fn render_markdown(summaries: &[OrchestratorTaskSummary]) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&HEADERS.join(" | "));
    out.push_str(" |\n|");
    out.push_str(&"---|".repeat(HEADERS.len()));
    out.push('\n');
    for summary in summaries {
        out.push_str("| ");
        out.push_str(&row(summary).join(" | "));
        out.push_str(" |\n");
    }
    out
}

fn render_json(summaries: &[OrchestratorTaskSummary]) -> String {
    serde_json::to_string_pretty(summaries).unwrap_or_else(|_| "[]".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<OrchestratorTaskSummary> {
        vec![OrchestratorTaskSummary {
            orchestrator: "claude-code".into(),
            task: "fix-bug".into(),
            trial_count: 3,
            pass_rate: 0.667,
            mean_composite_score: 0.81,
            mean_cost_usd: 0.1234,
            mean_duration_seconds: 42.0,
        }]
    }

    #[test]
    fn table_includes_headers_and_row() {
        let text = render(&sample(), ReportFormat::Table);
        assert!(text.contains("orchestrator"));
        assert!(text.contains("claude-code"));
    }

    #[test]
    fn markdown_uses_pipe_delimited_rows() {
        let text = render(&sample(), ReportFormat::Markdown);
        assert!(text.starts_with("| orchestrator"));
        assert!(text.contains("| claude-code | fix-bug |"));
    }

    #[test]
    fn json_round_trips_through_serde() {
        let text = render(&sample(), ReportFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["orchestrator"], "claude-code");
    }
}
