use intentflow_models::{ComparisonStatus, ExecutionReport};

use super::json::{analyze, summarize};
use super::{HIGH_FALLBACK_RATE, SLOW_EXECUTION_MS};

const RULE: &str = "============================================================";

/// Human-readable report: header, summary, per-step breakdown, usage
/// narrative, success-state analysis and recommendations.
pub fn to_text(report: &ExecutionReport) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push('\n');
    out.push_str("IntentFlow Execution Report\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("Execution ID: {}\n", report.execution_id));
    out.push_str(&format!("Spec: {}\n", report.spec_name));
    out.push_str(&format!("Started: {}\n", report.started_at.to_rfc3339()));
    out.push_str(&format!(
        "Total Duration: {}\n",
        format_duration(report.total_duration)
    ));

    push_section(&mut out, "SUMMARY");
    let summary = summarize(report);
    let analysis = analyze(report);
    let verdict = match (report.overall_success, report.stopped) {
        (_, true) => "STOPPED",
        (true, false) => "SUCCESS",
        (false, false) => "FAILED",
    };
    out.push_str(&format!("Overall Result: {verdict}\n"));
    out.push_str(&format!(
        "Steps: {} total, {} succeeded, {} failed\n",
        summary.total_steps, summary.successful_steps, summary.failed_steps
    ));
    out.push_str(&format!("Success Rate: {:.1}%\n", summary.success_rate));
    out.push_str(&format!(
        "AI Usage: {} ({:.1}%)\n",
        report.ai_usage_count, summary.ai_usage_rate
    ));
    out.push_str(&format!(
        "Snippet Usage: {} ({:.1}%)\n",
        report.snippet_usage_count, summary.snippet_usage_rate
    ));
    out.push_str(&format!(
        "Fallbacks: {} ({:.1}%)\n",
        report.fallback_count, summary.fallback_rate
    ));
    out.push_str(&format!(
        "Scores: performance {:.1}, reliability {:.1}, adaptability {:.1}\n",
        analysis.performance_score, analysis.reliability_score, analysis.adaptability_score
    ));

    push_section(&mut out, "STEPS");
    if report.steps.is_empty() {
        out.push_str("No steps were executed.\n");
    }
    for (index, step) in report.steps.iter().enumerate() {
        let marker = if step.success { "OK" } else { "FAIL" };
        out.push_str(&format!("{:>2}. [{marker}] {}\n", index + 1, step.name));
        out.push_str(&format!(
            "    Path: {} | Fallback: {} | Duration: {}ms\n",
            step.path_used.label(),
            if step.fallback_occurred { "yes" } else { "no" },
            step.duration
        ));
        if let Some(error) = &step.error {
            out.push_str(&format!("    Error: {error}\n"));
        }
        if let Some(screenshot) = &step.screenshot {
            out.push_str(&format!("    Screenshot: {screenshot}\n"));
        }
    }

    push_section(&mut out, "PATH USAGE");
    out.push_str(&usage_narrative(report));
    out.push('\n');

    push_section(&mut out, "SUCCESS STATE");
    push_success_state(&mut out, report);

    push_section(&mut out, "RECOMMENDATIONS");
    let recommendations = recommendations(report);
    if recommendations.is_empty() {
        out.push_str("No recommendations. The run looks healthy.\n");
    }
    for recommendation in &recommendations {
        out.push_str(&format!("- {recommendation}\n"));
    }

    if !report.suggestions.is_empty() {
        push_section(&mut out, "EXECUTION NOTES");
        for suggestion in &report.suggestions {
            out.push_str(&format!("- {suggestion}\n"));
        }
    }

    out
}

/// Advice derived from the report's rates, duration and verdicts.
pub fn recommendations(report: &ExecutionReport) -> Vec<String> {
    let mut items = Vec::new();
    let fallback_rate = report.fallback_rate();

    if fallback_rate > HIGH_FALLBACK_RATE {
        items.push(format!(
            "Fallback rate is {fallback_rate:.1}%. Update the snippets or instructions of steps whose primary path keeps failing."
        ));
    }
    if report.total_duration > SLOW_EXECUTION_MS {
        items.push(
            "Execution took longer than a minute. Prefer snippets for simple steps to cut AI round-trips."
                .to_string(),
        );
    }
    if !report.overall_success {
        items.push(
            "Execution did not succeed. Inspect the failed steps and their errors before re-running."
                .to_string(),
        );
    }
    if report.success_state_match == Some(false) {
        items.push(
            "Final state did not match the success screenshot. Verify the workflow reached its intended end state."
                .to_string(),
        );
    }
    if !report.steps.is_empty() && report.ai_usage_count == 0 {
        items.push(
            "No step used the AI path. Consider AI fallbacks for steps that target dynamic content."
                .to_string(),
        );
    }
    if report.snippet_usage_count == 0 && report.fallback_count > 0 {
        items.push(
            "No step completed through a snippet even though fallbacks ran. Re-record the snippets for this workflow."
                .to_string(),
        );
    }

    items
}

fn usage_narrative(report: &ExecutionReport) -> String {
    let total = report.step_count();
    if total == 0 {
        return "No path usage to analyze.".to_string();
    }
    if report.ai_usage_count == total {
        return "All steps ran through the AI path. The workflow is flexible but slower and less predictable than snippets."
            .to_string();
    }
    if report.snippet_usage_count == total {
        return "All steps ran as deterministic snippets. The workflow is fast and repeatable but sensitive to UI changes."
            .to_string();
    }
    let fallback_rate = report.fallback_rate();
    if fallback_rate > HIGH_FALLBACK_RATE {
        return format!(
            "High fallback rate ({fallback_rate:.1}%). Primary paths failed often and the run relied on fallbacks to make progress."
        );
    }
    format!(
        "Mixed execution: {} AI step(s) and {} snippet step(s), {} fallback(s).",
        report.ai_usage_count, report.snippet_usage_count, report.fallback_count
    )
}

fn push_success_state(out: &mut String, report: &ExecutionReport) {
    let Some(status) = report.comparison_status else {
        out.push_str("No success-state comparison was performed.\n");
        return;
    };

    let description = match status {
        ComparisonStatus::Success => "final state matches the success screenshot",
        ComparisonStatus::Partial => "final state partially matches the success screenshot",
        ComparisonStatus::Mismatch => "final state does not match the success screenshot",
    };
    out.push_str(&format!("Status: {} ({description})\n", status.as_str().to_uppercase()));
    if let Some(similarity) = report.comparison_similarity {
        out.push_str(&format!("Similarity: {similarity:.1}%\n"));
    }
    if let Some(record) = &report.comparison {
        out.push_str(&format!("Reference: {}\n", record.reference_path));
        out.push_str(&format!("Final state: {}\n", record.candidate_path));
        for difference in &record.result.differences {
            let severity = difference
                .severity
                .map(|severity| format!(" [{}]", format!("{severity:?}").to_lowercase()))
                .unwrap_or_default();
            out.push_str(&format!(
                "  - {}{severity}: {}\n",
                difference.kind, difference.description
            ));
        }
    }
}

fn push_section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(title.len()));
    out.push('\n');
}

fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{ms}ms");
    }
    format!("{:.2}s", ms as f64 / 1_000.0)
}
