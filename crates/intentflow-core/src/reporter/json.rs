use intentflow_models::ExecutionReport;
use serde::{Deserialize, Serialize};

use super::ReportError;

/// Derived rates, all percentages in 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
    pub success_rate: f64,
    pub fallback_rate: f64,
    pub ai_usage_rate: f64,
    pub snippet_usage_rate: f64,
}

/// Composite scores, each clamped to 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnalysis {
    /// Success rate penalized by fallbacks and long runtimes.
    pub performance_score: f64,
    /// Success rate with a bonus for runs that never needed a fallback.
    pub reliability_score: f64,
    /// AI usage plus a bonus for fallbacks that rescued their step.
    pub adaptability_score: f64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a ExecutionReport,
    summary: ReportSummary,
    analysis: ReportAnalysis,
}

pub fn summarize(report: &ExecutionReport) -> ReportSummary {
    ReportSummary {
        total_steps: report.step_count(),
        successful_steps: report.successful_steps(),
        failed_steps: report.failed_steps(),
        success_rate: round2(report.success_rate()),
        fallback_rate: round2(report.fallback_rate()),
        ai_usage_rate: round2(report.ai_usage_rate()),
        snippet_usage_rate: round2(report.snippet_usage_rate()),
    }
}

pub fn analyze(report: &ExecutionReport) -> ReportAnalysis {
    let success_rate = report.success_rate();
    let step_count = report.step_count();
    let fallback_count = report.fallback_count;

    let fallback_penalty = if step_count == 0 {
        0.0
    } else {
        fallback_count as f64 / step_count as f64 * 20.0
    };
    let duration_penalty = (report.total_duration as f64 / 60_000.0 * 10.0).min(20.0);
    let performance = (success_rate - fallback_penalty - duration_penalty).max(0.0);

    let no_fallback_bonus = if fallback_count == 0 { 10.0 } else { 0.0 };
    let reliability = (success_rate + no_fallback_bonus).min(100.0);

    let rescue_bonus = if fallback_count > 0 {
        report.successful_fallbacks() as f64 / fallback_count as f64 * 20.0
    } else {
        0.0
    };
    let adaptability = (report.ai_usage_rate() + rescue_bonus).min(100.0);

    ReportAnalysis {
        performance_score: round2(performance),
        reliability_score: round2(reliability),
        adaptability_score: round2(adaptability),
    }
}

/// The report with its summary and analysis attached, pretty-printed.
pub fn to_json(report: &ExecutionReport) -> Result<String, ReportError> {
    let document = JsonReport {
        report,
        summary: summarize(report),
        analysis: analyze(report),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
