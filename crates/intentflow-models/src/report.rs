//! Execution report: the aggregate outcome of one run over a spec.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::comparison::{ComparisonRecord, ComparisonStatus};
use crate::path::ExecutionPath;

/// Name of the pseudo-step recorded when a run fails before any step finished.
pub const EXECUTION_FAILED_STEP: &str = "Execution Failed";

/// Outcome of one step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepExecutionResult {
    pub name: String,
    /// Path that actually produced this outcome.
    pub path_used: ExecutionPath,
    pub fallback_occurred: bool,
    pub success: bool,
    /// Wall-clock duration in milliseconds.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<Value>,
}

/// The structured outcome artifact of one full run.
///
/// Counters are only updated through [`ExecutionReport::record_step`], so
/// `ai_usage_count + snippet_usage_count == steps.len()` and `fallback_count`
/// matches the steps flagged with `fallback_occurred`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub execution_id: String,
    pub spec_name: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepExecutionResult>,
    pub ai_usage_count: usize,
    pub snippet_usage_count: usize,
    pub fallback_count: usize,
    pub screenshots: Vec<String>,
    pub overall_success: bool,
    pub suggestions: Vec<String>,
    /// Wall-clock milliseconds from invocation start to completion.
    pub total_duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_state_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_status: Option<ComparisonStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonRecord>,
    /// Set when the caller stopped the run before every step executed.
    #[serde(default)]
    pub stopped: bool,
}

impl ExecutionReport {
    pub fn new(
        execution_id: impl Into<String>,
        spec_name: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            spec_name: spec_name.into(),
            started_at,
            steps: Vec::new(),
            ai_usage_count: 0,
            snippet_usage_count: 0,
            fallback_count: 0,
            screenshots: Vec::new(),
            overall_success: true,
            suggestions: Vec::new(),
            total_duration: 0,
            success_state_match: None,
            comparison_similarity: None,
            comparison_status: None,
            comparison: None,
            stopped: false,
        }
    }

    /// Append a step outcome and update the usage counters from it.
    pub fn record_step(&mut self, result: StepExecutionResult) {
        match result.path_used {
            ExecutionPath::Ai => self.ai_usage_count += 1,
            ExecutionPath::Snippet => self.snippet_usage_count += 1,
        }
        if result.fallback_occurred {
            self.fallback_count += 1;
        }
        if !result.success {
            self.overall_success = false;
        }
        self.steps.push(result);
    }

    /// Fold an unexpected run-loop error into the report.
    ///
    /// The error is attached to the last recorded step; an empty report gets a
    /// failed pseudo-step so it is never returned without entries.
    pub fn record_unexpected_error(&mut self, error: &str) {
        self.overall_success = false;
        match self.steps.last_mut() {
            Some(last) => {
                last.success = false;
                last.error = Some(match last.error.take() {
                    Some(existing) => format!("{existing}. Unexpected error: {error}"),
                    None => error.to_string(),
                });
            }
            None => self.record_step(StepExecutionResult {
                name: EXECUTION_FAILED_STEP.to_string(),
                path_used: ExecutionPath::Ai,
                fallback_occurred: false,
                success: false,
                duration: 0,
                error: Some(error.to_string()),
                screenshot: None,
                extracted_data: None,
            }),
        }
    }

    pub fn add_suggestion(&mut self, suggestion: impl Into<String>) {
        self.suggestions.push(suggestion.into());
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn successful_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.success).count()
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.len() - self.successful_steps()
    }

    /// Steps rescued by their fallback path.
    pub fn successful_fallbacks(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.fallback_occurred && step.success)
            .count()
    }

    /// Percentage of successful steps (0 when nothing ran).
    pub fn success_rate(&self) -> f64 {
        percentage(self.successful_steps(), self.steps.len())
    }

    pub fn fallback_rate(&self) -> f64 {
        percentage(self.fallback_count, self.steps.len())
    }

    pub fn ai_usage_rate(&self) -> f64 {
        percentage(self.ai_usage_count, self.steps.len())
    }

    pub fn snippet_usage_rate(&self) -> f64 {
        percentage(self.snippet_usage_count, self.steps.len())
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}
