//! Lifecycle events emitted while a spec executes.

use serde::{Deserialize, Serialize};

use crate::comparison::ComparisonResult;
use crate::report::{ExecutionReport, StepExecutionResult};
use crate::spec::{IntentSpec, IntentStep};

/// Events fire in causal order matching the step sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ExecutionEvent {
    ExecutionStarted {
        execution_id: String,
        spec: IntentSpec,
    },
    StepStarted {
        step_index: usize,
        step: IntentStep,
        total_steps: usize,
    },
    FallbackStarted {
        step_index: usize,
        step: IntentStep,
    },
    FallbackCompleted {
        step_index: usize,
        success: bool,
    },
    StepCompleted {
        step_index: usize,
        result: StepExecutionResult,
    },
    ScreenshotComparison {
        result: ComparisonResult,
    },
    ExecutionCompleted {
        report: ExecutionReport,
    },
    ExecutionFailed {
        error: String,
        report: ExecutionReport,
    },
    ExecutionStopped {
        execution_id: String,
        completed_steps: usize,
    },
}

impl ExecutionEvent {
    /// Wire name of the event (matches the serialized `type` tag).
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExecutionStarted { .. } => "execution-started",
            Self::StepStarted { .. } => "step-started",
            Self::FallbackStarted { .. } => "fallback-started",
            Self::FallbackCompleted { .. } => "fallback-completed",
            Self::StepCompleted { .. } => "step-completed",
            Self::ScreenshotComparison { .. } => "screenshot-comparison",
            Self::ExecutionCompleted { .. } => "execution-completed",
            Self::ExecutionFailed { .. } => "execution-failed",
            Self::ExecutionStopped { .. } => "execution-stopped",
        }
    }
}
