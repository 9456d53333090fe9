//! IntentFlow Models - data contracts shared across the workspace.
//!
//! - [`IntentSpec`] / [`IntentStep`]: the immutable execution plan
//! - [`ExecutionPath`] / [`FallbackPath`]: which strategy runs a step
//! - [`StepExecutionResult`] / [`ExecutionReport`]: the outcome of a run
//! - [`ComparisonResult`]: the verdict of a screenshot comparison
//! - [`ExecutionEvent`]: lifecycle notifications emitted during a run

pub mod comparison;
pub mod event;
pub mod path;
pub mod report;
pub mod spec;

pub use comparison::{
    ComparisonRecord, ComparisonResult, ComparisonStatus, DifferenceLocation, DifferenceSeverity,
    ScreenshotDifference,
};
pub use event::ExecutionEvent;
pub use path::{ExecutionPath, FallbackPath};
pub use report::{EXECUTION_FAILED_STEP, ExecutionReport, StepExecutionResult};
pub use spec::{IntentSpec, IntentStep, Variables};
