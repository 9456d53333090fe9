//! IntentFlow Traits - interfaces the orchestrator consumes.
//!
//! The orchestrator never drives a browser itself. It delegates to:
//! - [`AiStepExecutor`]: natural-language step execution
//! - [`ScriptStepExecutor`]: deterministic snippet execution and screenshots
//! - [`ScreenshotComparator`]: visual comparison against a known-good state
//!
//! and reports to:
//! - [`ExecutionListener`]: synchronous lifecycle observers
//! - [`ExecutionHistory`]: injected cross-run statistics store
//!
//! [`StepClassifier`] lets callers replace the step categorization heuristic.

pub mod classifier;
pub mod comparator;
pub mod error;
pub mod executor;
pub mod history;
pub mod listener;

pub use classifier::StepClassifier;
pub use comparator::ScreenshotComparator;
pub use error::{ExecutorError, Result};
pub use executor::{AiStepExecutor, CallOptions, ScriptStepExecutor, StepOutcome};
pub use history::{ExecutionHistory, HistorySummary};
pub use listener::ExecutionListener;
