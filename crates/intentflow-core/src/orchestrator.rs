//! Execution orchestrator.
//!
//! Runs an [`IntentSpec`] step by step, choosing the AI or snippet path per
//! step, falling back when the primary path fails, and collecting the outcome
//! into an [`ExecutionReport`]. Steps run strictly in order because later
//! steps depend on the page state earlier steps leave behind.

use chrono::Utc;
use futures::FutureExt;
use intentflow_models::{
    ComparisonResult, ExecutionEvent, ExecutionPath, ExecutionReport, IntentSpec, IntentStep,
    StepExecutionResult, Variables,
};
use intentflow_traits::{
    AiStepExecutor, CallOptions, ExecutionHistory, ExecutionListener, ExecutorError,
    ScreenshotComparator, ScriptStepExecutor, StepClassifier, StepOutcome,
};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ExecutionConfig;
use crate::events::EventBus;
use crate::resolver::{HeuristicClassifier, PathDecision, resolve};
use crate::success_state::SuccessStateResolver;
use crate::template::{substitute, substitute_step};
use crate::verification::{NO_REFERENCE_SUGGESTION, apply_comparison};

const FINAL_STATE_LABEL: &str = "final-state";

/// Drives one spec at a time through the AI and script executors.
///
/// Not re-entrant: concurrent `execute` calls on one instance are not
/// supported. Create an orchestrator per run or serialize calls. All run
/// state lives in the report being built; nothing carries over between runs
/// except what an injected [`ExecutionHistory`] stores.
pub struct Orchestrator {
    ai: Arc<dyn AiStepExecutor>,
    script: Arc<dyn ScriptStepExecutor>,
    comparator: Option<Arc<dyn ScreenshotComparator>>,
    classifier: Arc<dyn StepClassifier>,
    history: Option<Arc<dyn ExecutionHistory>>,
    config: ExecutionConfig,
    events: EventBus,
    stop: CancellationToken,
}

/// Outcome of a single path attempt, reduced to what the report needs.
struct Attempt {
    success: bool,
    error: Option<String>,
    screenshots: Vec<String>,
    data: Option<Value>,
}

impl Attempt {
    fn from_call(result: Result<StepOutcome, ExecutorError>) -> Self {
        match result {
            Ok(outcome) if outcome.success => Self {
                success: true,
                error: None,
                screenshots: outcome.screenshots,
                data: outcome.data,
            },
            Ok(outcome) => Self {
                success: false,
                error: Some(outcome.error_message()),
                screenshots: outcome.screenshots,
                data: None,
            },
            Err(err) => Self {
                success: false,
                error: Some(err.to_string()),
                screenshots: Vec::new(),
                data: None,
            },
        }
    }

    fn error_text(&self) -> String {
        self.error.clone().unwrap_or_default()
    }
}

impl Orchestrator {
    pub fn new(ai: Arc<dyn AiStepExecutor>, script: Arc<dyn ScriptStepExecutor>) -> Self {
        Self {
            ai,
            script,
            comparator: None,
            classifier: Arc::new(HeuristicClassifier::new()),
            history: None,
            config: ExecutionConfig::default(),
            events: EventBus::new(),
            stop: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_comparator(mut self, comparator: Arc<dyn ScreenshotComparator>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn StepClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_history(mut self, history: Arc<dyn ExecutionHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_listener(self, listener: Arc<dyn ExecutionListener>) -> Self {
        self.events.add_listener(listener);
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    /// Token that stops the run before its next step when cancelled.
    ///
    /// Cancellation never interrupts a step in flight. Once cancelled, the
    /// token stays cancelled for the lifetime of this orchestrator.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Run every step of `spec` and return the report.
    ///
    /// Never fails: executor errors, timeouts and panics all end up in the
    /// report, and executor cleanup runs exactly once regardless of outcome.
    pub async fn execute(&self, spec: &IntentSpec, variables: &Variables) -> ExecutionReport {
        let started = Instant::now();
        let execution_id = generate_execution_id();
        let mut report = ExecutionReport::new(&execution_id, &spec.name, Utc::now());

        info!(
            execution_id = %execution_id,
            spec = %spec.name,
            steps = spec.steps.len(),
            "Starting execution"
        );
        self.events.emit(ExecutionEvent::ExecutionStarted {
            execution_id: execution_id.clone(),
            spec: spec.clone(),
        });

        let failure = AssertUnwindSafe(self.run(spec, variables, &mut report))
            .catch_unwind()
            .await
            .err()
            .map(panic_message);

        // Executor cleanup is not part of the run's duration.
        let elapsed = started.elapsed();
        self.cleanup().await;

        if let Some(message) = &failure {
            error!(
                execution_id = %execution_id,
                error = %message,
                "Execution aborted unexpectedly"
            );
            report.record_unexpected_error(message);
        }
        report.total_duration = elapsed.as_millis() as u64;

        if let Some(history) = &self.history
            && let Err(err) = history.record(&report).await
        {
            warn!(execution_id = %execution_id, error = %err, "Failed to record execution history");
        }

        info!(
            execution_id = %execution_id,
            success = report.overall_success,
            ai = report.ai_usage_count,
            snippet = report.snippet_usage_count,
            fallbacks = report.fallback_count,
            duration_ms = report.total_duration,
            "Execution finished"
        );

        match failure {
            Some(error) => self.events.emit(ExecutionEvent::ExecutionFailed {
                error,
                report: report.clone(),
            }),
            None => self.events.emit(ExecutionEvent::ExecutionCompleted {
                report: report.clone(),
            }),
        }

        report
    }

    async fn run(&self, spec: &IntentSpec, variables: &Variables, report: &mut ExecutionReport) {
        let total_steps = spec.steps.len();
        let options = self.config.call_options();

        for (index, step) in spec.steps.iter().enumerate() {
            if self.stop.is_cancelled() {
                info!(
                    execution_id = %report.execution_id,
                    completed = index,
                    "Execution stopped by caller"
                );
                report.stopped = true;
                report.overall_success = false;
                report.add_suggestion(format!(
                    "Execution was stopped after {index} of {total_steps} steps"
                ));
                self.events.emit(ExecutionEvent::ExecutionStopped {
                    execution_id: report.execution_id.clone(),
                    completed_steps: index,
                });
                break;
            }

            self.events.emit(ExecutionEvent::StepStarted {
                step_index: index,
                step: step.clone(),
                total_steps,
            });

            let decision = resolve(
                step,
                &spec.preferences,
                self.config.strategy.as_ref(),
                self.classifier.as_ref(),
            );
            let resolved = substitute_step(step, variables);

            let result = self
                .execute_step(spec, index, &resolved, decision, variables, &options, report)
                .await;
            let failed = !result.success;

            report.record_step(result.clone());
            self.events.emit(ExecutionEvent::StepCompleted {
                step_index: index,
                result,
            });

            if failed && self.config.stop_on_failure {
                warn!(step = %step.name, "Halting after failed step");
                if index + 1 < total_steps {
                    report.add_suggestion(format!(
                        "Execution halted after step '{}' failed; {} remaining step(s) were not run",
                        step.name,
                        total_steps - index - 1
                    ));
                }
                break;
            }
        }

        if report.stopped {
            return;
        }

        let final_screenshot = if self.config.save_screenshots {
            let captured = self.capture(FINAL_STATE_LABEL).await;
            if let Some(path) = &captured {
                report.screenshots.push(path.clone());
            }
            captured
        } else {
            None
        };

        if self.config.screenshot_comparison {
            self.verify(spec, final_screenshot.as_deref(), report).await;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_step(
        &self,
        spec: &IntentSpec,
        index: usize,
        step: &IntentStep,
        decision: PathDecision,
        variables: &Variables,
        options: &CallOptions,
        report: &mut ExecutionReport,
    ) -> StepExecutionResult {
        let started = Instant::now();
        let primary = decision.primary;

        debug!(
            step = %step.name,
            path = %primary,
            fallback = %decision.fallback,
            source = ?decision.source,
            "Executing step"
        );

        let first = Attempt::from_call(self.invoke(primary, spec, step, variables, options).await);
        report.screenshots.extend(first.screenshots.iter().cloned());

        let (path_used, fallback_occurred, attempt, error) = if first.success {
            (primary, false, first, None)
        } else {
            let fallback = decision
                .fallback_path()
                .filter(|_| self.config.enable_fallback);

            match fallback {
                None => {
                    let error = first.error.clone();
                    (primary, false, first, error)
                }
                Some(fallback) => {
                    info!(
                        step = %step.name,
                        from = %primary,
                        to = %fallback,
                        error = %first.error_text(),
                        "Primary path failed, falling back"
                    );
                    self.events.emit(ExecutionEvent::FallbackStarted {
                        step_index: index,
                        step: step.clone(),
                    });

                    let second = Attempt::from_call(
                        self.invoke(fallback, spec, step, variables, options).await,
                    );
                    report.screenshots.extend(second.screenshots.iter().cloned());

                    self.events.emit(ExecutionEvent::FallbackCompleted {
                        step_index: index,
                        success: second.success,
                    });

                    let error = (!second.success).then(|| {
                        format!(
                            "{} failed: {}. Fallback failed: {}",
                            primary.label(),
                            first.error_text(),
                            second.error_text()
                        )
                    });
                    (fallback, true, second, error)
                }
            }
        };

        let duration = started.elapsed().as_millis() as u64;

        if !attempt.success {
            warn!(step = %step.name, path = %path_used, error = ?error, "Step failed");
        }

        let screenshot = if self.config.save_screenshots {
            let label = format!("step-{}-{}", index + 1, slugify(&step.name));
            let captured = self.capture(&label).await;
            if let Some(path) = &captured {
                report.screenshots.push(path.clone());
            }
            captured
        } else {
            None
        };

        StepExecutionResult {
            name: step.name.clone(),
            path_used,
            fallback_occurred,
            success: attempt.success,
            duration,
            error,
            screenshot,
            extracted_data: attempt.data,
        }
    }

    /// One executor call on `path`, bounded by the configured timeout.
    async fn invoke(
        &self,
        path: ExecutionPath,
        spec: &IntentSpec,
        step: &IntentStep,
        variables: &Variables,
        options: &CallOptions,
    ) -> Result<StepOutcome, ExecutorError> {
        let call = async {
            match path {
                ExecutionPath::Ai => {
                    let mut mini_spec = spec.single_step(step.clone());
                    mini_spec.url = substitute(&spec.url, variables);
                    self.ai.execute_flow(&mini_spec, variables, options).await
                }
                ExecutionPath::Snippet => self.script.execute_action(step, options).await,
            }
        };

        match timeout(self.config.timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(ExecutorError::Timeout {
                path,
                timeout_ms: self.config.timeout_ms,
            }),
        }
    }

    async fn capture(&self, label: &str) -> Option<String> {
        match timeout(self.config.timeout(), self.script.take_screenshot(label)).await {
            Ok(Ok(path)) => Some(path),
            Ok(Err(err)) => {
                warn!(label, error = %err, "Screenshot capture failed");
                None
            }
            Err(_) => {
                warn!(label, timeout_ms = self.config.timeout_ms, "Screenshot capture timed out");
                None
            }
        }
    }

    async fn verify(
        &self,
        spec: &IntentSpec,
        candidate: Option<&str>,
        report: &mut ExecutionReport,
    ) {
        let resolver = SuccessStateResolver::new(&self.config.recordings_dir);
        let Some(reference) = resolver.find_reference_screenshot(spec) else {
            info!(spec = %spec.name, "No success-state screenshot found, skipping comparison");
            report.add_suggestion(NO_REFERENCE_SUGGESTION);
            return;
        };

        let Some(candidate) = candidate.map(PathBuf::from) else {
            report.add_suggestion(
                "Screenshot comparison skipped: no final-state screenshot was captured",
            );
            return;
        };

        let Some(comparator) = &self.comparator else {
            report.add_suggestion(
                "Screenshot comparison skipped: no screenshot comparator is configured",
            );
            return;
        };

        match self.compare(comparator.as_ref(), &candidate, &reference).await {
            Ok(result) => {
                self.events.emit(ExecutionEvent::ScreenshotComparison {
                    result: result.clone(),
                });
                let status = apply_comparison(report, &candidate, &reference, result);
                info!(
                    similarity = ?report.comparison_similarity,
                    status = %status,
                    "Success-state comparison finished"
                );
            }
            Err(err) => {
                warn!(error = %err, "Screenshot comparison failed");
                report.add_suggestion(format!(
                    "Screenshot comparison could not be performed: {err}"
                ));
            }
        }
    }

    async fn compare(
        &self,
        comparator: &dyn ScreenshotComparator,
        candidate: &Path,
        reference: &Path,
    ) -> Result<ComparisonResult, ExecutorError> {
        match timeout(
            self.config.timeout(),
            comparator.compare_screenshots(candidate, reference),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ExecutorError::Unavailable(format!(
                "comparator timed out after {}ms",
                self.config.timeout_ms
            ))),
        }
    }

    async fn cleanup(&self) {
        let script = AssertUnwindSafe(self.script.cleanup()).catch_unwind().await;
        match script {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "Script executor cleanup failed"),
            Err(_) => warn!("Script executor cleanup panicked"),
        }

        let ai = AssertUnwindSafe(self.ai.cleanup()).catch_unwind().await;
        match ai {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "AI executor cleanup failed"),
            Err(_) => warn!("AI executor cleanup panicked"),
        }
    }
}

/// Timestamp plus a random suffix, e.g. `exec-1718000000000-3f2a9c1d`.
pub fn generate_execution_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("exec-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    };
    format!("Unexpected error during execution: {detail}")
}

fn slugify(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let collapsed = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if collapsed.is_empty() {
        "step".to_string()
    } else {
        collapsed
    }
}
