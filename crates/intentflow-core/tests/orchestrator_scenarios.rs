use async_trait::async_trait;
use intentflow_core::verification::NO_REFERENCE_SUGGESTION;
use intentflow_core::{ExecutionConfig, ExecutionStrategy, InMemoryExecutionHistory, Orchestrator};
use intentflow_models::{
    ComparisonResult, ComparisonStatus, DifferenceSeverity, EXECUTION_FAILED_STEP,
    ExecutionEvent, ExecutionPath, FallbackPath, IntentSpec, IntentStep, ScreenshotDifference,
    Variables,
};
use intentflow_traits::{
    AiStepExecutor, CallOptions, ExecutionHistory, ExecutorError, ScreenshotComparator,
    ScriptStepExecutor, StepOutcome,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Scripted behavior for one executor call.
#[derive(Clone)]
enum Reply {
    Ok,
    OkWithData(serde_json::Value),
    Fail(&'static str),
    Throw(&'static str),
    Hang,
    Panic(&'static str),
}

impl Reply {
    async fn play(self) -> Result<StepOutcome, ExecutorError> {
        match self {
            Reply::Ok => Ok(StepOutcome::success()),
            Reply::OkWithData(data) => Ok(StepOutcome::success().with_data(data)),
            Reply::Fail(message) => Ok(StepOutcome::failure(message)),
            Reply::Throw(message) => Err(ExecutorError::failed(message)),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(StepOutcome::success())
            }
            Reply::Panic(message) => panic!("{message}"),
        }
    }
}

#[derive(Default)]
struct MockAi {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    cleanups: AtomicUsize,
    mini_specs: Mutex<Vec<IntentSpec>>,
}

impl MockAi {
    fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiStepExecutor for MockAi {
    async fn execute_flow(
        &self,
        mini_spec: &IntentSpec,
        _variables: &Variables,
        _options: &CallOptions,
    ) -> intentflow_traits::Result<StepOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.mini_specs.lock().unwrap().push(mini_spec.clone());
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Ok);
        reply.play().await
    }

    async fn cleanup(&self) -> intentflow_traits::Result<()> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct MockScript {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    cleanups: AtomicUsize,
    steps: Mutex<Vec<IntentStep>>,
    screenshots: Mutex<Vec<String>>,
    fail_screenshots: bool,
    cleanup_delay: Duration,
}

impl MockScript {
    fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptStepExecutor for MockScript {
    async fn execute_action(
        &self,
        step: &IntentStep,
        _options: &CallOptions,
    ) -> intentflow_traits::Result<StepOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.steps.lock().unwrap().push(step.clone());
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Ok);
        reply.play().await
    }

    async fn take_screenshot(&self, label: &str) -> intentflow_traits::Result<String> {
        if self.fail_screenshots {
            return Err(ExecutorError::Unavailable("no page".to_string()));
        }
        self.screenshots.lock().unwrap().push(label.to_string());
        Ok(format!("/tmp/shots/{label}.png"))
    }

    async fn cleanup(&self) -> intentflow_traits::Result<()> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.cleanup_delay).await;
        Ok(())
    }
}

struct FixedComparator {
    result: ComparisonResult,
    calls: AtomicUsize,
}

#[async_trait]
impl ScreenshotComparator for FixedComparator {
    async fn compare_screenshots(
        &self,
        _candidate: &Path,
        _reference: &Path,
    ) -> intentflow_traits::Result<ComparisonResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

fn config(recordings: &Path) -> ExecutionConfig {
    ExecutionConfig {
        recordings_dir: recordings.to_path_buf(),
        ..ExecutionConfig::default()
    }
}

fn step(name: &str, prefer: ExecutionPath, fallback: FallbackPath) -> IntentStep {
    IntentStep::new(name)
        .with_instruction(format!("Perform {name}"))
        .with_snippet(format!("await page.click('#{name}')"))
        .with_prefer(prefer)
        .with_fallback(fallback)
}

fn record_events(orchestrator: Orchestrator) -> (Orchestrator, Arc<Mutex<Vec<ExecutionEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let orchestrator = orchestrator.with_listener(Arc::new(
        move |event: &ExecutionEvent| -> anyhow::Result<()> {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        },
    ));
    (orchestrator, events)
}

fn names(events: &Mutex<Vec<ExecutionEvent>>) -> Vec<&'static str> {
    events.lock().unwrap().iter().map(ExecutionEvent::name).collect()
}

#[tokio::test]
async fn ai_step_succeeds_on_primary_path() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Ok]);
    let script = MockScript::with_replies([]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Search",
        vec![step("search", ExecutionPath::Ai, FallbackPath::None)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.ai_usage_count, 1);
    assert_eq!(report.snippet_usage_count, 0);
    assert_eq!(report.fallback_count, 0);
    assert!(report.overall_success);
    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].path_used, ExecutionPath::Ai);
    assert!(!report.steps[0].fallback_occurred);
    assert!(report.steps[0].success);
    assert_eq!(script.calls(), 0);
}

#[tokio::test]
async fn snippet_fallback_rescues_failed_ai_step() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Throw("Element not found")]);
    let script = MockScript::with_replies([Reply::Ok]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Login",
        vec![step("login", ExecutionPath::Ai, FallbackPath::Snippet)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    let result = &report.steps[0];
    assert_eq!(result.path_used, ExecutionPath::Snippet);
    assert!(result.fallback_occurred);
    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(report.fallback_count, 1);
    assert_eq!(report.snippet_usage_count, 1);
    assert_eq!(report.ai_usage_count, 0);
    assert!(report.overall_success);
}

#[tokio::test]
async fn both_paths_failing_reports_combined_error() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Throw("Element not found")]);
    let script = MockScript::with_replies([Reply::Fail("Selector timeout")]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Login",
        vec![step("login", ExecutionPath::Ai, FallbackPath::Snippet)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    let result = &report.steps[0];
    assert!(!result.success);
    assert!(result.fallback_occurred);
    assert_eq!(
        result.error.as_deref(),
        Some("AI failed: Element not found. Fallback failed: Selector timeout")
    );
    assert!(!report.overall_success);
}

#[tokio::test]
async fn mixed_preferences_count_each_path() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([]);
    let script = MockScript::with_replies([]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Checkout",
        vec![
            step("open", ExecutionPath::Snippet, FallbackPath::None),
            step("pick", ExecutionPath::Ai, FallbackPath::None),
            step("pay", ExecutionPath::Snippet, FallbackPath::None),
        ],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.snippet_usage_count, 2);
    assert_eq!(report.ai_usage_count, 1);
    assert_eq!(report.fallback_count, 0);
    assert_eq!(
        report.ai_usage_count + report.snippet_usage_count,
        report.steps.len()
    );
    let order: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(order, vec!["open", "pick", "pay"]);
}

#[tokio::test]
async fn missing_reference_screenshot_skips_comparison() {
    let recordings = TempDir::new().unwrap();
    let comparator = Arc::new(FixedComparator {
        result: ComparisonResult {
            similarity: 99.0,
            matched: true,
            differences: Vec::new(),
            suggestions: Vec::new(),
        },
        calls: AtomicUsize::new(0),
    });
    let orchestrator = Orchestrator::new(MockAi::with_replies([]), MockScript::with_replies([]))
        .with_config(config(recordings.path()))
        .with_comparator(comparator.clone());
    let missing = recordings.path().join("nowhere.png");
    let spec = IntentSpec::new(
        "Login",
        vec![step("login", ExecutionPath::Snippet, FallbackPath::None)],
    )
        .with_success_screenshot(missing.display().to_string());

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert!(report.success_state_match.is_none());
    assert!(report.comparison_status.is_none());
    assert!(report.suggestions.iter().any(|s| s == NO_REFERENCE_SUGGESTION));
    assert_eq!(comparator.calls.load(Ordering::SeqCst), 0);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("successStateMatch").is_none());
}

#[tokio::test]
async fn partial_similarity_flags_review_and_high_severity() {
    let recordings = TempDir::new().unwrap();
    std::fs::write(recordings.path().join("Login-success-state.png"), b"png").unwrap();
    let comparator = Arc::new(FixedComparator {
        result: ComparisonResult {
            similarity: 75.0,
            matched: false,
            differences: vec![ScreenshotDifference {
                kind: "layout".to_string(),
                description: "Error banner visible".to_string(),
                severity: Some(DifferenceSeverity::High),
                location: None,
            }],
            suggestions: vec!["Check the banner".to_string()],
        },
        calls: AtomicUsize::new(0),
    });
    let (orchestrator, events) = record_events(
        Orchestrator::new(MockAi::with_replies([]), MockScript::with_replies([]))
            .with_config(config(recordings.path()))
            .with_comparator(comparator.clone()),
    );
    let spec = IntentSpec::new(
        "Login",
        vec![step("login", ExecutionPath::Snippet, FallbackPath::None)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.comparison_status, Some(ComparisonStatus::Partial));
    assert_eq!(report.success_state_match, Some(false));
    assert_eq!(report.comparison_similarity, Some(75.0));
    assert!(report.suggestions.iter().any(|s| s.contains("review the reported differences")));
    assert!(report.suggestions.iter().any(|s| s.contains("manual review")));
    assert!(report.suggestions.iter().any(|s| s == "Check the banner"));
    // Visual verdicts do not change the step-based outcome.
    assert!(report.overall_success);

    let record = report.comparison.as_ref().unwrap();
    assert_eq!(record.candidate_path, "/tmp/shots/final-state.png");
    assert!(record.reference_path.ends_with("Login-success-state.png"));
    assert!(names(&events).contains(&"screenshot-comparison"));
}

#[tokio::test]
async fn fallback_none_never_calls_other_executor() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([]);
    let script = MockScript::with_replies([Reply::Throw("Selector timeout")]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Form",
        vec![step("fill", ExecutionPath::Snippet, FallbackPath::None)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(ai.calls(), 0);
    assert_eq!(script.calls(), 1);
    assert!(!report.steps[0].fallback_occurred);
    assert_eq!(report.steps[0].error.as_deref(), Some("Selector timeout"));
    assert!(!report.overall_success);
}

#[tokio::test]
async fn disabled_fallback_is_never_attempted() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Fail("Element not found")]);
    let script = MockScript::with_replies([]);
    let orchestrator = Orchestrator::new(ai.clone(), script.clone()).with_config(ExecutionConfig {
        enable_fallback: false,
        ..config(recordings.path())
    });
    let spec = IntentSpec::new(
        "Form",
        vec![step("fill", ExecutionPath::Ai, FallbackPath::Snippet)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(script.calls(), 0);
    assert_eq!(report.fallback_count, 0);
    assert_eq!(report.steps[0].path_used, ExecutionPath::Ai);
    assert_eq!(report.steps[0].error.as_deref(), Some("Element not found"));
}

#[tokio::test]
async fn slow_executor_times_out_and_falls_back() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Hang]);
    let script = MockScript::with_replies([Reply::Ok]);
    let orchestrator = Orchestrator::new(ai.clone(), script.clone()).with_config(ExecutionConfig {
        timeout_ms: 50,
        ..config(recordings.path())
    });
    let spec = IntentSpec::new(
        "Slow",
        vec![step("wait", ExecutionPath::Ai, FallbackPath::Snippet)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert!(report.steps[0].success);
    assert!(report.steps[0].fallback_occurred);
    assert_eq!(report.steps[0].path_used, ExecutionPath::Snippet);
}

#[tokio::test]
async fn timeout_error_names_the_path() {
    let recordings = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(
        MockAi::with_replies([Reply::Hang]),
        MockScript::with_replies([]),
    )
    .with_config(ExecutionConfig {
        timeout_ms: 50,
        ..config(recordings.path())
    });
    let spec = IntentSpec::new("Slow", vec![step("wait", ExecutionPath::Ai, FallbackPath::None)]);

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(
        report.steps[0].error.as_deref(),
        Some("AI timed out after 50ms")
    );
}

#[tokio::test]
async fn panic_before_any_step_yields_execution_failed_step() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Panic("executor bug")]);
    let script = MockScript::with_replies([]);
    let (orchestrator, events) = record_events(
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path())),
    );
    let spec = IntentSpec::new(
        "Buggy",
        vec![step("boom", ExecutionPath::Ai, FallbackPath::Snippet)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].name, EXECUTION_FAILED_STEP);
    assert!(report.steps[0].error.as_deref().unwrap().contains("executor bug"));
    assert!(!report.overall_success);
    assert_eq!(script.cleanups(), 1);
    assert_eq!(ai.cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(names(&events).last(), Some(&"execution-failed"));
}

#[tokio::test]
async fn panic_after_a_step_is_attached_to_last_step() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Panic("executor bug")]);
    let script = MockScript::with_replies([Reply::Ok]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Buggy",
        vec![
            step("first", ExecutionPath::Snippet, FallbackPath::None),
            step("second", ExecutionPath::Ai, FallbackPath::None),
        ],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].name, "first");
    assert!(!report.steps[0].success);
    assert!(report.steps[0].error.as_deref().unwrap().contains("executor bug"));
    assert_eq!(script.cleanups(), 1);
}

#[tokio::test]
async fn cleanup_runs_once_per_execution() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Fail("nope")]);
    let script = MockScript::with_replies([Reply::Fail("nope")]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new("Fails", vec![step("x", ExecutionPath::Ai, FallbackPath::Snippet)]);

    orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(script.cleanups(), 1);
    assert_eq!(ai.cleanups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn events_follow_execution_order() {
    let recordings = TempDir::new().unwrap();
    let (orchestrator, events) = record_events(
        Orchestrator::new(
            MockAi::with_replies([Reply::Fail("Element not found")]),
            MockScript::with_replies([Reply::Ok, Reply::Ok]),
        )
        .with_config(ExecutionConfig {
            screenshot_comparison: false,
            ..config(recordings.path())
        }),
    );
    let spec = IntentSpec::new(
        "Flow",
        vec![
            step("a", ExecutionPath::Ai, FallbackPath::Snippet),
            step("b", ExecutionPath::Snippet, FallbackPath::None),
        ],
    );

    orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(
        names(&events),
        vec![
            "execution-started",
            "step-started",
            "fallback-started",
            "fallback-completed",
            "step-completed",
            "step-started",
            "step-completed",
            "execution-completed",
        ]
    );

    let recorded = events.lock().unwrap();
    let indices: Vec<usize> = recorded
        .iter()
        .filter_map(|event| match event {
            ExecutionEvent::StepCompleted { step_index, .. } => Some(*step_index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![0, 1]);
}

#[tokio::test]
async fn failing_listener_does_not_abort_run() {
    let recordings = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(MockAi::with_replies([]), MockScript::with_replies([]))
        .with_config(config(recordings.path()))
        .with_listener(Arc::new(|_: &ExecutionEvent| -> anyhow::Result<()> {
            anyhow::bail!("listener exploded")
        }))
        .with_listener(Arc::new(|event: &ExecutionEvent| -> anyhow::Result<()> {
            if matches!(event, ExecutionEvent::StepStarted { .. }) {
                panic!("listener panicked");
            }
            Ok(())
        }));
    let spec = IntentSpec::new("Flow", vec![step("a", ExecutionPath::Ai, FallbackPath::None)]);

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert!(report.overall_success);
    assert_eq!(report.steps.len(), 1);
}

#[tokio::test]
async fn subscribers_receive_events() {
    let recordings = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(MockAi::with_replies([]), MockScript::with_replies([]))
        .with_config(config(recordings.path()));
    let mut receiver = orchestrator.subscribe();
    let spec = IntentSpec::new("Flow", vec![step("a", ExecutionPath::Ai, FallbackPath::None)]);

    orchestrator.execute(&spec, &Variables::new()).await;

    let first = receiver.recv().await.unwrap();
    assert_eq!(first.name(), "execution-started");
}

#[tokio::test]
async fn stop_skips_remaining_steps() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([]);
    let script = MockScript::with_replies([]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let stop = orchestrator.stop_handle();
    let (orchestrator, events) = record_events(orchestrator.with_listener(Arc::new(
        move |event: &ExecutionEvent| -> anyhow::Result<()> {
            if let ExecutionEvent::StepCompleted { step_index: 0, .. } = event {
                stop.cancel();
            }
            Ok(())
        },
    )));
    let spec = IntentSpec::new(
        "Flow",
        vec![
            step("a", ExecutionPath::Snippet, FallbackPath::None),
            step("b", ExecutionPath::Snippet, FallbackPath::None),
            step("c", ExecutionPath::Snippet, FallbackPath::None),
        ],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.steps.len(), 1);
    assert!(report.stopped);
    assert!(!report.overall_success);
    assert_eq!(script.calls(), 1);
    assert_eq!(script.cleanups(), 1);
    assert!(
        report
            .suggestions
            .iter()
            .any(|s| s == "Execution was stopped after 1 of 3 steps")
    );
    assert!(names(&events).contains(&"execution-stopped"));
    assert!(!names(&events).contains(&"screenshot-comparison"));
}

#[tokio::test]
async fn stop_on_failure_halts_after_unrecovered_step() {
    let recordings = TempDir::new().unwrap();
    let script = MockScript::with_replies([Reply::Fail("Selector timeout")]);
    let orchestrator = Orchestrator::new(MockAi::with_replies([]), script.clone()).with_config(
        ExecutionConfig {
            stop_on_failure: true,
            ..config(recordings.path())
        },
    );
    let spec = IntentSpec::new(
        "Flow",
        vec![
            step("a", ExecutionPath::Snippet, FallbackPath::None),
            step("b", ExecutionPath::Snippet, FallbackPath::None),
        ],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.steps.len(), 1);
    assert_eq!(script.calls(), 1);
    assert!(report.suggestions.iter().any(|s| s.contains("1 remaining step(s)")));
}

#[tokio::test]
async fn failed_steps_do_not_halt_by_default() {
    let recordings = TempDir::new().unwrap();
    let script = MockScript::with_replies([Reply::Fail("Selector timeout"), Reply::Ok]);
    let orchestrator = Orchestrator::new(MockAi::with_replies([]), script.clone())
        .with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Flow",
        vec![
            step("a", ExecutionPath::Snippet, FallbackPath::None),
            step("b", ExecutionPath::Snippet, FallbackPath::None),
        ],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.steps.len(), 2);
    assert!(!report.steps[0].success);
    assert!(report.steps[1].success);
    assert!(!report.overall_success);
}

#[tokio::test]
async fn variables_are_substituted_before_dispatch() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Fail("Element not found")]);
    let script = MockScript::with_replies([Reply::Ok]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Login",
        vec![
            IntentStep::new("Fill username")
                .with_instruction("Type {{USERNAME}} and {{MISSING}}")
                .with_snippet("await page.fill('#user', '{{USERNAME}}')")
                .with_prefer(ExecutionPath::Ai)
                .with_fallback(FallbackPath::Snippet),
        ],
    )
    .with_params(["USERNAME"]);
    let variables: Variables = [("USERNAME".to_string(), "{{USERNAME}}-ada".to_string())].into();

    orchestrator.execute(&spec, &variables).await;

    let mini_specs = ai.mini_specs.lock().unwrap();
    assert_eq!(mini_specs.len(), 1);
    assert_eq!(mini_specs[0].steps.len(), 1);
    assert_eq!(mini_specs[0].name, "Login - Fill username");
    assert_eq!(
        mini_specs[0].steps[0].ai_instruction,
        "Type {{USERNAME}}-ada and {{MISSING}}"
    );

    let steps = script.steps.lock().unwrap();
    assert_eq!(steps[0].snippet, "await page.fill('#user', '{{USERNAME}}-ada')");
    // The caller's spec is left untouched.
    assert_eq!(spec.steps[0].ai_instruction, "Type {{USERNAME}} and {{MISSING}}");
}

#[tokio::test]
async fn spec_url_is_substituted_for_ai_dispatch() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Ok]);
    let script = MockScript::with_replies([]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let mut spec = IntentSpec::new(
        "Login",
        vec![step("login", ExecutionPath::Ai, FallbackPath::None)],
    )
    .with_params(["HOST"]);
    spec.url = "https://{{HOST}}/login".to_string();
    let variables: Variables = [("HOST".to_string(), "app.test".to_string())].into();

    orchestrator.execute(&spec, &variables).await;

    let mini_specs = ai.mini_specs.lock().unwrap();
    assert_eq!(mini_specs[0].url, "https://app.test/login");
    assert_eq!(spec.url, "https://{{HOST}}/login");
}

#[tokio::test]
async fn cleanup_time_is_not_counted_in_total_duration() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::Ok]);
    let script = Arc::new(MockScript {
        cleanup_delay: Duration::from_millis(400),
        ..MockScript::default()
    });
    let orchestrator = Orchestrator::new(ai, script.clone()).with_config(ExecutionConfig {
        save_screenshots: false,
        ..config(recordings.path())
    });
    let spec = IntentSpec::new(
        "Quick",
        vec![step("quick", ExecutionPath::Ai, FallbackPath::None)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(script.cleanups(), 1);
    assert!(report.overall_success);
    assert!(
        report.total_duration < 400,
        "total_duration {} includes cleanup",
        report.total_duration
    );
}

#[tokio::test]
async fn strategy_override_forces_path() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([]);
    let script = MockScript::with_replies([]);
    let orchestrator = Orchestrator::new(ai.clone(), script.clone()).with_config(ExecutionConfig {
        strategy: Some(ExecutionStrategy::force(ExecutionPath::Snippet)),
        ..config(recordings.path())
    });
    let spec = IntentSpec::new(
        "Flow",
        vec![
            step("a", ExecutionPath::Ai, FallbackPath::Snippet),
            step("b", ExecutionPath::Ai, FallbackPath::None),
        ],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.snippet_usage_count, 2);
    assert_eq!(ai.calls(), 0);
}

#[tokio::test]
async fn screenshots_and_extracted_data_are_collected() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([Reply::OkWithData(serde_json::json!({"price": "9.99"}))]);
    let script = MockScript::with_replies([]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Shop",
        vec![step("Read Price", ExecutionPath::Ai, FallbackPath::None)],
    );

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(
        report.steps[0].screenshot.as_deref(),
        Some("/tmp/shots/step-1-read-price.png")
    );
    assert_eq!(
        report.screenshots,
        vec![
            "/tmp/shots/step-1-read-price.png".to_string(),
            "/tmp/shots/final-state.png".to_string(),
        ]
    );
    assert_eq!(
        report.steps[0].extracted_data,
        Some(serde_json::json!({"price": "9.99"}))
    );
}

#[tokio::test]
async fn screenshot_failures_are_not_fatal() {
    let recordings = TempDir::new().unwrap();
    let script = Arc::new(MockScript {
        fail_screenshots: true,
        ..MockScript::default()
    });
    let orchestrator = Orchestrator::new(MockAi::with_replies([]), script.clone())
        .with_config(config(recordings.path()));
    let spec = IntentSpec::new("Flow", vec![step("a", ExecutionPath::Snippet, FallbackPath::None)]);

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert!(report.overall_success);
    assert!(report.screenshots.is_empty());
    assert!(report.steps[0].screenshot.is_none());
}

#[tokio::test]
async fn disabled_screenshots_skip_capture() {
    let recordings = TempDir::new().unwrap();
    let script = MockScript::with_replies([]);
    let orchestrator = Orchestrator::new(MockAi::with_replies([]), script.clone()).with_config(
        ExecutionConfig {
            save_screenshots: false,
            screenshot_comparison: false,
            ..config(recordings.path())
        },
    );
    let spec = IntentSpec::new("Flow", vec![step("a", ExecutionPath::Snippet, FallbackPath::None)]);

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert!(report.screenshots.is_empty());
    assert!(script.screenshots.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_spec_produces_empty_successful_report() {
    let recordings = TempDir::new().unwrap();
    let (orchestrator, events) = record_events(
        Orchestrator::new(MockAi::with_replies([]), MockScript::with_replies([]))
            .with_config(ExecutionConfig {
                screenshot_comparison: false,
                ..config(recordings.path())
            }),
    );
    let spec = IntentSpec::new("Nothing", Vec::new());

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert!(report.steps.is_empty());
    assert!(report.overall_success);
    assert_eq!(names(&events), vec!["execution-started", "execution-completed"]);
}

#[tokio::test]
async fn history_records_every_run() {
    let recordings = TempDir::new().unwrap();
    let history = Arc::new(InMemoryExecutionHistory::new());
    let orchestrator = Orchestrator::new(
        MockAi::with_replies([Reply::Ok, Reply::Fail("nope")]),
        MockScript::with_replies([]),
    )
    .with_config(config(recordings.path()))
    .with_history(history.clone());
    let spec = IntentSpec::new("Flow", vec![step("a", ExecutionPath::Ai, FallbackPath::None)]);

    let first = orchestrator.execute(&spec, &Variables::new()).await;
    let second = orchestrator.execute(&spec, &Variables::new()).await;

    assert_ne!(first.execution_id, second.execution_id);
    let summary = history.summary().await.unwrap();
    assert_eq!(summary.runs, 2);
    assert_eq!(summary.successful_runs, 1);
}

#[tokio::test]
async fn category_preferences_apply_to_unannotated_steps() {
    let recordings = TempDir::new().unwrap();
    let ai = MockAi::with_replies([]);
    let script = MockScript::with_replies([]);
    let orchestrator =
        Orchestrator::new(ai.clone(), script.clone()).with_config(config(recordings.path()));
    let spec = IntentSpec::new(
        "Flow",
        vec![
            IntentStep::new("open").with_instruction("Navigate to the login page"),
            IntentStep::new("click").with_instruction("Click the button labeled \"Sign in\""),
        ],
    )
    .with_preference("simple_steps", ExecutionPath::Snippet)
    .with_preference("dynamic_elements", ExecutionPath::Ai);

    let report = orchestrator.execute(&spec, &Variables::new()).await;

    assert_eq!(report.steps[0].path_used, ExecutionPath::Snippet);
    assert_eq!(report.steps[1].path_used, ExecutionPath::Ai);
}
