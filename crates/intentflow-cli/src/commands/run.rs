use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use intentflow_agent::{HttpAiExecutor, HttpScreenshotComparator, build_http_client};
use intentflow_browser::PlaywrightScriptExecutor;
use intentflow_core::{
    ConfigOverrides, ExecutionConfig, ExecutionStrategy, Orchestrator, load_spec,
    missing_variables, paths, render, reporter, substitute, validate,
};
use intentflow_models::{ExecutionEvent, IntentSpec, Variables};
use intentflow_traits::{AiStepExecutor, CallOptions, ExecutorError, StepOutcome};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::config::CliConfig;
use crate::output::{OutputFormat, emit};

/// Execute the spec and print the report. Returns the run's overall success.
pub async fn run(args: RunArgs, config: &CliConfig, format: OutputFormat) -> Result<bool> {
    let spec = load_spec(&args.spec)?;
    validate(&spec)?;

    let variables: Variables = args.vars.iter().cloned().collect();
    let missing = missing_variables(&spec, &variables);
    if !missing.is_empty() {
        warn!(
            missing = %missing.join(", "),
            "Declared params have no value; their placeholders stay literal"
        );
    }

    let execution = ExecutionConfig::default()
        .merged(&config.execution.clone().layered(&flag_overrides(&args)));

    let client = build_http_client();
    let api_key = args.api_key.clone();

    let agent_url = args.agent_url.clone().or_else(|| config.endpoints.agent.clone());
    let ai: Arc<dyn AiStepExecutor> = match agent_url {
        Some(url) => {
            let mut executor = HttpAiExecutor::new(url).with_client(client.clone());
            if let Some(key) = &api_key {
                executor = executor.with_api_key(key.clone());
            }
            Arc::new(executor)
        }
        None => Arc::new(MissingAgent),
    };

    let script = PlaywrightScriptExecutor::new()?
        .headless(!args.headed)
        .with_call_timeout(execution.timeout_ms)
        .with_start_url(start_url(&spec, &variables));

    let mut orchestrator = Orchestrator::new(ai, Arc::new(script)).with_config(execution);

    let comparator_url = args
        .comparator_url
        .clone()
        .or_else(|| config.endpoints.comparator.clone());
    if let Some(url) = comparator_url {
        let mut comparator = HttpScreenshotComparator::new(url).with_client(client);
        if let Some(key) = &api_key {
            comparator = comparator.with_api_key(key.clone());
        }
        orchestrator = orchestrator.with_comparator(Arc::new(comparator));
    }

    let orchestrator = orchestrator.with_listener(Arc::new(
        |event: &ExecutionEvent| -> anyhow::Result<()> {
            if let Some(line) = progress_line(event) {
                eprintln!("{line}");
            }
            Ok(())
        },
    ));

    let stop = orchestrator.stop_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Stopping after the current step...".yellow());
            stop.cancel();
        }
    });

    let report = orchestrator.execute(&spec, &variables).await;
    interrupt.abort();

    if !args.no_save {
        match save_report(&report) {
            Ok(path) => info!(path = %path.display(), "Report saved"),
            Err(err) => warn!(error = %err, "Failed to save report"),
        }
    }

    let rendered = render(&report, format.report_format())?;
    emit(&rendered, args.output.as_deref())?;

    Ok(report.overall_success)
}

fn flag_overrides(args: &RunArgs) -> ConfigOverrides {
    ConfigOverrides {
        enable_fallback: args.no_fallback.then_some(false),
        screenshot_comparison: args.no_comparison.then_some(false),
        save_screenshots: args.no_screenshots.then_some(false),
        timeout_ms: args.timeout,
        stop_on_failure: args.stop_on_failure.then_some(true),
        recordings_dir: args.recordings_dir.clone(),
        strategy: args.prefer.map(|path| {
            let strategy = ExecutionStrategy::force(path.into());
            match args.fallback {
                Some(fallback) => strategy.with_fallback(fallback.into()),
                None => strategy,
            }
        }),
    }
}

/// Page the browser opens first, with `{{NAME}}` placeholders resolved.
fn start_url(spec: &IntentSpec, variables: &Variables) -> String {
    substitute(&spec.url, variables)
}

fn save_report(report: &intentflow_models::ExecutionReport) -> Result<std::path::PathBuf> {
    let path = paths::reports_dir()?.join(format!("{}.json", report.execution_id));
    let json = reporter::to_json(report)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn progress_line(event: &ExecutionEvent) -> Option<String> {
    match event {
        ExecutionEvent::ExecutionStarted { execution_id, spec } => Some(format!(
            "{} {} ({execution_id})",
            "Running".cyan().bold(),
            spec.name
        )),
        ExecutionEvent::StepStarted {
            step_index,
            step,
            total_steps,
        } => Some(format!("[{}/{total_steps}] {}", step_index + 1, step.name)),
        ExecutionEvent::FallbackStarted { step, .. } => {
            Some(format!("    {} {}", "falling back:".yellow(), step.name))
        }
        ExecutionEvent::StepCompleted { result, .. } if result.success => Some(format!(
            "    {} via {} in {}ms",
            "ok".green(),
            result.path_used.label(),
            result.duration
        )),
        ExecutionEvent::StepCompleted { result, .. } => Some(format!(
            "    {} {}",
            "failed:".red(),
            result.error.as_deref().unwrap_or("unknown error")
        )),
        ExecutionEvent::ScreenshotComparison { result } => Some(format!(
            "Success state similarity: {:.1}%",
            result.similarity
        )),
        ExecutionEvent::ExecutionStopped {
            completed_steps, ..
        } => Some(format!(
            "{} after {completed_steps} step(s)",
            "Stopped".yellow().bold()
        )),
        ExecutionEvent::ExecutionFailed { error, .. } => {
            Some(format!("{} {error}", "Execution failed:".red().bold()))
        }
        ExecutionEvent::FallbackCompleted { .. } | ExecutionEvent::ExecutionCompleted { .. } => {
            None
        }
    }
}

/// Stand-in used when no agent endpoint is configured; AI calls fail and the
/// snippet path can still rescue each step.
struct MissingAgent;

#[async_trait]
impl AiStepExecutor for MissingAgent {
    async fn execute_flow(
        &self,
        _mini_spec: &IntentSpec,
        _variables: &Variables,
        _options: &CallOptions,
    ) -> intentflow_traits::Result<StepOutcome> {
        Err(ExecutorError::Unavailable(
            "no AI agent configured (set --agent-url or INTENTFLOW_AGENT_URL)".to_string(),
        ))
    }
}
