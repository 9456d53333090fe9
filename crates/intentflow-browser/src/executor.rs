use async_trait::async_trait;
use intentflow_models::IntentStep;
use intentflow_traits::{CallOptions, ExecutorError, ScriptStepExecutor, StepOutcome};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::runtime::{NodeJobOutput, NodeProcessRunner, NodeRunner, RuntimeProbe};
use crate::script::{build_screenshot_script, build_step_script};
use crate::session::BrowserSession;

/// Screenshot time limit until a call timeout is known.
const DEFAULT_SCREENSHOT_TIMEOUT_MS: u64 = 30_000;

/// Script step executor backed by Playwright under Node.js.
///
/// A browser session is created lazily on the first call and lives until
/// [`ScriptStepExecutor::cleanup`]. The page URL reached by each step is
/// restored before the next one runs.
pub struct PlaywrightScriptExecutor {
    root_dir: PathBuf,
    headless: bool,
    start_url: Option<String>,
    runner: Arc<dyn NodeRunner>,
    probe: OnceCell<RuntimeProbe>,
    session: Mutex<Option<BrowserSession>>,
    current_url: RwLock<Option<String>>,
    /// Follows the per-call timeout of the most recent step.
    screenshot_timeout_ms: AtomicU64,
}

impl PlaywrightScriptExecutor {
    /// Executor rooted at the default browser directory, running the local `node`.
    pub fn new() -> anyhow::Result<Self> {
        let root_dir = intentflow_core::paths::browser_dir()?;
        Ok(Self::with_runner(root_dir, Arc::new(NodeProcessRunner::new())))
    }

    pub fn with_runner(root_dir: impl Into<PathBuf>, runner: Arc<dyn NodeRunner>) -> Self {
        Self {
            root_dir: root_dir.into(),
            headless: true,
            start_url: None,
            runner,
            probe: OnceCell::new(),
            session: Mutex::new(None),
            current_url: RwLock::new(None),
            screenshot_timeout_ms: AtomicU64::new(DEFAULT_SCREENSHOT_TIMEOUT_MS),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Page the first step starts on.
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let url = (!url.trim().is_empty()).then_some(url);
        self.current_url = RwLock::new(url.clone());
        self.start_url = url;
        self
    }

    /// Per-call timeout applied to screenshots taken before any step runs.
    pub fn with_call_timeout(self, timeout_ms: u64) -> Self {
        self.screenshot_timeout_ms.store(timeout_ms.max(1), Ordering::Relaxed);
        self
    }

    pub async fn current_url(&self) -> Option<String> {
        self.current_url.read().await.clone()
    }

    pub async fn session(&self) -> Option<BrowserSession> {
        self.session.lock().await.clone()
    }

    async fn ensure_ready(&self) -> Result<(), ExecutorError> {
        let probe = self
            .probe
            .get_or_try_init(|| async { self.runner.probe().await })
            .await
            .map_err(|err| ExecutorError::Unavailable(err.to_string()))?;
        probe
            .ensure_ready()
            .map_err(|err| ExecutorError::Unavailable(err.to_string()))
    }

    async fn ensure_session(&self) -> Result<BrowserSession, ExecutorError> {
        let mut session = self.session.lock().await;
        if let Some(existing) = session.as_ref() {
            return Ok(existing.clone());
        }

        let created = BrowserSession::create(&self.root_dir, self.headless)?;
        info!(session_id = %created.id, dir = %created.session_dir, "Browser session created");
        *session = Some(created.clone());
        Ok(created)
    }

    async fn remember_url(&self, output: &NodeJobOutput) {
        let url = output
            .payload
            .as_ref()
            .and_then(|payload| payload.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty() && *url != "about:blank");
        if let Some(url) = url {
            *self.current_url.write().await = Some(url.to_string());
        }
    }
}

#[async_trait]
impl ScriptStepExecutor for PlaywrightScriptExecutor {
    async fn execute_action(
        &self,
        step: &IntentStep,
        options: &CallOptions,
    ) -> intentflow_traits::Result<StepOutcome> {
        self.ensure_ready().await?;
        self.screenshot_timeout_ms.store(options.timeout_ms.max(1), Ordering::Relaxed);
        let session = self.ensure_session().await?;
        let start_url = self.current_url().await;

        let script = build_step_script(&session, start_url.as_deref(), step, options.timeout_ms)?;
        debug!(step = %step.name, start_url = ?start_url, "Running snippet step");

        let output = self.runner.run(script, options.timeout_ms).await?;
        self.remember_url(&output).await;

        if !output.succeeded() {
            return Ok(StepOutcome::failure(output.failed_message()));
        }

        let outcome = StepOutcome::success();
        let result = output
            .payload
            .and_then(|mut payload| payload.get_mut("result").map(Value::take))
            .filter(|result| !result.is_null());
        Ok(match result {
            Some(data) => outcome.with_data(data),
            None => outcome,
        })
    }

    async fn take_screenshot(&self, label: &str) -> intentflow_traits::Result<String> {
        self.ensure_ready().await?;
        let session = self.ensure_session().await?;
        let start_url = self.current_url().await;
        let target = session.artifact_path(label).display().to_string();

        let script = build_screenshot_script(&session, start_url.as_deref(), &target)?;
        let timeout_ms = self.screenshot_timeout_ms.load(Ordering::Relaxed);
        let output = self.runner.run(script, timeout_ms).await?;
        if !output.succeeded() {
            return Err(ExecutorError::failed(format!(
                "Screenshot '{label}' failed: {}",
                output.failed_message()
            )));
        }

        debug!(label, path = %target, "Screenshot captured");
        Ok(target)
    }

    async fn cleanup(&self) -> intentflow_traits::Result<()> {
        let session = self.session.lock().await.take();
        *self.current_url.write().await = self.start_url.clone();

        let Some(session) = session else {
            return Ok(());
        };
        if let Err(err) = session.discard_profile() {
            warn!(session_id = %session.id, error = %err, "Failed to remove browser profile");
            return Err(err.into());
        }
        info!(session_id = %session.id, "Browser session closed");
        Ok(())
    }
}
