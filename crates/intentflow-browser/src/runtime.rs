//! Node.js and Playwright process plumbing.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

pub(crate) const RESULT_MARKER: &str = "__INTENTFLOW_STEP_RESULT__=";

/// Readiness of the local browser runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuntimeProbe {
    pub node_available: bool,
    pub node_version: Option<String>,
    pub playwright_package_available: bool,
    pub chromium_cache_detected: bool,
    pub ready: bool,
    pub notes: Vec<String>,
}

impl RuntimeProbe {
    pub fn ensure_ready(&self) -> Result<()> {
        if !self.node_available {
            bail!("Node.js is required for browser execution");
        }
        if !self.playwright_package_available {
            bail!("Playwright npm package is not available. Install it with: npm i -D playwright");
        }
        Ok(())
    }
}

/// Outcome of one Node.js job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeJobOutput {
    pub exit_code: i32,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
    /// JSON emitted on the result marker line, if any.
    pub payload: Option<Value>,
}

impl NodeJobOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
            && self
                .payload
                .as_ref()
                .and_then(|payload| payload.get("success"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }

    pub fn failed_message(&self) -> String {
        if let Some(payload) = &self.payload
            && let Some(error) = payload.get("error").and_then(Value::as_str)
        {
            return error.to_string();
        }

        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }

        format!("Browser step failed with exit code {}", self.exit_code)
    }
}

/// Runs generated Playwright scripts.
#[async_trait]
pub trait NodeRunner: Send + Sync {
    async fn probe(&self) -> Result<RuntimeProbe>;

    async fn run(&self, script: String, timeout_ms: u64) -> Result<NodeJobOutput>;
}

/// Runs scripts with the local `node` binary.
#[derive(Debug, Default)]
pub struct NodeProcessRunner;

impl NodeProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NodeRunner for NodeProcessRunner {
    async fn probe(&self) -> Result<RuntimeProbe> {
        Ok(probe_runtime().await)
    }

    async fn run(&self, script: String, timeout_ms: u64) -> Result<NodeJobOutput> {
        let temp_dir = tempfile::Builder::new()
            .prefix("intentflow-step-")
            .tempdir()?;
        let script_path = temp_dir.path().join("runner.mjs");
        std::fs::write(&script_path, script)?;

        let started = Instant::now();
        let output = run_command_capture(
            "node",
            &[script_path.display().to_string()],
            None,
            Duration::from_millis(timeout_ms.max(1)),
        )
        .await?;
        let duration_ms = started.elapsed().as_millis() as u64;
        let (stdout, payload) = extract_result_payload(&output.stdout);

        Ok(NodeJobOutput {
            exit_code: output.exit_code,
            duration_ms,
            stdout,
            stderr: output.stderr,
            payload,
        })
    }
}

/// Check for Node.js, the Playwright package and a cached Chromium build.
pub async fn probe_runtime() -> RuntimeProbe {
    let mut probe = RuntimeProbe::default();
    let probe_timeout = Duration::from_secs(10);

    if let Ok(output) =
        run_command_capture("node", &["--version".to_string()], None, probe_timeout).await
        && output.exit_code == 0
    {
        probe.node_available = true;
        probe.node_version = Some(output.stdout.trim().to_string());
    }

    if probe.node_available {
        let playwright = run_command_capture(
            "node",
            &[
                "--input-type=module".to_string(),
                "-e".to_string(),
                "import('playwright').then(() => process.exit(0)).catch(() => process.exit(1));"
                    .to_string(),
            ],
            None,
            Duration::from_secs(15),
        )
        .await;
        probe.playwright_package_available = playwright
            .map(|output| output.exit_code == 0)
            .unwrap_or(false);
    }

    probe.chromium_cache_detected = detect_chromium_cache();
    probe.ready = probe.node_available && probe.playwright_package_available;

    if !probe.node_available {
        probe
            .notes
            .push("Node.js not found. Install Node.js 20+ to run snippet steps.".to_string());
    }
    if probe.node_available && !probe.playwright_package_available {
        probe
            .notes
            .push("Playwright npm package not found. Run: npm i -D playwright".to_string());
    }
    if probe.ready && !probe.chromium_cache_detected {
        probe.notes.push(
            "Chromium not found in the Playwright cache. Run: npx playwright install chromium"
                .to_string(),
        );
    }

    probe
}

/// Split the result marker line out of a job's stdout.
pub(crate) fn extract_result_payload(stdout: &str) -> (String, Option<Value>) {
    let mut payload = None;
    let mut clean_lines = Vec::new();

    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix(RESULT_MARKER) {
            if let Ok(value) = serde_json::from_str::<Value>(rest.trim()) {
                payload = Some(value);
            }
            continue;
        }
        clean_lines.push(line.to_string());
    }

    (clean_lines.join("\n"), payload)
}

struct CommandCapture {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

async fn run_command_capture(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    limit: Duration,
) -> Result<CommandCapture> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = match timeout(limit, command.output()).await {
        Ok(result) => result?,
        Err(_) => bail!("{program} timed out after {}ms", limit.as_millis()),
    };

    Ok(CommandCapture {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn detect_chromium_cache() -> bool {
    if let Ok(path) = std::env::var("PLAYWRIGHT_BROWSERS_PATH")
        && PathBuf::from(path).exists()
    {
        return true;
    }

    let mut candidates = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        candidates.push(home.join(".cache/ms-playwright"));
        candidates.push(home.join("Library/Caches/ms-playwright"));
    }
    if let Some(profile) = std::env::var_os("USERPROFILE") {
        candidates.push(PathBuf::from(profile).join("AppData/Local/ms-playwright"));
    }

    candidates.into_iter().any(|path| path.exists())
}
