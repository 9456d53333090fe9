//! Step executor interfaces.

use async_trait::async_trait;
use intentflow_models::{IntentSpec, IntentStep, Variables};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Per-call options forwarded to both executors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallOptions {
    pub save_screenshots: bool,
    pub timeout_ms: u64,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            save_screenshots: true,
            timeout_ms: 30_000,
        }
    }
}

/// Result of executing a single step on one path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    /// Data extracted by the executor (AI path only, in practice).
    #[serde(default)]
    pub data: Option<Value>,
}

impl StepOutcome {
    /// Create a successful outcome.
    pub fn success() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Create a failed outcome.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_screenshots(mut self, screenshots: Vec<String>) -> Self {
        self.screenshots = screenshots;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Error text for a failed outcome, with a generic message when none was given.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Step reported failure without an error message".to_string())
    }
}

/// Executes one step through a natural-language instruction.
#[async_trait]
pub trait AiStepExecutor: Send + Sync {
    /// Execute a one-step spec whose fields are already variable-substituted.
    async fn execute_flow(
        &self,
        mini_spec: &IntentSpec,
        variables: &Variables,
        options: &CallOptions,
    ) -> Result<StepOutcome>;

    /// Release executor-owned resources. Must be idempotent.
    async fn cleanup(&self) -> Result<()> {
        Ok(())
    }
}

/// Executes one step through deterministic script commands.
#[async_trait]
pub trait ScriptStepExecutor: Send + Sync {
    async fn execute_action(&self, step: &IntentStep, options: &CallOptions)
    -> Result<StepOutcome>;

    /// Capture the current page and return the image path.
    async fn take_screenshot(&self, label: &str) -> Result<String>;

    /// Close browser/page resources. Must be idempotent.
    async fn cleanup(&self) -> Result<()>;
}
