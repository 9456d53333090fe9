//! Orchestrator configuration.
//!
//! [`ExecutionConfig`] carries every recognized option with its default.
//! Callers adjust it with a [`ConfigOverrides`] whose `Some` fields replace
//! the corresponding top-level value; nothing is merged recursively.

use intentflow_models::{ExecutionPath, FallbackPath};
use intentflow_traits::CallOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::paths;

/// Default per-executor-call timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Caller override of the per-step path preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionStrategy {
    /// Path to try first when `override_preferences` is set.
    #[serde(default)]
    pub preferred_path: Option<ExecutionPath>,
    /// When true, `preferred_path` wins over step and spec preferences.
    #[serde(default)]
    pub override_preferences: bool,
    /// Fallback policy applied with the override; `None` means no fallback.
    #[serde(default)]
    pub fallback: Option<FallbackPath>,
}

impl ExecutionStrategy {
    pub fn force(path: ExecutionPath) -> Self {
        Self {
            preferred_path: Some(path),
            override_preferences: true,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPath) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    /// Master switch for falling back to the secondary path.
    pub enable_fallback: bool,
    /// Compare the final state with the success-state screenshot.
    pub screenshot_comparison: bool,
    /// Capture per-step and final screenshots at all.
    pub save_screenshots: bool,
    /// Per-executor-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Halt after the first step that fails unrecovered.
    pub stop_on_failure: bool,
    /// Where success-state screenshots are searched for.
    pub recordings_dir: PathBuf,
    pub strategy: Option<ExecutionStrategy>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            enable_fallback: true,
            screenshot_comparison: true,
            save_screenshots: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            stop_on_failure: false,
            recordings_dir: paths::recordings_dir(),
            strategy: None,
        }
    }
}

impl ExecutionConfig {
    /// Apply caller overrides shallowly.
    pub fn merged(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(value) = overrides.enable_fallback {
            self.enable_fallback = value;
        }
        if let Some(value) = overrides.screenshot_comparison {
            self.screenshot_comparison = value;
        }
        if let Some(value) = overrides.save_screenshots {
            self.save_screenshots = value;
        }
        if let Some(value) = overrides.timeout_ms {
            self.timeout_ms = value;
        }
        if let Some(value) = overrides.stop_on_failure {
            self.stop_on_failure = value;
        }
        if let Some(value) = &overrides.recordings_dir {
            self.recordings_dir = value.clone();
        }
        if let Some(value) = overrides.strategy {
            self.strategy = Some(value);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn call_options(&self) -> CallOptions {
        CallOptions {
            save_screenshots: self.save_screenshots,
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Partial configuration; every `Some` field replaces the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub enable_fallback: Option<bool>,
    #[serde(default)]
    pub screenshot_comparison: Option<bool>,
    #[serde(default)]
    pub save_screenshots: Option<bool>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub stop_on_failure: Option<bool>,
    #[serde(default)]
    pub recordings_dir: Option<PathBuf>,
    #[serde(default)]
    pub strategy: Option<ExecutionStrategy>,
}

impl ConfigOverrides {
    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn layered(mut self, other: &ConfigOverrides) -> Self {
        if other.enable_fallback.is_some() {
            self.enable_fallback = other.enable_fallback;
        }
        if other.screenshot_comparison.is_some() {
            self.screenshot_comparison = other.screenshot_comparison;
        }
        if other.save_screenshots.is_some() {
            self.save_screenshots = other.save_screenshots;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.stop_on_failure.is_some() {
            self.stop_on_failure = other.stop_on_failure;
        }
        if other.recordings_dir.is_some() {
            self.recordings_dir = other.recordings_dir.clone();
        }
        if other.strategy.is_some() {
            self.strategy = other.strategy;
        }
        self
    }
}
