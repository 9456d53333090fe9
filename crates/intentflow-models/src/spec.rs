//! Intent specification: the declarative, parameterized execution plan.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::path::{ExecutionPath, FallbackPath};

/// Variable bindings supplied by the caller for `{{NAME}}` placeholders.
pub type Variables = HashMap<String, String>;

/// A multi-step browser workflow, produced from a recording and treated as
/// read-only input during execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// Variable names referenced by `{{NAME}}` placeholders in the steps.
    #[serde(default)]
    pub params: Vec<String>,
    pub steps: Vec<IntentStep>,
    /// Default path per step category (e.g. `dynamic_elements`, `simple_steps`).
    #[serde(default)]
    pub preferences: BTreeMap<String, ExecutionPath>,
    /// Explicit location of the known-good end-state screenshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_screenshot: Option<String>,
}

impl IntentSpec {
    pub fn new(name: impl Into<String>, steps: Vec<IntentStep>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            url: String::new(),
            params: Vec::new(),
            steps,
            preferences: BTreeMap::new(),
            success_screenshot: None,
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_preference(mut self, category: impl Into<String>, path: ExecutionPath) -> Self {
        self.preferences.insert(category.into(), path);
        self
    }

    pub fn with_success_screenshot(mut self, path: impl Into<String>) -> Self {
        self.success_screenshot = Some(path.into());
        self
    }

    /// Build the one-step spec handed to the AI executor for `step`.
    ///
    /// Metadata is inherited so the executor keeps the starting URL and the
    /// declared parameters; preferences and the reference screenshot are not.
    pub fn single_step(&self, step: IntentStep) -> IntentSpec {
        IntentSpec {
            name: format!("{} - {}", self.name, step.name),
            description: self.description.clone(),
            url: self.url.clone(),
            params: self.params.clone(),
            steps: vec![step],
            preferences: BTreeMap::new(),
            success_screenshot: None,
        }
    }
}

/// One unit of work inside an [`IntentSpec`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IntentStep {
    pub name: String,
    #[serde(default)]
    pub ai_instruction: String,
    /// Script text interpreted only by the script executor.
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer: Option<ExecutionPath>,
    #[serde(default)]
    pub fallback: FallbackPath,
    /// Free-form action hint (`navigate`, `click`, `fill`, `wait`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Executor-level timeout hint in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

impl IntentStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.ai_instruction = instruction.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_prefer(mut self, path: ExecutionPath) -> Self {
        self.prefer = Some(path);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPath) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}
