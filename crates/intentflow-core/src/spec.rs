//! Loading and validating intent specifications.

use std::collections::HashSet;
use std::path::Path;

use intentflow_models::{IntentSpec, Variables};
use thiserror::Error;

use crate::template::placeholders;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Failed to read spec: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse spec: {0}")]
    Parse(String),

    #[error("Unsupported spec format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    #[error("Invalid spec: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

pub type Result<T> = std::result::Result<T, SpecError>;

/// Read a spec from disk, choosing the parser by file extension.
pub fn load_spec(path: &Path) -> Result<IntentSpec> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let content = std::fs::read_to_string(path)?;

    match extension.as_str() {
        "yaml" | "yml" => parse_yaml(&content),
        "json" => parse_json(&content),
        other => Err(SpecError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            format!(".{other}")
        })),
    }
}

pub fn parse_yaml(content: &str) -> Result<IntentSpec> {
    serde_yaml::from_str(content).map_err(|err| SpecError::Parse(err.to_string()))
}

pub fn parse_json(content: &str) -> Result<IntentSpec> {
    serde_json::from_str(content).map_err(|err| SpecError::Parse(err.to_string()))
}

/// Check a spec for structural problems, reporting all of them at once.
///
/// Execution does not require a validated spec; this is for tooling that
/// wants to reject a bad recording before a run.
pub fn validate(spec: &IntentSpec) -> Result<()> {
    let mut problems = Vec::new();

    if spec.name.trim().is_empty() {
        problems.push("Spec name must not be empty".to_string());
    }

    let declared: HashSet<&str> = spec.params.iter().map(String::as_str).collect();
    for name in placeholders(&spec.url) {
        if !declared.contains(name.as_str()) {
            problems.push(format!("url references undeclared param '{name}'"));
        }
    }

    let mut seen = HashSet::new();
    for (index, step) in spec.steps.iter().enumerate() {
        let label = if step.name.trim().is_empty() {
            problems.push(format!("Step {} has an empty name", index + 1));
            format!("step {}", index + 1)
        } else {
            if !seen.insert(step.name.as_str()) {
                problems.push(format!("Duplicate step name '{}'", step.name));
            }
            format!("step '{}'", step.name)
        };

        if let (Some(prefer), Some(fallback)) = (step.prefer, step.fallback.target())
            && prefer == fallback
        {
            problems.push(format!(
                "{label} falls back to its preferred path '{prefer}'"
            ));
        }

        let fields = [
            ("ai_instruction", Some(step.ai_instruction.as_str())),
            ("snippet", Some(step.snippet.as_str())),
            ("selector", step.selector.as_deref()),
            ("value", step.value.as_deref()),
        ];
        for (field, text) in fields {
            let Some(text) = text else { continue };
            for name in placeholders(text) {
                if !declared.contains(name.as_str()) {
                    problems.push(format!(
                        "{label} {field} references undeclared param '{name}'"
                    ));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(SpecError::Invalid(problems))
    }
}

/// Declared params with no binding in `variables`, in declaration order.
pub fn missing_variables(spec: &IntentSpec, variables: &Variables) -> Vec<String> {
    spec.params
        .iter()
        .filter(|param| !variables.contains_key(param.as_str()))
        .cloned()
        .collect()
}
