//! Collaborator error types.

use intentflow_models::ExecutionPath;
use thiserror::Error;

/// Errors raised by executors and comparators.
///
/// Any of these on a step call counts as an ordinary step failure and is
/// eligible for fallback.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("{0}")]
    Failed(String),

    #[error("{} timed out after {timeout_ms}ms", path.label())]
    Timeout { path: ExecutionPath, timeout_ms: u64 },

    #[error("Executor unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecutorError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result type alias for collaborator calls
pub type Result<T> = std::result::Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_displays_bare_message() {
        assert_eq!(
            ExecutorError::failed("Element not found").to_string(),
            "Element not found"
        );
    }

    #[test]
    fn timeout_names_the_path() {
        let err = ExecutorError::Timeout {
            path: ExecutionPath::Snippet,
            timeout_ms: 30000,
        };
        assert_eq!(err.to_string(), "Snippet timed out after 30000ms");
    }
}
