//! Execution paths a step can take.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two strategies that can execute a step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPath {
    /// Natural-language instruction handled by the AI executor.
    Ai,
    /// Deterministic script handled by the script executor.
    Snippet,
}

impl ExecutionPath {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Snippet => "snippet",
        }
    }

    /// Human-facing label used in error attribution and reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::Snippet => "Snippet",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Ai => Self::Snippet,
            Self::Snippet => Self::Ai,
        }
    }
}

impl fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to try when the primary path fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPath {
    Ai,
    Snippet,
    #[default]
    None,
}

impl FallbackPath {
    /// The executor path to fall back to, if any.
    pub fn target(self) -> Option<ExecutionPath> {
        match self {
            Self::Ai => Some(ExecutionPath::Ai),
            Self::Snippet => Some(ExecutionPath::Snippet),
            Self::None => None,
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Snippet => "snippet",
            Self::None => "none",
        }
    }
}

impl From<ExecutionPath> for FallbackPath {
    fn from(path: ExecutionPath) -> Self {
        match path {
            ExecutionPath::Ai => Self::Ai,
            ExecutionPath::Snippet => Self::Snippet,
        }
    }
}

impl fmt::Display for FallbackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_target_maps_to_paths() {
        assert_eq!(FallbackPath::Ai.target(), Some(ExecutionPath::Ai));
        assert_eq!(FallbackPath::Snippet.target(), Some(ExecutionPath::Snippet));
        assert_eq!(FallbackPath::None.target(), None);
    }

    #[test]
    fn paths_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&ExecutionPath::Snippet).unwrap(),
            "\"snippet\""
        );
        let parsed: FallbackPath = serde_json::from_str("\"none\"").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn other_flips_path() {
        assert_eq!(ExecutionPath::Ai.other(), ExecutionPath::Snippet);
        assert_eq!(ExecutionPath::Snippet.other(), ExecutionPath::Ai);
    }
}
