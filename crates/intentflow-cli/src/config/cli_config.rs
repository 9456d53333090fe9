//! CLI configuration file support
//!
//! Loads configuration from ~/.config/intentflow/config.toml

use intentflow_core::ConfigOverrides;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Orchestrator options; anything left out keeps its default
    #[serde(default)]
    pub execution: ConfigOverrides,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// Remote collaborator endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// AI agent base URL
    pub agent: Option<String>,
    /// Screenshot comparator base URL
    pub comparator: Option<String>,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Ignoring unreadable config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("intentflow").join("config.toml"))
    }
}
