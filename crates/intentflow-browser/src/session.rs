use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// On-disk browser state shared by the steps of one run.
///
/// `profile_dir` holds the storage state and is discarded on cleanup;
/// `artifacts_dir` holds screenshots and outlives the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserSession {
    pub id: String,
    pub headless: bool,
    pub created_at_ms: i64,
    pub session_dir: String,
    pub profile_dir: String,
    pub artifacts_dir: String,
}

impl BrowserSession {
    pub(crate) fn create(root_dir: &Path, headless: bool) -> Result<Self> {
        let id = Uuid::new_v4().to_string();
        let session_dir = root_dir.join(&id);
        let profile_dir = session_dir.join("profile");
        let artifacts_dir = session_dir.join("artifacts");

        std::fs::create_dir_all(&profile_dir)?;
        std::fs::create_dir_all(&artifacts_dir)?;

        Ok(Self {
            id,
            headless,
            created_at_ms: Utc::now().timestamp_millis(),
            session_dir: session_dir.display().to_string(),
            profile_dir: profile_dir.display().to_string(),
            artifacts_dir: artifacts_dir.display().to_string(),
        })
    }

    /// Where a screenshot with `label` is written.
    pub fn artifact_path(&self, label: &str) -> PathBuf {
        let file_name: String = label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        PathBuf::from(&self.artifacts_dir).join(format!("{file_name}.png"))
    }

    pub(crate) fn discard_profile(&self) -> Result<()> {
        let profile_dir = PathBuf::from(&self.profile_dir);
        if profile_dir.exists() {
            std::fs::remove_dir_all(profile_dir)?;
        }
        Ok(())
    }
}
