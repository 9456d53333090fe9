//! Locating the known-good end-state screenshot for a spec.

use intentflow_models::IntentSpec;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// File name suffix used by recordings for end-state screenshots.
pub const SUCCESS_STATE_SUFFIX: &str = "success-state.png";

/// Finds reference screenshots in a recordings directory.
///
/// Recordings are named inconsistently upstream, so the lookup tolerates
/// naming drift: explicit path, then exact and slugged names, then the most
/// recently modified success-state file.
#[derive(Debug, Clone)]
pub struct SuccessStateResolver {
    recordings_dir: PathBuf,
}

impl SuccessStateResolver {
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
        }
    }

    pub fn recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    pub fn find_reference_screenshot(&self, spec: &IntentSpec) -> Option<PathBuf> {
        if let Some(explicit) = spec.success_screenshot.as_deref() {
            let path = PathBuf::from(explicit);
            if path.is_file() {
                debug!(path = %path.display(), "Using explicit success screenshot");
                return Some(path);
            }
            debug!(path = %path.display(), "Explicit success screenshot does not exist");
        }

        for name in candidate_names(&spec.name) {
            let path = self.recordings_dir.join(&name);
            if path.is_file() {
                debug!(path = %path.display(), "Found success screenshot by name");
                return Some(path);
            }
        }

        let latest = self.latest_success_state();
        if let Some(path) = &latest {
            debug!(path = %path.display(), "Using most recent success screenshot");
        }
        latest
    }

    fn latest_success_state(&self) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.recordings_dir).ok()?;

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.contains(SUCCESS_STATE_SUFFIX))
            })
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                Some((modified, entry.path()))
            })
            .max_by(|(a_time, a_path), (b_time, b_path)| {
                a_time.cmp(b_time).then_with(|| a_path.cmp(b_path))
            })
            .map(|(_, path)| path)
    }
}

/// Exact name first, then the dash and underscore slugs.
fn candidate_names(spec_name: &str) -> Vec<String> {
    let lowered = spec_name.to_lowercase();
    let mut names = vec![
        format!("{spec_name}-{SUCCESS_STATE_SUFFIX}"),
        format!("{}-{SUCCESS_STATE_SUFFIX}", lowered.replace(' ', "-")),
        format!("{}-{SUCCESS_STATE_SUFFIX}", lowered.replace(' ', "_")),
    ];
    names.dedup();
    names
}
