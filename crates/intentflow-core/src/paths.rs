use anyhow::Result;
use std::path::PathBuf;

const INTENTFLOW_DIR: &str = ".intentflow";
const RECORDINGS_DIR: &str = "recordings";
const REPORTS_DIR: &str = "reports";
const LOGS_DIR: &str = "logs";
const BROWSER_DIR: &str = "browser";

/// Environment variable to override the IntentFlow directory.
const INTENTFLOW_DIR_ENV: &str = "INTENTFLOW_DIR";

/// Resolve the IntentFlow data directory.
/// Priority: INTENTFLOW_DIR env var > ~/.intentflow/
pub fn resolve_intentflow_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(INTENTFLOW_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(INTENTFLOW_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the IntentFlow directory exists and return its path.
pub fn ensure_intentflow_dir() -> Result<PathBuf> {
    let dir = resolve_intentflow_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Conventional location of recordings and success-state screenshots.
///
/// Falls back to a relative `recordings` directory when no home directory
/// can be determined.
pub fn recordings_dir() -> PathBuf {
    resolve_intentflow_dir()
        .map(|dir| dir.join(RECORDINGS_DIR))
        .unwrap_or_else(|_| PathBuf::from(RECORDINGS_DIR))
}

/// Default directory for persisted reports: ~/.intentflow/reports/
pub fn reports_dir() -> Result<PathBuf> {
    let dir = ensure_intentflow_dir()?.join(REPORTS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the logs directory: ~/.intentflow/logs/
pub fn logs_dir() -> Result<PathBuf> {
    let dir = ensure_intentflow_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Root for browser sessions: ~/.intentflow/browser/
pub fn browser_dir() -> Result<PathBuf> {
    Ok(resolve_intentflow_dir()?.join(BROWSER_DIR))
}
