pub mod json;
pub mod table;

use anyhow::{Context, Result};
use clap::ValueEnum;
use intentflow_core::ReportFormat;
use std::path::Path;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// Per-step rows; only meaningful for reports
    Csv,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }

    pub fn report_format(self) -> ReportFormat {
        match self {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Csv => ReportFormat::Csv,
        }
    }
}

/// Print `content` to stdout, or write it to `path` when one is given.
pub fn emit(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, ensure_trailing_newline(content))
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => print!("{}", ensure_trailing_newline(content)),
    }
    Ok(())
}

fn ensure_trailing_newline(content: &str) -> String {
    if content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    }
}
