//! Rendering execution reports.
//!
//! Every renderer is a pure function of the report: rendering the same report
//! twice produces identical output. Callers decide where the output goes.

mod csv;
mod json;
mod text;

pub use self::csv::to_csv;
pub use self::json::{ReportAnalysis, ReportSummary, analyze, summarize, to_json};
pub use self::text::{recommendations, to_text};

use intentflow_models::ExecutionReport;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Fallback rate (percent) above which a run is flagged.
pub const HIGH_FALLBACK_RATE: f64 = 30.0;
/// Total duration (milliseconds) above which a run is flagged as slow.
pub const SLOW_EXECUTION_MS: u64 = 60_000;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("CSV output error: {0}")]
    Output(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("Unsupported report format: {other}")),
        }
    }
}

/// Render `report` in the requested format.
pub fn render(report: &ExecutionReport, format: ReportFormat) -> Result<String, ReportError> {
    match format {
        ReportFormat::Text => Ok(to_text(report)),
        ReportFormat::Json => to_json(report),
        ReportFormat::Csv => to_csv(report),
    }
}
