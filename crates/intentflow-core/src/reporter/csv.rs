use intentflow_models::ExecutionReport;
use serde::Serialize;

use super::ReportError;

/// One CSV row per step; `index` is the 0-based step position.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepRow<'a> {
    execution_id: &'a str,
    index: usize,
    name: &'a str,
    path_used: &'a str,
    fallback_occurred: bool,
    success: bool,
    duration: u64,
    error: &'a str,
}

/// Per-step rows with a header line, RFC 4180 quoting.
pub fn to_csv(report: &ExecutionReport) -> Result<String, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([
        "executionId",
        "index",
        "name",
        "pathUsed",
        "fallbackOccurred",
        "success",
        "duration",
        "error",
    ])?;

    for (index, step) in report.steps.iter().enumerate() {
        writer.serialize(StepRow {
            execution_id: &report.execution_id,
            index,
            name: &step.name,
            path_used: step.path_used.as_str(),
            fallback_occurred: step.fallback_occurred,
            success: step.success,
            duration: step.duration,
            error: step.error.as_deref().unwrap_or(""),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ReportError::Output(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ReportError::Output(err.to_string()))
}
