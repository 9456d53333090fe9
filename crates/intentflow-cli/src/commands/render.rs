use anyhow::{Context, Result};
use intentflow_core::render;
use intentflow_models::ExecutionReport;

use crate::cli::RenderArgs;
use crate::output::{OutputFormat, emit};

pub fn run(args: RenderArgs, format: OutputFormat) -> Result<()> {
    let raw = std::fs::read_to_string(&args.report)
        .with_context(|| format!("Failed to read report {}", args.report.display()))?;
    let report: ExecutionReport = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not an IntentFlow report", args.report.display()))?;

    let rendered = render(&report, format.report_format())?;
    emit(&rendered, args.output.as_deref())
}
