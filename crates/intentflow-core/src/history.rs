//! In-process run history.

use async_trait::async_trait;
use intentflow_models::ExecutionReport;
use intentflow_traits::{ExecutionHistory, HistorySummary};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
struct RunStats {
    success: bool,
    fallback_rate: f64,
    ai_usage_rate: f64,
}

/// History kept in memory for the lifetime of the value.
#[derive(Default)]
pub struct InMemoryExecutionHistory {
    runs: RwLock<Vec<RunStats>>,
}

impl InMemoryExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionHistory for InMemoryExecutionHistory {
    async fn record(&self, report: &ExecutionReport) -> anyhow::Result<()> {
        self.runs.write().await.push(RunStats {
            success: report.overall_success,
            fallback_rate: report.fallback_rate(),
            ai_usage_rate: report.ai_usage_rate(),
        });
        Ok(())
    }

    async fn summary(&self) -> anyhow::Result<HistorySummary> {
        let runs = self.runs.read().await;
        if runs.is_empty() {
            return Ok(HistorySummary::default());
        }

        let count = runs.len() as f64;
        let successful_runs = runs.iter().filter(|run| run.success).count();
        Ok(HistorySummary {
            runs: runs.len(),
            successful_runs,
            success_rate: successful_runs as f64 / count * 100.0,
            average_fallback_rate: runs.iter().map(|run| run.fallback_rate).sum::<f64>() / count,
            average_ai_usage_rate: runs.iter().map(|run| run.ai_usage_rate).sum::<f64>() / count,
        })
    }
}
