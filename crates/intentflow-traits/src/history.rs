//! Cross-run statistics store.

use async_trait::async_trait;
use intentflow_models::ExecutionReport;
use serde::{Deserialize, Serialize};

/// Aggregates over every report recorded in a history store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub runs: usize,
    pub successful_runs: usize,
    /// Percentage of runs with `overall_success`.
    pub success_rate: f64,
    /// Mean of per-run fallback rates, in percent.
    pub average_fallback_rate: f64,
    /// Mean of per-run AI usage rates, in percent.
    pub average_ai_usage_rate: f64,
}

/// Explicitly scoped store for statistics that outlive a single run.
///
/// Injected into the orchestrator so repeated or concurrent runs in tests
/// never share hidden state.
#[async_trait]
pub trait ExecutionHistory: Send + Sync {
    async fn record(&self, report: &ExecutionReport) -> anyhow::Result<()>;

    async fn summary(&self) -> anyhow::Result<HistorySummary>;
}
