//! Execution lifecycle observers.

use intentflow_models::ExecutionEvent;

/// Receives events synchronously, in the order the orchestrator emits them.
///
/// Errors returned here are logged by the event bus and never abort a run.
pub trait ExecutionListener: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent) -> anyhow::Result<()>;
}

impl<F> ExecutionListener for F
where
    F: Fn(&ExecutionEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, event: &ExecutionEvent) -> anyhow::Result<()> {
        self(event)
    }
}
