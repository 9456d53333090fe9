//! Screenshot comparison interface.

use async_trait::async_trait;
use intentflow_models::ComparisonResult;
use std::path::Path;

use crate::error::Result;

/// Compares a candidate screenshot with a known-good reference.
#[async_trait]
pub trait ScreenshotComparator: Send + Sync {
    async fn compare_screenshots(
        &self,
        candidate: &Path,
        reference: &Path,
    ) -> Result<ComparisonResult>;
}
