//! Screenshot comparator backed by a remote vision service.

use async_trait::async_trait;
use base64::Engine;
use intentflow_models::ComparisonResult;
use intentflow_traits::{ExecutorError, ScreenshotComparator};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::http_client::{build_http_client, endpoint_url};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodedImage {
    path: String,
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
struct CompareRequest {
    candidate: EncodedImage,
    reference: EncodedImage,
}

/// Sends both images base64-encoded to `{base_url}/compare`.
pub struct HttpScreenshotComparator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpScreenshotComparator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn detect_mime(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }

    async fn encode(path: &Path) -> Result<EncodedImage, ExecutorError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(EncodedImage {
            path: path.display().to_string(),
            mime_type: Self::detect_mime(path),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }
}

#[async_trait]
impl ScreenshotComparator for HttpScreenshotComparator {
    async fn compare_screenshots(
        &self,
        candidate: &Path,
        reference: &Path,
    ) -> intentflow_traits::Result<ComparisonResult> {
        let payload = CompareRequest {
            candidate: Self::encode(candidate).await?,
            reference: Self::encode(reference).await?,
        };
        let url = endpoint_url(&self.base_url, "compare");
        debug!(
            url = %url,
            candidate = %candidate.display(),
            reference = %reference.display(),
            "Comparing screenshots"
        );

        let mut request = self.client.post(&url).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|err| {
            ExecutorError::Unavailable(format!("Comparator request failed: {err}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            ExecutorError::Unavailable(format!("Comparator response could not be read: {err}"))
        })?;
        if !status.is_success() {
            return Err(ExecutorError::failed(format!(
                "Comparator error ({}): {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let result: ComparisonResult = serde_json::from_str(&body)?;
        Ok(ComparisonResult {
            similarity: result.similarity.clamp(0.0, 100.0),
            ..result
        })
    }
}
