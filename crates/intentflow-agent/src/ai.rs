//! AI step executor that delegates to a remote browser agent.

use async_trait::async_trait;
use intentflow_models::{IntentSpec, Variables};
use intentflow_traits::{AiStepExecutor, CallOptions, ExecutorError, StepOutcome};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::http_client::{build_http_client, endpoint_url};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteFlowRequest<'a> {
    spec: &'a IntentSpec,
    variables: &'a Variables,
    options: &'a CallOptions,
}

/// Posts each one-step spec to `{base_url}/execute` and reads back a
/// [`StepOutcome`].
pub struct HttpAiExecutor {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAiExecutor {
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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AiStepExecutor for HttpAiExecutor {
    async fn execute_flow(
        &self,
        mini_spec: &IntentSpec,
        variables: &Variables,
        options: &CallOptions,
    ) -> intentflow_traits::Result<StepOutcome> {
        let url = endpoint_url(&self.base_url, "execute");
        debug!(url = %url, spec = %mini_spec.name, "Dispatching step to AI agent");

        let mut request = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(options.timeout_ms.max(1)))
            .json(&ExecuteFlowRequest {
                spec: mini_spec,
                variables,
                options,
            });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ExecutorError::Unavailable(format!("AI agent request failed: {err}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            ExecutorError::Unavailable(format!("AI agent response could not be read: {err}"))
        })?;
        if !status.is_success() {
            return Err(ExecutorError::failed(format!(
                "AI agent error ({}): {}",
                status.as_u16(),
                body.trim()
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
