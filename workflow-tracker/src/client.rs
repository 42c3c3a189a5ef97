//! HTTP client for the workflow execution service
//!
//! One request per call. Errors are mapped onto [`ApiError`] and handed back to
//! the caller; nothing here retries or caches.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use workflow_tracker_sdk::{
    ApiError, ApiResult, WorkflowAction, WorkflowApi, WorkflowListResponse,
    WorkflowStatus, WorkflowSummary,
};

use crate::config::{ApiConfig, ConfigError};

const MAX_ERROR_BODY: usize = 200;

#[derive(Clone)]
pub struct HttpWorkflowClient {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl std::fmt::Debug for HttpWorkflowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWorkflowClient")
            .field("base_url", &self.base_url.as_str())
            .field("auth_enabled", &self.auth_token.is_some())
            .finish()
    }
}

impl HttpWorkflowClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::invalid("api.base_url", e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::invalid(
                "api.base_url",
                "URL cannot carry a path",
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ConfigError::invalid("api", format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/api/workflows/<segments...>`, each segment percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(["api", "workflows"]);
            path.extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        workflow_id: Option<&str>,
        operation: &str,
    ) -> ApiResult<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(operation, error = %e, "Workflow API request did not complete");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        warn!(
            operation,
            status = status.as_u16(),
            workflow_id = workflow_id.unwrap_or("-"),
            message = %message,
            "Workflow API returned an error"
        );
        Err(ApiError::from_status(status.as_u16(), workflow_id, message))
    }

    async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> ApiResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", operation, e)))
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowClient {
    async fn fetch_status(&self, workflow_id: &str) -> ApiResult<WorkflowStatus> {
        let url = self.endpoint(&[workflow_id, "status"]);
        debug!(url = %url, workflow_id, "Fetching workflow status");

        let response = self
            .send(self.request(Method::GET, url), Some(workflow_id), "fetch status")
            .await?;
        let status: WorkflowStatus = Self::decode(response, "fetch status").await?;

        if !status.steps_are_contiguous() {
            warn!(workflow_id, "Step indices are not contiguous");
        }
        debug!(
            workflow_id,
            status = %status.status,
            current_step = status.current_step,
            total_steps = status.total_steps,
            "Fetched workflow status"
        );
        Ok(status)
    }

    async fn send_action(&self, workflow_id: &str, action: WorkflowAction) -> ApiResult<()> {
        let url = self.endpoint(&[workflow_id, action.path_segment()]);
        debug!(url = %url, workflow_id, action = %action, "Sending workflow action");

        self.send(self.request(Method::POST, url), Some(workflow_id), action.path_segment())
            .await?;
        info!(workflow_id, action = %action, "Workflow action accepted");
        Ok(())
    }

    async fn list_workflows(&self) -> ApiResult<Vec<WorkflowSummary>> {
        let url = self.endpoint(&[]);
        debug!(url = %url, "Listing workflows");

        let response = self
            .send(self.request(Method::GET, url), None, "list workflows")
            .await?;
        let list: WorkflowListResponse = Self::decode(response, "list workflows").await?;
        let workflows = list.into_workflows();
        debug!(count = workflows.len(), "Listed workflows");
        Ok(workflows)
    }

    async fn delete_workflow(&self, workflow_id: &str) -> ApiResult<()> {
        let url = self.endpoint(&[workflow_id]);
        debug!(url = %url, workflow_id, "Deleting workflow");

        self.send(self.request(Method::DELETE, url), Some(workflow_id), "delete workflow")
            .await?;
        info!(workflow_id, "Deleted workflow");
        Ok(())
    }
}

/// Pull a readable message out of an error body (`{"error": ..}` / `{"message": ..}`)
pub(crate) fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
        }
    }

    Some(body.chars().take(MAX_ERROR_BODY).collect())
}
