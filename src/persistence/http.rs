use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, header};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::{
    EditorError, Result,
    config::BackendConfig,
    persistence::{AuthSession, ExecutionRecord, WorkflowBackend, WorkflowPayload, WorkflowRecord},
};

/// REST client for the workflow endpoints.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        auth: &AuthSession,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.client.request(method, url).header(header::AUTHORIZATION, auth.bearer())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HttpBackend request failed: {} - {}", status, body);
            return Err(EditorError::Backend(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl WorkflowBackend for HttpBackend {
    async fn load(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<WorkflowRecord> {
        self.send(self.request(Method::GET, &format!("/workflows/{}", id), auth)).await
    }

    async fn create(
        &self,
        auth: &AuthSession,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord> {
        let request = self.request(Method::POST, "/workflows", auth).query(&[("ownerId", auth.user_id.as_str())]).json(payload);
        self.send(request).await
    }

    async fn update(
        &self,
        auth: &AuthSession,
        id: &str,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord> {
        let request = self.request(Method::PUT, &format!("/workflows/{}", id), auth).json(payload);
        self.send(request).await
    }

    async fn execute(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<ExecutionRecord> {
        let request = self.request(Method::POST, &format!("/workflows/{}/execute", id), auth).json(&serde_json::json!({}));
        self.send(request).await
    }

    async fn executions(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<Vec<ExecutionRecord>> {
        self.send(self.request(Method::GET, &format!("/workflows/{}/executions", id), auth)).await
    }
}
