use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::types::{decode_response, error_message, RemoteRequest};
use super::KnowledgeSource;
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::response::Response;

/// HTTP client for the remote knowledge source
#[derive(Clone)]
pub struct RemoteClient {
    client: Client,
    endpoint: String,
    timeout_ms: u64,
}

impl RemoteClient {
    /// Create a new remote client.
    ///
    /// # Errors
    /// Returns [`RemoteError::Disabled`] when no endpoint is configured.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let endpoint = config.endpoint.clone().ok_or(RemoteError::Disabled)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(RemoteError::Http)?;

        Ok(Self {
            client,
            endpoint,
            timeout_ms: config.timeout_ms,
        })
    }

    /// Get the endpoint URL (for testing)
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute a single request; no retries
    async fn execute_request(&self, request: &RemoteRequest) -> RemoteResult<Response> {
        debug!(
            endpoint = %self.endpoint,
            with_dataset = request.dataset.is_some(),
            "Calling remote knowledge source"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    RemoteError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: error_message(&error_body),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                RemoteError::Http(e)
            }
        })?;

        decode_response(&body)
    }
}

#[async_trait]
impl KnowledgeSource for RemoteClient {
    async fn ask(&self, request: &RemoteRequest) -> RemoteResult<Response> {
        let start = Instant::now();
        let response = self.execute_request(request).await?;
        info!(
            endpoint = %self.endpoint,
            latency_ms = start.elapsed().as_millis(),
            has_chart = response.visualization.is_some(),
            "Remote answer received"
        );
        Ok(response)
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
