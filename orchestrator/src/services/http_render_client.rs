//! HTTP render service client
//!
//! One POST per render call. Status codes and response bodies are mapped to
//! `RawResult` or `ClientError`; retrying is left to the orchestrator.

use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use shared::SlideSpec;
use crate::error::{ClientError, OrchestratorError, OrchestratorResult};
use crate::traits::RenderServiceClient;
use crate::types::RawResult;

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    payload: &'a serde_json::Value,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    ok: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    retryable: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpRenderClient {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    api_token: Option<String>,
}

impl HttpRenderClient {
    /// Build a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: Url, timeout: Duration) -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrchestratorError::ConfigurationError {
                field: "http_client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
            api_token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    fn map_send_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl RenderServiceClient for HttpRenderClient {
    async fn render(&self, spec: &SlideSpec) -> Result<RawResult, ClientError> {
        let body = RenderRequest {
            payload: &spec.payload,
            width: spec.dimensions.width,
            height: spec.dimensions.height,
        };

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        debug!("Render service answered slide {} with {}", spec.ordinal, status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.is_empty() {
                status.to_string()
            } else {
                format!("{}: {}", status, text)
            };
            return match status.as_u16() {
                429 | 503 => Ok(RawResult::overloaded(message)),
                400 | 422 => Err(ClientError::InvalidInput(message)),
                400..=499 => Ok(RawResult::rejected(message)),
                _ => Err(ClientError::Transport(message)),
            };
        }

        let parsed: RenderResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Protocol(format!("Failed to parse render response: {}", e)))?;

        if parsed.ok {
            parsed
                .url
                .map(RawResult::rendered)
                .ok_or_else(|| ClientError::Protocol("Render response reported ok without a url".to_string()))
        } else {
            Ok(RawResult::Rejected {
                retryable: parsed.retryable,
                error: parsed
                    .error
                    .unwrap_or_else(|| "render service rejected the slide".to_string()),
            })
        }
    }
}
