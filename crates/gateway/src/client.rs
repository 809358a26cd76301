//! `reqwest` implementation of [`CompletionProvider`].

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::messages::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::CompletionProvider;

pub const DEFAULT_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for one gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL without the trailing `/chat/completions`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct GatewayClient {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Return the response unchanged on 2xx, otherwise a
    /// [`GatewayError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for GatewayClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GatewayError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let response = Self::ensure_success(response).await.inspect_err(|e| {
            tracing::error!(error = %e, "AI gateway returned an error");
        })?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        body.first_content()
            .ok_or_else(|| GatewayError::InvalidResponse("response has no message content".into()))
    }
}
