use crate::config::ChatConfig;
use crate::ports::{BoxFuture, ChatCompleter};
use crate::types::chat::{ChatRequest, ChatResponse};

use serde_json::Value;

const MESSAGES_PATH: &str = "/v1/messages";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Client for the Anthropic Messages API holding the server-side key.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl AnthropicClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}{MESSAGES_PATH}", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
        }
    }

    /// Posts the request and returns the upstream JSON whatever its status.
    pub async fn forward(&self, request: &ChatRequest) -> Result<Value, ChatError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.json::<Value>().await?;
        if !status.is_success() {
            tracing::warn!(%status, "chat API returned an error response");
        }
        Ok(body)
    }
}

impl ChatCompleter for AnthropicClient {
    type Error = ChatError;
    type Fut<'a>
        = BoxFuture<'a, Result<ChatResponse, ChatError>>
    where
        Self: 'a;

    fn complete<'a>(&'a self, request: &'a ChatRequest) -> Self::Fut<'a> {
        Box::pin(async move { self.forward(request).await.map(ChatResponse) })
    }
}
