use crate::adapters::ChatError;
use crate::state;
use crate::types::chat::ChatRequest;

use super::ErrorResponse;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error(transparent)]
    Upstream(#[from] ChatError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::InvalidBody(_) | ProxyError::Upstream(_) => {
                tracing::error!(error = %self, "chat proxy failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Relays a browser chat request to the Messages API with the server's key.
///
/// Only `model`, `max_tokens`, `system` and `messages` are forwarded. The
/// upstream body comes back untouched with a 200, even when it is an API error.
pub(crate) async fn chat_proxy(
    State(state): State<state::AppState>,
    method: Method,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    if method != Method::POST {
        return Err(ProxyError::MethodNotAllowed);
    }
    let request = if body.is_empty() {
        ChatRequest::default()
    } else {
        ChatRequest::from_body(&serde_json::from_slice::<Value>(&body)?)
    };
    let response = state.chat.forward(&request).await?;
    Ok(Json(response))
}
