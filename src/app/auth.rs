use crate::state;

use super::api_error;

use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Lets a request through only with a valid `Authorization: Bearer` token,
/// unless no auth key is configured.
pub(crate) async fn require_auth(
    State(state): State<state::AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(key) = state.config.auth_key.as_ref() else {
        return next.run(req).await;
    };

    let verified = bearer_token(req.headers()).map(|token| key.verify_token(token));
    match verified {
        Some(Ok(subject)) => {
            tracing::debug!(%subject, path = req.uri().path(), "authorized request");
            next.run(req).await
        }
        Some(Err(err)) => {
            tracing::warn!(error = %err, "rejected bearer token");
            api_error(StatusCode::UNAUTHORIZED, "unauthorized").into_response()
        }
        None => api_error(StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
