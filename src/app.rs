use crate::adapters::StoreError;
use crate::assets;
use crate::config;
use crate::state;

use axum::Json;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware;
use axum::routing::{any, get, put};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

mod auth;
mod devices;
mod proxy;
mod settings;

pub fn app(config: config::AppConfig) -> Router {
    let state = state::AppState::new(config);
    if state.config.auth_key.is_none() {
        tracing::warn!("no auth key configured: device and settings endpoints are open");
    }

    let chat = Router::new()
        .route("/api/chat", any(proxy::chat_proxy))
        .layer(CorsLayer::permissive());
    let guarded = Router::new()
        .route(
            "/api/devices/{owner}",
            put(devices::device_register).delete(devices::device_remove),
        )
        .route(
            "/api/settings/notifications",
            get(settings::settings_view).put(settings::settings_save),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));
    let household = Router::new()
        .merge(guarded)
        .route("/api/push/public-key", get(devices::push_public_key))
        .layer(household_cors(&state.config.web));

    Router::new()
        .merge(chat)
        .merge(household)
        .route("/firebase-messaging-sw.js", get(assets::service_worker))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// CORS for the household endpoints: only the web app's own origins.
fn household_cors(web: &config::WebConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = web
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%origin, error = %err, "ignoring invalid allowed origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn store_failure(document: &str, err: StoreError) -> ApiError {
    tracing::error!(error = %err, document, "document store failure");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
