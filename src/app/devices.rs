use crate::adapters::StoreError;
use crate::config::PushBackend;
use crate::ports::DeviceRegistry;
use crate::state;
use crate::types::catalog::RegisteredDevice;

use super::{ApiError, api_error, store_failure};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceRequest {
    #[serde(default)]
    pub(crate) token: String,
}

pub(crate) async fn device_register(
    State(state): State<state::AppState>,
    Path(owner): Path<String>,
    Json(request): Json<DeviceRequest>,
) -> Result<StatusCode, ApiError> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "token is required."));
    }
    let device = RegisteredDevice {
        token: token.to_string(),
        owner: owner.clone(),
        updated_at: Some(OffsetDateTime::now_utc()),
    };
    state
        .store
        .upsert_device(&owner, &device)
        .await
        .map_err(device_failure)?;
    tracing::info!(%owner, "device registered");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn device_remove(
    State(state): State<state::AppState>,
    Path(owner): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_devices(std::slice::from_ref(&owner))
        .await
        .map_err(device_failure)?;
    tracing::info!(%owner, "device removed");
    Ok(StatusCode::NO_CONTENT)
}

fn device_failure(err: StoreError) -> ApiError {
    match err {
        StoreError::InvalidId(_) => api_error(StatusCode::BAD_REQUEST, err.to_string()),
        other => store_failure("device", other),
    }
}

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

/// VAPID key browsers need to subscribe when the Web Push backend is active.
pub(crate) async fn push_public_key(
    State(state): State<state::AppState>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    match &state.config.push {
        PushBackend::WebPush(vapid) => Ok(Json(PublicKeyResponse {
            public_key: vapid.public_key.clone(),
        })),
        PushBackend::Fcm { .. } | PushBackend::Disabled => Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Web Push is not configured.",
        )),
    }
}
