use crate::ports::SettingsStore;
use crate::state;
use crate::types::catalog::NotificationSettings;

use super::{ApiError, api_error, store_failure};

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

pub(crate) async fn settings_view(
    State(state): State<state::AppState>,
) -> Result<Json<NotificationSettings>, ApiError> {
    match state.store.load_settings().await {
        Ok(Some(settings)) => Ok(Json(settings)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "Notification settings have not been saved yet.",
        )),
        Err(err) => Err(store_failure("settings", err)),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettingsRequest {
    pub(crate) enabled: bool,
    pub(crate) hour: i64,
}

/// Saves `enabled` and `hour`, keeping the stored `lastSent`.
pub(crate) async fn settings_save(
    State(state): State<state::AppState>,
    Json(request): Json<SettingsRequest>,
) -> Result<StatusCode, ApiError> {
    let hour = u8::try_from(request.hour)
        .ok()
        .filter(|hour| *hour <= 23)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "hour must be between 0 and 23."))?;
    state
        .store
        .save_schedule(request.enabled, hour)
        .await
        .map_err(|err| store_failure("settings", err))?;
    tracing::info!(enabled = request.enabled, hour, "notification settings saved");
    Ok(StatusCode::NO_CONTENT)
}
