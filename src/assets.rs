use crate::state::AppState;
use crate::templates;

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub(crate) async fn service_worker(State(state): State<AppState>) -> Response {
    let web = &state.config.web;
    let template = templates::ServiceWorkerTemplate {
        app_name: &web.app_name,
        app_path: &web.app_path,
        icon_url: &web.icon_url,
        badge_url: &web.badge_url,
        link: &web.link,
    };
    match template.render() {
        Ok(script) => (
            [
                ("content-type", "application/javascript"),
                ("cache-control", "no-cache"),
            ],
            script,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to render service worker");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
