pub mod adapters;
pub mod app;
mod assets;
pub mod auth;
mod clock;
pub mod config;
pub mod ports;
pub mod push;
pub mod state;
pub mod suggestion;
mod templates;
pub mod types;

pub use app::app;
pub use auth::{AuthKey, generate_auth_key};
pub use push::{DeliveryError, generate_vapid_credentials, run_once};
pub use suggestion::RunOutcome;

/// Starts the hourly job and serves the HTTP API until the listener fails.
pub async fn serve(config: config::AppConfig) -> std::io::Result<()> {
    let scheduler = push::maybe_start_scheduler(&config).map_err(std::io::Error::other)?;
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!(addr = %config.listen, data_dir = %config.data_dir.display(), "listening");
    let result = axum::serve(listener, app(config)).await;
    if let Some(scheduler) = scheduler
        && !scheduler.is_finished()
    {
        scheduler.abort();
    }
    result
}
