use crate::adapters::{
    AnthropicClient, FcmError, FcmSender, FileStore, ServiceAccount, TokioTimeProvider,
    WebPushSender,
};
use crate::config::{AppConfig, PushBackend};
use crate::ports::PushSender;
use crate::suggestion::{RunOutcome, SuggestionError, SuggestionJob, SuggestionOptions};

mod scheduler;
pub(crate) mod vapid;

use std::sync::Arc;

use scheduler::HourlyScheduler;
pub(crate) use scheduler::ScheduledJobHandle;
pub use vapid::{VapidCredentials, generate_vapid_credentials};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no push backend configured")]
    Disabled,
    #[error(transparent)]
    Fcm(#[from] FcmError),
    #[error("failed to init web-push: {0}")]
    WebPush(#[from] web_push::WebPushError),
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),
}

type FileBackedJob<P> =
    SuggestionJob<TokioTimeProvider, FileStore, FileStore, FileStore, AnthropicClient, P>;

fn build_job<P: PushSender>(config: &AppConfig, sender: P) -> FileBackedJob<P> {
    let store = FileStore::new(&config.data_dir);
    SuggestionJob::new(
        TokioTimeProvider,
        store.clone(),
        store.clone(),
        store,
        AnthropicClient::new(&config.chat),
        sender,
        SuggestionOptions::from_config(config),
    )
}

fn fcm_sender(service_account: &std::path::Path, base_url: &str) -> Result<FcmSender, FcmError> {
    FcmSender::new(ServiceAccount::from_file(service_account)?, base_url)
}

/// Starts the hourly suggestion job, unless no push backend is configured.
pub(crate) fn maybe_start_scheduler(
    config: &AppConfig,
) -> Result<Option<ScheduledJobHandle>, DeliveryError> {
    let handle = match &config.push {
        PushBackend::Disabled => {
            tracing::warn!("dinner suggestions disabled: no push backend configured");
            return Ok(None);
        }
        PushBackend::Fcm {
            service_account,
            base_url,
        } => spawn_hourly(config, fcm_sender(service_account, base_url)?),
        PushBackend::WebPush(vapid) => spawn_hourly(config, WebPushSender::new(vapid.clone())?),
    };
    Ok(Some(handle))
}

fn spawn_hourly<P: PushSender>(config: &AppConfig, sender: P) -> ScheduledJobHandle {
    let job = Arc::new(build_job(config, sender));
    let scheduler = HourlyScheduler::new(TokioTimeProvider, config.time_zone.clone());
    let handle = scheduler.spawn(move || {
        let job = Arc::clone(&job);
        async move {
            match job.run().await {
                Ok(RunOutcome::Sent(report)) => tracing::info!(
                    date = %report.date,
                    delivered = report.delivered,
                    failed = report.failed,
                    pruned = report.pruned.len(),
                    "hourly run delivered a suggestion"
                ),
                Ok(RunOutcome::Skipped(_)) => {}
                Err(err) => tracing::error!(error = %err, "hourly suggestion run failed"),
            }
        }
    });
    tracing::info!(started_at = %handle.started_at, "hourly suggestion job scheduled");
    handle
}

/// Runs the suggestion job a single time, for use from an external trigger.
pub async fn run_once(config: &AppConfig) -> Result<RunOutcome, DeliveryError> {
    let outcome = match &config.push {
        PushBackend::Disabled => return Err(DeliveryError::Disabled),
        PushBackend::Fcm {
            service_account,
            base_url,
        } => {
            build_job(config, fcm_sender(service_account, base_url)?)
                .run()
                .await?
        }
        PushBackend::WebPush(vapid) => {
            build_job(config, WebPushSender::new(vapid.clone())?)
                .run()
                .await?
        }
    };
    Ok(outcome)
}
