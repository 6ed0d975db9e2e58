use crate::clock;
use crate::ports;

use jiff::tz::TimeZone;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

const RETRY_DELAY: Duration = Duration::from_secs(3600);

pub(crate) struct ScheduledJobHandle {
    pub(crate) started_at: OffsetDateTime,
    handle: JoinHandle<()>,
}

impl ScheduledJobHandle {
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub(crate) fn abort(&self) {
        self.handle.abort();
    }
}

/// Fires a job at the top of every hour on the zone's wall clock.
#[derive(Debug, Clone)]
pub(crate) struct HourlyScheduler<T> {
    time: T,
    zone: TimeZone,
}

impl<T> HourlyScheduler<T>
where
    T: ports::TimeProvider,
{
    pub(crate) fn new(time: T, zone: TimeZone) -> Self {
        Self { time, zone }
    }

    pub(crate) fn spawn<F, Fut>(&self, run: F) -> ScheduledJobHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let time = self.time.clone();
        let zone = self.zone.clone();
        let started_at = time.now();
        let handle = tokio::spawn(async move {
            run_hourly(time, zone, run).await;
        });
        ScheduledJobHandle { started_at, handle }
    }
}

async fn run_hourly<T, F, Fut>(time: T, zone: TimeZone, mut run: F)
where
    T: ports::TimeProvider,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let delay = match clock::until_next_hour(time.now(), &zone) {
            Ok(delay) => delay,
            Err(err) => {
                tracing::error!(error = %err, "failed to compute next hourly run");
                RETRY_DELAY
            }
        };
        tracing::debug!(delay_secs = delay.as_secs(), "waiting for next hourly run");
        time.sleep(delay).await;
        run().await;
    }
}
