use std::time::Duration;

use time::OffsetDateTime;

/// Wall clock and timer used by the hourly scheduler and the suggestion job.
///
/// `now` is always UTC; callers convert into the configured zone.
pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep(&self, duration: Duration) -> Self::Sleep<'_>;
}
