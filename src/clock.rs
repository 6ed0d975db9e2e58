use jiff::Timestamp;
use jiff::tz::TimeZone;
use std::time::Duration;
use time::OffsetDateTime;

/// Wall-clock hour and calendar date in a fixed zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalMoment {
    pub(crate) hour: u8,
    /// `YYYY-MM-DD`
    pub(crate) date: String,
}

pub(crate) fn local_moment(now: OffsetDateTime, zone: &TimeZone) -> Result<LocalMoment, jiff::Error> {
    let zoned = Timestamp::from_nanosecond(now.unix_timestamp_nanos())?.to_zoned(zone.clone());
    Ok(LocalMoment {
        hour: zoned.hour().unsigned_abs(),
        date: zoned.date().to_string(),
    })
}

/// Time left until the next top of the hour on the zone's wall clock.
///
/// Exactly on the hour counts as a full hour away.
pub(crate) fn until_next_hour(now: OffsetDateTime, zone: &TimeZone) -> Result<Duration, jiff::Error> {
    let zoned = Timestamp::from_nanosecond(now.unix_timestamp_nanos())?.to_zoned(zone.clone());
    let elapsed = Duration::from_secs(
        u64::from(zoned.minute().unsigned_abs()) * 60 + u64::from(zoned.second().unsigned_abs()),
    ) + Duration::from_nanos(u64::from(zoned.subsec_nanosecond().unsigned_abs()));
    Ok(Duration::from_secs(3600) - elapsed)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use time::format_description::well_known::Rfc3339;

    fn at(raw: &str) -> OffsetDateTime {
        OffsetDateTime::parse(raw, &Rfc3339).expect("parse timestamp")
    }

    fn new_york() -> TimeZone {
        TimeZone::get("America/New_York").expect("zone")
    }

    #[test]
    fn local_moment__should_use_zone_date_not_utc_date() {
        // Given
        let now = at("2025-01-13T03:30:00Z");

        // When
        let moment = local_moment(now, &new_york()).expect("moment");

        // Then
        assert_eq!(moment.hour, 22);
        assert_eq!(moment.date, "2025-01-12");
    }

    #[test]
    fn local_moment__should_follow_daylight_saving() {
        // Given
        let now = at("2025-07-01T22:00:00Z");

        // When
        let moment = local_moment(now, &new_york()).expect("moment");

        // Then
        assert_eq!(moment.hour, 18);
        assert_eq!(moment.date, "2025-07-01");
    }

    #[test]
    fn until_next_hour__should_count_down_to_top_of_hour() {
        // Given
        let now = at("2025-01-12T09:45:30Z");

        // When
        let delay = until_next_hour(now, &TimeZone::UTC).expect("delay");

        // Then
        assert_eq!(delay, Duration::from_secs(14 * 60 + 30));
    }

    #[test]
    fn until_next_hour__should_respect_half_hour_offsets() {
        // Given
        let zone = TimeZone::get("Asia/Kolkata").expect("zone");
        let now = at("2025-01-12T09:00:00Z");

        // When
        let delay = until_next_hour(now, &zone).expect("delay");

        // Then
        assert_eq!(delay, Duration::from_secs(30 * 60));
    }

    #[test]
    fn until_next_hour__should_wait_full_hour_when_on_the_hour() {
        // Given
        let now = at("2025-01-12T09:00:00Z");

        // Then
        assert_eq!(
            until_next_hour(now, &TimeZone::UTC).expect("delay"),
            Duration::from_secs(3600)
        );
    }
}
