use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaResetInfo {
    /// RFC3339 timestamp of the next reset, in the reference zone's offset.
    pub reset_time: String,
    pub hours_until_reset: i64,
    pub minutes_until_reset: i64,
    pub formatted: String,
}

/// Next local midnight in `tz` strictly after `now`.
pub fn next_midnight(now: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    let local = now.with_timezone(&tz);
    let mut date = local.date_naive();
    loop {
        date = date.succ_opt().unwrap_or(date);
        let naive = date.and_time(NaiveTime::MIN);
        // DST gaps can swallow midnight; fall back to the earliest valid instant.
        if let Some(midnight) = tz.from_local_datetime(&naive).earliest() {
            return midnight;
        }
        if let Some(shifted) = tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
        {
            return shifted;
        }
    }
}

pub fn next_reset_after(now: DateTime<Utc>, tz: Tz) -> QuotaResetInfo {
    let reset = next_midnight(now, tz);
    let until = reset.with_timezone(&Utc) - now;
    let total_secs = until.num_seconds().max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    QuotaResetInfo {
        reset_time: reset.to_rfc3339(),
        hours_until_reset: hours,
        minutes_until_reset: minutes,
        formatted: format!("{}h {}m", hours, minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;

    #[test]
    fn reset_is_next_pacific_midnight() {
        // 2024-01-15 20:30 UTC is 12:30 PST
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 20, 30, 0).unwrap();
        let info = next_reset_after(now, Los_Angeles);
        assert_eq!(info.reset_time, "2024-01-16T00:00:00-08:00");
        assert_eq!(info.hours_until_reset, 11);
        assert_eq!(info.minutes_until_reset, 30);
        assert_eq!(info.formatted, "11h 30m");
    }

    #[test]
    fn reset_at_exact_midnight_rolls_to_following_day() {
        // 08:00 UTC on a winter day is exactly midnight in Los Angeles
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let reset = next_midnight(now, Los_Angeles);
        assert_eq!(reset.to_rfc3339(), "2024-01-16T00:00:00-08:00");
    }

    #[test]
    fn reset_respects_daylight_saving_offset() {
        let now = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap();
        let info = next_reset_after(now, Los_Angeles);
        assert_eq!(info.reset_time, "2024-07-05T00:00:00-07:00");
        assert_eq!(info.hours_until_reset, 19);
        assert_eq!(info.minutes_until_reset, 0);
    }

    #[test]
    fn reset_in_utc_zone() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        let info = next_reset_after(now, chrono_tz::UTC);
        assert_eq!(info.hours_until_reset, 0);
        assert_eq!(info.minutes_until_reset, 1);
    }
}
