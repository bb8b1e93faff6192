//! Local calendar-day bucketing.
//!
//! Day math uses a plain minute offset supplied by the client rather than
//! IANA timezone rules; the offset is an explicit parameter everywhere so the
//! functions stay pure.

use chrono::{DateTime, Duration, Utc};

/// Shift an instant by the timezone offset and truncate to a calendar day.
pub fn to_local_day(instant: DateTime<Utc>, timezone_offset_minutes: i32) -> String {
    let local = instant + Duration::minutes(timezone_offset_minutes as i64);
    local.format("%Y-%m-%d").to_string()
}

/// Last `n` local calendar days, oldest first, ending at the day containing
/// `now`.
pub fn last_n_local_days(now: DateTime<Utc>, n: usize, timezone_offset_minutes: i32) -> Vec<String> {
    (0..n)
        .rev()
        .map(|i| to_local_day(now - Duration::days(i as i64), timezone_offset_minutes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_local_day_shifts_across_midnight() {
        // 01:30 UTC is still the previous day at UTC-8.
        let instant = Utc.with_ymd_and_hms(2025, 3, 10, 1, 30, 0).unwrap();
        assert_eq!(to_local_day(instant, 0), "2025-03-10");
        assert_eq!(to_local_day(instant, -480), "2025-03-09");
        // 23:30 UTC is already the next day at UTC+2.
        let late = Utc.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(to_local_day(late, 120), "2025-03-11");
    }

    #[test]
    fn test_to_local_day_is_stable() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(to_local_day(instant, -300), to_local_day(instant, -300));
    }

    #[test]
    fn test_last_n_local_days_ordering() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let days = last_n_local_days(now, 3, 0);
        assert_eq!(days, vec!["2025-03-08", "2025-03-09", "2025-03-10"]);
    }

    #[test]
    fn test_last_n_local_days_crosses_month_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let days = last_n_local_days(now, 2, 0);
        assert_eq!(days, vec!["2025-02-28", "2025-03-01"]);
    }
}
