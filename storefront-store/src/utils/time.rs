//! 时间工具函数 (UTC)
//!
//! Period boundaries used by statistics. All ranges are half-open
//! `[start, end)`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// 日期开始 (00:00:00 UTC)
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

/// Today: `[00:00, next 00:00)`
pub fn day_range(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_start(now.date_naive());
    (start, start + Duration::days(1))
}

/// ISO week containing `now`, starting Monday
pub fn week_range(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = now.date_naive();
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let start = day_start(monday);
    (start, start + Duration::days(7))
}

/// Calendar month containing `now`
pub fn month_range(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = now.date_naive();
    let first = date.with_day(1).unwrap_or(date);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let end = next.map(day_start).unwrap_or_else(|| day_start(first) + Duration::days(31));
    (day_start(first), end)
}

/// Whether `at` lies in `[start, end)`
pub fn in_range(at: DateTime<Utc>, (start, end): (DateTime<Utc>, DateTime<Utc>)) -> bool {
    at >= start && at < end
}
