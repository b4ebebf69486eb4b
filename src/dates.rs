use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::models::{DateRange, Timestamped};

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Keeps records whose instant lies within the range, preserving input order.
///
/// Bounds are compared as midnight UTC instants, so an end date of `2025-12-08`
/// drops anything later than `2025-12-08T00:00:00Z`.
pub fn filter_by_date_range<'a, T: Timestamped>(items: &'a [T], range: &DateRange) -> Vec<&'a T> {
    let start = range.start_date.map(day_start);
    let end = range.end_date.map(day_start);

    items
        .iter()
        .filter(|item| {
            let at = item.created_at();
            if start.is_some_and(|start| start > at) {
                return false;
            }
            if end.is_some_and(|end| end < at) {
                return false;
            }
            true
        })
        .collect()
}

/// `YYYY-MM-DD` portion of a UTC timestamp.
pub fn day_key(at: DateTime<Utc>) -> String {
    at.date_naive().format("%Y-%m-%d").to_string()
}

/// Buckets records by UTC calendar day. Keys iterate in ascending day order and
/// each bucket keeps the input order.
pub fn group_by_day<'a, T, I>(items: I) -> BTreeMap<String, Vec<&'a T>>
where
    T: Timestamped + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut grouped: BTreeMap<String, Vec<&'a T>> = BTreeMap::new();
    for item in items {
        grouped.entry(day_key(item.created_at())).or_default().push(item);
    }
    grouped
}

/// The equal-length window ending the day before `range` starts.
/// Open ranges have no previous period and yield an open range.
pub fn previous_period_range(range: &DateRange) -> DateRange {
    let Some((start, end)) = range.bounds() else {
        return DateRange::all_time();
    };

    let period_days = (end - start).num_days();
    let previous_end = start - Duration::days(1);
    let previous_start = previous_end - Duration::days(period_days);

    DateRange::new(Some(previous_start), Some(previous_end))
}

/// Percent change from `previous` to `current`, rounded to the nearest integer.
pub fn calculate_change(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }
    (((current - previous) / previous) * 100.0).round() as i64
}

/// "Dec 8 - Dec 14", or "All Time" when either bound is open.
pub fn format_period(range: &DateRange) -> String {
    match range.bounds() {
        Some((start, end)) => format!("{} - {}", start.format("%b %-d"), end.format("%b %-d")),
        None => "All Time".to_string(),
    }
}

/// Rounded integer percentage of `part` over `whole`; 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// Rounded mean of the given millisecond durations; 0 for an empty input.
pub fn mean_ms<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u64
}
