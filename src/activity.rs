use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate};
use serde::Serialize;

use crate::models::{DailyPoint, WeeklyBucket};

pub const DEFAULT_WINDOW_DAYS: u32 = 90;

/// Flattens weekly buckets into one point per day, keeping only days in
/// `[window_end - window_days, window_end]`.
///
/// Dates are UTC calendar dates; `window_end` must be a UTC date as well
/// (`Utc::now().date_naive()`). The result is sorted ascending by date. When
/// overlapping buckets produce the same date, the bucket that comes later in
/// `buckets` wins.
pub fn to_daily_series(
    buckets: &[WeeklyBucket],
    window_end: NaiveDate,
    window_days: u32,
) -> Vec<DailyPoint> {
    let window_start = window_end
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);

    let mut by_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();

    for bucket in buckets {
        let Some(week_start) = DateTime::from_timestamp(bucket.week_start, 0) else {
            continue;
        };
        let week_start = week_start.date_naive();

        for (offset, &count) in (0u64..).zip(bucket.days.iter()) {
            let Some(date) = week_start.checked_add_days(Days::new(offset)) else {
                break;
            };

            if (window_start..=window_end).contains(&date) {
                by_date.insert(date, count);
            }
        }
    }

    by_date
        .into_iter()
        .map(|(date, count)| DailyPoint { date, count })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    pub total_commits: u64,
    pub active_days: usize,
    /// Earliest day with the highest count, if any day had commits.
    pub busiest_day: Option<DailyPoint>,
}

pub fn summarize(series: &[DailyPoint]) -> ActivitySummary {
    let busiest_day = series
        .iter()
        .filter(|p| p.count > 0)
        .fold(None::<DailyPoint>, |best, point| match best {
            Some(b) if b.count >= point.count => Some(b),
            _ => Some(*point),
        });

    ActivitySummary {
        total_commits: series.iter().map(|p| u64::from(p.count)).sum(),
        active_days: series.iter().filter(|p| p.count > 0).count(),
        busiest_day,
    }
}
