//! Time bucketing of orders into day, week and month periods
//!
//! All calendar math happens in the timezone of the reference instant; bucket
//! boundaries are reported back in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::models::Order;

/// Width of a reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketUnit {
    Day,
    Week,
    Month,
}

impl BucketUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketUnit::Day => "day",
            BucketUnit::Week => "week",
            BucketUnit::Month => "month",
        }
    }

    /// Trailing periods shown by the detailed report
    pub fn default_window(&self) -> usize {
        match self {
            BucketUnit::Day => 30,
            BucketUnit::Week => 12,
            BucketUnit::Month => 12,
        }
    }

    /// Largest window accepted, about ten years of days or weeks
    pub fn max_window(&self) -> usize {
        match self {
            BucketUnit::Day => 3660,
            BucketUnit::Week => 522,
            BucketUnit::Month => 1200,
        }
    }

    /// Report title, e.g. "Daily Report"
    pub fn display_name(&self) -> &'static str {
        match self {
            BucketUnit::Day => "Daily",
            BucketUnit::Week => "Weekly",
            BucketUnit::Month => "Monthly",
        }
    }
}

impl fmt::Display for BucketUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(BucketUnit::Day),
            "week" | "weekly" => Ok(BucketUnit::Week),
            "month" | "monthly" => Ok(BucketUnit::Month),
            _ => Err(CoreError::InvalidUnit {
                value: s.to_string(),
            }),
        }
    }
}

/// One reporting period and the orders that fall into it
#[derive(Debug, Clone)]
pub struct Bucket<'a> {
    /// Short label ("Oct 19", "Week Oct 12", "Oct 2026")
    pub label: String,
    /// Long label used by exports ("10/19/2026", "October 2026", ...)
    pub full_label: String,
    pub start: DateTime<Utc>,
    /// Inclusive end of the period
    pub end: DateTime<Utc>,
    pub orders: Vec<&'a Order>,
}

impl Bucket<'_> {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Partition orders into `window` trailing buckets ending at `reference`
///
/// Buckets come back oldest first. `window` is capped at
/// [`BucketUnit::max_window`]. Orders outside the covered range are left
/// out silently. Day and month membership compares local calendar fields;
/// week membership compares instants against inclusive boundaries computed
/// independently per week, so adjacent weeks are not guaranteed to partition
/// the timeline.
pub fn bucketize<'a, Tz: TimeZone>(
    orders: &'a [Order],
    unit: BucketUnit,
    window: usize,
    reference: &DateTime<Tz>,
) -> Vec<Bucket<'a>> {
    let max = unit.max_window();
    if window > max {
        debug!(unit = %unit, requested = window, max, "Window capped");
    }
    let window = window.min(max);

    let buckets = match unit {
        BucketUnit::Day => day_buckets(orders, window, reference),
        BucketUnit::Week => week_buckets(orders, window, reference),
        BucketUnit::Month => month_buckets(orders, window, reference),
    };

    let placed: usize = buckets.iter().map(|b| b.orders.len()).sum();
    if placed < orders.len() {
        trace!(
            unit = %unit,
            excluded = orders.len() - placed,
            "Orders outside the bucket window"
        );
    }

    buckets
}

fn day_buckets<'a, Tz: TimeZone>(
    orders: &'a [Order],
    window: usize,
    reference: &DateTime<Tz>,
) -> Vec<Bucket<'a>> {
    let tz = reference.timezone();
    let today = reference.date_naive();

    (0..window)
        .rev()
        .map(|i| {
            let date = today - Duration::days(i as i64);
            let next = date + Duration::days(1);
            let start = local_to_utc(&tz, date.and_time(NaiveTime::MIN));
            let end = local_to_utc(&tz, next.and_time(NaiveTime::MIN)) - Duration::milliseconds(1);

            let members = orders
                .iter()
                .filter(|order| order.created_at.with_timezone(&tz).date_naive() == date)
                .collect();

            Bucket {
                label: date.format("%b %-d").to_string(),
                full_label: date.format("%-m/%-d/%Y").to_string(),
                start,
                end,
                orders: members,
            }
        })
        .collect()
}

fn week_buckets<'a, Tz: TimeZone>(
    orders: &'a [Order],
    window: usize,
    reference: &DateTime<Tz>,
) -> Vec<Bucket<'a>> {
    let tz = reference.timezone();
    let local = reference.naive_local();
    let since_sunday = i64::from(reference.weekday().num_days_from_sunday());

    (0..window)
        .rev()
        .map(|i| {
            // Start keeps the reference wall-clock time
            let start_local = local - Duration::days(since_sunday + 7 * i as i64);
            let end_local = start_local + Duration::days(6);
            let start = local_to_utc(&tz, start_local);
            let end = local_to_utc(&tz, end_local);

            let members = orders
                .iter()
                .filter(|order| start <= order.created_at && order.created_at <= end)
                .collect();

            Bucket {
                label: format!("Week {}", start_local.format("%b %-d")),
                full_label: format!(
                    "{} - {}",
                    start_local.format("%-m/%-d/%Y"),
                    end_local.format("%-m/%-d/%Y")
                ),
                start,
                end,
                orders: members,
            }
        })
        .collect()
}

fn month_buckets<'a, Tz: TimeZone>(
    orders: &'a [Order],
    window: usize,
    reference: &DateTime<Tz>,
) -> Vec<Bucket<'a>> {
    let tz = reference.timezone();
    let reference_month = reference.year() * 12 + reference.month0() as i32;

    (0..window)
        .rev()
        .filter_map(|i| {
            let first = month_start(reference_month - i as i32)?;
            let next = month_start(reference_month - i as i32 + 1)?;
            let start = local_to_utc(&tz, first.and_time(NaiveTime::MIN));
            let end = local_to_utc(&tz, next.and_time(NaiveTime::MIN)) - Duration::milliseconds(1);

            let members = orders
                .iter()
                .filter(|order| {
                    let local = order.created_at.with_timezone(&tz);
                    local.year() == first.year() && local.month() == first.month()
                })
                .collect();

            Some(Bucket {
                label: first.format("%b %Y").to_string(),
                full_label: first.format("%B %Y").to_string(),
                start,
                end,
                orders: members,
            })
        })
        .collect()
}

/// First day of a month given as `year * 12 + month0`
fn month_start(month_index: i32) -> Option<NaiveDate> {
    let year = month_index.div_euclid(12);
    let month = month_index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Resolve a local wall-clock time to UTC
///
/// Ambiguous times take the earlier instant. Times inside a DST gap are
/// shifted forward by an hour.
fn local_to_utc<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}
