//! Order and revenue analytics
//!
//! Buckets orders by day, week and month, aggregates paid revenue and order
//! counts, ranks items and hours, and assembles the reports shown on the
//! owner dashboard. Everything here is synchronous and side-effect free.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::config::ReportConfig;
use crate::store::Snapshot;

pub mod buckets;
pub mod metrics;
pub mod ranking;
pub mod reports;
pub mod status;


pub use buckets::{bucketize, Bucket, BucketUnit};
pub use metrics::{aggregate, paid_revenue, Metrics};
pub use ranking::{
    busiest_weekday, hourly_distribution, hourly_revenue, item_sales, peak_hour, top_n,
    top_selling_items, weekday_distribution, HourCount, ItemSales,
};
pub use reports::{
    active_orders_by_table, daily_trend, dashboard_overview, detailed_report, peak_hours_report,
    seven_day_trend, top_items_report, DashboardOverview, DetailedReport, PeakHoursReport,
    ReportRow, ReportSummary, TableOrders, TopItem, TrendPoint, NO_TABLE,
};
pub use status::{status_distribution, StatusCount, StatusDistribution};

/// Everything the owner dashboard shows, computed from one snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub overview: DashboardOverview,
    pub trend: Vec<TrendPoint>,
    pub top_items: Vec<TopItem>,
    pub status: StatusDistribution,
    /// Reference instant the dashboard was computed for
    pub computed_at: DateTime<Utc>,
}

impl DashboardData {
    /// Compute the dashboard (sync function)
    ///
    /// Cheap enough to run on every change event; callers holding an async
    /// runtime may still offload very large snapshots to `spawn_blocking`.
    pub fn compute<Tz: TimeZone>(
        snapshot: &Snapshot,
        reference: &DateTime<Tz>,
        config: &ReportConfig,
    ) -> Self {
        let orders = &snapshot.orders;

        Self {
            overview: dashboard_overview(orders, &snapshot.menu_items, reference),
            trend: daily_trend(orders, config.trend_days, reference),
            top_items: top_items_report(orders, config.top_items_limit),
            status: status_distribution(orders),
            computed_at: reference.with_timezone(&Utc),
        }
    }
}
