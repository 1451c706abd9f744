//! Report assembly: trend, top items, detailed period report, dashboard views
//!
//! Every report is a pure function of an order slice and a reference instant.
//! Empty input yields zeroed reports, never an error.

use chrono::{DateTime, TimeZone, Utc, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;

use super::buckets::{bucketize, BucketUnit};
use super::metrics::{aggregate, paid_revenue, Metrics};
use super::ranking::{
    busiest_weekday, hourly_distribution, hourly_revenue, peak_hour, top_selling_items,
    weekday_distribution, HourCount,
};
use crate::models::{MenuItem, Order, OrderStatus};
use crate::money::sum_amounts;

/// One day of the rolling trend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// "Oct 19"
    pub label: String,
    /// "10/19/2026"
    pub full_label: String,
    pub orders: usize,
    pub revenue: Decimal,
}

/// Per-day order counts and paid revenue for the last `days` days
pub fn daily_trend<Tz: TimeZone>(
    orders: &[Order],
    days: usize,
    reference: &DateTime<Tz>,
) -> Vec<TrendPoint> {
    bucketize(orders, BucketUnit::Day, days, reference)
        .into_iter()
        .map(|bucket| TrendPoint {
            orders: bucket.orders.len(),
            revenue: paid_revenue(bucket.orders.iter().copied()),
            label: bucket.label,
            full_label: bucket.full_label,
        })
        .collect()
}

pub fn seven_day_trend<Tz: TimeZone>(orders: &[Order], reference: &DateTime<Tz>) -> Vec<TrendPoint> {
    daily_trend(orders, 7, reference)
}

/// Row of the top items report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopItem {
    pub name: String,
    /// Units sold across paid orders
    pub orders: u64,
    pub revenue: Decimal,
}

pub fn top_items_report(orders: &[Order], limit: usize) -> Vec<TopItem> {
    top_selling_items(orders, limit)
        .into_iter()
        .map(|sales| TopItem {
            name: sales.name,
            orders: sales.quantity,
            revenue: sales.revenue,
        })
        .collect()
}

/// One period of the detailed report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub period: String,
    pub full_period: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Totals across all periods of a detailed report
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_revenue: Decimal,
    pub total_paid_orders: usize,
    pub total_orders: usize,
    /// Mean of per-period revenue, empty periods included
    pub average_revenue_per_period: Decimal,
    pub payment_rate: f64,
}

/// Day/week/month breakdown with a summary row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
    pub unit: BucketUnit,
    pub reference: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub summary: ReportSummary,
}

impl DetailedReport {
    pub fn is_empty(&self) -> bool {
        self.summary.total_orders == 0
    }
}

pub fn detailed_report<Tz: TimeZone>(
    orders: &[Order],
    unit: BucketUnit,
    window: usize,
    reference: &DateTime<Tz>,
) -> DetailedReport {
    let rows: Vec<ReportRow> = bucketize(orders, unit, window, reference)
        .into_iter()
        .map(|bucket| ReportRow {
            metrics: aggregate(bucket.orders.iter().copied()),
            period: bucket.label,
            full_period: bucket.full_label,
            start: bucket.start,
            end: bucket.end,
        })
        .collect();

    let summary = summarize_rows(&rows);
    DetailedReport {
        unit,
        reference: reference.with_timezone(&Utc),
        rows,
        summary,
    }
}

fn summarize_rows(rows: &[ReportRow]) -> ReportSummary {
    let totals = rows
        .iter()
        .fold(Metrics::default(), |acc, row| acc.merge(&row.metrics));

    let average_revenue_per_period = if rows.is_empty() {
        Decimal::ZERO
    } else {
        totals
            .revenue
            .checked_div(Decimal::from(rows.len()))
            .unwrap_or(Decimal::ZERO)
    };

    ReportSummary {
        total_revenue: totals.revenue,
        total_paid_orders: totals.paid_orders,
        total_orders: totals.total_orders,
        average_revenue_per_period,
        payment_rate: totals.payment_rate,
    }
}

/// Header figures of the owner dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_orders: usize,
    pub paid_orders: usize,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    /// Menu items currently available
    pub active_menu_items: usize,
    pub menu_item_count: usize,
    pub todays_orders: usize,
    pub todays_paid_orders: usize,
    pub todays_revenue: Decimal,
    pub pending_orders: usize,
}

pub fn dashboard_overview<Tz: TimeZone>(
    orders: &[Order],
    menu_items: &[MenuItem],
    reference: &DateTime<Tz>,
) -> DashboardOverview {
    let tz = reference.timezone();
    let today = reference.date_naive();

    let overall = aggregate(orders);
    let todays = aggregate(
        orders
            .iter()
            .filter(|order| order.created_at.with_timezone(&tz).date_naive() == today),
    );

    DashboardOverview {
        total_orders: overall.total_orders,
        paid_orders: overall.paid_orders,
        total_revenue: overall.revenue,
        average_order_value: overall.average_order_value,
        active_menu_items: menu_items.iter().filter(|item| item.available).count(),
        menu_item_count: menu_items.len(),
        todays_orders: todays.total_orders,
        todays_paid_orders: todays.paid_orders,
        todays_revenue: todays.revenue,
        pending_orders: orders
            .iter()
            .filter(|order| order.status == OrderStatus::Pending)
            .count(),
    }
}

/// Label used for orders without a table
pub const NO_TABLE: &str = "No Table";

/// Unpaid orders of one table
#[derive(Debug, Clone, Serialize)]
pub struct TableOrders<'a> {
    pub table: String,
    pub orders: Vec<&'a Order>,
}

impl TableOrders<'_> {
    /// Sum of order totals still to be settled (cancelled orders excluded)
    pub fn outstanding(&self) -> Decimal {
        sum_amounts(
            self.orders
                .iter()
                .filter(|order| order.status != OrderStatus::Cancelled)
                .map(|order| order.total_amount),
        )
    }
}

/// Orders not yet paid, grouped by table
///
/// Numeric table numbers come first in ascending order, then any other
/// labels (including "No Table") in first-seen order.
pub fn active_orders_by_table(orders: &[Order]) -> Vec<TableOrders<'_>> {
    let mut groups: Vec<TableOrders<'_>> = Vec::new();

    for order in orders.iter().filter(|order| !order.is_paid()) {
        let table = match order.table_number.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => NO_TABLE,
        };
        match groups.iter_mut().find(|group| group.table == table) {
            Some(group) => group.orders.push(order),
            None => groups.push(TableOrders {
                table: table.to_string(),
                orders: vec![order],
            }),
        }
    }

    // Stable: non-numeric labels keep first-seen order
    groups.sort_by_key(|group| match group.table.parse::<u32>() {
        Ok(n) => (0, n),
        Err(_) => (1, 0),
    });
    groups
}

/// Hour-of-day and weekday patterns
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakHoursReport {
    pub hourly_orders: [usize; 24],
    pub hourly_revenue: [Decimal; 24],
    /// Monday first
    pub weekday_orders: [usize; 7],
    pub peak_hour: Option<HourCount>,
    pub busiest_weekday: Option<Weekday>,
}

pub fn peak_hours_report<Tz: TimeZone>(orders: &[Order], tz: &Tz) -> PeakHoursReport {
    let weekday_orders = weekday_distribution(orders, tz);
    PeakHoursReport {
        hourly_orders: hourly_distribution(orders, tz),
        hourly_revenue: hourly_revenue(orders, tz),
        weekday_orders,
        peak_hour: peak_hour(orders, tz),
        busiest_weekday: busiest_weekday(&weekday_orders).map(|(day, _)| day),
    }
}
