//! Terminal rendering for bistro commands
//!
//! Every formatter produces either a comfy-table rendering or pretty JSON.

use bistro_core::analytics::{
    DashboardData, DashboardOverview, DetailedReport, PeakHoursReport, StatusDistribution,
    TableOrders, TopItem, TrendPoint,
};
use bistro_core::error::{ErrorSeverity, LoadReport};
use bistro_core::money::{format_money, format_percent};
use chrono::Weekday;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Row, Table};
use serde::Serialize;

// ============================================================================
// Shared helpers
// ============================================================================

/// Pretty JSON for `--format json`
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn new_table(headers: &[&str], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn right(value: impl ToString) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

/// Parse a `#RRGGBB` chart color
fn hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

// ============================================================================
// Dashboard
// ============================================================================

pub fn format_overview(overview: &DashboardOverview, currency: &str, no_color: bool) -> String {
    let mut table = new_table(&["Metric", "Value"], no_color);
    let rows: Vec<(&str, String)> = vec![
        ("Total orders", overview.total_orders.to_string()),
        ("Paid orders", overview.paid_orders.to_string()),
        ("Total revenue", format_money(currency, overview.total_revenue)),
        (
            "Average order value",
            format_money(currency, overview.average_order_value),
        ),
        ("Today's orders", overview.todays_orders.to_string()),
        ("Today's revenue", format_money(currency, overview.todays_revenue)),
        ("Pending orders", overview.pending_orders.to_string()),
        (
            "Menu items available",
            format!("{} of {}", overview.active_menu_items, overview.menu_item_count),
        ),
    ];

    for (label, value) in rows {
        table.add_row(Row::from(vec![Cell::new(label), right(value)]));
    }
    table.to_string()
}

/// Overview, trend, top items and status breakdown in one page
pub fn format_dashboard(data: &DashboardData, currency: &str, no_color: bool) -> String {
    [
        format_overview(&data.overview, currency, no_color),
        format!(
            "Last {} days\n{}",
            data.trend.len(),
            format_trend(&data.trend, currency, no_color)
        ),
        format!(
            "Top items\n{}",
            format_top_items(&data.top_items, currency, no_color)
        ),
        format!("Orders by status\n{}", format_status(&data.status, no_color)),
    ]
    .join("\n\n")
}

pub fn format_trend(points: &[TrendPoint], currency: &str, no_color: bool) -> String {
    let mut table = new_table(&["Day", "Date", "Orders", "Revenue"], no_color);
    for point in points {
        table.add_row(Row::from(vec![
            Cell::new(&point.label),
            Cell::new(&point.full_label),
            right(point.orders),
            right(format_money(currency, point.revenue)),
        ]));
    }
    table.to_string()
}

pub fn format_top_items(items: &[TopItem], currency: &str, no_color: bool) -> String {
    if items.is_empty() {
        return "No paid orders yet.".to_string();
    }

    let mut table = new_table(&["#", "Item", "Sold", "Revenue"], no_color);
    for (i, item) in items.iter().enumerate() {
        table.add_row(Row::from(vec![
            right(i + 1),
            Cell::new(&item.name),
            right(item.orders),
            right(format_money(currency, item.revenue)),
        ]));
    }
    table.to_string()
}

pub fn format_status(distribution: &StatusDistribution, no_color: bool) -> String {
    let total = distribution.total();
    let mut table = new_table(&["Status", "Orders", "Share"], no_color);

    for entry in distribution.entries() {
        let label = match hex_color(entry.color) {
            Some(color) if !no_color => Cell::new(entry.label).fg(color),
            _ => Cell::new(entry.label),
        };
        let share = if total > 0 {
            format_percent(entry.count as f64 / total as f64)
        } else {
            "-".to_string()
        };
        table.add_row(Row::from(vec![label, right(entry.count), right(share)]));
    }
    table.to_string()
}

// ============================================================================
// Reports
// ============================================================================

/// Period table followed by the totals block
pub fn format_report(report: &DetailedReport, currency: &str, no_color: bool) -> String {
    let mut table = new_table(
        &[
            "Period",
            "Dates",
            "Orders",
            "Paid",
            "Revenue",
            "Avg Order",
            "Paid Rate",
        ],
        no_color,
    );

    for row in &report.rows {
        let metrics = &row.metrics;
        table.add_row(Row::from(vec![
            Cell::new(&row.period),
            Cell::new(&row.full_period),
            right(metrics.total_orders),
            right(metrics.paid_orders),
            right(format_money(currency, metrics.revenue)),
            right(format_money(currency, metrics.average_order_value)),
            right(format_percent(metrics.payment_rate)),
        ]));
    }

    let summary = &report.summary;
    let lines = [
        format!(
            "{} report, {} periods ending {}",
            report.unit.display_name(),
            report.rows.len(),
            report.reference.format("%Y-%m-%d")
        ),
        table.to_string(),
        format!(
            "Total revenue:        {}",
            format_money(currency, summary.total_revenue)
        ),
        format!(
            "Orders:               {} ({} paid)",
            summary.total_orders, summary.total_paid_orders
        ),
        format!(
            "Revenue per period:   {}",
            format_money(currency, summary.average_revenue_per_period)
        ),
        format!("Payment rate:         {}", format_percent(summary.payment_rate)),
    ];
    lines.join("\n")
}

pub fn format_peak_hours(report: &PeakHoursReport, currency: &str, no_color: bool) -> String {
    let mut table = new_table(&["Hour", "Orders", "Paid Revenue"], no_color);
    let busy_hours = report
        .hourly_orders
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0);
    for (hour, count) in busy_hours {
        table.add_row(Row::from(vec![
            Cell::new(format!("{:02}:00", hour)),
            right(count),
            right(format_money(currency, report.hourly_revenue[hour])),
        ]));
    }

    let weekdays: Vec<String> = report
        .weekday_orders
        .iter()
        .enumerate()
        .filter_map(|(i, count)| {
            let day = Weekday::try_from(i as u8).ok()?;
            Some(format!("{} {}", day, count))
        })
        .collect();

    let peak = report
        .peak_hour
        .map_or_else(|| "No data".to_string(), |p| p.label());
    let busiest = report
        .busiest_weekday
        .map_or_else(|| "No data".to_string(), |d| d.to_string());

    [
        table.to_string(),
        format!("By weekday:      {}", weekdays.join(", ")),
        format!("Peak hour:       {}", peak),
        format!("Busiest weekday: {}", busiest),
    ]
    .join("\n")
}

pub fn format_tables(groups: &[TableOrders<'_>], currency: &str, no_color: bool) -> String {
    if groups.is_empty() {
        return "No active orders.".to_string();
    }

    let mut table = new_table(&["Table", "Orders", "Statuses", "Outstanding"], no_color);
    for group in groups {
        let statuses: Vec<&str> = group.orders.iter().map(|o| o.status.label()).collect();
        table.add_row(Row::from(vec![
            Cell::new(&group.table),
            right(group.orders.len()),
            Cell::new(statuses.join(", ")),
            right(format_money(currency, group.outstanding())),
        ]));
    }
    table.to_string()
}

// ============================================================================
// Load diagnostics
// ============================================================================

/// One line per load problem, `None` when the load was clean
pub fn format_load_issues(report: &LoadReport) -> Option<String> {
    if !report.has_errors() {
        return None;
    }

    let lines: Vec<String> = report
        .errors
        .iter()
        .map(|error| {
            let tag = match error.severity {
                ErrorSeverity::Warning => "skipped",
                ErrorSeverity::Fatal => "fatal",
            };
            format!("  [{}] {}", tag, error)
        })
        .collect();

    Some(lines.join("\n"))
}

// ============================================================================
// Tests
// ============================================================================
