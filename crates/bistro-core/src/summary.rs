//! Flat snapshot summary for the assistant context
//!
//! The summary is rendered into a fixed text template. Field order and labels
//! are stable so the rendered block can be compared verbatim.

use chrono::TimeZone;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::analytics::{aggregate, peak_hour, status_distribution, top_selling_items};
use crate::analytics::{HourCount, ItemSales, StatusDistribution};
use crate::config::ReportConfig;
use crate::models::{MenuItem, Order};
use crate::money::format_money;

const ASSISTANT_PREAMBLE: &str = "You are an AI restaurant business analyst assistant. \
You have access to real restaurant data and should provide insights, suggestions, \
and analysis based on the following data:";

const ASSISTANT_TOPICS: [&str; 6] = [
    "Menu optimization suggestions",
    "Peak hour staffing recommendations",
    "Revenue improvement strategies",
    "Popular vs underperforming items",
    "Operational efficiency tips",
    "Customer service improvements",
];

const ASSISTANT_CLOSING: &str = "Be concise, actionable, and data-driven in your responses. \
Use the actual data provided to give specific recommendations.";

/// Aggregate view of the whole order history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSummary {
    pub total_orders: usize,
    pub paid_orders: usize,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub top_items: Vec<ItemSales>,
    pub peak_hour: Option<HourCount>,
    /// "{hour}:00 with {count} orders", or "No data"
    pub peak_hour_label: String,
    pub menu_item_count: usize,
    pub status_distribution: StatusDistribution,
}

/// Summarize orders and menu; `top_limit` caps the ranked item list
pub fn summarize<Tz: TimeZone>(
    orders: &[Order],
    menu_items: &[MenuItem],
    tz: &Tz,
    top_limit: usize,
) -> RestaurantSummary {
    let metrics = aggregate(orders);
    let peak = peak_hour(orders, tz);

    RestaurantSummary {
        total_orders: metrics.total_orders,
        paid_orders: metrics.paid_orders,
        total_revenue: metrics.revenue,
        average_order_value: metrics.average_order_value,
        top_items: top_selling_items(orders, top_limit),
        peak_hour_label: peak.map_or_else(|| "No data".to_string(), |p| p.label()),
        peak_hour: peak,
        menu_item_count: menu_items.len(),
        status_distribution: status_distribution(orders),
    }
}

impl RestaurantSummary {
    /// Render the data block: header metrics, top items, status counts
    pub fn render_context(&self, currency: &str, item_limit: usize) -> String {
        let mut lines = vec![
            "Restaurant Analytics Data:".to_string(),
            format!("- Total Orders: {}", self.total_orders),
            format!("- Total Revenue: {}", format_money(currency, self.total_revenue)),
            format!(
                "- Average Order Value: {}",
                format_money(currency, self.average_order_value)
            ),
            format!("- Total Menu Items: {}", self.menu_item_count),
            format!("- Peak Hour: {}", self.peak_hour_label),
            String::new(),
            "Top Selling Items:".to_string(),
        ];

        lines.extend(self.top_items.iter().take(item_limit).enumerate().map(|(i, item)| {
            format!(
                "{}. {} - {} orders, {} revenue",
                i + 1,
                item.name,
                item.quantity,
                format_money(currency, item.revenue)
            )
        }));

        lines.push(String::new());
        lines.push("Order Status Distribution:".to_string());
        lines.extend(
            self.status_distribution
                .entries()
                .iter()
                .map(|entry| format!("- {}: {}", entry.label, entry.count)),
        );

        lines.join("\n")
    }
}

/// Full system prompt handed to the assistant collaborator
pub fn assistant_system_prompt(summary: &RestaurantSummary, config: &ReportConfig) -> String {
    let topics: Vec<String> = ASSISTANT_TOPICS
        .iter()
        .map(|topic| format!("- {}", topic))
        .collect();

    format!(
        "{}\n\n{}\n\nProvide helpful insights about:\n{}\n\n{}",
        ASSISTANT_PREAMBLE,
        summary.render_context(&config.currency_symbol, config.prompt_top_items),
        topics.join("\n"),
        ASSISTANT_CLOSING
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderLineItem, OrderStatus, OrderType};
    use chrono::{DateTime, Utc};

    fn order(id: &str, status: OrderStatus, at: &str, lines: &[(&str, &str, u32, i64)]) -> Order {
        let items: Vec<OrderLineItem> = lines
            .iter()
            .map(|(item_id, name, qty, price)| OrderLineItem {
                menu_item_id: item_id.to_string(),
                menu_item_name: name.to_string(),
                quantity: *qty,
                price: Decimal::from(*price),
                total: Decimal::from(*price) * Decimal::from(*qty),
            })
            .collect();
        Order {
            id: id.to_string(),
            customer_name: "Table 1".to_string(),
            customer_phone: String::new(),
            table_number: Some("1".to_string()),
            total_amount: items.iter().map(|l| l.total).sum(),
            items,
            status,
            order_type: OrderType::DineIn,
            notes: String::new(),
            taken_by: "staff".to_string(),
            created_at: at.parse::<DateTime<Utc>>().unwrap(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], &[], &Utc, 10);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.average_order_value, Decimal::ZERO);
        assert_eq!(summary.peak_hour_label, "No data");
        assert!(summary.top_items.is_empty());
        assert_eq!(summary.status_distribution.total(), 0);
    }

    #[test]
    fn test_render_context_layout() {
        let orders = vec![
            order("o1", OrderStatus::Paid, "2026-10-19T12:10:00Z", &[("m1", "Dosa", 2, 60)]),
            order("o2", OrderStatus::Pending, "2026-10-19T12:40:00Z", &[("m2", "Chai", 1, 20)]),
            order("o3", OrderStatus::Paid, "2026-10-19T19:00:00Z", &[("m2", "Chai", 3, 20)]),
        ];
        let summary = summarize(&orders, &[], &Utc, 10);

        let expected = "Restaurant Analytics Data:\n\
- Total Orders: 3\n\
- Total Revenue: ₹180.00\n\
- Average Order Value: ₹90.00\n\
- Total Menu Items: 0\n\
- Peak Hour: 12:00 with 2 orders\n\
\n\
Top Selling Items:\n\
1. Chai - 3 orders, ₹60.00 revenue\n\
2. Dosa - 2 orders, ₹120.00 revenue\n\
\n\
Order Status Distribution:\n\
- Pending: 1\n\
- Preparing: 0\n\
- Ready: 0\n\
- Delivered: 0\n\
- Paid: 2\n\
- Cancelled: 0";

        assert_eq!(summary.render_context("₹", 5), expected);
    }

    #[test]
    fn test_render_context_truncates_items() {
        let orders: Vec<Order> = (0..8)
            .map(|i| {
                let item_id = format!("m{}", i);
                let name = format!("Dish {}", i);
                order(
                    &format!("o{}", i),
                    OrderStatus::Paid,
                    "2026-10-19T12:00:00Z",
                    &[(item_id.as_str(), name.as_str(), 1, 10)],
                )
            })
            .collect();
        let summary = summarize(&orders, &[], &Utc, 10);
        assert_eq!(summary.top_items.len(), 8);

        let rendered = summary.render_context("₹", 5);
        assert!(rendered.contains("5. Dish 4 - 1 orders"));
        assert!(!rendered.contains("6. Dish 5"));
    }

    #[test]
    fn test_system_prompt_wraps_context() {
        let summary = summarize(&[], &[], &Utc, 10);
        let prompt = assistant_system_prompt(&summary, &ReportConfig::default());

        assert!(prompt.starts_with("You are an AI restaurant business analyst assistant."));
        assert!(prompt.contains("\n\nRestaurant Analytics Data:\n- Total Orders: 0\n"));
        assert!(prompt.contains("Provide helpful insights about:\n- Menu optimization suggestions\n"));
        assert!(prompt.ends_with("give specific recommendations."));
    }
}
