//! Revenue and order-count metrics
//!
//! Revenue only ever counts `paid` orders. Every other status still counts
//! toward order totals.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Order;
use crate::money::sum_amounts;

/// Aggregate metrics over a set of orders
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_orders: usize,
    pub paid_orders: usize,
    /// Sum of `total_amount` over paid orders, full precision
    pub revenue: Decimal,
    /// revenue / paid_orders, zero when nothing is paid
    pub average_order_value: Decimal,
    /// paid_orders / total_orders as a ratio, zero for an empty set
    pub payment_rate: f64,
}

impl Metrics {
    /// Build metrics from raw counts, deriving average and payment rate
    pub fn from_counts(total_orders: usize, paid_orders: usize, revenue: Decimal) -> Self {
        let average_order_value = if paid_orders > 0 {
            revenue
                .checked_div(Decimal::from(paid_orders))
                .unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };

        let payment_rate = if total_orders > 0 {
            paid_orders as f64 / total_orders as f64
        } else {
            0.0
        };

        Self {
            total_orders,
            paid_orders,
            revenue,
            average_order_value,
            payment_rate,
        }
    }

    /// Combine two metric sets as if their orders had been aggregated together
    pub fn merge(&self, other: &Metrics) -> Metrics {
        Metrics::from_counts(
            self.total_orders + other.total_orders,
            self.paid_orders + other.paid_orders,
            self.revenue.saturating_add(other.revenue),
        )
    }

    pub fn payment_rate_percent(&self) -> f64 {
        self.payment_rate * 100.0
    }

    pub fn is_empty(&self) -> bool {
        self.total_orders == 0
    }
}

/// Compute metrics for any collection of orders
pub fn aggregate<'a, I>(orders: I) -> Metrics
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut total = 0usize;
    let mut paid = 0usize;
    let mut revenue = Decimal::ZERO;

    for order in orders {
        total += 1;
        if order.is_paid() {
            paid += 1;
            revenue = revenue.saturating_add(order.total_amount);
        }
    }

    Metrics::from_counts(total, paid, revenue)
}

/// Sum of paid order totals
pub fn paid_revenue<'a, I>(orders: I) -> Decimal
where
    I: IntoIterator<Item = &'a Order>,
{
    sum_amounts(
        orders
            .into_iter()
            .filter(|order| order.is_paid())
            .map(|order| order.total_amount),
    )
}
