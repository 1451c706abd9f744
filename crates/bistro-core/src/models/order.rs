//! Order model: status lifecycle, line items and the order-taking draft
//!
//! Orders are created once (status `pending`) and afterwards only change status.
//! Line items carry a denormalized name and price snapshot so that later menu
//! edits never rewrite historical revenue.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::models::menu::MenuItem;
use crate::money::{max_amount, sum_amounts};

/// Order status lifecycle
///
/// `Paid` and `Cancelled` are effectively terminal; the other states are moved
/// forward by staff. Only `Paid` orders contribute to revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in display order
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Paid,
        OrderStatus::Cancelled,
    ];

    /// Wire representation ("pending", "paid", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Capitalized display label
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Paid => "Paid",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Chart color (hex) used by the status distribution
    pub fn color(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "#F59E0B",
            OrderStatus::Preparing => "#3B82F6",
            OrderStatus::Ready => "#10B981",
            OrderStatus::Delivered => "#6B7280",
            OrderStatus::Paid => "#059669",
            OrderStatus::Cancelled => "#EF4444",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Paid and cancelled orders are no longer worked on by staff
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lower)
            .ok_or_else(|| CoreError::InvalidStatus {
                value: s.to_string(),
            })
    }
}

/// How the order is served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    #[default]
    #[serde(rename = "dine-in")]
    DineIn,
    #[serde(rename = "takeaway")]
    Takeaway,
    #[serde(rename = "delivery")]
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine-in",
            OrderType::Takeaway => "takeaway",
            OrderType::Delivery => "delivery",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order, priced at order time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub menu_item_id: String,
    pub menu_item_name: String,
    pub quantity: u32,
    /// Unit price snapshot
    pub price: Decimal,
    /// quantity × price
    pub total: Decimal,
}

impl OrderLineItem {
    /// Build a line from the current menu price
    pub fn from_menu_item(item: &MenuItem, quantity: u32) -> Self {
        Self {
            menu_item_id: item.id.clone(),
            menu_item_name: item.name.clone(),
            quantity,
            price: item.price,
            total: item.price.saturating_mul(Decimal::from(quantity)),
        }
    }

    /// Recompute the line total after a quantity change
    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total = self.price.saturating_mul(Decimal::from(quantity));
    }
}

/// A customer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    pub items: Vec<OrderLineItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub notes: String,
    pub taken_by: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }

    /// Number of units across all lines
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// Payload for creating a new order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub table_number: Option<String>,
    pub items: Vec<OrderLineItem>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub notes: String,
    pub taken_by: String,
}

impl NewOrder {
    /// Structural checks applied at the store boundary
    ///
    /// The reporting engine assumes these hold and never re-verifies them.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_lines(&self.items, self.total_amount)
    }

    /// Materialize into a stored order (always starts as `pending`)
    pub fn into_order(self, id: String, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            table_number: self.table_number,
            items: self.items,
            total_amount: self.total_amount,
            status: OrderStatus::Pending,
            order_type: self.order_type,
            notes: self.notes,
            taken_by: self.taken_by,
            created_at,
        }
    }
}

/// Shared validation for new orders and orders read from a data file
pub(crate) fn validate_lines(items: &[OrderLineItem], total_amount: Decimal) -> Result<(), CoreError> {
    if items.is_empty() {
        return Err(CoreError::InvalidOrder {
            reason: "order has no line items".to_string(),
        });
    }

    for line in items {
        if line.quantity == 0 {
            return Err(CoreError::InvalidOrder {
                reason: format!("line '{}' has zero quantity", line.menu_item_name),
            });
        }
        if line.price < Decimal::ZERO {
            return Err(CoreError::InvalidOrder {
                reason: format!("line '{}' has a negative price", line.menu_item_name),
            });
        }
        if line.price > max_amount() || line.total > max_amount() {
            return Err(CoreError::InvalidOrder {
                reason: format!("line '{}' exceeds the amount limit", line.menu_item_name),
            });
        }
        let expected = line.price.checked_mul(Decimal::from(line.quantity));
        if expected != Some(line.total) {
            return Err(CoreError::InvalidOrder {
                reason: format!(
                    "line '{}' total {} does not equal {} x {}",
                    line.menu_item_name, line.total, line.quantity, line.price
                ),
            });
        }
    }

    let sum = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.total))
        .filter(|sum| *sum <= max_amount())
        .ok_or_else(|| CoreError::InvalidOrder {
            reason: "order total exceeds the amount limit".to_string(),
        })?;
    if sum != total_amount {
        return Err(CoreError::InvalidOrder {
            reason: format!("order total {} does not match line sum {}", total_amount, sum),
        });
    }

    Ok(())
}

/// Order being composed at the table, before it is placed
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    lines: Vec<OrderLineItem>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a menu item (increments an existing line)
    pub fn add_item(&mut self, item: &MenuItem) {
        match self.lines.iter_mut().find(|line| line.menu_item_id == item.id) {
            Some(line) => {
                let quantity = line.quantity.saturating_add(1);
                line.set_quantity(quantity);
            }
            None => self.lines.push(OrderLineItem::from_menu_item(item, 1)),
        }
    }

    /// Set the quantity of a line; zero removes it
    pub fn set_quantity(&mut self, menu_item_id: &str, quantity: u32) {
        if quantity == 0 {
            self.lines.retain(|line| line.menu_item_id != menu_item_id);
            return;
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.menu_item_id == menu_item_id)
        {
            line.set_quantity(quantity);
        }
    }

    pub fn lines(&self) -> &[OrderLineItem] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> Decimal {
        sum_amounts(self.lines.iter().map(|line| line.total))
    }

    /// Turn the draft into a dine-in order for a table
    pub fn into_new_order(
        self,
        table_number: &str,
        taken_by: impl Into<String>,
    ) -> Result<NewOrder, CoreError> {
        let table = table_number.trim();
        if self.lines.is_empty() {
            return Err(CoreError::InvalidOrder {
                reason: "draft has no items".to_string(),
            });
        }
        if table.is_empty() {
            return Err(CoreError::InvalidOrder {
                reason: "table number is required".to_string(),
            });
        }

        let total_amount = self.total();
        Ok(NewOrder {
            customer_name: format!("Table {}", table),
            customer_phone: String::new(),
            table_number: Some(table.to_string()),
            items: self.lines,
            total_amount,
            order_type: OrderType::DineIn,
            notes: String::new(),
            taken_by: taken_by.into(),
        })
    }
}
