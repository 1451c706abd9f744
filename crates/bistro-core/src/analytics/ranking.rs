//! Ranking: top-N items, hour-of-day and weekday patterns

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::Order;

/// Stable descending sort by `key`, truncated to `n`
///
/// Items with equal keys keep their input order.
pub fn top_n<T, K, F>(mut items: Vec<T>, n: usize, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items.truncate(n);
    items
}

/// Cumulative sales of one menu item over paid orders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSales {
    pub menu_item_id: String,
    /// Name from the first line seen for this item
    pub name: String,
    /// Units sold
    pub quantity: u64,
    pub revenue: Decimal,
}

/// Accumulate paid line items by menu item id, groups in first-seen order
pub fn item_sales<'a, I>(orders: I) -> Vec<ItemSales>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut sales: Vec<ItemSales> = Vec::new();

    for order in orders.into_iter().filter(|order| order.is_paid()) {
        for line in &order.items {
            match index.get(line.menu_item_id.as_str()) {
                Some(&pos) => {
                    let entry = &mut sales[pos];
                    entry.quantity += u64::from(line.quantity);
                    entry.revenue = entry.revenue.saturating_add(line.total);
                }
                None => {
                    index.insert(line.menu_item_id.as_str(), sales.len());
                    sales.push(ItemSales {
                        menu_item_id: line.menu_item_id.clone(),
                        name: line.menu_item_name.clone(),
                        quantity: u64::from(line.quantity),
                        revenue: line.total,
                    });
                }
            }
        }
    }

    sales
}

/// Best sellers by units sold (ties keep first-seen order)
pub fn top_selling_items<'a, I>(orders: I, n: usize) -> Vec<ItemSales>
where
    I: IntoIterator<Item = &'a Order>,
{
    top_n(item_sales(orders), n, |sales| sales.quantity)
}

/// Order count for one hour of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    /// Local hour, 0-23
    pub hour: u32,
    pub count: usize,
}

impl HourCount {
    /// "{hour}:00 with {count} orders"
    pub fn label(&self) -> String {
        format!("{}:00 with {} orders", self.hour, self.count)
    }
}

fn local<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> DateTime<Tz> {
    ts.with_timezone(tz)
}

/// Orders per local hour of day, all statuses
pub fn hourly_distribution<'a, I, Tz>(orders: I, tz: &Tz) -> [usize; 24]
where
    I: IntoIterator<Item = &'a Order>,
    Tz: TimeZone,
{
    let mut counts = [0usize; 24];
    for order in orders {
        counts[local(&order.created_at, tz).hour() as usize] += 1;
    }
    counts
}

/// Busiest hour of day; ties go to the earliest hour
pub fn peak_hour<'a, I, Tz>(orders: I, tz: &Tz) -> Option<HourCount>
where
    I: IntoIterator<Item = &'a Order>,
    Tz: TimeZone,
{
    let counts = hourly_distribution(orders, tz);
    let mut best: Option<HourCount> = None;

    for (hour, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        if best.map_or(true, |b| count > b.count) {
            best = Some(HourCount {
                hour: hour as u32,
                count,
            });
        }
    }

    best
}

/// Paid revenue per local hour of day
pub fn hourly_revenue<'a, I, Tz>(orders: I, tz: &Tz) -> [Decimal; 24]
where
    I: IntoIterator<Item = &'a Order>,
    Tz: TimeZone,
{
    let mut revenue = [Decimal::ZERO; 24];
    for order in orders.into_iter().filter(|order| order.is_paid()) {
        let slot = &mut revenue[local(&order.created_at, tz).hour() as usize];
        *slot = slot.saturating_add(order.total_amount);
    }
    revenue
}

/// Orders per local weekday (0 = Monday, 6 = Sunday)
pub fn weekday_distribution<'a, I, Tz>(orders: I, tz: &Tz) -> [usize; 7]
where
    I: IntoIterator<Item = &'a Order>,
    Tz: TimeZone,
{
    let mut counts = [0usize; 7];
    for order in orders {
        let weekday = local(&order.created_at, tz).weekday();
        counts[weekday.num_days_from_monday() as usize] += 1;
    }
    counts
}

/// Busiest weekday with its order count; ties go to the earlier day
pub fn busiest_weekday(distribution: &[usize; 7]) -> Option<(Weekday, usize)> {
    let (idx, &count) = distribution
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, count)| **count)?;
    if count == 0 {
        return None;
    }
    Weekday::try_from(idx as u8).ok().map(|day| (day, count))
}
