//! Order status distribution

use serde::Serialize;

use crate::models::{Order, OrderStatus};

/// Count for one status with its display metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
}

/// Group-by over all six statuses, cancelled included
///
/// Entries always follow `OrderStatus::ALL`, including zero counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDistribution {
    entries: Vec<StatusCount>,
}

impl StatusDistribution {
    pub fn entries(&self) -> &[StatusCount] {
        &self.entries
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        self.entries
            .iter()
            .find(|entry| entry.status == status)
            .map_or(0, |entry| entry.count)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Entries with at least one order, as a pie chart would show them
    pub fn non_empty(&self) -> impl Iterator<Item = &StatusCount> {
        self.entries.iter().filter(|entry| entry.count > 0)
    }
}

pub fn status_distribution<'a, I>(orders: I) -> StatusDistribution
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut counts = [0usize; OrderStatus::ALL.len()];
    for order in orders {
        if let Some(idx) = OrderStatus::ALL.iter().position(|s| *s == order.status) {
            counts[idx] += 1;
        }
    }

    let entries = OrderStatus::ALL
        .iter()
        .zip(counts)
        .map(|(status, count)| StatusCount {
            status: *status,
            label: status.label(),
            color: status.color(),
            count,
        })
        .collect();

    StatusDistribution { entries }
}
