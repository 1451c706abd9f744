//! Data store with DashMap + parking_lot::RwLock
//!
//! Holds the working copy of menu items and orders. Consumers never aggregate
//! over the live maps: they take a [`Snapshot`] and compute from that.

use anyhow::Context;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DataStoreConfig;
use crate::error::{CoreError, DegradedState, LoadReport};
use crate::event::{ChangeKind, DataEvent, EventBus};
use crate::export::export_snapshot_to_json;
use crate::models::{MenuItem, MenuItemUpdate, NewMenuItem, NewOrder, Order, OrderStatus};
use crate::parsers::{DataFile, DataFileParser};

/// Immutable copy of the store contents at one point in time
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Newest first
    pub orders: Vec<Order>,
    /// Newest first
    pub menu_items: Vec<MenuItem>,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot, ordering both collections newest first
    pub fn new(mut orders: Vec<Order>, mut menu_items: Vec<MenuItem>) -> Self {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        menu_items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Self {
            orders,
            menu_items,
            taken_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.menu_items.is_empty()
    }
}

/// Persistent-store interface for menu items and orders
///
/// Every failed mutation is returned as a distinct `CoreError`; nothing is
/// applied partially. Successful mutations publish a `DataEvent`.
pub trait OrderStore {
    fn list_menu_items(&self) -> Vec<MenuItem>;

    /// All orders, newest first
    fn list_orders(&self) -> Vec<Order>;

    fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CoreError>;

    fn update_menu_item(&self, id: &str, update: MenuItemUpdate) -> Result<MenuItem, CoreError>;

    /// Removes the item from the menu; orders keep their line snapshots
    fn delete_menu_item(&self, id: &str) -> Result<(), CoreError>;

    /// Validate and store an order with its lines, status `pending`
    fn insert_order(&self, order: NewOrder) -> Result<Order, CoreError>;

    /// Any status is accepted, transitions are not enforced
    fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Order, CoreError>;

    /// Permanently remove a non-paid order
    fn delete_order(&self, id: &str) -> Result<(), CoreError>;

    /// Change feed keyed by entity type
    fn subscribe(&self) -> broadcast::Receiver<DataEvent>;

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.list_orders(), self.list_menu_items())
    }
}

/// Central data store for bistro
///
/// Thread-safe access to menu items and orders. Uses DashMap for the entity
/// maps and RwLock for the low-contention health state.
pub struct DataStore {
    /// Backing data file, if any
    data_path: Option<PathBuf>,

    config: DataStoreConfig,

    menu_items: DashMap<String, MenuItem>,

    orders: DashMap<String, Order>,

    /// Event bus for notifying subscribers
    event_bus: EventBus,

    /// Current degraded state
    degraded_state: RwLock<DegradedState>,
}

impl DataStore {
    /// Create a new data store
    pub fn new(data_path: Option<PathBuf>, config: DataStoreConfig) -> Self {
        Self {
            data_path,
            event_bus: EventBus::new(config.event_capacity),
            config,
            menu_items: DashMap::new(),
            orders: DashMap::new(),
            degraded_state: RwLock::new(DegradedState::Healthy),
        }
    }

    /// Create with default configuration
    pub fn with_defaults(data_path: Option<PathBuf>) -> Self {
        Self::new(data_path, DataStoreConfig::default())
    }

    /// Store without a backing file
    pub fn in_memory() -> Self {
        Self::with_defaults(None)
    }

    /// Get the event bus for subscribing to updates
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn data_path(&self) -> Option<&Path> {
        self.data_path.as_deref()
    }

    /// Get current degraded state
    pub fn degraded_state(&self) -> DegradedState {
        self.degraded_state.read().clone()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn menu_item_count(&self) -> usize {
        self.menu_items.len()
    }

    pub fn get_order(&self, id: &str) -> Option<Order> {
        self.orders.get(id).map(|r| r.value().clone())
    }

    pub fn get_menu_item(&self, id: &str) -> Option<MenuItem> {
        self.menu_items.get(id).map(|r| r.value().clone())
    }

    /// Initial load of the backing file with LoadReport for graceful degradation
    pub async fn initial_load(&self) -> LoadReport {
        let report = match self.data_path.clone() {
            Some(path) => {
                info!(path = %path.display(), "Starting initial data load");
                self.load_from_file(&path).await
            }
            None => {
                debug!("No data file configured, starting empty");
                LoadReport::new()
            }
        };

        self.event_bus.publish(DataEvent::LoadCompleted);

        info!(
            menu_items = report.menu_items_loaded,
            orders = report.orders_loaded,
            rejected = report.orders_rejected,
            errors = report.errors.len(),
            "Initial load complete"
        );

        report
    }

    /// Load a data file, replacing the current contents
    ///
    /// When the file cannot be read at all the current contents are kept and
    /// the store turns read-only.
    pub async fn load_from_file(&self, path: &Path) -> LoadReport {
        let parser = DataFileParser::new()
            .with_retries(self.config.parse_retries, self.config.retry_delay);

        let mut report = LoadReport::new();
        if let Some(data) = parser.parse_graceful(path, &mut report).await {
            self.replace_all(data);
        }

        self.update_degraded_state(&report);
        report
    }

    /// Reload the backing file (called by the watcher)
    pub async fn reload(&self) -> Option<LoadReport> {
        let path = self.data_path.clone()?;
        let report = self.load_from_file(&path).await;

        if report.has_fatal_errors() {
            warn!(path = %path.display(), "Reload failed, keeping previous data");
        } else {
            self.event_bus.publish(DataEvent::DataReloaded);
            debug!(
                orders = report.orders_loaded,
                menu_items = report.menu_items_loaded,
                "Data reloaded"
            );
        }

        Some(report)
    }

    /// Swap the whole contents for those of a data file
    pub fn replace_all(&self, data: DataFile) {
        self.menu_items.clear();
        self.orders.clear();

        for item in data.menu_items {
            self.menu_items.insert(item.id.clone(), item);
        }
        for order in data.orders {
            self.orders.insert(order.id.clone(), order);
        }

        debug!(
            menu_items = self.menu_items.len(),
            orders = self.orders.len(),
            "Store contents replaced"
        );
    }

    /// Check that writing the store back cannot lose entries
    ///
    /// Anything but a clean load blocks write-back: skipped entries exist only
    /// in the file, and an unreadable file must not be replaced.
    pub fn ensure_writable(&self) -> Result<(), CoreError> {
        match self.degraded_state() {
            DegradedState::Healthy => Ok(()),
            DegradedState::PartialData { reason, .. } | DegradedState::ReadOnly { reason } => {
                Err(CoreError::WriteBlocked { reason })
            }
        }
    }

    /// Write the current contents back to the data file
    pub fn save(&self) -> anyhow::Result<()> {
        let path = self
            .data_path
            .as_deref()
            .context("Store has no data file to save to")?;
        self.ensure_writable()?;

        export_snapshot_to_json(&self.snapshot(), path)?;
        info!(path = %path.display(), orders = self.orders.len(), "Data file saved");
        Ok(())
    }

    /// Insert a validated order with an explicit creation time
    ///
    /// Used when importing historical orders; `insert_order` stamps `now`.
    pub fn insert_order_at(&self, order: NewOrder, created_at: DateTime<Utc>) -> Result<Order, CoreError> {
        order.validate()?;

        let stored = order.into_order(Uuid::new_v4().to_string(), created_at);
        self.orders.insert(stored.id.clone(), stored.clone());

        debug!(order_id = %stored.id, total = %stored.total_amount, "Order inserted");
        self.publish_order(&stored.id, ChangeKind::Inserted);
        Ok(stored)
    }

    /// Update degraded state based on load report
    fn update_degraded_state(&self, report: &LoadReport) {
        let mut state = self.degraded_state.write();

        if report.has_fatal_errors() {
            *state = DegradedState::ReadOnly {
                reason: "Data file could not be loaded".to_string(),
            };
            return;
        }

        let skipped = report.errors.len();
        *state = if skipped == 0 {
            DegradedState::Healthy
        } else {
            DegradedState::PartialData {
                rejected: report.orders_rejected,
                reason: format!("{} entries skipped while loading", skipped),
            }
        };
    }

    fn publish_order(&self, id: &str, change: ChangeKind) {
        self.event_bus.publish(DataEvent::OrderChanged {
            id: id.to_string(),
            change,
        });
    }

    fn publish_menu_item(&self, id: &str, change: ChangeKind) {
        self.event_bus.publish(DataEvent::MenuItemChanged {
            id: id.to_string(),
            change,
        });
    }
}

impl OrderStore for DataStore {
    fn list_menu_items(&self) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self.menu_items.iter().map(|r| r.value().clone()).collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        items
    }

    fn list_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.iter().map(|r| r.value().clone()).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        orders
    }

    fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CoreError> {
        item.validate()?;

        let stored = item.into_menu_item(Uuid::new_v4().to_string(), Utc::now());
        self.menu_items.insert(stored.id.clone(), stored.clone());

        debug!(menu_item_id = %stored.id, name = %stored.name, "Menu item inserted");
        self.publish_menu_item(&stored.id, ChangeKind::Inserted);
        Ok(stored)
    }

    fn update_menu_item(&self, id: &str, update: MenuItemUpdate) -> Result<MenuItem, CoreError> {
        let updated = {
            let mut entry = self
                .menu_items
                .get_mut(id)
                .ok_or_else(|| CoreError::MenuItemNotFound {
                    menu_item_id: id.to_string(),
                })?;
            let updated = update.apply_to(entry.value())?;
            *entry.value_mut() = updated.clone();
            updated
        };

        debug!(menu_item_id = %id, "Menu item updated");
        self.publish_menu_item(id, ChangeKind::Updated);
        Ok(updated)
    }

    fn delete_menu_item(&self, id: &str) -> Result<(), CoreError> {
        self.menu_items
            .remove(id)
            .ok_or_else(|| CoreError::MenuItemNotFound {
                menu_item_id: id.to_string(),
            })?;

        debug!(menu_item_id = %id, "Menu item deleted");
        self.publish_menu_item(id, ChangeKind::Deleted);
        Ok(())
    }

    fn insert_order(&self, order: NewOrder) -> Result<Order, CoreError> {
        self.insert_order_at(order, Utc::now())
    }

    fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Order, CoreError> {
        let updated = {
            let mut entry = self
                .orders
                .get_mut(id)
                .ok_or_else(|| CoreError::OrderNotFound {
                    order_id: id.to_string(),
                })?;
            let previous = entry.status;
            entry.value_mut().status = status;
            debug!(order_id = %id, from = %previous, to = %status, "Order status updated");
            entry.value().clone()
        };

        self.publish_order(id, ChangeKind::Updated);
        Ok(updated)
    }

    fn delete_order(&self, id: &str) -> Result<(), CoreError> {
        // Check and remove under one shard lock
        let removed = self.orders.remove_if(id, |_, order| !order.is_paid());

        if removed.is_none() {
            return Err(if self.orders.contains_key(id) {
                CoreError::PaidOrderLocked {
                    order_id: id.to_string(),
                }
            } else {
                CoreError::OrderNotFound {
                    order_id: id.to_string(),
                }
            });
        }

        debug!(order_id = %id, "Order deleted");
        self.publish_order(id, ChangeKind::Deleted);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.event_bus.subscribe()
    }
}
