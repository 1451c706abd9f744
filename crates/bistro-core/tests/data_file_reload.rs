//! Integration tests for loading, writing back and reloading the data file

use bistro_core::config::DataStoreConfig;
use bistro_core::models::{NewMenuItem, OrderDraft, OrderStatus};
use bistro_core::{
    export_snapshot_to_json, CoreError, DataEvent, DataStore, DegradedState, FileWatcher,
    OrderStore, WatcherConfig,
};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn fast_config() -> DataStoreConfig {
    DataStoreConfig {
        parse_retries: 1,
        retry_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

/// Write a data file with one menu item and `orders` pending orders
fn write_seed_file(path: &Path, orders: usize) {
    let store = DataStore::in_memory();
    let item = store
        .insert_menu_item(NewMenuItem {
            name: "Veg Biryani".to_string(),
            category: "Rice".to_string(),
            price: Decimal::new(18050, 2),
            description: "Dum cooked".to_string(),
            available: true,
        })
        .unwrap();

    for i in 0..orders {
        let mut draft = OrderDraft::new();
        draft.add_item(&item);
        let order = draft.into_new_order(&(i + 1).to_string(), "ravi").unwrap();
        store.insert_order(order).unwrap();
    }

    export_snapshot_to_json(&store.snapshot(), path).unwrap();
}

/// One loadable order and one whose total does not match its lines
const PARTIAL_FILE: &str = r#"{
    "menuItems": [],
    "orders": [
        {"id": "ok", "customerName": "Table 1", "tableNumber": "1",
         "items": [{"menuItemId": "m1", "menuItemName": "Lassi", "quantity": 2, "price": 60, "total": 120}],
         "totalAmount": 120, "status": "ready", "takenBy": "ravi", "createdAt": "2026-10-19T08:00:00Z"},
        {"id": "bad-total", "customerName": "Table 2", "tableNumber": "2",
         "items": [{"menuItemId": "m1", "menuItemName": "Lassi", "quantity": 1, "price": 60, "total": 60}],
         "totalAmount": 90, "status": "paid", "takenBy": "ravi", "createdAt": "2026-10-19T09:00:00Z"}
    ]
}"#;

#[tokio::test]
async fn test_initial_load_round_trips_written_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bistro-data.json");
    write_seed_file(&path, 3);

    let store = DataStore::new(Some(path.clone()), fast_config());
    let report = store.initial_load().await;

    assert!(!report.has_errors());
    assert_eq!(report.orders_loaded, 3);
    assert_eq!(report.menu_items_loaded, 1);
    assert_eq!(store.order_count(), 3);
    assert!(store.degraded_state().is_healthy());

    let snapshot = store.snapshot();
    assert_eq!(snapshot.menu_items[0].price, Decimal::new(18050, 2));
    assert!(snapshot
        .orders
        .iter()
        .all(|o| o.status == OrderStatus::Pending && o.total_amount == Decimal::new(18050, 2)));
}

#[tokio::test]
async fn test_status_change_survives_write_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bistro-data.json");
    write_seed_file(&path, 2);

    let store = DataStore::new(Some(path.clone()), fast_config());
    store.initial_load().await;
    let id = store.list_orders()[0].id.clone();

    store.update_order_status(&id, OrderStatus::Paid).unwrap();
    store.save().unwrap();

    let reloaded = DataStore::new(Some(path), fast_config());
    reloaded.initial_load().await;
    assert_eq!(reloaded.get_order(&id).map(|o| o.status), Some(OrderStatus::Paid));
    assert_eq!(reloaded.order_count(), 2);
}

#[tokio::test]
async fn test_missing_file_makes_store_read_only() {
    let dir = tempdir().unwrap();
    let store = DataStore::new(Some(dir.path().join("absent.json")), fast_config());

    let report = store.initial_load().await;

    assert!(report.has_fatal_errors());
    assert_eq!(store.order_count(), 0);
    assert!(store.degraded_state().is_read_only());
    assert!(store.save().is_err());
    assert!(!dir.path().join("absent.json").exists());
}

#[tokio::test]
async fn test_reload_keeps_previous_data_on_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bistro-data.json");
    write_seed_file(&path, 2);

    let store = DataStore::new(Some(path.clone()), fast_config());
    store.initial_load().await;
    let mut events = store.subscribe();

    std::fs::write(&path, "{ \"orders\": [ truncated").unwrap();
    let report = store.reload().await.unwrap();

    assert!(report.has_fatal_errors());
    assert_eq!(store.order_count(), 2);
    assert!(store.degraded_state().is_read_only());
    assert!(events.try_recv().is_err());

    // A good file brings the store back
    write_seed_file(&path, 4);
    store.reload().await.unwrap();
    assert_eq!(store.order_count(), 4);
    assert!(store.degraded_state().is_healthy());
    assert!(matches!(events.try_recv(), Ok(DataEvent::DataReloaded)));
}

#[tokio::test]
async fn test_rejected_orders_mark_partial_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bistro-data.json");
    std::fs::write(&path, PARTIAL_FILE).unwrap();

    let store = DataStore::new(Some(path), fast_config());
    let report = store.initial_load().await;

    assert_eq!(report.orders_loaded, 1);
    assert_eq!(report.orders_rejected, 1);
    assert!(matches!(
        store.degraded_state(),
        DegradedState::PartialData { rejected: 1, .. }
    ));
    assert!(store.get_order("bad-total").is_none());
}

#[tokio::test]
async fn test_partial_load_refuses_write_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bistro-data.json");
    std::fs::write(&path, PARTIAL_FILE).unwrap();

    let store = DataStore::new(Some(path.clone()), fast_config());
    store.initial_load().await;
    assert!(matches!(
        store.ensure_writable(),
        Err(CoreError::WriteBlocked { .. })
    ));

    // The in-memory change is allowed, persisting it is not
    store.update_order_status("ok", OrderStatus::Paid).unwrap();
    let err = store.save().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::WriteBlocked { .. })
    ));

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert_eq!(on_disk, PARTIAL_FILE);
    assert!(on_disk.contains("bad-total"));

    // Once the file is fixed and reloaded, saving works again
    std::fs::write(&path, PARTIAL_FILE.replace("\"totalAmount\": 90", "\"totalAmount\": 60")).unwrap();
    store.reload().await.unwrap();
    assert!(store.degraded_state().is_healthy());
    store.update_order_status("ok", OrderStatus::Paid).unwrap();
    store.save().unwrap();

    let reloaded = DataStore::new(Some(path), fast_config());
    let report = reloaded.initial_load().await;
    assert_eq!(report.orders_loaded, 2);
    assert_eq!(reloaded.get_order("ok").map(|o| o.status), Some(OrderStatus::Paid));
    assert!(reloaded.get_order("bad-total").is_some());
}

#[tokio::test]
async fn test_write_back_keeps_exact_amounts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bistro-data.json");
    let price: Decimal = "12.345678901234567891".parse().unwrap();

    let store = DataStore::new(Some(path.clone()), fast_config());
    let item = store
        .insert_menu_item(NewMenuItem {
            name: "Saffron Kulfi".to_string(),
            category: "Desserts".to_string(),
            price,
            description: String::new(),
            available: true,
        })
        .unwrap();
    let mut draft = OrderDraft::new();
    draft.add_item(&item);
    draft.set_quantity(&item.id, 3);
    let order = store
        .insert_order(draft.into_new_order("4", "ravi").unwrap())
        .unwrap();
    assert_eq!(order.total_amount, price * Decimal::from(3));

    store.save().unwrap();

    let reloaded = DataStore::new(Some(path), fast_config());
    let report = reloaded.initial_load().await;
    assert_eq!(report.orders_rejected, 0);
    assert!(reloaded.degraded_state().is_healthy());
    assert_eq!(reloaded.get_menu_item(&item.id).map(|m| m.price), Some(price));

    let order = reloaded.get_order(&order.id).unwrap();
    assert_eq!(order.items[0].price, price);
    assert_eq!(order.items[0].total, "37.037036703703703673".parse::<Decimal>().unwrap());
    assert_eq!(order.total_amount, order.items[0].total);
}

#[tokio::test]
async fn test_watcher_reloads_on_external_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bistro-data.json");
    write_seed_file(&path, 1);

    let store = Arc::new(DataStore::new(Some(path.clone()), fast_config()));
    store.initial_load().await;
    let mut events = store.subscribe();

    let watcher = FileWatcher::start(
        Arc::clone(&store),
        WatcherConfig {
            debounce_delay: Duration::from_millis(50),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Give the backend a moment to register the watch
    tokio::time::sleep(Duration::from_millis(200)).await;
    write_seed_file(&path, 5);

    let reloaded = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(DataEvent::DataReloaded) => break true,
                Ok(_) => continue,
                Err(_) => break false,
            }
        }
    })
    .await
    .unwrap_or(false);

    watcher.stop().await;

    assert!(reloaded, "watcher did not pick up the rewrite");
    assert_eq!(store.order_count(), 5);
}
