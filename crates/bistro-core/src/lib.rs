//! bistro-core - Core library for bistro
//!
//! Provides the order and menu model, the reporting engine (bucketing,
//! metrics, ranking, reports), the assistant summary, CSV export, and the
//! in-memory store with its event bus, data-file parser and file watcher.

pub mod analytics;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod models;
pub mod money;
pub mod parsers;
pub mod store;
pub mod summary;
pub mod watcher;

pub use analytics::{BucketUnit, DashboardData, DetailedReport, Metrics};
pub use config::{DataStoreConfig, ReportConfig};
pub use error::{CoreError, DegradedState, LoadReport};
pub use event::{ChangeKind, DataEvent, EventBus};
pub use export::{export_report_to_csv, export_snapshot_to_json, report_file_name, write_report_csv};
pub use store::{DataStore, OrderStore, Snapshot};
pub use summary::{assistant_system_prompt, summarize, RestaurantSummary};
pub use watcher::{FileWatcher, WatcherConfig};
