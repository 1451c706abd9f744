//! Data file parser with retry on parse failure
//!
//! A data file is a JSON document `{ "menuItems": [...], "orders": [...] }`.
//! Entries are decoded one by one so that a single malformed order does not
//! take the rest of the file down with it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{CoreError, LoadError, LoadReport, LoadSection};
use crate::models::order::validate_lines;
use crate::models::{MenuItem, Order};

/// Typed contents of a data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFile {
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// Untyped envelope, entries checked individually
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataFile {
    #[serde(default)]
    menu_items: Vec<serde_json::Value>,
    #[serde(default)]
    orders: Vec<serde_json::Value>,
}

/// Parser for the bistro data file
pub struct DataFileParser {
    /// Maximum retry attempts
    max_retries: u32,
    /// Delay between retries
    retry_delay: Duration,
}

impl Default for DataFileParser {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl DataFileParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Read and decode the envelope with retry logic
    ///
    /// Retries on failure as the file might be mid-write by another process.
    async fn read_raw(&self, path: &Path) -> Result<RawDataFile, CoreError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, "Retrying data file parse after delay");
                sleep(self.retry_delay).await;
            }

            match self.try_read(path).await {
                Ok(raw) => return Ok(raw),
                // A missing file will not appear by waiting
                Err(e @ CoreError::FileNotFound { .. }) => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "Data file parse attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::FileNotFound {
            path: path.to_path_buf(),
        }))
    }

    /// Single read attempt
    async fn try_read(&self, path: &Path) -> Result<RawDataFile, CoreError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                CoreError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|e| CoreError::JsonParse {
            path: path.to_path_buf(),
            message: e.to_string(),
            source: e,
        })
    }

    /// Parse strictly: any invalid entry fails the whole file
    pub async fn parse(&self, path: &Path) -> Result<DataFile, CoreError> {
        let mut report = LoadReport::new();
        let raw = self.read_raw(path).await?;
        let data = decode_entries(raw, &mut report);

        match report.errors.into_iter().next() {
            Some(first) => Err(CoreError::InvalidDataFile {
                path: path.to_path_buf(),
                message: first.to_string(),
            }),
            None => Ok(data),
        }
    }

    /// Parse with graceful degradation, recording errors in LoadReport
    ///
    /// Invalid entries are skipped with a warning. Returns `None` only when
    /// the file itself cannot be read or is not JSON.
    pub async fn parse_graceful(&self, path: &Path, report: &mut LoadReport) -> Option<DataFile> {
        match self.read_raw(path).await {
            Ok(raw) => Some(decode_entries(raw, report)),
            Err(e) => {
                report.push(LoadError::from_core_error(LoadSection::File, None, &e));
                None
            }
        }
    }
}

fn decode_entries(raw: RawDataFile, report: &mut LoadReport) -> DataFile {
    let mut data = DataFile::default();

    let mut seen = HashSet::new();
    for (idx, value) in raw.menu_items.into_iter().enumerate() {
        let item = match serde_json::from_value::<MenuItem>(value) {
            Ok(item) => item,
            Err(e) => {
                report.push(LoadError::skipped(LoadSection::MenuItems, format!("#{}", idx), e.to_string()));
                continue;
            }
        };
        if let Err(e) = item.validate() {
            report.push(LoadError::from_core_error(LoadSection::MenuItems, Some(&item.id), &e));
            continue;
        }
        if !seen.insert(item.id.clone()) {
            let duplicate = CoreError::DuplicateId { id: item.id.clone() };
            report.push(LoadError::from_core_error(LoadSection::MenuItems, Some(&item.id), &duplicate));
            continue;
        }
        data.menu_items.push(item);
    }
    report.menu_items_loaded += data.menu_items.len();

    let mut seen = HashSet::new();
    for (idx, value) in raw.orders.into_iter().enumerate() {
        let order = match serde_json::from_value::<Order>(value) {
            Ok(order) => order,
            Err(e) => {
                report.push(LoadError::skipped(LoadSection::Orders, format!("#{}", idx), e.to_string()));
                continue;
            }
        };
        if let Err(e) = validate_lines(&order.items, order.total_amount) {
            report.push(
                LoadError::from_core_error(LoadSection::Orders, Some(&order.id), &e)
                    .with_suggestion(format!("Fix or remove order {}", order.id)),
            );
            continue;
        }
        if !seen.insert(order.id.clone()) {
            let duplicate = CoreError::DuplicateId { id: order.id.clone() };
            report.push(LoadError::from_core_error(LoadSection::Orders, Some(&order.id), &duplicate));
            continue;
        }
        data.orders.push(order);
    }
    report.orders_loaded += data.orders.len();

    debug!(
        menu_items = data.menu_items.len(),
        orders = data.orders.len(),
        rejected = report.orders_rejected,
        "Decoded data file"
    );

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"{
        "menuItems": [
            {"id": "m1", "name": "Masala Dosa", "category": "Mains", "price": 120,
             "available": true, "createdAt": "2026-01-01T09:00:00Z"}
        ],
        "orders": [
            {"id": "o1", "customerName": "Table 3", "tableNumber": "3",
             "items": [{"menuItemId": "m1", "menuItemName": "Masala Dosa", "quantity": 2, "price": 120, "total": 240}],
             "totalAmount": 240, "status": "paid", "orderType": "dine-in",
             "takenBy": "asha", "createdAt": "2026-10-19T13:05:00Z"}
        ]
    }"#;

    #[tokio::test]
    async fn test_parse_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", VALID).unwrap();

        let data = DataFileParser::new().parse(file.path()).await.unwrap();
        assert_eq!(data.menu_items.len(), 1);
        assert_eq!(data.orders.len(), 1);
        assert!(data.orders[0].is_paid());
    }

    #[tokio::test]
    async fn test_parse_missing_file() {
        let parser = DataFileParser::new();
        let result = parser.parse(Path::new("/nonexistent/bistro.json")).await;

        assert!(matches!(result, Err(CoreError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_parse_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let parser = DataFileParser::new().with_retries(1, Duration::from_millis(10));
        let result = parser.parse(file.path()).await;

        assert!(matches!(result, Err(CoreError::JsonParse { .. })));
    }

    #[tokio::test]
    async fn test_graceful_skips_bad_orders() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "orders": [
                {{"id": "o1", "customerName": "A", "items": [{{"menuItemId": "m1", "menuItemName": "Tea", "quantity": 1, "price": 2, "total": 2}}],
                  "totalAmount": 2, "status": "pending", "takenBy": "x", "createdAt": "2026-10-19T10:00:00Z"}},
                {{"id": "o2", "customerName": "B", "items": [{{"menuItemId": "m1", "menuItemName": "Tea", "quantity": 1, "price": 2, "total": 2}}],
                  "totalAmount": 5, "status": "pending", "takenBy": "x", "createdAt": "2026-10-19T10:00:00Z"}},
                {{"id": "o3", "customerName": "C", "items": [], "totalAmount": 0,
                  "status": "refunded", "takenBy": "x", "createdAt": "2026-10-19T10:00:00Z"}},
                {{"id": "o1", "customerName": "A", "items": [{{"menuItemId": "m1", "menuItemName": "Tea", "quantity": 1, "price": 2, "total": 2}}],
                  "totalAmount": 2, "status": "paid", "takenBy": "x", "createdAt": "2026-10-19T11:00:00Z"}}
            ]
        }}"#
        )
        .unwrap();

        let parser = DataFileParser::new();
        let mut report = LoadReport::new();
        let data = parser.parse_graceful(file.path(), &mut report).await.unwrap();

        assert_eq!(data.orders.len(), 1);
        assert_eq!(data.orders[0].id, "o1");
        assert_eq!(report.orders_loaded, 1);
        assert_eq!(report.orders_rejected, 3);
        assert!(!report.has_fatal_errors());
        assert_eq!(report.warnings().count(), 3);
        assert_eq!(
            report.skipped_entries(LoadSection::Orders).collect::<Vec<_>>(),
            vec!["o2", "#2", "o1"]
        );

        // Strict parsing refuses the same file
        assert!(parser.parse(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_graceful_skips_oversized_amounts() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "orders": [
                {{"id": "overflow", "customerName": "A", "items": [{{"menuItemId": "m1", "menuItemName": "Thali", "quantity": 3,
                  "price": 40000000000000000000000000000, "total": 40000000000000000000000000000}}],
                  "totalAmount": 40000000000000000000000000000, "status": "paid", "takenBy": "x", "createdAt": "2026-10-19T10:00:00Z"}},
                {{"id": "huge-1", "customerName": "B", "items": [{{"menuItemId": "m1", "menuItemName": "Thali", "quantity": 1,
                  "price": 50000000000000000000000000000, "total": 50000000000000000000000000000}}],
                  "totalAmount": 50000000000000000000000000000, "status": "paid", "takenBy": "x", "createdAt": "2026-10-19T10:00:00Z"}},
                {{"id": "huge-2", "customerName": "C", "items": [{{"menuItemId": "m1", "menuItemName": "Thali", "quantity": 1,
                  "price": 50000000000000000000000000000, "total": 50000000000000000000000000000}}],
                  "totalAmount": 50000000000000000000000000000, "status": "paid", "takenBy": "x", "createdAt": "2026-10-19T10:00:00Z"}},
                {{"id": "ok", "customerName": "D", "items": [{{"menuItemId": "m1", "menuItemName": "Thali", "quantity": 3, "price": 150.5, "total": 451.5}}],
                  "totalAmount": 451.5, "status": "paid", "takenBy": "x", "createdAt": "2026-10-19T10:00:00Z"}}
            ]
        }}"#
        )
        .unwrap();

        let parser = DataFileParser::new();
        let mut report = LoadReport::new();
        let data = parser.parse_graceful(file.path(), &mut report).await.unwrap();

        assert_eq!(data.orders.len(), 1);
        assert_eq!(data.orders[0].id, "ok");
        assert_eq!(data.orders[0].total_amount, rust_decimal::Decimal::new(4515, 1));
        assert_eq!(report.orders_rejected, 3);
        assert!(!report.has_fatal_errors());
        assert_eq!(
            report.skipped_entries(LoadSection::Orders).collect::<Vec<_>>(),
            vec!["overflow", "huge-1", "huge-2"]
        );
    }

    #[tokio::test]
    async fn test_parse_graceful_records_missing_file() {
        let parser = DataFileParser::new();
        let mut report = LoadReport::new();

        let result = parser
            .parse_graceful(Path::new("/nonexistent/bistro.json"), &mut report)
            .await;

        assert!(result.is_none());
        assert!(report.has_fatal_errors());
    }
}
