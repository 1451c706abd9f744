//! Error types for bistro-core
//!
//! Provides a single error hierarchy with thiserror plus a load report for
//! graceful degradation when reading data files.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for bistro operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // ===================
    // Parse Errors
    // ===================
    #[error("Failed to parse JSON in {path}: {message}")]
    JsonParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid entry in data file {path}: {message}")]
    InvalidDataFile { path: PathBuf, message: String },

    #[error("Unknown order status: {value}")]
    InvalidStatus { value: String },

    #[error("Unknown report unit: {value} (expected day, week or month)")]
    InvalidUnit { value: String },

    // ===================
    // Store Errors
    // ===================
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("Menu item not found: {menu_item_id}")]
    MenuItemNotFound { menu_item_id: String },

    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("Invalid menu item: {reason}")]
    InvalidMenuItem { reason: String },

    #[error("Order {order_id} is paid and can no longer be removed")]
    PaidOrderLocked { order_id: String },

    #[error("Duplicate id in data file: {id}")]
    DuplicateId { id: String },

    #[error("Data file not written: {reason}; fix the file and reload first")]
    WriteBlocked { reason: String },

    // ===================
    // Watch Errors
    // ===================
    #[error("File watcher error: {message}")]
    WatchError {
        message: String,
        #[source]
        source: Option<notify::Error>,
    },
}

impl CoreError {
    /// True for failures reported by the store for a specific entity
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::OrderNotFound { .. }
                | CoreError::MenuItemNotFound { .. }
                | CoreError::FileNotFound { .. }
        )
    }
}

/// Part of the data file a load problem was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSection {
    /// The file as a whole (missing, unreadable, not JSON)
    File,
    MenuItems,
    Orders,
}

impl LoadSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadSection::File => "data file",
            LoadSection::MenuItems => "menu item",
            LoadSection::Orders => "order",
        }
    }
}

impl fmt::Display for LoadSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a load problem cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// One entry was skipped, the rest loaded
    Warning,
    /// Nothing could be loaded
    Fatal,
}

/// One problem found while loading the data file
#[derive(Debug, Clone)]
pub struct LoadError {
    pub section: LoadSection,
    /// Entry id, or `#index` when the entry had no readable id
    pub entry: Option<String>,
    pub message: String,
    pub severity: ErrorSeverity,
    /// Actionable suggestion for user (optional)
    pub suggestion: Option<String>,
}

impl LoadError {
    /// An entry that was dropped while the rest of the file loaded
    pub fn skipped(section: LoadSection, entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section,
            entry: Some(entry.into()),
            message: message.into(),
            severity: ErrorSeverity::Warning,
            suggestion: None,
        }
    }

    /// Add an actionable suggestion to this error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Describe a CoreError raised for one entry (or for the whole file)
    pub fn from_core_error(section: LoadSection, entry: Option<&str>, error: &CoreError) -> Self {
        let (message, suggestion) = match error {
            CoreError::FileNotFound { path } => (
                format!("Data file not found: {}", path.display()),
                Some("Pass --data <file> or set BISTRO_DATA".to_string()),
            ),
            CoreError::FileRead { path, .. } => (
                format!("Cannot read file: {}", path.display()),
                Some(format!("Check permissions: chmod +r {}", path.display())),
            ),
            CoreError::JsonParse { path, message, .. } => (
                format!("Invalid JSON in {}: {}", path.display(), message),
                Some("Validate JSON syntax with: jq . <file>".to_string()),
            ),
            CoreError::InvalidOrder { reason } => (
                format!("rejected, {}", reason),
                Some("Line totals must equal quantity x price and sum to the order total".to_string()),
            ),
            CoreError::InvalidMenuItem { reason } => (format!("rejected, {}", reason), None),
            CoreError::DuplicateId { .. } => ("duplicate id, later copy skipped".to_string(), None),
            other => (other.to_string(), None),
        };

        let file_level = matches!(
            error,
            CoreError::FileNotFound { .. } | CoreError::FileRead { .. } | CoreError::JsonParse { .. }
        );

        Self {
            section: if file_level { LoadSection::File } else { section },
            entry: entry.map(str::to_string),
            message,
            severity: if file_level {
                ErrorSeverity::Fatal
            } else {
                ErrorSeverity::Warning
            },
            suggestion,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry {
            Some(entry) => write!(f, "{} {}: {}", self.section, entry, self.message)?,
            None => write!(f, "{}: {}", self.section, self.message)?,
        }
        if let Some(hint) = &self.suggestion {
            write!(f, " ({})", hint)?;
        }
        Ok(())
    }
}

/// Outcome of loading a data file
///
/// Bad entries are skipped and recorded here instead of failing the load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub errors: Vec<LoadError>,
    pub menu_items_loaded: usize,
    pub orders_loaded: usize,
    /// Orders dropped because they could not be decoded or validated
    pub orders_rejected: usize,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem; skipped orders also count as rejected
    pub fn push(&mut self, error: LoadError) {
        if error.section == LoadSection::Orders && error.severity == ErrorSeverity::Warning {
            self.orders_rejected += 1;
        }
        self.errors.push(error);
    }

    pub fn has_fatal_errors(&self) -> bool {
        self.count(ErrorSeverity::Fatal) > 0
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LoadError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ErrorSeverity::Warning)
    }

    pub fn count(&self, severity: ErrorSeverity) -> usize {
        self.errors.iter().filter(|e| e.severity == severity).count()
    }

    /// Ids (or positions) of the entries skipped in one section
    pub fn skipped_entries(&self, section: LoadSection) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .filter(move |e| e.section == section)
            .filter_map(|e| e.entry.as_deref())
    }
}

/// Health of the store after the last load
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DegradedState {
    /// Everything loaded successfully
    #[default]
    Healthy,
    /// Some entries were rejected but the rest is usable
    PartialData { rejected: usize, reason: String },
    /// The data file could not be read; writing it back would lose data
    ReadOnly { reason: String },
}

impl DegradedState {
    pub fn is_healthy(&self) -> bool {
        matches!(self, DegradedState::Healthy)
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_healthy()
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, DegradedState::ReadOnly { .. })
    }
}
