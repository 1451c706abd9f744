//! Report configuration persistence for bistro
//!
//! Stored as TOML, by default in `<config_dir>/bistro/config.toml`. A missing
//! or unreadable file falls back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::analytics::BucketUnit;
use crate::event::EventBus;

/// Tunables for report assembly and presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Prefix for every formatted currency amount
    pub currency_symbol: String,
    /// Number of days in the dashboard trend
    pub trend_days: usize,
    /// Items shown in the top items report
    pub top_items_limit: usize,
    /// Items kept in the assistant summary
    pub summary_top_items: usize,
    /// Items rendered into the assistant context block
    pub prompt_top_items: usize,
    pub day_window: usize,
    pub week_window: usize,
    pub month_window: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            trend_days: 7,
            top_items_limit: 5,
            summary_top_items: 10,
            prompt_top_items: 5,
            day_window: BucketUnit::Day.default_window(),
            week_window: BucketUnit::Week.default_window(),
            month_window: BucketUnit::Month.default_window(),
        }
    }
}

impl ReportConfig {
    /// Load from a TOML file.
    /// Returns defaults on any I/O or parse error (graceful degradation).
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No report config, using defaults");
                return Self::default();
            }
        };

        match toml::from_str::<ReportConfig>(&content) {
            Ok(config) => config.sanitized(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid report config, using defaults");
                Self::default()
            }
        }
    }

    /// Persist as TOML, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize report config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Window size configured for a bucket unit
    pub fn window_for(&self, unit: BucketUnit) -> usize {
        match unit {
            BucketUnit::Day => self.day_window,
            BucketUnit::Week => self.week_window,
            BucketUnit::Month => self.month_window,
        }
    }

    /// Replace zero windows with the unit defaults and cap oversized ones
    fn sanitized(mut self) -> Self {
        for unit in [BucketUnit::Day, BucketUnit::Week, BucketUnit::Month] {
            let window = match self.window_for(unit) {
                0 => {
                    warn!(unit = %unit, "Zero window in config, using default");
                    unit.default_window()
                }
                w if w > unit.max_window() => {
                    warn!(unit = %unit, window = w, max = unit.max_window(), "Window in config too large, capping");
                    unit.max_window()
                }
                w => w,
            };
            match unit {
                BucketUnit::Day => self.day_window = window,
                BucketUnit::Week => self.week_window = window,
                BucketUnit::Month => self.month_window = window,
            }
        }
        if self.trend_days == 0 {
            self.trend_days = 7;
        }
        self.trend_days = self.trend_days.min(BucketUnit::Day.max_window());
        self
    }
}

/// Settings for the in-memory data store
#[derive(Debug, Clone)]
pub struct DataStoreConfig {
    /// Retries when the data file fails to parse (it may be mid-write)
    pub parse_retries: u32,
    pub retry_delay: Duration,
    /// Broadcast channel capacity for data events
    pub event_capacity: usize,
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            parse_retries: 3,
            retry_delay: Duration::from_millis(100),
            event_capacity: EventBus::DEFAULT_CAPACITY,
        }
    }
}
