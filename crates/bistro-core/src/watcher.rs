//! File watcher for the bistro data file
//!
//! Uses notify with adaptive debouncing. The parent directory is watched
//! rather than the file itself so that atomic replaces (write + rename) are
//! still observed.

use crate::error::CoreError;
use crate::event::DataEvent;
use crate::store::DataStore;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

/// Configuration for the file watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Base debounce delay
    pub debounce_delay: Duration,

    /// Maximum debounce delay during burst
    pub max_debounce_delay: Duration,

    /// Burst detection threshold (events per second)
    pub burst_threshold: u32,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(500),
            max_debounce_delay: Duration::from_secs(3),
            burst_threshold: 10,
        }
    }
}

/// File watcher that reloads the store when the data file changes
pub struct FileWatcher {
    /// Notify watcher instance
    _watcher: RecommendedWatcher,

    /// Shutdown signal
    shutdown_tx: mpsc::Sender<()>,
}

impl FileWatcher {
    /// Start watching the store's data file
    pub async fn start(store: Arc<DataStore>, config: WatcherConfig) -> Result<Self, CoreError> {
        let data_path = store
            .data_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| CoreError::WatchError {
                message: "store has no data file to watch".to_string(),
                source: None,
            })?;
        let watch_dir = match data_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(100);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(|e| watch_error("failed to create watcher", e))?;
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error(&format!("cannot watch {}", watch_dir.display()), e))?;

        info!(path = %data_path.display(), "File watcher started");

        let event_bus = store.event_bus().clone();
        tokio::spawn(async move {
            let mut debounce_state = DebounceState::new(config);

            loop {
                tokio::select! {
                    Some(result) = event_rx.recv() => {
                        match result {
                            Ok(event) => {
                                if Self::is_data_file_change(&event, &data_path)
                                    && debounce_state.should_emit(Instant::now())
                                {
                                    debug!(kind = ?event.kind, "Data file changed, reloading");
                                    // reload() publishes DataReloaded on success
                                    store.reload().await;
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "File watcher error");
                                event_bus.publish(DataEvent::WatcherError(e.to_string()));
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("File watcher shutting down");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            shutdown_tx,
        })
    }

    /// True for create/modify events that touch the data file
    fn is_data_file_change(event: &Event, data_path: &Path) -> bool {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {}
            _ => return false,
        }

        let Some(file_name) = data_path.file_name() else {
            return false;
        };

        event.paths.iter().any(|path| {
            trace!(path = %path.display(), "Processing file event");
            path.file_name() == Some(file_name)
        })
    }

    /// Stop the watcher
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

fn watch_error(message: &str, source: notify::Error) -> CoreError {
    CoreError::WatchError {
        message: message.to_string(),
        source: Some(source),
    }
}

/// Debounce state for adaptive debouncing
///
/// Only one file is watched, so a single timestamp suffices.
struct DebounceState {
    config: WatcherConfig,
    last_emit: Option<Instant>,
    event_count_window: VecDeque<Instant>,
}

impl DebounceState {
    fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            last_emit: None,
            event_count_window: VecDeque::new(),
        }
    }

    fn should_emit(&mut self, now: Instant) -> bool {
        // Track event rate for burst detection
        self.event_count_window.push_back(now);
        while self
            .event_count_window
            .front()
            .is_some_and(|t| now.duration_since(*t) > Duration::from_secs(1))
        {
            self.event_count_window.pop_front();
        }

        let delay = if self.event_count_window.len() as u32 > self.config.burst_threshold {
            self.config.max_debounce_delay
        } else {
            self.config.debounce_delay
        };

        if let Some(last) = self.last_emit {
            if now.duration_since(last) < delay {
                trace!("Debouncing event");
                return false;
            }
        }

        self.last_emit = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modify_event(path: &str) -> Event {
        Event {
            kind: EventKind::Modify(notify::event::ModifyKind::Data(
                notify::event::DataChange::Content,
            )),
            paths: vec![PathBuf::from(path)],
            ..Default::default()
        }
    }

    #[test]
    fn test_debounce_state_basic() {
        let config = WatcherConfig {
            debounce_delay: Duration::from_millis(100),
            max_debounce_delay: Duration::from_millis(500),
            burst_threshold: 5,
        };
        let mut state = DebounceState::new(config);
        let start = Instant::now();

        // First event should pass
        assert!(state.should_emit(start));

        // Immediate second should be debounced
        assert!(!state.should_emit(start + Duration::from_millis(10)));

        // After the delay it passes again
        assert!(state.should_emit(start + Duration::from_millis(150)));
    }

    #[test]
    fn test_debounce_extends_during_burst() {
        let config = WatcherConfig {
            debounce_delay: Duration::from_millis(100),
            max_debounce_delay: Duration::from_millis(500),
            burst_threshold: 3,
        };
        let mut state = DebounceState::new(config);
        let start = Instant::now();

        assert!(state.should_emit(start));
        for i in 1..=4 {
            state.should_emit(start + Duration::from_millis(i * 20));
        }
        // Past the base delay but inside the burst delay
        assert!(!state.should_emit(start + Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn test_in_memory_store_cannot_be_watched() {
        let store = Arc::new(DataStore::in_memory());
        let result = FileWatcher::start(store, WatcherConfig::default()).await;
        assert!(matches!(result, Err(CoreError::WatchError { source: None, .. })));
    }

    #[test]
    fn test_data_file_change_matches_name() {
        let data_path = PathBuf::from("/srv/bistro/bistro-data.json");

        let hit = modify_event("/srv/bistro/bistro-data.json");
        assert!(FileWatcher::is_data_file_change(&hit, &data_path));

        let other = modify_event("/srv/bistro/bistro-data.json.tmp");
        assert!(!FileWatcher::is_data_file_change(&other, &data_path));

        let removed = Event {
            kind: EventKind::Remove(notify::event::RemoveKind::File),
            paths: vec![data_path.clone()],
            ..Default::default()
        };
        assert!(!FileWatcher::is_data_file_change(&removed, &data_path));
    }
}
