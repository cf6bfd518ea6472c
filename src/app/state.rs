//! Defines the central, mutable state of the application.

use crate::config::AppConfig;
use std::path::PathBuf;

use super::events::UserEvent;
use super::tasks::WorkerHandle;
use super::view_model::LibraryRow;

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` so commands and the event
/// loop can share it. Scan workers never touch it: they only emit events,
/// which `accept_event` applies here.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Where the configuration is persisted; `None` uses the platform default.
    pub config_path: Option<PathBuf>,
    /// The directory selected in the tree, if any.
    pub selected_dir: Option<PathBuf>,
    /// The active search term; empty when listing a directory.
    pub search_query: String,
    /// The table contents of the last accepted scan.
    pub rows: Vec<LibraryRow>,
    /// Progress of the current scan, in percent.
    pub progress: u8,
    /// `true` while the current generation has not emitted its result.
    pub is_scanning: bool,
    /// `true` if the last accepted result was cut short by a cancel.
    pub last_scan_cancelled: bool,
    /// Status-bar text.
    pub status_message: String,
    /// Generation of the most recently started scan.
    pub generation: u64,
    /// The worker of the current generation.
    pub scan_task: Option<WorkerHandle>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            config_path: None,
            selected_dir: None,
            search_query: String::new(),
            rows: Vec::new(),
            progress: 0,
            is_scanning: false,
            last_scan_cancelled: false,
            status_message: "Ready.".to_string(),
            generation: 0,
            scan_task: None,
        }
    }

    /// The directory a new scan starts from: the selection, else the base path.
    pub fn scan_root(&self) -> PathBuf {
        self.selected_dir
            .clone()
            .unwrap_or_else(|| self.config.base_path.clone())
    }

    /// Cancels and detaches the previous worker, then opens a new generation.
    pub fn begin_scan(&mut self) -> u64 {
        if let Some(previous) = self.scan_task.take() {
            tracing::debug!("Superseding scan {}", previous.generation());
            previous.cancel();
        }
        self.generation += 1;
        self.is_scanning = true;
        self.progress = 0;
        self.status_message = "Scanning...".to_string();
        self.generation
    }

    /// Asks the current worker to stop. Its partial result still arrives
    /// through `ScanFinished`.
    pub fn cancel_current_scan(&mut self) {
        match &self.scan_task {
            Some(handle) if self.is_scanning => {
                tracing::info!("Cancelling scan {}", handle.generation());
                handle.cancel();
                self.status_message = "Cancelling...".to_string();
            }
            _ => tracing::debug!("cancel_current_scan called, but no scan is running."),
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Applies an event to the state. Scan events from a superseded
    /// generation are dropped; the return value says whether anything changed.
    ///
    /// Runs under the state lock, so it only swaps in data the worker has
    /// already prepared and never touches the filesystem.
    pub fn accept_event(&mut self, event: UserEvent) -> bool {
        if let Some(generation) = event.generation() {
            if !self.is_current(generation) {
                tracing::debug!(
                    "Discarding event from stale scan {} (current {})",
                    generation,
                    self.generation
                );
                return false;
            }
        }

        match event {
            UserEvent::ScanProgress { percent, .. } => {
                if !self.is_scanning || percent < self.progress {
                    return false;
                }
                self.progress = percent;
            }
            UserEvent::ScanFinished { outcome, rows, .. } => {
                self.rows = rows;
                self.is_scanning = false;
                self.last_scan_cancelled = outcome.cancelled;
                self.scan_task = None;
                self.status_message = if outcome.cancelled {
                    format!("Cancelled: {} files found so far", self.rows.len())
                } else {
                    format!("{} files found", self.rows.len())
                };
            }
            UserEvent::LibraryChanged(path) => {
                self.status_message = format!("Updated {}", path.display());
            }
            UserEvent::ShowError(message) => {
                self.status_message = message;
            }
        }
        true
    }

    /// Forgets the selection, search and results.
    pub fn reset_directory_state(&mut self) {
        self.cancel_current_scan();
        self.scan_task = None;
        self.is_scanning = false;
        self.generation += 1;
        self.selected_dir = None;
        self.search_query.clear();
        self.rows.clear();
        self.progress = 0;
        self.last_scan_cancelled = false;
        self.status_message = "Ready.".to_string();
    }
}
