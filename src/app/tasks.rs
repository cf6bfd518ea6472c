use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;
use super::view_model::build_rows;

use crate::config::AppConfig;
use crate::core::error::CoreError;
use crate::core::{EnumerationRequest, LibraryScanner, ScanOutcome, SearchEngine};

/// How a worker turns the files it collected into table rows.
#[derive(Debug, Clone)]
pub struct RowOptions {
    /// Rows show their directory relative to this path.
    pub base_path: PathBuf,
    /// Order rows by file name, ignoring case, instead of traversal order.
    pub sort_case_insensitive: bool,
}

impl RowOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_path: config.base_path.clone(),
            sort_case_insensitive: config.sort_results_case_insensitive,
        }
    }
}

/// Owned handle to one background scan.
///
/// The cancel flag is the only state shared with the worker. Cancelling is
/// idempotent and has no effect once the worker has emitted its result.
#[derive(Debug)]
pub struct WorkerHandle {
    generation: u64,
    cancel_flag: Arc<AtomicBool>,
    task: JoinHandle<ScanOutcome>,
}

impl WorkerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    /// Waits for the terminal outcome.
    pub async fn wait(self) -> Result<ScanOutcome, CoreError> {
        Ok(self.task.await?)
    }
}

/// Runs `request` on the blocking pool.
///
/// Emits `ScanProgress` whenever the percentage changes, then exactly one
/// `ScanFinished`, which is always the last event of the run. The rows in it
/// are derived here, so sidecar lookups stay off the interactive side.
pub fn spawn_scan<P: EventProxy>(
    request: EnumerationRequest,
    generation: u64,
    row_options: RowOptions,
    proxy: P,
) -> WorkerHandle {
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let worker_flag = cancel_flag.clone();

    let task = tokio::task::spawn_blocking(move || {
        tracing::debug!("Worker {} started for {:?}", generation, request.root);
        let mut last_percent = None;
        let outcome = LibraryScanner::run(&request, &worker_flag, |percent| {
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                proxy.send_event(UserEvent::ScanProgress {
                    generation,
                    percent,
                });
            }
        });
        let mut files = outcome.files.clone();
        if row_options.sort_case_insensitive {
            SearchEngine::sort_case_insensitive(&mut files);
        }
        let rows = build_rows(&files, &row_options.base_path);
        proxy.send_event(UserEvent::ScanFinished {
            generation,
            outcome: outcome.clone(),
            rows,
        });
        outcome
    });

    WorkerHandle {
        generation,
        cancel_flag,
        task,
    }
}

/// Cancels whatever scan the state owns and starts `request` in its place.
///
/// Returns the generation of the new run.
pub fn start_scan<P: EventProxy>(
    request: EnumerationRequest,
    proxy: P,
    state: &Arc<Mutex<AppState>>,
) -> u64 {
    let mut state_guard = state
        .lock()
        .expect("Mutex was poisoned. This should not happen.");
    let generation = state_guard.begin_scan();
    let request = request.with_sorting(state_guard.config.sort_entries);
    let row_options = RowOptions::from_config(&state_guard.config);

    tracing::info!(
        "Starting scan {} ({:?}) under {:?}",
        generation,
        request.mode,
        request.root
    );
    let handle = spawn_scan(request, generation, row_options, proxy);
    state_guard.scan_task = Some(handle);
    generation
}
