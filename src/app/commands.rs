//! Contains the command handlers a front end calls.
//!
//! Each handler validates its input, updates the `AppState`, and either starts
//! a scan worker or performs a short filesystem action. Results of scans reach
//! the state later through `UserEvent`s.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks::start_scan;
use crate::config::settings;
use crate::core::{EnumerationRequest, FileHandler};

fn lock(state: &Arc<Mutex<AppState>>) -> MutexGuard<'_, AppState> {
    state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
}

fn persist_config(state: &AppState) {
    if let Err(e) = settings::save_config(&state.config, state.config_path.as_deref()) {
        tracing::warn!("Failed to save config: {}", e);
    }
}

/// Points the library at a new base directory and clears the table.
pub fn select_base_path(path: PathBuf, state: &Arc<Mutex<AppState>>) -> Result<()> {
    if !path.is_dir() {
        bail!("Selected path is not a valid directory: {}", path.display());
    }
    let mut state_guard = lock(state);
    state_guard.reset_directory_state();
    state_guard.config.base_path = path;
    state_guard.config.last_directory = None;
    persist_config(&state_guard);
    tracing::info!("Base path set to {:?}", state_guard.config.base_path);
    Ok(())
}

/// Selects a directory in the tree and lists every eligible file below it.
pub fn select_directory<P: EventProxy>(
    path: PathBuf,
    proxy: P,
    state: &Arc<Mutex<AppState>>,
) -> Option<u64> {
    if !path.is_dir() {
        proxy.send_event(UserEvent::ShowError(format!(
            "Selected path is not a valid directory: {}",
            path.display()
        )));
        return None;
    }
    {
        let mut state_guard = lock(state);
        state_guard.selected_dir = Some(path.clone());
        state_guard.search_query.clear();
        state_guard.config.last_directory = Some(path.clone());
        persist_config(&state_guard);
    }
    Some(start_scan(EnumerationRequest::list_all(path), proxy, state))
}

/// Searches file names and `.bib` sidecars below the selected directory, or
/// below the base path when nothing is selected. A blank term does nothing.
pub fn start_search<P: EventProxy>(
    term: &str,
    proxy: P,
    state: &Arc<Mutex<AppState>>,
) -> Option<u64> {
    let request = {
        let mut state_guard = lock(state);
        let root = state_guard.scan_root();
        let request = match EnumerationRequest::search(&root, term) {
            Ok(request) => request,
            Err(_) => {
                tracing::debug!("Ignoring blank search");
                return None;
            }
        };
        state_guard.search_query = term.trim().to_string();
        request
    };
    Some(start_scan(request, proxy, state))
}

/// Drops the search term and lists the selected directory again.
pub fn clear_search<P: EventProxy>(proxy: P, state: &Arc<Mutex<AppState>>) -> u64 {
    let root = {
        let mut state_guard = lock(state);
        state_guard.search_query.clear();
        state_guard.scan_root()
    };
    start_scan(EnumerationRequest::list_all(root), proxy, state)
}

/// Re-runs the current listing or search.
pub fn refresh<P: EventProxy>(proxy: P, state: &Arc<Mutex<AppState>>) -> u64 {
    let request = {
        let state_guard = lock(state);
        let root = state_guard.scan_root();
        EnumerationRequest::search(&root, &state_guard.search_query)
            .unwrap_or_else(|_| EnumerationRequest::list_all(root))
    };
    start_scan(request, proxy, state)
}

/// Asks the running scan to stop; its partial result is still delivered.
pub fn cancel_scan(state: &Arc<Mutex<AppState>>) {
    lock(state).cancel_current_scan();
}

/// Copies `source` into `dest_dir` (default: the scan root) and refreshes.
pub fn add_file<P: EventProxy>(
    source: &Path,
    dest_dir: Option<PathBuf>,
    proxy: P,
    state: &Arc<Mutex<AppState>>,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.unwrap_or_else(|| lock(state).scan_root());
    let added = FileHandler::add_to_library(source, &dest_dir)
        .with_context(|| format!("Could not add {}", source.display()))?;
    proxy.send_event(UserEvent::LibraryChanged(added.clone()));
    refresh(proxy, state);
    Ok(added)
}

/// Writes the `.bib` sidecar of `path`. Blank text is not saved.
pub fn save_bib<P: EventProxy>(
    path: &Path,
    content: &str,
    proxy: P,
    state: &Arc<Mutex<AppState>>,
) -> Result<bool> {
    let written = FileHandler::save_bib(path, content)
        .with_context(|| format!("Could not save bib record for {}", path.display()))?;
    if written {
        proxy.send_event(UserEvent::LibraryChanged(path.to_path_buf()));
        refresh(proxy, state);
    }
    Ok(written)
}

/// Reads the `.bib` sidecar of `path`, if any.
pub fn read_bib(path: &Path) -> Result<Option<String>> {
    Ok(FileHandler::read_bib(path)?)
}

/// Runs the OCR check on a PDF and records the flag.
pub fn check_ocr<P: EventProxy>(
    path: &Path,
    proxy: P,
    state: &Arc<Mutex<AppState>>,
) -> Result<bool> {
    if !FileHandler::supports_ocr_check(path) {
        bail!("Not a PDF file: {}", path.display());
    }
    let has_text = FileHandler::check_ocr(path)?;
    proxy.send_event(UserEvent::LibraryChanged(path.to_path_buf()));
    refresh(proxy, state);
    Ok(has_text)
}

/// Opens a library file with the desktop's default application.
pub fn open_entry(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("File does not exist: {}", path.display());
    }
    open::that(path).with_context(|| format!("Could not open {}", path.display()))
}

/// Opens the directory containing a library file.
pub fn reveal_entry(path: &Path) -> Result<()> {
    let folder = path
        .parent()
        .filter(|p| p.is_dir())
        .with_context(|| format!("No containing folder for {}", path.display()))?;
    open::that(folder).with_context(|| format!("Could not open {}", folder.display()))
}
