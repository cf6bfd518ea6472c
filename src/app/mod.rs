//! The headless side of the library window: state, worker tasks, commands and
//! the bridges a front end uses to drive them.

pub mod commands;
pub mod events;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use events::{IpcMessage, UserEvent};
use proxy::EventProxy;
use state::AppState;

#[derive(Deserialize)]
struct PathPayload {
    path: PathBuf,
}

#[derive(Deserialize)]
struct SearchPayload {
    term: String,
}

#[derive(Deserialize)]
struct AddFilePayload {
    source: PathBuf,
    #[serde(default)]
    destination: Option<PathBuf>,
}

#[derive(Deserialize)]
struct BibPayload {
    path: PathBuf,
    content: String,
}

fn parse<T: for<'de> Deserialize<'de>>(payload: serde_json::Value) -> anyhow::Result<T> {
    serde_json::from_value(payload).map_err(|e| anyhow::anyhow!("Invalid payload: {}", e))
}

/// Dispatches a JSON message of the form `{"command": ..., "payload": ...}`.
///
/// Failures are reported back through a `ShowError` event.
pub fn handle_ipc_message<P: EventProxy>(
    message: String,
    proxy: P,
    state: &Arc<Mutex<AppState>>,
) {
    let msg: IpcMessage = match serde_json::from_str(&message) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("Failed to parse IPC message: {}", e);
            proxy.send_event(UserEvent::ShowError(format!("Malformed message: {e}")));
            return;
        }
    };
    tracing::debug!("IPC command '{}'", msg.command);

    let command = msg.command.clone();
    if let Err(e) = dispatch(msg, &proxy, state) {
        tracing::warn!("IPC command '{}' failed: {:#}", command, e);
        proxy.send_event(UserEvent::ShowError(format!("{e:#}")));
    }
}

fn dispatch<P: EventProxy>(
    msg: IpcMessage,
    proxy: &P,
    state: &Arc<Mutex<AppState>>,
) -> anyhow::Result<()> {
    match msg.command.as_str() {
        "selectBasePath" => {
            let p: PathPayload = parse(msg.payload)?;
            commands::select_base_path(p.path, state)?;
        }
        "selectDirectory" => {
            let p: PathPayload = parse(msg.payload)?;
            commands::select_directory(p.path, proxy.clone(), state);
        }
        "search" => {
            let p: SearchPayload = parse(msg.payload)?;
            commands::start_search(&p.term, proxy.clone(), state);
        }
        "clearSearch" => {
            commands::clear_search(proxy.clone(), state);
        }
        "refresh" => {
            commands::refresh(proxy.clone(), state);
        }
        "cancelScan" => commands::cancel_scan(state),
        "addFile" => {
            let p: AddFilePayload = parse(msg.payload)?;
            commands::add_file(&p.source, p.destination, proxy.clone(), state)?;
        }
        "saveBib" => {
            let p: BibPayload = parse(msg.payload)?;
            commands::save_bib(&p.path, &p.content, proxy.clone(), state)?;
        }
        "checkOcr" => {
            let p: PathPayload = parse(msg.payload)?;
            commands::check_ocr(&p.path, proxy.clone(), state)?;
        }
        "openFile" => {
            let p: PathPayload = parse(msg.payload)?;
            commands::open_entry(&p.path)?;
        }
        "openFolder" => {
            let p: PathPayload = parse(msg.payload)?;
            commands::reveal_entry(&p.path)?;
        }
        other => anyhow::bail!("Unknown command: {other}"),
    }
    Ok(())
}

/// Applies an event from the channel to the shared state.
///
/// Returns `true` if the event was accepted (stale scan events are not).
pub fn handle_user_event(state: &Arc<Mutex<AppState>>, event: UserEvent) -> bool {
    state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .accept_event(event)
}
