//! Defines the event and message structures exchanged between the scan worker,
//! the library commands and whatever front end drives them.

use serde::Deserialize;
use std::path::PathBuf;

use super::view_model::LibraryRow;
use crate::core::ScanOutcome;

/// Events sent from background work to the interactive side.
///
/// Scan events carry the generation of the run that produced them so that a
/// superseded worker can never overwrite the results of its replacement.
#[derive(Debug, Clone)]
pub enum UserEvent {
    /// Percentage of eligible files classified so far.
    ScanProgress { generation: u64, percent: u8 },
    /// The terminal event of a run, normal or cancelled. `rows` are already
    /// derived from `outcome.files`, in display order.
    ScanFinished {
        generation: u64,
        outcome: ScanOutcome,
        rows: Vec<LibraryRow>,
    },
    /// A file or sidecar under this path was written.
    LibraryChanged(PathBuf),
    /// An error message to be displayed to the user.
    ShowError(String),
}

impl UserEvent {
    /// The run this event belongs to, if it came from a scan worker.
    pub fn generation(&self) -> Option<u64> {
        match self {
            UserEvent::ScanProgress { generation, .. }
            | UserEvent::ScanFinished { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}

/// A message received from a front end over the IPC bridge.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}
