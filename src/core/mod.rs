pub mod error;
pub mod file_handler;
pub mod scanner;
pub mod search;
pub mod sidecar;

use error::CoreError;
use serde::Serialize;
use std::path::PathBuf;

/// What a scan collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScanMode {
    /// Every eligible file under the root.
    ListAll,
    /// Eligible files whose name or `.bib` sidecar contains the term.
    /// The term is stored trimmed and case-folded.
    Search(String),
}

/// Input of a single scan. Immutable once the worker starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationRequest {
    pub root: PathBuf,
    pub mode: ScanMode,
    /// Visit directory entries in file-name order in both passes.
    pub sorted: bool,
}

impl EnumerationRequest {
    pub fn list_all(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: ScanMode::ListAll,
            sorted: true,
        }
    }

    pub fn search(root: impl Into<PathBuf>, term: &str) -> Result<Self, CoreError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(CoreError::EmptySearchTerm);
        }
        Ok(Self {
            root: root.into(),
            mode: ScanMode::Search(term.to_lowercase()),
            sorted: true,
        })
    }

    pub fn with_sorting(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }
}

/// Terminal result of a scan, emitted exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub root: PathBuf,
    pub mode: ScanMode,
    /// Collected paths in traversal order.
    pub files: Vec<PathBuf>,
    /// Eligible files counted in the first pass.
    pub total: usize,
    /// Eligible files classified in the second pass before it stopped.
    pub processed: usize,
    pub cancelled: bool,
}

impl ScanOutcome {
    pub(crate) fn empty(request: &EnumerationRequest, cancelled: bool) -> Self {
        Self {
            root: request.root.clone(),
            mode: request.mode.clone(),
            files: Vec::new(),
            total: 0,
            processed: 0,
            cancelled,
        }
    }
}

pub use file_handler::FileHandler;
pub use scanner::LibraryScanner;
pub use search::SearchEngine;
