//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// The scan worker itself never fails: unreadable roots and sidecars degrade to
/// "no files" or "no match". These variants cover the library-editing
/// operations (copy-in, sidecar writes, OCR checks) and worker plumbing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    /// This is often due to a worker panicking.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// Represents a path that was expected to be a regular file but was not.
    #[error("Path is not a regular file: {0}")]
    NotAFile(PathBuf),

    /// A copy-in would replace an entry that is already in the library.
    #[error("A file with this name already exists: {0}")]
    AlreadyExists(PathBuf),

    /// The file name ends in a suffix reserved for sidecar files.
    #[error("File name uses a reserved sidecar suffix: {0}")]
    ReservedName(PathBuf),

    /// A search request was built with a blank term.
    #[error("Search term must not be empty")]
    EmptySearchTerm,

    /// The `.json` flags sidecar could not be parsed or serialized.
    #[error("Malformed flags sidecar {1}: {0}")]
    Sidecar(#[source] serde_json::Error, PathBuf),
}

pub type Result<T> = std::result::Result<T, CoreError>;
