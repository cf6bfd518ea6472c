//! Alexandria: a file-library manager built around a cancellable,
//! sidecar-aware directory scanner.

// Declare all modules as public so they can be used by the binary and tests.
pub mod app;
pub mod config;
pub mod core;
pub mod utils;
