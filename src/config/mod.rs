pub mod settings;

use anyhow::Result;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_LIBRARY_DIR: &str = "Alexandria";
const SHELF_DIR: &str = "Library";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the library tree. Every scan request is built from this (or a
    /// directory below it); nothing else holds the path.
    pub base_path: PathBuf,
    /// The directory that was selected when the application last ran.
    pub last_directory: Option<PathBuf>,
    /// Walk directory entries in file-name order.
    pub sort_entries: bool,
    /// Present results sorted by file name, ignoring case, instead of in
    /// traversal order.
    pub sort_results_case_insensitive: bool,
}

impl AppConfig {
    /// Creates `<base_path>/Library` when the base path does not exist yet.
    pub fn ensure_library_root(&self) -> Result<()> {
        if !self.base_path.exists() {
            let shelf = self.base_path.join(SHELF_DIR);
            fs::create_dir_all(&shelf)?;
            tracing::info!("Created library root at {:?}", shelf);
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let base_path = UserDirs::new()
            .map(|dirs| dirs.home_dir().join(DEFAULT_LIBRARY_DIR))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_DIR));
        Self {
            base_path,
            last_directory: None,
            sort_entries: true,
            sort_results_case_insensitive: false,
        }
    }
}
