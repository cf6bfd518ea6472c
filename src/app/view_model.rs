//! Responsible for transforming scan results into the rows a front end renders.

use crate::core::sidecar::{bib_path, load_flags};
use crate::utils::file_detection::media_type;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One row of the file table, with its derived columns.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LibraryRow {
    pub path: PathBuf,
    pub file_name: String,
    /// Parent directory relative to the library base path.
    pub directory: String,
    /// A `.bib` sidecar exists.
    pub has_bib: bool,
    /// The `ocr` flag of the `.json` sidecar, when recorded.
    pub ocr: Option<bool>,
    pub media_type: String,
}

impl LibraryRow {
    pub fn from_path(path: &Path, base_path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        let directory = parent
            .strip_prefix(base_path)
            .unwrap_or(parent)
            .display()
            .to_string();
        let ocr = match load_flags(path) {
            Ok(flags) => flags.ocr,
            Err(e) => {
                tracing::debug!("Ignoring flags sidecar: {}", e);
                None
            }
        };

        Self {
            path: path.to_path_buf(),
            file_name,
            directory,
            has_bib: bib_path(path).is_file(),
            ocr,
            media_type: media_type(path),
        }
    }
}

/// Derives rows for `files`, keeping their order.
pub fn build_rows(files: &[PathBuf], base_path: &Path) -> Vec<LibraryRow> {
    files
        .par_iter()
        .map(|path| LibraryRow::from_path(path, base_path))
        .collect()
}
