//! Match predicates used by the search worker.

use super::sidecar::bib_path;
use std::fs;
use std::path::{Path, PathBuf};

/// A utility struct for matching library entries against a search term.
///
/// This struct is stateless and provides methods as associated functions.
/// Every `folded_term` argument must already be lower-cased.
pub struct SearchEngine;

impl SearchEngine {
    /// A file matches if its name contains the term, or failing that, if its
    /// `.bib` sidecar does. The sidecar is only read when the name misses.
    pub fn matches(path: &Path, folded_term: &str) -> bool {
        Self::matches_file_name(path, folded_term) || Self::matches_bib(path, folded_term)
    }

    /// Case-insensitive substring test on the final path component.
    pub fn matches_file_name(path: &Path, folded_term: &str) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase().contains(folded_term))
            .unwrap_or(false)
    }

    /// Case-insensitive substring test on the `.bib` sidecar's content.
    ///
    /// A missing, unreadable or non-UTF-8 sidecar counts as no match.
    pub fn matches_bib(path: &Path, folded_term: &str) -> bool {
        let bib = bib_path(path);
        match fs::read_to_string(&bib) {
            Ok(content) => content.to_lowercase().contains(folded_term),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!("Ignoring unreadable bib sidecar {:?}: {}", bib, e);
                }
                false
            }
        }
    }

    /// Sorts paths by file name ignoring case, then by full path so the order
    /// is total.
    pub fn sort_case_insensitive(paths: &mut [PathBuf]) {
        paths.sort_by_cached_key(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            (name, p.clone())
        });
    }
}
