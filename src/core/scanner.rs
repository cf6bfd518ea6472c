use super::search::SearchEngine;
use super::sidecar::is_sidecar_name;
use super::{EnumerationRequest, ScanMode, ScanOutcome};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::{DirEntry, WalkDir};

/// Walks a library directory in two passes: one to count eligible files for
/// the progress denominator, one to collect the files the request asks for.
///
/// Symbolic links are never followed, and a symlink is not a regular file, so
/// linked entries are not eligible. Entries that cannot be read mid-walk are
/// skipped.
pub struct LibraryScanner;

impl LibraryScanner {
    /// Runs one scan to completion or until `cancel_flag` is observed.
    ///
    /// `progress` receives a percentage after every eligible file of the
    /// collect pass; the values never decrease. The returned outcome is the
    /// terminal result: on cancellation it holds whatever was gathered so far.
    pub fn run<F>(
        request: &EnumerationRequest,
        cancel_flag: &AtomicBool,
        mut progress: F,
    ) -> ScanOutcome
    where
        F: FnMut(u8),
    {
        let root = std::path::absolute(&request.root).unwrap_or_else(|_| request.root.clone());
        let mut outcome = ScanOutcome::empty(request, false);
        outcome.root = root.clone();

        if !root.is_dir() {
            tracing::info!("Scan root {:?} is not a readable directory", root);
            return outcome;
        }

        // Pass 1: count.
        let mut total = 0usize;
        for entry in Self::walk(&root, request.sorted) {
            if cancel_flag.load(Ordering::Relaxed) {
                tracing::info!("🛑 Scan cancelled while counting after {} files", total);
                outcome.cancelled = true;
                return outcome;
            }
            if Self::eligible(&entry).is_some() {
                total += 1;
            }
        }
        outcome.total = total;

        if total == 0 {
            tracing::info!("No eligible files under {:?}", root);
            return outcome;
        }
        tracing::info!("📂 Counted {} eligible files under {:?}", total, root);

        // Pass 2: collect.
        let mut processed = 0usize;
        for entry in Self::walk(&root, request.sorted) {
            if cancel_flag.load(Ordering::Relaxed) {
                tracing::info!(
                    "🛑 Scan cancelled after {} of {} files, keeping {} results",
                    processed,
                    total,
                    outcome.files.len()
                );
                outcome.cancelled = true;
                break;
            }
            let Some(path) = Self::eligible(&entry) else {
                continue;
            };

            let keep = match &request.mode {
                ScanMode::ListAll => true,
                ScanMode::Search(term) => SearchEngine::matches(path, term),
            };
            if keep {
                outcome.files.push(path.to_path_buf());
            }

            processed += 1;
            // Files created between the passes can push `processed` past `total`.
            progress(Self::percent(processed, total));
        }
        outcome.processed = processed;

        if !outcome.cancelled {
            tracing::info!(
                "✅ Scan completed: {} of {} files collected",
                outcome.files.len(),
                total
            );
        }
        outcome
    }

    /// `floor(processed / total * 100)`, capped at 100.
    pub fn percent(processed: usize, total: usize) -> u8 {
        if total == 0 {
            return 100;
        }
        (processed.saturating_mul(100) / total).min(100) as u8
    }

    fn walk(root: &Path, sorted: bool) -> impl Iterator<Item = DirEntry> {
        let mut walker = WalkDir::new(root).follow_links(false).min_depth(1);
        if sorted {
            walker = walker.sort_by_file_name();
        }
        walker.into_iter().filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
    }

    /// Returns the entry's path if it is a regular, non-sidecar file.
    fn eligible(entry: &DirEntry) -> Option<&Path> {
        if !entry.file_type().is_file() {
            return None;
        }
        if is_sidecar_name(&entry.file_name().to_string_lossy()) {
            return None;
        }
        Some(entry.path())
    }

    /// Counts eligible files without collecting them.
    pub fn count_eligible(root: &Path, sorted: bool) -> usize {
        Self::walk(root, sorted)
            .filter(|entry| Self::eligible(entry).is_some())
            .count()
    }

    /// Convenience wrapper that lists every eligible file and ignores progress.
    pub fn list_all(root: &Path) -> Vec<PathBuf> {
        let request = EnumerationRequest::list_all(root);
        Self::run(&request, &AtomicBool::new(false), |_| {}).files
    }
}
