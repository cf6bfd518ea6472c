use super::error::{CoreError, Result};
use super::sidecar::{self, is_sidecar_path};
use crate::utils::file_detection::{has_text_layer, is_pdf};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Operations that change the library on disk.
pub struct FileHandler;

impl FileHandler {
    /// Copies a document into a library directory and returns its new path.
    ///
    /// Existing entries are never overwritten, and names ending in a reserved
    /// sidecar suffix are refused. The copy keeps the source's permissions and
    /// access/modification times.
    pub fn add_to_library(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(CoreError::NotAFile(source.to_path_buf()));
        }
        if !dest_dir.is_dir() {
            return Err(CoreError::NotADirectory(dest_dir.to_path_buf()));
        }
        let name = source
            .file_name()
            .ok_or_else(|| CoreError::NotAFile(source.to_path_buf()))?;
        let target = dest_dir.join(name);

        if is_sidecar_path(&target) {
            return Err(CoreError::ReservedName(target));
        }
        if target.exists() {
            return Err(CoreError::AlreadyExists(target));
        }

        fs::copy(source, &target).map_err(|e| CoreError::Io(e, target.clone()))?;
        let metadata = fs::metadata(source).map_err(|e| CoreError::Io(e, source.to_path_buf()))?;
        filetime::set_file_times(
            &target,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )
        .map_err(|e| CoreError::Io(e, target.clone()))?;
        tracing::info!("Added {:?} to library as {:?}", source, target);
        Ok(target)
    }

    /// Extracts text from the leading pages of a PDF and records the answer as
    /// the `ocr` flag in its `.json` sidecar. Other keys in the sidecar are kept.
    ///
    /// A malformed sidecar is replaced rather than blocking the check.
    pub fn check_ocr(path: &Path) -> Result<bool> {
        if !path.is_file() {
            return Err(CoreError::NotAFile(path.to_path_buf()));
        }
        let has_text = has_text_layer(path);

        let mut flags = match sidecar::load_flags(path) {
            Ok(flags) => flags,
            Err(e) => {
                tracing::warn!("Replacing unreadable flags sidecar: {}", e);
                sidecar::FileFlags::default()
            }
        };
        flags.ocr = Some(has_text);
        sidecar::save_flags(path, &flags)?;

        tracing::info!("OCR check for {:?}: text layer = {}", path, has_text);
        Ok(has_text)
    }

    /// Whether the OCR check applies to this file.
    pub fn supports_ocr_check(path: &Path) -> bool {
        is_pdf(path)
    }

    pub fn read_bib(path: &Path) -> Result<Option<String>> {
        sidecar::read_bib(path)
    }

    pub fn save_bib(path: &Path, text: &str) -> Result<bool> {
        if !path.is_file() {
            return Err(CoreError::NotAFile(path.to_path_buf()));
        }
        sidecar::save_bib(path, text)
    }
}
