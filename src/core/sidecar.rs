//! Companion files stored next to library entries.
//!
//! A library file at `P` may carry a bibliography record at `P.bib` and a
//! flags record at `P.json`. Both are keyed purely by appending the suffix to
//! the full path and are read on demand, never cached.

use super::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const BIB_SUFFIX: &str = ".bib";
pub const FLAGS_SUFFIX: &str = ".json";

/// Name suffixes that are never treated as library content.
pub const RESERVED_SUFFIXES: [&str; 2] = [BIB_SUFFIX, FLAGS_SUFFIX];

/// Returns `true` if a leaf file name ends in one of the reserved suffixes.
pub fn is_sidecar_name(name: &str) -> bool {
    RESERVED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Returns `true` if the path's final component is a sidecar name.
pub fn is_sidecar_path(path: &Path) -> bool {
    path.file_name()
        .map(|name| is_sidecar_name(&name.to_string_lossy()))
        .unwrap_or(false)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// `P` -> `P.bib`
pub fn bib_path(path: &Path) -> PathBuf {
    with_suffix(path, BIB_SUFFIX)
}

/// `P` -> `P.json`
pub fn flags_path(path: &Path) -> PathBuf {
    with_suffix(path, FLAGS_SUFFIX)
}

/// Flags recorded about a library file.
///
/// Only `ocr` is interpreted; any other keys found in the sidecar are carried
/// through unchanged when the record is rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reads the bibliography sidecar of `path`, if there is one.
pub fn read_bib(path: &Path) -> Result<Option<String>> {
    let bib = bib_path(path);
    match fs::read_to_string(&bib) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::Io(e, bib)),
    }
}

/// Writes the bibliography sidecar of `path`.
///
/// Blank text is not written and `Ok(false)` is returned.
pub fn save_bib(path: &Path, text: &str) -> Result<bool> {
    if text.trim().is_empty() {
        tracing::debug!("Skipping empty bib record for {:?}", path);
        return Ok(false);
    }
    let bib = bib_path(path);
    write_atomically(&bib, text.as_bytes())?;
    tracing::info!("Saved bib record to {:?}", bib);
    Ok(true)
}

/// Loads the flags sidecar of `path`; a missing sidecar yields the defaults.
pub fn load_flags(path: &Path) -> Result<FileFlags> {
    let json = flags_path(path);
    let content = match fs::read_to_string(&json) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileFlags::default()),
        Err(e) => return Err(CoreError::Io(e, json)),
    };
    serde_json::from_str(&content).map_err(|e| CoreError::Sidecar(e, json))
}

/// Writes the flags sidecar of `path` as pretty-printed JSON.
pub fn save_flags(path: &Path, flags: &FileFlags) -> Result<()> {
    let json = flags_path(path);
    let content =
        serde_json::to_string_pretty(flags).map_err(|e| CoreError::Sidecar(e, json.clone()))?;
    write_atomically(&json, content.as_bytes())
}

/// Writes through a temp file in the target's directory so a concurrent scan
/// never reads a half-written sidecar.
fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| CoreError::Io(e, dir.to_path_buf()))?;
    tmp.write_all(bytes)
        .map_err(|e| CoreError::Io(e, target.to_path_buf()))?;
    tmp.persist(target)
        .map_err(|e| CoreError::Io(e.error, target.to_path_buf()))?;
    Ok(())
}
