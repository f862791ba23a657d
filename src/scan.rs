//! Source discovery.
//!
//! Lists the photographs to process from the top level of the source
//! directory. Output filenames carry each source's position in this listing,
//! so the order must not depend on how the filesystem happens to iterate:
//! entries are sorted by filename before indices are assigned.
//!
//! ```text
//! assets/
//! ├── 050-escritorio_gamer.png   → 001
//! ├── 051-placard_vestidor.jpg   → 002
//! ├── Favicon.png                (excluded prefix)
//! ├── logo-dark.png              (excluded prefix)
//! ├── notes.txt                  (not an image extension)
//! └── optimized/                 (directories are never entered)
//! ```
//!
//! ## Expected sources
//!
//! A config may name stem prefixes that must be present. Missing ones are
//! either reported as warnings or turned into [`ScanError::MissingExpected`],
//! depending on [`MissingPolicy`].

use crate::config::{MissingPolicy, SourcesConfig, normalize_extension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source directory not found: {0}")]
    SourceDirMissing(PathBuf),
    #[error("Expected sources not found: {}", .0.join(", "))]
    MissingExpected(Vec<String>),
}

/// One eligible source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    /// 1-based position in the sorted listing.
    pub index: usize,
    pub path: PathBuf,
    pub file_name: String,
    /// Filename without its last extension.
    pub stem: String,
}

/// Whether a filename passes the extension and exclusion rules.
pub fn is_eligible(file_name: &str, rules: &SourcesConfig) -> bool {
    let extension = match Path::new(file_name).extension() {
        Some(ext) => ext.to_string_lossy().to_ascii_lowercase(),
        None => return false,
    };
    if !rules
        .extensions
        .iter()
        .any(|allowed| normalize_extension(allowed) == extension)
    {
        return false;
    }

    let lower_name = file_name.to_lowercase();
    if rules
        .exclude_exact
        .iter()
        .any(|name| name.to_lowercase() == lower_name)
    {
        return false;
    }
    !rules
        .exclude_prefixes
        .iter()
        .any(|prefix| lower_name.starts_with(&prefix.to_lowercase()))
}

/// List eligible sources in `dir`, sorted by filename and numbered from 1.
///
/// Only regular files (or symlinks to them) directly inside `dir` are
/// considered.
pub fn list_sources(dir: &Path, rules: &SourcesConfig) -> Result<Vec<SourceEntry>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::SourceDirMissing(dir.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !is_eligible(&file_name, rules) {
            continue;
        }

        let stem = entry
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        sources.push(SourceEntry {
            index: sources.len() + 1,
            path: entry.into_path(),
            file_name,
            stem,
        });
    }

    Ok(sources)
}

/// Expected stem prefixes that match no source (case-insensitive).
pub fn missing_expected(sources: &[SourceEntry], expected: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|prefix| {
            let prefix = prefix.to_lowercase();
            !sources
                .iter()
                .any(|s| s.stem.to_lowercase().starts_with(&prefix))
        })
        .cloned()
        .collect()
}

/// Apply the configured [`MissingPolicy`].
///
/// Returns the missing prefixes to warn about, or an error under
/// [`MissingPolicy::Error`].
pub fn check_expected(
    sources: &[SourceEntry],
    rules: &SourcesConfig,
) -> Result<Vec<String>, ScanError> {
    let missing = missing_expected(sources, &rules.expected);
    match rules.missing_expected {
        MissingPolicy::Error if !missing.is_empty() => Err(ScanError::MissingExpected(missing)),
        _ => Ok(missing),
    }
}
