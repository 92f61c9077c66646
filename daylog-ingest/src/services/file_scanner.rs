//! Source path scanning
//!
//! Recursive discovery of manifest and metadata files under a selected
//! source path, and derivation of the volume label that path lives on.

use daylog_common::config::TomlConfig;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Manifest file extension
pub const MANIFEST_EXTENSIONS: &[&str] = &["mhl"];

/// Camera metadata file extensions
pub const METADATA_EXTENSIONS: &[&str] = &["ale", "xml"];

/// File scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is neither a file nor a directory
    #[error("Not a file or directory: {0}")]
    Unsupported(PathBuf),
}

/// Recursive file scanner filtered by extension
pub struct FileScanner {
    ignore_patterns: Vec<String>,
}

impl FileScanner {
    /// Create new file scanner with default ignore patterns
    ///
    /// Ignores Finder and filesystem bookkeeping (`.DS_Store`, `._*` resource
    /// forks, `.Spotlight-V100`, `.Trashes`, `.fseventsd`).
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "._".to_string(),
                ".Spotlight-V100".to_string(),
                ".Trashes".to_string(),
                ".fseventsd".to_string(),
            ],
        }
    }

    /// Files under `root_path` with one of `extensions` (case-insensitive)
    ///
    /// A file path is accepted directly if its extension matches. Results are
    /// sorted so that parse order, and therefore merge order, is stable.
    pub fn scan(&self, root_path: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if root_path.is_file() {
            return Ok(if has_extension(root_path, extensions) {
                vec![root_path.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        if !root_path.is_dir() {
            return Err(ScanError::Unsupported(root_path.to_path_buf()));
        }

        let mut files = Vec::new();
        let mut symlink_visited = HashSet::new();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    // Continue scanning, don't abort
                    tracing::warn!(error = %e, "Error accessing entry");
                }
            }
        }

        files.sort();

        tracing::debug!(
            path = %root_path.display(),
            found = files.len(),
            "Scan complete"
        );

        Ok(files)
    }

    fn should_process_entry(
        &self,
        entry: &DirEntry,
        symlink_visited: &mut HashSet<PathBuf>,
    ) -> bool {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();

        if entry.depth() > 0
            && self
                .ignore_patterns
                .iter()
                .any(|pattern| file_name.starts_with(pattern.as_str()))
        {
            return false;
        }

        if entry.file_type().is_symlink() {
            if let Ok(canonical) = path.canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!(path = %path.display(), "Symlink loop detected");
                    return false;
                }
            }
        }

        true
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// Volume a source path lives on
///
/// The first segment beneath `volumes_root`, or `system_volume_label` for
/// paths elsewhere.
pub fn volume_label(source_path: &Path, config: &TomlConfig) -> String {
    source_path
        .strip_prefix(&config.volumes_root)
        .ok()
        .and_then(|rest| {
            rest.components().find_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
        })
        .unwrap_or_else(|| config.system_volume_label.clone())
}
