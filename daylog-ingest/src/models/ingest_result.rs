//! Ingest call results and per-file issues
//!
//! Failures inside a batch are collected here instead of aborting the call.

use crate::error::IngestError;
use crate::models::IngestKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueSeverity {
    /// Something was dropped, the rest of the file was used
    Warning,
    /// A file or path contributed nothing, siblings continue
    Skip,
    /// The call could not produce anything
    Critical,
}

/// One problem encountered while ingesting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestIssue {
    /// File or source path that caused the issue
    pub file_path: String,

    /// Error code (e.g., "XML_ERROR", "NO_MANIFESTS")
    pub error_code: String,

    /// Human-readable error message
    pub error_message: String,

    pub severity: IssueSeverity,

    pub occurred_at: DateTime<Utc>,
}

impl IngestIssue {
    /// Build an issue from an error
    pub fn from_error(file_path: &Path, error: &IngestError, severity: IssueSeverity) -> Self {
        Self {
            file_path: file_path.display().to_string(),
            error_code: error.code().to_string(),
            error_message: error.to_string(),
            severity,
            occurred_at: Utc::now(),
        }
    }

    /// Create new skip issue
    pub fn skip(file_path: &Path, error: &IngestError) -> Self {
        Self::from_error(file_path, error, IssueSeverity::Skip)
    }

    /// Create new warning
    pub fn warning(file_path: &Path, error: &IngestError) -> Self {
        Self::from_error(file_path, error, IssueSeverity::Warning)
    }
}

/// Outcome of one ingest call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub kind: IngestKind,

    /// Source paths in the order given
    pub paths: Vec<PathBuf>,

    /// Manifest files parsed successfully
    pub manifests_parsed: usize,

    /// Clips first seen in this call
    pub clips_added: Vec<String>,

    /// Known clips that gained a copy on a new volume
    pub clips_updated: Vec<String>,

    /// Net-new clips that received camera metadata
    pub metadata_attached: usize,

    pub issues: Vec<IngestIssue>,
}

impl IngestReport {
    /// Create new empty report
    pub fn new(kind: IngestKind, paths: Vec<PathBuf>) -> Self {
        Self {
            kind,
            paths,
            manifests_parsed: 0,
            clips_added: Vec::new(),
            clips_updated: Vec::new(),
            metadata_attached: 0,
            issues: Vec::new(),
        }
    }

    /// Count issues by severity
    pub fn count_by_severity(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}
