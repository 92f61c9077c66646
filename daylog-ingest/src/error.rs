//! Error types for daylog-ingest
//!
//! Format errors (malformed XML, unknown manifest schema), content errors
//! (no usable manifests under a path), merge-safety errors (reserved custom
//! keys) and call-level configuration errors (bad patterns). Row-level
//! metadata validation failures are not errors here: they are logged and
//! the row is dropped.

use crate::models::IngestIssue;
use crate::services::file_scanner::ScanError;
use crate::services::metadata_extractor::MetadataError;
use std::path::PathBuf;
use thiserror::Error;

/// Ingest and reconciliation error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Document is not well-formed XML
    #[error("Malformed XML in {file}: {message}")]
    Xml { file: String, message: String },

    /// Well-formed XML that matches neither hash-list schema
    #[error("Unrecognized hash list in {file} ({diagnostic})")]
    UnknownSchema { file: String, diagnostic: String },

    /// No manifest files found under a selected path
    #[error("No manifests found in {}", path.display())]
    NoManifests { path: PathBuf },

    /// Manifests found, but none listed a file of the requested kind
    #[error("No usable files listed in manifests under {}", path.display())]
    NoUsableFiles { path: PathBuf },

    /// Several paths or files failed and none yielded a clip
    #[error("No usable clips from any source: {}", summarize(.issues))]
    NothingUsable { issues: Vec<IngestIssue> },

    /// Source path could not be scanned
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Camera metadata file could not be read
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Blocking parse task panicked or was cancelled
    #[error("Parse task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Custom field would overwrite a reserved clip key
    #[error("Custom field '{key}' on clip '{clip}' collides with a reserved key")]
    ReservedKey { clip: String, key: String },

    /// Custom field names a clip field but its value does not fit it
    #[error("Custom field '{key}' on clip '{clip}' does not fit the clip field")]
    InvalidCustomValue { clip: String, key: String },

    /// Pattern supplied by configuration does not compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// daylog-common error
    #[error("Common error: {0}")]
    Common(#[from] daylog_common::Error),
}

impl IngestError {
    /// Stable machine-readable code for reports
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Xml { .. } => "XML_ERROR",
            IngestError::UnknownSchema { .. } => "UNKNOWN_SCHEMA",
            IngestError::NoManifests { .. } => "NO_MANIFESTS",
            IngestError::NoUsableFiles { .. } => "NO_USABLE_FILES",
            IngestError::NothingUsable { .. } => "NOTHING_USABLE",
            IngestError::Scan(_) => "SCAN_ERROR",
            IngestError::Metadata(_) => "METADATA_ERROR",
            IngestError::Task(_) => "TASK_FAILED",
            IngestError::ReservedKey { .. } => "RESERVED_KEY",
            IngestError::InvalidCustomValue { .. } => "INVALID_CUSTOM_VALUE",
            IngestError::InvalidPattern { .. } => "INVALID_PATTERN",
            IngestError::InvalidInput(_) => "INVALID_INPUT",
            IngestError::Io(_) => "IO_ERROR",
            IngestError::Json(_) => "JSON_ERROR",
            IngestError::Common(_) => "COMMON_ERROR",
        }
    }
}

fn summarize(issues: &[IngestIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.error_message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;
