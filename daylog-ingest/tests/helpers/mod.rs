//! Test Helper Utilities
//!
//! Shared utilities for testing daylog-ingest

#![allow(dead_code)]

pub mod manifest_fixtures;

// Re-export commonly used items
pub use manifest_fixtures::{
    ale_export, asc_manifest, classic_manifest, volumes_config, write_file, FileRow,
};
