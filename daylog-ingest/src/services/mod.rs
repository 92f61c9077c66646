//! Service modules for media reconciliation
//!
//! Leaves first:
//! - `xml_scan`, `sequence`: pure helpers for manifest parsing
//! - `file_scanner`: source path discovery and volume labels
//! - `manifest_parser`, `metadata_extractor`: per-file parsing
//! - `clip_resolver`: per-ingest reconciliation into the clip store
//! - `clip_merger`, `copy_groups`, `aggregates`: read-side views and totals
//! - `custom_fields`: CSV cell parsing strategies for custom records

pub mod aggregates;
pub mod clip_merger;
pub mod clip_resolver;
pub mod copy_groups;
pub mod custom_fields;
pub mod file_scanner;
pub mod manifest_parser;
pub mod metadata_extractor;
pub mod sequence;
pub mod xml_scan;

pub use aggregates::{compress_reels, AggregateCalculator, SectionSummary};
pub use clip_merger::merge_clips;
pub use clip_resolver::ClipIdentityResolver;
pub use copy_groups::{copy_groups, copy_groups_from_volumes, CopyGroup};
pub use custom_fields::{CustomFieldMapping, DurationUnit, FieldMapping, FieldParser, FieldSpec};
pub use file_scanner::{volume_label, FileScanner, ScanError};
pub use manifest_parser::{parse_manifest, ManifestEntry, ManifestFormat, ManifestParser};
pub use metadata_extractor::{MetadataError, MetadataExtraction, MetadataExtractor, MetadataRowError};
pub use sequence::resolve_clip_names;
