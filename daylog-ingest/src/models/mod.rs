//! Data models for daylog-ingest
//!
//! - Clip records (OCF, sound, proxy, merged)
//! - Custom field records
//! - Production days and report selections
//! - Ingest results

pub mod clip;
pub mod custom;
pub mod daily_log;
pub mod ingest_result;

pub use clip::{
    CameraMetadata, CameraMetadataRecord, ClipCopy, ClipRecord, IngestKind, MergedClip, ProxyInfo,
    ProxyRecord,
};
pub use custom::{is_reserved_key, CustomRecord, FieldValue, RESERVED_KEYS};
pub use daily_log::{DailyLog, OcfSection, ProxySection, Selection, SoundSection};
pub use ingest_result::{IngestIssue, IngestReport, IssueSeverity};
