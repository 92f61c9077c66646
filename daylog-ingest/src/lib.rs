//! daylog-ingest library interface
//!
//! Media reconciliation and aggregation for production day reports:
//! hash-list manifests and camera metadata exports in, per-clip records and
//! report totals out.

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use crate::error::{IngestError, IngestResult};
pub use crate::store::ClipStore;
