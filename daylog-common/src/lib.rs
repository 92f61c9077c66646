//! # Daylog Common Library
//!
//! Shared code for the daylog crates including:
//! - Error types
//! - Configuration loading
//! - Timecode arithmetic
//! - Byte and duration formatting for reports

pub mod config;
pub mod error;
pub mod format;
pub mod timecode;

pub use error::{Error, Result};
pub use timecode::Timecode;
