//! User-defined custom fields
//!
//! Custom records are produced from CSV rows by the field-mapping
//! strategies in `services::custom_fields` and merged onto clips by name.

use daylog_common::format::DurationParts;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Keys a custom record may never set on a merged clip
pub const RESERVED_KEYS: [&str; 5] = ["clip", "size", "copies", "image", "proxy"];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// One parsed custom field value
///
/// Variant order matters for untagged deserialization: the first shape that
/// fits wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    ArrayOfArrays(Vec<Vec<String>>),
    Duration(DurationParts),
    KeyValue(IndexMap<String, String>),
    ArrayOfObjects(Vec<IndexMap<String, String>>),
}

impl FieldValue {
    /// Plain text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Custom fields for one clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRecord {
    pub clip: String,
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,
}

impl CustomRecord {
    pub fn new(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// First key that collides with a reserved clip key
    pub fn reserved_key(&self) -> Option<&str> {
        self.fields
            .keys()
            .map(String::as_str)
            .find(|key| is_reserved_key(key))
    }
}
