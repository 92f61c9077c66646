//! Clip records
//!
//! `ClipRecord` is the reconciled per-clip view of original camera files and
//! sound recordings. `MergedClip` is the externally visible union of OCF,
//! proxy, sound and custom data for one clip.

use crate::models::FieldValue;
use daylog_common::timecode::parse_fps;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which media a manifest ingest is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestKind {
    /// Original camera files
    Ocf,
    /// Sound recordings
    Sound,
}

impl fmt::Display for IngestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestKind::Ocf => f.write_str("ocf"),
            IngestKind::Sound => f.write_str("sound"),
        }
    }
}

impl FromStr for IngestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ocf" => Ok(IngestKind::Ocf),
            "sound" => Ok(IngestKind::Sound),
            other => Err(format!("unknown ingest kind '{}'", other)),
        }
    }
}

/// One verified instance of a clip on a backup volume
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipCopy {
    pub volume: String,
    pub hash: Option<String>,
}

/// Descriptive camera fields attached to a clip
///
/// Every field is optional; timecodes are `HH:MM:SS:FF`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tc_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tc_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lut: Option<String>,
}

impl CameraMetadata {
    /// Serialized field names, as accepted by `set_field`
    pub const FIELDS: [&'static str; 15] = [
        "tc_start",
        "tc_end",
        "duration",
        "fps",
        "reel",
        "camera_model",
        "resolution",
        "codec",
        "lens",
        "white_balance",
        "tint",
        "shutter",
        "exposure_index",
        "gamma",
        "lut",
    ];

    pub fn has_field(key: &str) -> bool {
        Self::FIELDS.contains(&key)
    }

    /// Timecode range and rate, when all three are present
    pub fn timecode_range(&self) -> Option<(&str, &str, f64)> {
        match (&self.tc_start, &self.tc_end, self.fps) {
            (Some(start), Some(end), Some(fps)) => Some((start.as_str(), end.as_str(), fps)),
            _ => None,
        }
    }

    /// Assign a field by its serialized name
    ///
    /// Returns false if `key` names no metadata field, or if the value does not
    /// fit it (`fps` must parse as a rate).
    pub fn set_field(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "tc_start" => &mut self.tc_start,
            "tc_end" => &mut self.tc_end,
            "duration" => &mut self.duration,
            "reel" => &mut self.reel,
            "camera_model" => &mut self.camera_model,
            "resolution" => &mut self.resolution,
            "codec" => &mut self.codec,
            "lens" => &mut self.lens,
            "white_balance" => &mut self.white_balance,
            "tint" => &mut self.tint,
            "shutter" => &mut self.shutter,
            "exposure_index" => &mut self.exposure_index,
            "gamma" => &mut self.gamma,
            "lut" => &mut self.lut,
            "fps" => {
                return match parse_fps(&value) {
                    Some(fps) => {
                        self.fps = Some(fps);
                        true
                    }
                    None => false,
                };
            }
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// Camera metadata parsed from an ALE row or XML sidecar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraMetadataRecord {
    pub clip: String,
    #[serde(flatten)]
    pub metadata: CameraMetadata,
}

/// A reconciled logical clip (OCF or sound)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRecord {
    pub clip: String,
    /// Sum over sequence members
    pub size: u64,
    #[serde(default)]
    pub copies: Vec<ClipCopy>,
    #[serde(flatten)]
    pub metadata: CameraMetadata,
}

impl ClipRecord {
    pub fn new(clip: impl Into<String>, size: u64, copies: Vec<ClipCopy>) -> Self {
        Self {
            clip: clip.into(),
            size,
            copies,
            metadata: CameraMetadata::default(),
        }
    }

    pub fn has_volume(&self, volume: &str) -> bool {
        self.copies.iter().any(|c| c.volume == volume)
    }

    /// Append copies whose volume is not already present
    ///
    /// Returns how many copies were added.
    pub fn add_copies<'a>(&mut self, copies: impl IntoIterator<Item = &'a ClipCopy>) -> usize {
        let mut added = 0;
        for copy in copies {
            if !self.has_volume(&copy.volume) {
                self.copies.push(copy.clone());
                added += 1;
            }
        }
        added
    }
}

/// Transcoded proxy descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub clip: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// Proxy fields as nested in a merged clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyInfo {
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl From<&ProxyRecord> for ProxyInfo {
    fn from(proxy: &ProxyRecord) -> Self {
        Self {
            size: proxy.size,
            format: proxy.format.clone(),
            codec: proxy.codec.clone(),
            resolution: proxy.resolution.clone(),
        }
    }
}

/// Union of OCF, proxy, sound and custom data for one clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedClip {
    pub clip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub copies: Vec<ClipCopy>,
    #[serde(flatten)]
    pub metadata: CameraMetadata,
    /// Names of sound clips whose timecode overlaps this clip
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sound: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyInfo>,
    /// Custom keys that name no clip field
    #[serde(flatten)]
    pub custom: IndexMap<String, FieldValue>,
}

impl MergedClip {
    /// Bare entry keyed only by name
    pub fn bare(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            size: None,
            copies: Vec::new(),
            metadata: CameraMetadata::default(),
            sound: Vec::new(),
            proxy: None,
            custom: IndexMap::new(),
        }
    }

    /// Assign a custom value to the clip field `key` names
    ///
    /// `None` if `key` names no clip field. `Some(false)` if it does but the
    /// value does not fit: metadata fields take text, `sound` takes text or a
    /// list of names.
    pub fn assign(&mut self, key: &str, value: &FieldValue) -> Option<bool> {
        if key == "sound" {
            self.sound = match value {
                FieldValue::Text(name) => vec![name.clone()],
                FieldValue::List(names) => names.clone(),
                _ => return Some(false),
            };
            return Some(true);
        }
        if !CameraMetadata::has_field(key) {
            return None;
        }
        Some(
            value
                .as_text()
                .map(|text| self.metadata.set_field(key, text.to_string()))
                .unwrap_or(false),
        )
    }
}
