//! Production-day records and multi-day report selections
//!
//! Every aggregate (`files`, `size`, `duration`, `reels`, `copies`) is either
//! declared directly on a section or left unset to be derived from its clips.

use crate::models::{ClipRecord, CustomRecord, ProxyRecord};
use chrono::NaiveDate;
use daylog_common::Timecode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Original camera file section of a day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcfSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Declared total duration, `HH:MM:SS:FF`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reels: Option<Vec<String>>,
    /// Declared backup volume names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<Vec<String>>,
    pub clips: Vec<ClipRecord>,
}

/// Proxy section of a day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub clips: Vec<ProxyRecord>,
}

/// Sound section of a day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<Vec<String>>,
    pub clips: Vec<ClipRecord>,
}

/// One production day
///
/// Created when a report is saved and replaced wholesale on re-save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    pub id: Uuid,
    pub day: u32,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub ocf: OcfSection,
    #[serde(default)]
    pub proxy: ProxySection,
    #[serde(default)]
    pub sound: SoundSection,
    #[serde(default)]
    pub custom: Vec<CustomRecord>,
}

impl DailyLog {
    pub fn new(day: u32, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            day,
            date,
            unit: None,
            ocf: OcfSection::default(),
            proxy: ProxySection::default(),
            sound: SoundSection::default(),
            custom: Vec::new(),
        }
    }

    /// Check declared values and clip timecodes
    ///
    /// A clip duration is only meaningful with a frame rate to count it in.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(duration) = &self.ocf.duration {
            duration
                .parse::<Timecode>()
                .map_err(|e| format!("day {}: declared duration: {}", self.day, e))?;
        }
        for clip in self.ocf.clips.iter().chain(&self.sound.clips) {
            if let Some(duration) = &clip.metadata.duration {
                duration
                    .parse::<Timecode>()
                    .map_err(|e| format!("day {}: clip {}: {}", self.day, clip.clip, e))?;
                if clip.metadata.fps.is_none() {
                    return Err(format!(
                        "day {}: clip {} has a duration but no fps",
                        self.day, clip.clip
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One or more days merged for reporting
///
/// Built on demand by `AggregateCalculator::merge_days`; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub ids: Vec<Uuid>,
    /// Sorted day numbers
    pub days: Vec<u32>,
    /// `min - max`, or a single date
    pub date: String,
    /// Distinct unit names in first-seen order
    pub units: Vec<String>,
    pub ocf: OcfSection,
    pub proxy: ProxySection,
    pub sound: SoundSection,
    pub custom: Vec<CustomRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> DailyLog {
        DailyLog::new(1, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    #[test]
    fn test_minimal_json_deserializes() {
        let json = serde_json::json!({
            "id": "7f1c7a52-3f0e-4a7e-9d55-5b0f1f0f6d11",
            "day": 3,
            "date": "2024-05-03",
            "ocf": { "size": 100 }
        });
        let log: DailyLog = serde_json::from_value(json).unwrap();
        assert_eq!(log.day, 3);
        assert_eq!(log.ocf.size, Some(100));
        assert!(log.ocf.clips.is_empty());
        assert!(log.sound.files.is_none());
    }

    #[test]
    fn test_validate_declared_duration() {
        let mut log = day();
        log.ocf.duration = Some("01:00:00:00".to_string());
        assert!(log.validate().is_ok());
        log.ocf.duration = Some("one hour".to_string());
        assert!(log.validate().is_err());
    }

    #[test]
    fn test_validate_clip_duration_needs_fps() {
        let mut log = day();
        let mut clip = ClipRecord::new("A001C001", 1, Vec::new());
        clip.metadata.duration = Some("00:00:10:00".to_string());
        log.ocf.clips.push(clip.clone());
        assert!(log.validate().is_err());

        clip.metadata.fps = Some(25.0);
        log.ocf.clips = vec![clip];
        assert!(log.validate().is_ok());
    }
}
