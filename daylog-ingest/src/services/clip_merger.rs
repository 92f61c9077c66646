//! Multi-source clip merge
//!
//! Builds the externally visible `MergedClip` list for a day from its stored
//! OCF, proxy, sound and custom records. OCF, proxy and custom records join
//! by clip name; sound joins by timecode overlap only.

use crate::error::{IngestError, IngestResult};
use crate::models::{CameraMetadata, ClipRecord, CustomRecord, MergedClip, ProxyInfo, ProxyRecord};
use daylog_common::timecode::{ranges_overlap, tc_to_frames};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Frame range of a clip, when it carries valid timecodes and a rate
fn frame_range(clip_name: &str, metadata: &CameraMetadata) -> Option<(u64, u64)> {
    let (start, end, fps) = metadata.timecode_range()?;
    match (tc_to_frames(start, fps), tc_to_frames(end, fps)) {
        (Ok(start), Ok(end)) => Some((start, end)),
        _ => {
            tracing::debug!(clip = %clip_name, "Skipping sound match, timecode does not parse");
            None
        }
    }
}

/// Merge one day's records into per-clip views
///
/// Output keeps the order in which each name first appears across the OCF,
/// proxy, custom and sound passes. Fails without merging anything if any
/// custom record sets a reserved key, or gives a clip field a value that
/// does not fit it.
pub fn merge_clips(
    ocf: &[ClipRecord],
    proxy: &[ProxyRecord],
    sound: &[ClipRecord],
    custom: &[CustomRecord],
) -> IngestResult<Vec<MergedClip>> {
    if let Some((record, key)) = custom
        .iter()
        .find_map(|record| record.reserved_key().map(|key| (record, key)))
    {
        return Err(IngestError::ReservedKey {
            clip: record.clip.clone(),
            key: key.to_string(),
        });
    }

    let mut merged: IndexMap<String, MergedClip> = IndexMap::new();

    for clip in ocf {
        let entry = merged
            .entry(clip.clip.clone())
            .or_insert_with(|| MergedClip::bare(clip.clip.clone()));
        entry.size = Some(clip.size);
        entry.copies = clip.copies.clone();
        entry.metadata = clip.metadata.clone();
    }

    for record in proxy {
        merged
            .entry(record.clip.clone())
            .or_insert_with(|| MergedClip::bare(record.clip.clone()))
            .proxy = Some(ProxyInfo::from(record));
    }

    // Custom values replace the clip fields they name, sound included
    let mut sound_assigned: HashSet<String> = HashSet::new();
    for record in custom {
        let entry = merged
            .entry(record.clip.clone())
            .or_insert_with(|| MergedClip::bare(record.clip.clone()));
        for (key, value) in &record.fields {
            match entry.assign(key, value) {
                Some(true) => {
                    if key == "sound" {
                        sound_assigned.insert(record.clip.clone());
                    }
                }
                Some(false) => {
                    return Err(IngestError::InvalidCustomValue {
                        clip: record.clip.clone(),
                        key: key.clone(),
                    });
                }
                None => {
                    entry.custom.insert(key.clone(), value.clone());
                }
            }
        }
    }

    let sound_ranges: Vec<(&str, u64, u64)> = sound
        .iter()
        .filter_map(|clip| {
            frame_range(&clip.clip, &clip.metadata).map(|(start, end)| (clip.clip.as_str(), start, end))
        })
        .collect();

    if !sound_ranges.is_empty() {
        for entry in merged.values_mut() {
            if sound_assigned.contains(&entry.clip) {
                continue;
            }
            let Some((start, end)) = frame_range(&entry.clip, &entry.metadata) else {
                continue;
            };
            for (name, sound_start, sound_end) in &sound_ranges {
                if ranges_overlap(start, end, *sound_start, *sound_end)
                    && !entry.sound.iter().any(|s| s.as_str() == *name)
                {
                    entry.sound.push(name.to_string());
                }
            }
        }
    }

    tracing::debug!(
        ocf = ocf.len(),
        proxy = proxy.len(),
        sound = sound.len(),
        custom = custom.len(),
        merged = merged.len(),
        "Merged clips"
    );

    Ok(merged.into_values().collect())
}
