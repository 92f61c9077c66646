//! Aggregate computation and multi-day merge
//!
//! Every section aggregate is either declared on the day or derived from its
//! clips:
//! - `files`: declared, else the clip count
//! - `size`: declared, else the sum of clip sizes
//! - `duration` (OCF): declared, else clip durations summed as frames at each
//!   clip's own rate and rendered at the first clip's rate
//! - `reels`: declared, else the clips' reels, optionally range-compressed
//! - `copies`: declared, else the union of the clips' copy volumes
//!
//! Derived values exist only when there are clips to derive them from.

use crate::error::{IngestError, IngestResult};
use crate::models::{
    ClipRecord, DailyLog, MergedClip, OcfSection, ProxySection, Selection, SoundSection,
};
use crate::services::clip_merger::merge_clips;
use crate::services::copy_groups::{analyze, CopyGroup};
use daylog_common::config::TomlConfig;
use daylog_common::format::{format_bytes_string, format_duration, ByteUnit, DurationStyle};
use daylog_common::timecode::{frames_to_tc, tc_to_frames, tc_to_seconds};
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;

static REEL_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)(\d+)(\D*)$").expect("reel pattern is valid"));

// ============================================================================
// Reel range compression
// ============================================================================

/// A reel split around its trailing number
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReelParts<'a> {
    raw: &'a str,
    prefix: &'a str,
    suffix: &'a str,
    number: Option<u64>,
}

impl<'a> ReelParts<'a> {
    fn parse(raw: &'a str) -> Self {
        let parsed = REEL_PARTS.captures(raw).and_then(|caps| {
            let number = caps.get(2)?.as_str().parse::<u64>().ok()?;
            Some(Self {
                raw,
                prefix: caps.get(1)?.as_str(),
                suffix: caps.get(3)?.as_str(),
                number: Some(number),
            })
        });
        parsed.unwrap_or(Self {
            raw,
            prefix: raw,
            suffix: "",
            number: None,
        })
    }

    fn continues(&self, previous: &ReelParts<'_>) -> bool {
        match (previous.number, self.number) {
            (Some(prev), Some(next)) => {
                self.prefix == previous.prefix
                    && self.suffix == previous.suffix
                    && prev.checked_add(1) == Some(next)
            }
            _ => false,
        }
    }

    fn sort_key(&self, other: &Self) -> Ordering {
        self.prefix
            .cmp(other.prefix)
            .then_with(|| self.suffix.cmp(other.suffix))
            .then_with(|| self.number.cmp(&other.number))
            .then_with(|| self.raw.cmp(other.raw))
    }
}

/// Collapse consecutive reel numbers into `"first - last"` ranges
///
/// Reels are sorted by prefix, suffix, then number. Reels without a number
/// are kept as they are.
pub fn compress_reels(reels: &[String]) -> Vec<String> {
    let unique: IndexSet<&str> = reels.iter().map(String::as_str).collect();
    let mut parts: Vec<ReelParts<'_>> = unique.into_iter().map(ReelParts::parse).collect();
    parts.sort_by(|a, b| a.sort_key(b));

    let mut output = Vec::new();
    let mut index = 0;
    while index < parts.len() {
        let start = &parts[index];
        let mut end = index;
        while end + 1 < parts.len() && parts[end + 1].continues(&parts[end]) {
            end += 1;
        }
        if end == index {
            output.push(start.raw.to_string());
        } else {
            output.push(format!("{} - {}", start.raw, parts[end].raw));
        }
        index = end + 1;
    }
    output
}

fn other_clips_label(count: usize) -> String {
    if count == 1 {
        "+ 1 other clip".to_string()
    } else {
        format!("+ {} other clips", count)
    }
}

/// Distinct reels of the clips in first-seen order
fn clip_reels(clips: &[ClipRecord]) -> Vec<String> {
    let reels: IndexSet<&str> = clips
        .iter()
        .filter_map(|clip| clip.metadata.reel.as_deref())
        .collect();
    reels.into_iter().map(str::to_string).collect()
}

/// Distinct copy volumes of the clips in first-seen order
fn clip_volumes(clips: &[ClipRecord]) -> Vec<String> {
    let volumes: IndexSet<&str> = clips
        .iter()
        .flat_map(|clip| clip.copies.iter().map(|copy| copy.volume.as_str()))
        .collect();
    volumes.into_iter().map(str::to_string).collect()
}

fn union(lists: impl IntoIterator<Item = Vec<String>>) -> Vec<String> {
    let merged: IndexSet<String> = lists.into_iter().flatten().collect();
    merged.into_iter().collect()
}

// ============================================================================
// Section summaries
// ============================================================================

/// Resolved aggregates of one section, ready for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Size in automatic units, e.g. "117 MB"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Duration as `1h 02m 03s`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub copy_groups: Vec<CopyGroup>,
}

impl SectionSummary {
    fn new(files: Option<u64>, size: Option<u64>) -> Self {
        Self {
            files,
            size,
            size_label: size
                .map(|s| format_bytes_string(s, ByteUnit::Auto))
                .filter(|label| !label.is_empty()),
            duration: None,
            duration_label: None,
            reels: None,
            copies: None,
            copy_groups: Vec::new(),
        }
    }
}

// ============================================================================
// Calculator
// ============================================================================

/// Declared-or-derived aggregate resolution
#[derive(Debug, Clone, Copy)]
pub struct AggregateCalculator {
    default_fps: f64,
}

impl AggregateCalculator {
    pub fn new(default_fps: f64) -> Self {
        Self { default_fps }
    }

    pub fn from_config(config: &TomlConfig) -> Self {
        Self::new(config.default_fps)
    }

    /// Declared count, else the clip count when there are clips
    pub fn files(declared: Option<u64>, clip_count: usize) -> Option<u64> {
        declared.or_else(|| (clip_count > 0).then_some(clip_count as u64))
    }

    /// Declared size, else the sum of clip sizes when there are clips
    pub fn size(declared: Option<u64>, sizes: &[u64]) -> Option<u64> {
        declared.or_else(|| {
            (!sizes.is_empty()).then(|| sizes.iter().fold(0u64, |sum, s| sum.saturating_add(*s)))
        })
    }

    fn clip_sizes(clips: &[ClipRecord]) -> Vec<u64> {
        clips.iter().map(|clip| clip.size).collect()
    }

    /// Sum of clip durations, with the rate it is expressed at
    ///
    /// Clips without a duration are skipped; a duration that does not parse
    /// at its clip's rate is logged and skipped.
    pub fn clips_duration(&self, clips: &[ClipRecord]) -> Option<(String, f64)> {
        let output_fps = clips
            .first()
            .and_then(|clip| clip.metadata.fps)
            .unwrap_or(self.default_fps);

        let mut total: u64 = 0;
        let mut counted = 0usize;
        for clip in clips {
            let Some(duration) = clip.metadata.duration.as_deref() else {
                continue;
            };
            let fps = clip.metadata.fps.unwrap_or(self.default_fps);
            match tc_to_frames(duration, fps) {
                Ok(frames) => {
                    total = total.saturating_add(frames);
                    counted += 1;
                }
                Err(e) => {
                    tracing::warn!(clip = %clip.clip, error = %e, "Skipping clip duration");
                }
            }
        }

        if counted == 0 {
            return None;
        }
        frames_to_tc(total, output_fps)
            .ok()
            .map(|tc| (tc, output_fps))
    }

    /// Declared duration, else the clip duration sum
    pub fn duration(&self, declared: Option<&str>, clips: &[ClipRecord]) -> Option<String> {
        self.resolved_duration(declared, clips).map(|(tc, _)| tc)
    }

    fn resolved_duration(&self, declared: Option<&str>, clips: &[ClipRecord]) -> Option<(String, f64)> {
        match declared {
            Some(tc) => Some((tc.to_string(), self.default_fps)),
            None => self.clips_duration(clips),
        }
    }

    /// Declared reels, else the clips' reels
    ///
    /// With `group`, reels are range-compressed. Derived lists end with a
    /// `"+ N other clip(s)"` entry counting clips that carry no reel.
    pub fn reels(
        declared: Option<&[String]>,
        clips: &[ClipRecord],
        group: bool,
    ) -> Option<Vec<String>> {
        let compress = |reels: Vec<String>| if group { compress_reels(&reels) } else { reels };

        if let Some(declared) = declared {
            return Some(compress(declared.to_vec()));
        }
        if clips.is_empty() {
            return None;
        }

        let mut reels = compress(clip_reels(clips));
        let without_reel = clips.iter().filter(|c| c.metadata.reel.is_none()).count();
        if without_reel > 0 {
            reels.push(other_clips_label(without_reel));
        }
        Some(reels)
    }

    /// Declared volumes, else the union of clip copy volumes
    pub fn copies(declared: Option<&[String]>, clips: &[ClipRecord]) -> Option<Vec<String>> {
        match declared {
            Some(declared) => Some(declared.to_vec()),
            None => (!clips.is_empty()).then(|| clip_volumes(clips)),
        }
    }

    pub fn ocf_summary(&self, section: &OcfSection, group_reels: bool) -> SectionSummary {
        let files = Self::files(section.files, section.clips.len());
        let mut summary = SectionSummary::new(
            files,
            Self::size(section.size, &Self::clip_sizes(&section.clips)),
        );

        if let Some((duration, fps)) = self.resolved_duration(section.duration.as_deref(), &section.clips) {
            summary.duration_label = tc_to_seconds(&duration, fps)
                .ok()
                .map(|seconds| format_duration(seconds.floor() as u64, DurationStyle::Human));
            summary.duration = Some(duration);
        }
        summary.reels = Self::reels(section.reels.as_deref(), &section.clips, group_reels);
        summary.copies = Self::copies(section.copies.as_deref(), &section.clips);
        summary.copy_groups = analyze(
            &section.clips,
            section.copies.as_deref(),
            files.unwrap_or(0) as usize,
        );
        summary
    }

    pub fn proxy_summary(&self, section: &ProxySection) -> SectionSummary {
        let sizes: Vec<u64> = section.clips.iter().map(|clip| clip.size).collect();
        SectionSummary::new(
            Self::files(section.files, section.clips.len()),
            Self::size(section.size, &sizes),
        )
    }

    pub fn sound_summary(&self, section: &SoundSection) -> SectionSummary {
        let files = Self::files(section.files, section.clips.len());
        let mut summary = SectionSummary::new(
            files,
            Self::size(section.size, &Self::clip_sizes(&section.clips)),
        );
        summary.copies = Self::copies(section.copies.as_deref(), &section.clips);
        summary.copy_groups = analyze(
            &section.clips,
            section.copies.as_deref(),
            files.unwrap_or(0) as usize,
        );
        summary
    }

    // ------------------------------------------------------------------------
    // Multi-day merge
    // ------------------------------------------------------------------------

    /// Merge days into one reporting selection
    ///
    /// An aggregate declared on any day is recomputed from every day's
    /// resolved value. One declared on no day stays unset, leaving it to be
    /// derived from the concatenated clips.
    pub fn merge_days(&self, days: &[DailyLog]) -> IngestResult<Selection> {
        if days.is_empty() {
            return Err(IngestError::InvalidInput("no days selected".to_string()));
        }

        let mut ordered: Vec<&DailyLog> = days.iter().collect();
        ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.day.cmp(&b.day)));

        let mut day_numbers: Vec<u32> = ordered.iter().map(|d| d.day).collect();
        day_numbers.sort_unstable();
        day_numbers.dedup();

        let first_date = ordered[0].date;
        let last_date = ordered[ordered.len() - 1].date;
        let date = if first_date == last_date {
            first_date.format("%Y-%m-%d").to_string()
        } else {
            format!(
                "{} - {}",
                first_date.format("%Y-%m-%d"),
                last_date.format("%Y-%m-%d")
            )
        };

        let units: IndexSet<String> = ordered.iter().filter_map(|d| d.unit.clone()).collect();

        let selection = Selection {
            ids: ordered.iter().map(|d| d.id).collect(),
            days: day_numbers,
            date,
            units: units.into_iter().collect(),
            ocf: self.merge_ocf(&ordered),
            proxy: Self::merge_proxy(&ordered),
            sound: Self::merge_sound(&ordered),
            custom: ordered.iter().flat_map(|d| d.custom.iter().cloned()).collect(),
        };

        tracing::debug!(
            days = selection.days.len(),
            ocf_clips = selection.ocf.clips.len(),
            sound_clips = selection.sound.clips.len(),
            "Merged days"
        );

        Ok(selection)
    }

    fn merge_ocf(&self, days: &[&DailyLog]) -> OcfSection {
        let sections: Vec<&OcfSection> = days.iter().map(|d| &d.ocf).collect();
        let files = sections.iter().any(|s| s.files.is_some()).then(|| {
            sections
                .iter()
                .filter_map(|s| Self::files(s.files, s.clips.len()))
                .sum::<u64>()
        });
        let size = sections.iter().any(|s| s.size.is_some()).then(|| {
            sections
                .iter()
                .filter_map(|s| Self::size(s.size, &Self::clip_sizes(&s.clips)))
                .fold(0u64, u64::saturating_add)
        });
        let duration = if sections.iter().any(|s| s.duration.is_some()) {
            self.sum_durations(
                sections
                    .iter()
                    .filter_map(|s| self.resolved_duration(s.duration.as_deref(), &s.clips)),
            )
        } else {
            None
        };
        let reels = sections.iter().any(|s| s.reels.is_some()).then(|| {
            union(
                sections
                    .iter()
                    .map(|s| s.reels.clone().unwrap_or_else(|| clip_reels(&s.clips))),
            )
        });
        let copies = sections.iter().any(|s| s.copies.is_some()).then(|| {
            union(
                sections
                    .iter()
                    .filter_map(|s| Self::copies(s.copies.as_deref(), &s.clips)),
            )
        });

        OcfSection {
            files,
            size,
            duration,
            reels,
            copies,
            clips: sections.iter().flat_map(|s| s.clips.iter().cloned()).collect(),
        }
    }

    fn merge_proxy(days: &[&DailyLog]) -> ProxySection {
        let sections: Vec<&ProxySection> = days.iter().map(|d| &d.proxy).collect();
        let files = sections.iter().any(|s| s.files.is_some()).then(|| {
            sections
                .iter()
                .filter_map(|s| Self::files(s.files, s.clips.len()))
                .sum::<u64>()
        });
        let size = sections.iter().any(|s| s.size.is_some()).then(|| {
            sections
                .iter()
                .filter_map(|s| {
                    let sizes: Vec<u64> = s.clips.iter().map(|c| c.size).collect();
                    Self::size(s.size, &sizes)
                })
                .fold(0u64, u64::saturating_add)
        });

        ProxySection {
            files,
            size,
            clips: sections.iter().flat_map(|s| s.clips.iter().cloned()).collect(),
        }
    }

    fn merge_sound(days: &[&DailyLog]) -> SoundSection {
        let sections: Vec<&SoundSection> = days.iter().map(|d| &d.sound).collect();
        let files = sections.iter().any(|s| s.files.is_some()).then(|| {
            sections
                .iter()
                .filter_map(|s| Self::files(s.files, s.clips.len()))
                .sum::<u64>()
        });
        let size = sections.iter().any(|s| s.size.is_some()).then(|| {
            sections
                .iter()
                .filter_map(|s| Self::size(s.size, &Self::clip_sizes(&s.clips)))
                .fold(0u64, u64::saturating_add)
        });
        let copies = sections.iter().any(|s| s.copies.is_some()).then(|| {
            union(
                sections
                    .iter()
                    .filter_map(|s| Self::copies(s.copies.as_deref(), &s.clips)),
            )
        });

        SoundSection {
            files,
            size,
            copies,
            clips: sections.iter().flat_map(|s| s.clips.iter().cloned()).collect(),
        }
    }

    /// Frame-sum of `(timecode, fps)` pairs, rendered at the first rate
    fn sum_durations(&self, durations: impl Iterator<Item = (String, f64)>) -> Option<String> {
        let mut output_fps = None;
        let mut total: u64 = 0;
        for (tc, fps) in durations {
            match tc_to_frames(&tc, fps) {
                Ok(frames) => {
                    output_fps.get_or_insert(fps);
                    total = total.saturating_add(frames);
                }
                Err(e) => tracing::warn!(duration = %tc, error = %e, "Skipping day duration"),
            }
        }
        output_fps.and_then(|fps| frames_to_tc(total, fps).ok())
    }
}

impl Selection {
    /// Copy groups over the merged OCF clips, or the declared volumes
    pub fn ocf_copy_groups(&self) -> Vec<CopyGroup> {
        let total = AggregateCalculator::files(self.ocf.files, self.ocf.clips.len()).unwrap_or(0);
        analyze(&self.ocf.clips, self.ocf.copies.as_deref(), total as usize)
    }

    /// Copy groups over the merged sound clips, or the declared volumes
    pub fn sound_copy_groups(&self) -> Vec<CopyGroup> {
        let total =
            AggregateCalculator::files(self.sound.files, self.sound.clips.len()).unwrap_or(0);
        analyze(&self.sound.clips, self.sound.copies.as_deref(), total as usize)
    }

    /// Per-clip merge across every selected day
    pub fn merged_clips(&self) -> IngestResult<Vec<MergedClip>> {
        merge_clips(
            &self.ocf.clips,
            &self.proxy.clips,
            &self.sound.clips,
            &self.custom,
        )
    }
}
