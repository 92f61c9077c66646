//! Backup-completeness copy groups
//!
//! Partitions the volumes backing a set of clips. Each volume joins the
//! first existing group whose accumulated clip set it does not overlap,
//! otherwise it starts a new group. A group therefore collects volumes with
//! non-redundant coverage, and two volumes holding the same clips always end
//! up in different groups.

use crate::models::ClipRecord;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Volumes reported together with the clips they cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyGroup {
    /// Volume names, in placement order
    pub volumes: Vec<String>,
    /// Clip names covered by the group
    pub clips: Vec<String>,
    /// `(covered, total)`
    pub count: (usize, usize),
}

/// Group volumes from per-clip copy detail
pub fn copy_groups(clips: &[ClipRecord]) -> Vec<CopyGroup> {
    let total = clips.len();

    let mut per_volume: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for clip in clips {
        for copy in &clip.copies {
            per_volume
                .entry(copy.volume.as_str())
                .or_default()
                .insert(clip.clip.as_str());
        }
    }

    let mut groups: Vec<(Vec<&str>, IndexSet<&str>)> = Vec::new();
    for (volume, volume_clips) in per_volume {
        match groups
            .iter_mut()
            .find(|(_, covered)| covered.is_disjoint(&volume_clips))
        {
            Some((volumes, covered)) => {
                volumes.push(volume);
                covered.extend(volume_clips);
            }
            None => groups.push((vec![volume], volume_clips)),
        }
    }

    groups
        .into_iter()
        .map(|(volumes, covered)| CopyGroup {
            count: (covered.len(), total),
            volumes: volumes.into_iter().map(str::to_string).collect(),
            clips: covered.into_iter().map(str::to_string).collect(),
        })
        .collect()
}

/// One trivial group per declared volume, used when no copy detail exists
pub fn copy_groups_from_volumes(volumes: &[String], total: usize) -> Vec<CopyGroup> {
    volumes
        .iter()
        .map(|volume| CopyGroup {
            volumes: vec![volume.clone()],
            clips: Vec::new(),
            count: (0, total),
        })
        .collect()
}

/// Copy groups for a section: clip detail when any clip has copies,
/// otherwise the declared volume list
pub fn analyze(clips: &[ClipRecord], declared: Option<&[String]>, total: usize) -> Vec<CopyGroup> {
    if clips.iter().any(|clip| !clip.copies.is_empty()) {
        copy_groups(clips)
    } else {
        declared
            .map(|volumes| copy_groups_from_volumes(volumes, total))
            .unwrap_or_default()
    }
}
