//! Image-sequence detection
//!
//! Frame-per-file formats (DNG, ARRIRAW, EXR, DPX) list one manifest row per
//! frame. Rows are folded into one clip named after their shared prefix, but
//! only when the grouping is unambiguous:
//! - every member ends in a `.NNN` or `_NNN` numeric suffix, and
//! - the prefix group has more than one member.
//!
//! Anything else is its own clip under its raw name, so two unrelated files
//! that happen to share a prefix are never merged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static SEQUENCE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)[._](\d+)$").expect("sequence pattern is valid"));

/// Split a raw name into its sequence prefix, if it has a numeric suffix
pub fn sequence_prefix(raw_name: &str) -> Option<&str> {
    SEQUENCE_SUFFIX
        .captures(raw_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Resolve the clip name for each raw name
///
/// Output is index-aligned with the input. Pure and deterministic for a given
/// list.
pub fn resolve_clip_names(raw_names: &[String]) -> Vec<String> {
    struct Group {
        members: usize,
        all_suffixed: bool,
    }

    let keyed: Vec<(&str, bool)> = raw_names
        .iter()
        .map(|name| match sequence_prefix(name) {
            Some(prefix) => (prefix, true),
            None => (name.as_str(), false),
        })
        .collect();

    let mut groups: HashMap<&str, Group> = HashMap::new();
    for (prefix, suffixed) in &keyed {
        let group = groups.entry(*prefix).or_insert(Group {
            members: 0,
            all_suffixed: true,
        });
        group.members += 1;
        group.all_suffixed &= *suffixed;
    }

    raw_names
        .iter()
        .zip(&keyed)
        .map(|(raw, (prefix, _))| {
            let group = &groups[prefix];
            if group.members > 1 && group.all_suffixed {
                prefix.to_string()
            } else {
                raw.clone()
            }
        })
        .collect()
}
