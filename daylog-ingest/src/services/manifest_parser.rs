//! Hash-list manifest parsing
//!
//! Two incompatible hash-list generations are accepted:
//! - classic: flat `<hash><file/><size/><md5/>…</hash>` rows under `<hashlist>`
//! - ASC: `<hashes><hash><path size="…">…</path><xxh64>…</xxh64></hash></hashes>`
//!
//! **Algorithm:**
//! 1. Reject documents that are not well-formed XML (error names the file)
//! 2. Attempt the classic schema, then the ASC schema
//! 3. If neither matches, fail with whatever prolog/version details the scan
//!    salvaged, never with raw deserializer internals
//! 4. Keep rows whose extension is accepted for the ingest kind
//! 5. Fold image sequences into one clip per prefix
//! 6. Emit one `ClipRecord` per clip: summed size, one copy on the volume

use crate::error::{IngestError, IngestResult};
use crate::models::{ClipCopy, ClipRecord, IngestKind};
use crate::services::sequence::resolve_clip_names;
use crate::services::xml_scan::{scan_document, DocumentInfo};
use daylog_common::config::TomlConfig;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Root element of both hash-list generations
const HASHLIST_ROOT: &str = "hashlist";

// ============================================================================
// Classic schema
// ============================================================================

/// Classic (flat) hash list
#[derive(Debug, Clone, Deserialize)]
pub struct ClassicHashList {
    #[serde(rename = "@version")]
    pub version: Option<String>,
    pub hash: Vec<ClassicHashItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassicHashItem {
    pub file: String,
    /// Stringified integer
    pub size: String,
    pub lastmodificationdate: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub xxhash64: Option<String>,
    pub xxhash64be: Option<String>,
    pub hashdate: Option<String>,
}

impl ClassicHashList {
    fn entries(&self) -> Result<Vec<ManifestEntry>, String> {
        self.hash
            .iter()
            .map(|item| {
                Ok(ManifestEntry {
                    file: item.file.trim().to_string(),
                    size: parse_size(&item.size, &item.file)?,
                    digests: HashDigests {
                        md5: clean(&item.md5),
                        sha1: clean(&item.sha1),
                        xxhash64: clean(&item.xxhash64),
                        xxhash64be: clean(&item.xxhash64be),
                    },
                })
            })
            .collect()
    }
}

// ============================================================================
// ASC schema
// ============================================================================

/// ASC (nested) hash list
#[derive(Debug, Clone, Deserialize)]
pub struct AscHashList {
    #[serde(rename = "@version")]
    pub version: Option<String>,
    pub hashes: AscHashes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AscHashes {
    #[serde(default)]
    pub hash: Vec<AscHashItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AscHashItem {
    pub path: AscPath,
    pub md5: Option<AscDigest>,
    pub sha1: Option<AscDigest>,
    pub xxh64: Option<AscDigest>,
    pub xxh64be: Option<AscDigest>,
    pub xxh128: Option<AscDigest>,
    pub xxh3: Option<AscDigest>,
    pub c4: Option<AscDigest>,
    #[serde(rename = "previousPath")]
    pub previous_path: Option<AscPath>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AscPath {
    #[serde(rename = "$text")]
    pub text: String,
    #[serde(rename = "@size")]
    pub size: Option<String>,
    #[serde(rename = "@creationdate")]
    pub creationdate: Option<String>,
    #[serde(rename = "@lastmodificationdate")]
    pub lastmodificationdate: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AscDigest {
    #[serde(rename = "$text")]
    pub text: String,
    #[serde(rename = "@action")]
    pub action: Option<String>,
    #[serde(rename = "@hashdate")]
    pub hashdate: Option<String>,
    #[serde(rename = "@structure")]
    pub structure: Option<String>,
}

impl AscHashList {
    fn entries(&self) -> Result<Vec<ManifestEntry>, String> {
        let digest = |d: &Option<AscDigest>| {
            d.as_ref()
                .map(|d| d.text.trim().to_string())
                .filter(|t| !t.is_empty())
        };

        self.hashes
            .hash
            .iter()
            .map(|item| {
                let size = item
                    .path
                    .size
                    .as_deref()
                    .ok_or_else(|| format!("path '{}' has no size", item.path.text))?;
                Ok(ManifestEntry {
                    file: item.path.text.trim().to_string(),
                    size: parse_size(size, &item.path.text)?,
                    digests: HashDigests {
                        md5: digest(&item.md5),
                        sha1: digest(&item.sha1),
                        xxhash64: digest(&item.xxh64),
                        xxhash64be: digest(&item.xxh64be),
                    },
                })
            })
            .collect()
    }
}

// ============================================================================
// Schema resolution
// ============================================================================

/// A hash list resolved to exactly one schema generation
#[derive(Debug, Clone)]
pub enum ManifestFormat {
    Classic(ClassicHashList),
    Asc(AscHashList),
}

impl ManifestFormat {
    /// Hash-list version attribute
    pub fn version(&self) -> Option<&str> {
        match self {
            ManifestFormat::Classic(list) => list.version.as_deref(),
            ManifestFormat::Asc(list) => list.version.as_deref(),
        }
    }

    /// Validated file rows
    pub fn entries(&self) -> Vec<ManifestEntry> {
        // Both variants are only constructed after their entries validated
        let entries = match self {
            ManifestFormat::Classic(list) => list.entries(),
            ManifestFormat::Asc(list) => list.entries(),
        };
        entries.unwrap_or_default()
    }
}

/// Digests recorded for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashDigests {
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub xxhash64: Option<String>,
    pub xxhash64be: Option<String>,
}

impl HashDigests {
    /// Digest by priority md5 → sha1 → xxhash64 → xxhash64be
    pub fn preferred(&self) -> Option<String> {
        self.md5
            .as_ref()
            .or(self.sha1.as_ref())
            .or(self.xxhash64.as_ref())
            .or(self.xxhash64be.as_ref())
            .cloned()
    }
}

/// One file row of a hash list (transient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file: String,
    pub size: u64,
    pub digests: HashDigests,
}

impl ManifestEntry {
    /// Final path segment
    pub fn file_name(&self) -> &str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(&self.file)
    }

    /// (name without extension, lowercase extension)
    pub fn split_name(&self) -> (&str, String) {
        let name = self.file_name();
        match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], name[dot + 1..].to_ascii_lowercase()),
            _ => (name, String::new()),
        }
    }
}

/// Validate and resolve a hash-list document
///
/// `file` names the document in errors.
pub fn parse_manifest(xml: &str, file: &str) -> IngestResult<ManifestFormat> {
    let info = scan_document(xml).map_err(|message| IngestError::Xml {
        file: file.to_string(),
        message,
    })?;

    let classic_error = match try_classic(xml, &info) {
        Ok(list) => return Ok(ManifestFormat::Classic(list)),
        Err(e) => e,
    };

    let asc_error = match try_asc(xml, &info) {
        Ok(list) => return Ok(ManifestFormat::Asc(list)),
        Err(e) => e,
    };

    tracing::debug!(
        file = %file,
        classic = %classic_error,
        asc = %asc_error,
        "Hash list matched neither schema"
    );

    Err(IngestError::UnknownSchema {
        file: file.to_string(),
        diagnostic: diagnostic(&info),
    })
}

fn try_classic(xml: &str, info: &DocumentInfo) -> Result<ClassicHashList, String> {
    if info.root != HASHLIST_ROOT {
        return Err(format!("root element is <{}>", info.root));
    }
    let list: ClassicHashList = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
    list.entries()?;
    Ok(list)
}

fn try_asc(xml: &str, info: &DocumentInfo) -> Result<AscHashList, String> {
    if info.root != HASHLIST_ROOT {
        return Err(format!("root element is <{}>", info.root));
    }
    let list: AscHashList = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
    list.entries()?;
    Ok(list)
}

/// Best-effort description of an unrecognized document
fn diagnostic(info: &DocumentInfo) -> String {
    let mut parts = Vec::new();
    if let Some(version) = &info.xml_version {
        parts.push(format!("xml version {}", version));
    }
    if let Some(encoding) = &info.encoding {
        parts.push(format!("encoding {}", encoding));
    }
    if info.root == HASHLIST_ROOT {
        match info.root_attribute("version") {
            Some(version) => parts.push(format!("hashlist version {}", version)),
            None => parts.push("hashlist without version".to_string()),
        }
    } else {
        parts.push(format!("root element <{}>", info.root));
    }
    parts.join(", ")
}

fn parse_size(raw: &str, file: &str) -> Result<u64, String> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| format!("size '{}' of '{}' is not a byte count", raw, file))
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Parser
// ============================================================================

/// Manifest parser for one ingest kind
#[derive(Debug, Clone)]
pub struct ManifestParser {
    kind: IngestKind,
    extensions: HashSet<String>,
}

impl ManifestParser {
    /// Parser accepting the configured extensions for `kind`
    pub fn new(kind: IngestKind, config: &TomlConfig) -> Self {
        let extensions = match kind {
            IngestKind::Ocf => &config.extensions.ocf,
            IngestKind::Sound => &config.extensions.sound,
        };
        Self::with_extensions(kind, extensions)
    }

    pub fn with_extensions<S: AsRef<str>>(
        kind: IngestKind,
        extensions: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            kind,
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Is this row's extension accepted
    pub fn accepts(&self, entry: &ManifestEntry) -> bool {
        let (_, extension) = entry.split_name();
        self.extensions.contains(&extension)
    }

    /// Read and parse one manifest file
    pub fn parse_file(&self, path: &Path, volume: &str) -> IngestResult<Vec<ClipRecord>> {
        let xml = std::fs::read_to_string(path)?;
        self.parse_str(&xml, &path.display().to_string(), volume)
    }

    /// Parse manifest text into clips on `volume`
    pub fn parse_str(&self, xml: &str, file: &str, volume: &str) -> IngestResult<Vec<ClipRecord>> {
        let format = parse_manifest(xml, file)?;
        let entries = format.entries();
        let total = entries.len();
        let clips = self.build_clips(entries, volume);

        tracing::debug!(
            file = %file,
            kind = %self.kind,
            schema = match format { ManifestFormat::Classic(_) => "classic", ManifestFormat::Asc(_) => "asc" },
            rows = total,
            clips = clips.len(),
            "Parsed manifest"
        );

        Ok(clips)
    }

    /// Filter, group and total rows into clips
    pub fn build_clips(&self, entries: Vec<ManifestEntry>, volume: &str) -> Vec<ClipRecord> {
        let mut seen_files = HashSet::new();
        let kept: Vec<ManifestEntry> = entries
            .into_iter()
            .filter(|entry| self.accepts(entry))
            .filter(|entry| seen_files.insert(entry.file.clone()))
            .collect();

        let raw_names: Vec<String> = kept
            .iter()
            .map(|entry| entry.split_name().0.to_string())
            .collect();
        let clip_names = resolve_clip_names(&raw_names);

        let mut clips: IndexMap<String, ClipRecord> = IndexMap::new();
        for (entry, name) in kept.iter().zip(clip_names) {
            match clips.get_mut(&name) {
                Some(clip) => clip.size = clip.size.saturating_add(entry.size),
                None => {
                    let copy = ClipCopy {
                        volume: volume.to_string(),
                        hash: entry.digests.preferred(),
                    };
                    clips.insert(name.clone(), ClipRecord::new(name, entry.size, vec![copy]));
                }
            }
        }

        clips.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hashlist version="1.1">
  <creatorinfo><name>Wrangler</name></creatorinfo>
  <hash>
    <file>A001/A001C001_230101_R1AB.mov</file>
    <size>1000</size>
    <lastmodificationdate>2023-01-01T10:00:00Z</lastmodificationdate>
    <xxhash64be>aaaa</xxhash64be>
    <md5>m5</md5>
  </hash>
  <hash>
    <file>A001/A001C001_230101_R1AB.xml</file>
    <size>12</size>
    <md5>side</md5>
  </hash>
</hashlist>"#;

    const ASC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hashlist version="2.0" xmlns="urn:ASC:MHL:v2.0">
  <hashes>
    <hash>
      <path size="10" lastmodificationdate="2023-01-01T10:00:00Z">B001/B001C002_0001.dng</path>
      <xxh64 action="original" hashdate="2023-01-01T10:00:00Z">x1</xxh64>
    </hash>
    <directoryhash>
      <path>B001</path>
      <content><xxh64>dir</xxh64></content>
    </directoryhash>
    <hash>
      <path size="20">B001/B001C002_0002.dng</path>
      <xxh64 action="original">x2</xxh64>
    </hash>
  </hashes>
</hashlist>"#;

    fn ocf() -> ManifestParser {
        ManifestParser::with_extensions(IngestKind::Ocf, ["mov", "dng"])
    }

    #[test]
    fn test_classic_schema_resolves() {
        let format = parse_manifest(CLASSIC, "classic.mhl").unwrap();
        assert!(matches!(format, ManifestFormat::Classic(_)));
        assert_eq!(format.version(), Some("1.1"));
        assert_eq!(format.entries().len(), 2);
    }

    #[test]
    fn test_asc_schema_resolves() {
        let format = parse_manifest(ASC, "asc.mhl").unwrap();
        assert!(matches!(format, ManifestFormat::Asc(_)));
        let entries = format.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].size, 20);
        assert_eq!(entries[0].digests.xxhash64.as_deref(), Some("x1"));
    }

    #[test]
    fn test_malformed_xml_names_file() {
        let err = parse_manifest("<hashlist><hash>", "broken.mhl").unwrap_err();
        match err {
            IngestError::Xml { file, .. } => assert_eq!(file, "broken.mhl"),
            other => panic!("Expected Xml error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_schema_carries_diagnostic() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?><hashlist version="9.9"><other/></hashlist>"#;
        match parse_manifest(xml, "odd.mhl").unwrap_err() {
            IngestError::UnknownSchema { diagnostic, .. } => {
                assert_eq!(diagnostic, "xml version 1.0, encoding UTF-8, hashlist version 9.9");
            }
            other => panic!("Expected UnknownSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_size_fails_schema() {
        let xml = "<hashlist><hash><file>a.mov</file><size>big</size></hash></hashlist>";
        assert!(matches!(
            parse_manifest(xml, "a.mhl"),
            Err(IngestError::UnknownSchema { .. })
        ));
    }

    #[test]
    fn test_hash_priority() {
        let digests = HashDigests {
            md5: None,
            sha1: Some("s".into()),
            xxhash64: Some("x".into()),
            xxhash64be: Some("b".into()),
        };
        assert_eq!(digests.preferred().as_deref(), Some("s"));
        assert_eq!(HashDigests::default().preferred(), None);
    }

    #[test]
    fn test_classic_clips_filtered_by_extension() {
        let clips = ocf().parse_str(CLASSIC, "classic.mhl", "SHUTTLE_01").unwrap();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].clip, "A001C001_230101_R1AB");
        assert_eq!(clips[0].size, 1000);
        assert_eq!(
            clips[0].copies,
            vec![ClipCopy {
                volume: "SHUTTLE_01".into(),
                hash: Some("m5".into())
            }]
        );
    }

    #[test]
    fn test_asc_sequence_sums_sizes() {
        let clips = ocf().parse_str(ASC, "asc.mhl", "RAID").unwrap();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].clip, "B001C002");
        assert_eq!(clips[0].size, 30);
        assert_eq!(clips[0].copies[0].hash.as_deref(), Some("x1"));
    }

    #[test]
    fn test_sound_kind_keeps_wav_only() {
        let parser = ManifestParser::with_extensions(IngestKind::Sound, ["wav"]);
        let entries = vec![
            ManifestEntry {
                file: "SOUND/T001.WAV".into(),
                size: 5,
                digests: HashDigests::default(),
            },
            ManifestEntry {
                file: "SOUND/notes.txt".into(),
                size: 1,
                digests: HashDigests::default(),
            },
        ];
        let clips = parser.build_clips(entries, "SOUND_01");
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].clip, "T001");
        assert_eq!(clips[0].copies[0].hash, None);
    }

    #[test]
    fn test_duplicate_rows_counted_once() {
        let entry = ManifestEntry {
            file: "A001/A001C001.mov".into(),
            size: 7,
            digests: HashDigests::default(),
        };
        let clips = ocf().build_clips(vec![entry.clone(), entry], "RAID");
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].size, 7);
    }
}
