//! Manifest and metadata fixture builders
//!
//! Writes classic and ASC hash lists and ALE exports into temporary volume
//! trees for ingest tests.

use daylog_common::config::TomlConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// One file row of a fixture manifest
#[derive(Debug, Clone)]
pub struct FileRow {
    pub path: String,
    pub size: u64,
    pub hash: String,
}

impl FileRow {
    pub fn new(path: &str, size: u64, hash: &str) -> Self {
        Self {
            path: path.to_string(),
            size,
            hash: hash.to_string(),
        }
    }
}

/// Classic (flat) hash list with md5 digests
pub fn classic_manifest(rows: &[FileRow]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<hashlist version=\"1.1\">\n  <creatorinfo><name>fixture</name></creatorinfo>\n",
    );
    for row in rows {
        xml.push_str(&format!(
            "  <hash>\n    <file>{}</file>\n    <size>{}</size>\n    <lastmodificationdate>2024-05-01T10:00:00Z</lastmodificationdate>\n    <md5>{}</md5>\n    <hashdate>2024-05-01T10:05:00Z</hashdate>\n  </hash>\n",
            row.path, row.size, row.hash
        ));
    }
    xml.push_str("</hashlist>\n");
    xml
}

/// ASC hash list with xxh64 digests
pub fn asc_manifest(rows: &[FileRow]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<hashlist version=\"2.0\" xmlns=\"urn:ASC:MHL:v2.0\">\n  <creatorinfo><tool version=\"1\">fixture</tool></creatorinfo>\n  <hashes>\n",
    );
    for row in rows {
        xml.push_str(&format!(
            "    <hash>\n      <path size=\"{}\" lastmodificationdate=\"2024-05-01T10:00:00Z\">{}</path>\n      <xxh64 action=\"original\" hashdate=\"2024-05-01T10:05:00Z\">{}</xxh64>\n    </hash>\n",
            row.size, row.path, row.hash
        ));
    }
    xml.push_str("  </hashes>\n</hashlist>\n");
    xml
}

/// Write `content` to `root/relative`, creating directories
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// ALE export with Name, Start, End, Reel_name and FPS columns
pub fn ale_export(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut ale = String::from(
        "Heading\nFIELD_DELIM\tTABS\nVIDEO_FORMAT\t1080\nFPS\t25\n\nColumn\nName\tStart\tEnd\tReel_name\tFPS\n\nData\n",
    );
    for (name, start, end, reel) in rows {
        ale.push_str(&format!("{}\t{}\t{}\t{}\t25\n", name, start, end, reel));
    }
    ale
}

/// Config whose volumes root is the test's temporary directory
pub fn volumes_config(volumes_root: &Path) -> TomlConfig {
    TomlConfig {
        volumes_root: volumes_root.to_path_buf(),
        ..TomlConfig::default()
    }
}
