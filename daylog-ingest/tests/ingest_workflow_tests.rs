//! End-to-end ingest tests
//!
//! Builds volume trees of manifests in a temporary directory that stands in
//! for the volumes root, then runs the resolver against a clip store.

mod helpers;

use daylog_ingest::models::{ClipCopy, IngestKind, IssueSeverity};
use daylog_ingest::services::{ClipIdentityResolver, ScanError};
use daylog_ingest::{ClipStore, IngestError};
use helpers::{ale_export, asc_manifest, classic_manifest, volumes_config, write_file, FileRow};
use tempfile::TempDir;

fn a001_rows() -> Vec<FileRow> {
    vec![
        FileRow::new("A001/A001C001_240501_R1AB.mov", 1_000, "md5-c001"),
        FileRow::new("A001/A001C002_240501_R1AB.mov", 2_000, "md5-c002"),
        FileRow::new("A001/A001C002_240501_R1AB.xml", 3, "md5-sidecar"),
    ]
}

#[tokio::test]
async fn test_ingest_classic_manifest() {
    let volumes = TempDir::new().unwrap();
    let source = volumes.path().join("SHUTTLE_01").join("DAY_01");
    write_file(&source, "A001/A001.mhl", &classic_manifest(&a001_rows()));

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let report = resolver
        .ingest(&mut store, IngestKind::Ocf, &[source])
        .await
        .unwrap();

    assert_eq!(report.manifests_parsed, 1);
    assert_eq!(
        report.clips_added,
        vec!["A001C001_240501_R1AB", "A001C002_240501_R1AB"]
    );
    assert!(report.issues.is_empty());

    let clip = &store.ocf["A001C002_240501_R1AB"];
    assert_eq!(clip.size, 2_000);
    assert_eq!(
        clip.copies,
        vec![ClipCopy {
            volume: "SHUTTLE_01".to_string(),
            hash: Some("md5-c002".to_string()),
        }]
    );
    assert!(store.sound.is_empty());
}

#[tokio::test]
async fn test_image_sequence_grouped_with_outlier_kept_apart() {
    let volumes = TempDir::new().unwrap();
    let source = volumes.path().join("RAID").join("B001");
    let rows = vec![
        FileRow::new("B001C003/B001C003_0001.dng", 10, "x1"),
        FileRow::new("B001C003/B001C003_0002.dng", 20, "x2"),
        FileRow::new("B001C003/B001C003_0003.dng", 30, "x3"),
        FileRow::new("B001C004/B001C004.dng", 5, "x4"),
        FileRow::new("B001C004/B001C004_0001.dng", 7, "x5"),
    ];
    write_file(&source, "ascmhl/0001_B001.mhl", &asc_manifest(&rows));

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    resolver
        .ingest(&mut store, IngestKind::Ocf, &[source])
        .await
        .unwrap();

    let sequence = &store.ocf["B001C003"];
    assert_eq!(sequence.size, 60);
    assert_eq!(sequence.copies[0].hash.as_deref(), Some("x1"));

    // The unsuffixed outlier blocks grouping of its prefix
    assert_eq!(store.ocf["B001C004"].size, 5);
    assert_eq!(store.ocf["B001C004_0001"].size, 7);
    assert_eq!(store.ocf.len(), 3);
}

#[tokio::test]
async fn test_reingest_same_volume_is_idempotent() {
    let volumes = TempDir::new().unwrap();
    let source = volumes.path().join("SHUTTLE_01");
    write_file(&source, "A001.mhl", &classic_manifest(&a001_rows()));

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    resolver
        .ingest(&mut store, IngestKind::Ocf, &[source.clone()])
        .await
        .unwrap();
    let before = store.clone();

    let second = resolver
        .ingest(&mut store, IngestKind::Ocf, &[source])
        .await
        .unwrap();

    assert!(second.clips_added.is_empty());
    assert!(second.clips_updated.is_empty());
    assert_eq!(store, before);
}

#[tokio::test]
async fn test_second_volume_adds_copies() {
    let volumes = TempDir::new().unwrap();
    let shuttle = volumes.path().join("SHUTTLE_01");
    let raid = volumes.path().join("RAID");
    write_file(&shuttle, "A001.mhl", &classic_manifest(&a001_rows()));
    write_file(&raid, "offload/A001.mhl", &asc_manifest(&a001_rows()));

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    resolver
        .ingest(&mut store, IngestKind::Ocf, &[shuttle])
        .await
        .unwrap();
    let report = resolver
        .ingest(&mut store, IngestKind::Ocf, &[raid])
        .await
        .unwrap();

    assert!(report.clips_added.is_empty());
    assert_eq!(report.clips_updated.len(), 2);

    let clip = &store.ocf["A001C001_240501_R1AB"];
    let volumes: Vec<&str> = clip.copies.iter().map(|c| c.volume.as_str()).collect();
    assert_eq!(volumes, vec!["SHUTTLE_01", "RAID"]);
    assert_eq!(clip.size, 1_000);
}

#[tokio::test]
async fn test_bad_manifest_does_not_block_siblings() {
    let volumes = TempDir::new().unwrap();
    let broken = volumes.path().join("SHUTTLE_01");
    let good = volumes.path().join("SHUTTLE_02");
    let empty = volumes.path().join("SHUTTLE_03");
    write_file(&broken, "A001.mhl", "<hashlist><hash><file>a.mov</file>");
    write_file(&good, "A001.mhl", &classic_manifest(&a001_rows()));
    std::fs::create_dir_all(&empty).unwrap();

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let report = resolver
        .ingest(&mut store, IngestKind::Ocf, &[broken, good, empty])
        .await
        .unwrap();

    assert_eq!(report.clips_added.len(), 2);
    assert_eq!(report.manifests_parsed, 1);

    let codes: Vec<&str> = report.issues.iter().map(|i| i.error_code.as_str()).collect();
    assert!(codes.contains(&"XML_ERROR"));
    assert!(codes.contains(&"NO_MANIFESTS"));
    assert_eq!(report.count_by_severity(IssueSeverity::Skip), 2);
}

#[tokio::test]
async fn test_unknown_schema_reported_with_diagnostic() {
    let volumes = TempDir::new().unwrap();
    let odd = volumes.path().join("SHUTTLE_01");
    let good = volumes.path().join("SHUTTLE_02");
    write_file(
        &odd,
        "A001.mhl",
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><hashlist version=\"3.0\"><entries/></hashlist>",
    );
    write_file(&good, "A001.mhl", &classic_manifest(&a001_rows()));

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let report = resolver
        .ingest(&mut store, IngestKind::Ocf, &[odd, good])
        .await
        .unwrap();

    let issue = report
        .issues
        .iter()
        .find(|i| i.error_code == "UNKNOWN_SCHEMA")
        .expect("unknown schema issue");
    assert!(issue.error_message.contains("hashlist version 3.0"));
}

#[tokio::test]
async fn test_single_unknown_schema_fails_with_diagnostic() {
    let volumes = TempDir::new().unwrap();
    let odd = volumes.path().join("SHUTTLE_01");
    write_file(
        &odd,
        "A001.mhl",
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><hashlist version=\"3.0\"><entries/></hashlist>",
    );

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let error = resolver
        .ingest(&mut store, IngestKind::Ocf, &[odd])
        .await
        .unwrap_err();

    assert_eq!(error.code(), "UNKNOWN_SCHEMA");
    assert!(error.to_string().contains("hashlist version 3.0"));
    match error {
        IngestError::UnknownSchema { diagnostic, .. } => {
            assert_eq!(diagnostic, "xml version 1.0, encoding UTF-8, hashlist version 3.0");
        }
        other => panic!("Expected UnknownSchema, got {:?}", other),
    }
    assert!(store.ocf.is_empty());
}

#[tokio::test]
async fn test_empty_directory_fails_with_no_manifests() {
    let volumes = TempDir::new().unwrap();
    let empty = volumes.path().join("SHUTTLE_01");
    std::fs::create_dir_all(&empty).unwrap();

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let result = resolver
        .ingest(&mut store, IngestKind::Ocf, &[empty.clone()])
        .await;

    match result {
        Err(IngestError::NoManifests { path }) => assert_eq!(path, empty),
        other => panic!("Expected NoManifests, got {:?}", other),
    }
}

#[tokio::test]
async fn test_several_failures_all_reported() {
    let volumes = TempDir::new().unwrap();
    let broken = volumes.path().join("SHUTTLE_01");
    let empty = volumes.path().join("SHUTTLE_02");
    write_file(&broken, "A001.mhl", "<hashlist><hash><file>a.mov</file>");
    std::fs::create_dir_all(&empty).unwrap();

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let error = resolver
        .ingest(&mut store, IngestKind::Ocf, &[broken, empty])
        .await
        .unwrap_err();

    assert_eq!(error.code(), "NOTHING_USABLE");
    assert!(error.to_string().contains("No manifests found"));
    match error {
        IngestError::NothingUsable { issues } => {
            let codes: Vec<&str> = issues.iter().map(|i| i.error_code.as_str()).collect();
            assert_eq!(codes.len(), 2);
            assert!(codes.contains(&"XML_ERROR"));
            assert!(codes.contains(&"NO_MANIFESTS"));
        }
        other => panic!("Expected NothingUsable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_path_keeps_scan_error() {
    let volumes = TempDir::new().unwrap();
    let missing = volumes.path().join("SHUTTLE_09");

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let error = resolver
        .ingest(&mut store, IngestKind::Ocf, &[missing])
        .await
        .unwrap_err();

    assert_eq!(error.code(), "SCAN_ERROR");
    assert!(matches!(error, IngestError::Scan(ScanError::PathNotFound(_))));
}

#[tokio::test]
async fn test_unreadable_metadata_file_is_a_warning() {
    let volumes = TempDir::new().unwrap();
    let source = volumes.path().join("SHUTTLE_01");
    write_file(&source, "A001.mhl", &classic_manifest(&a001_rows()));
    write_file(&source, "A001.ale", "not an ale export");

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let report = resolver
        .ingest(&mut store, IngestKind::Ocf, &[source])
        .await
        .unwrap();

    assert_eq!(report.clips_added.len(), 2);
    assert_eq!(report.metadata_attached, 0);
    assert_eq!(report.count_by_severity(IssueSeverity::Warning), 1);
    assert_eq!(report.issues[0].error_code, "METADATA_ERROR");
}

#[tokio::test]
async fn test_no_usable_files_fails_call() {
    let volumes = TempDir::new().unwrap();
    let source = volumes.path().join("SHUTTLE_01");
    write_file(&source, "A001.mhl", &classic_manifest(&a001_rows()));

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let result = resolver
        .ingest(&mut store, IngestKind::Sound, &[source])
        .await;

    assert!(matches!(result, Err(IngestError::NoUsableFiles { .. })));
    assert!(store.sound.is_empty());
}

#[tokio::test]
async fn test_sound_ingest_keeps_wav() {
    let volumes = TempDir::new().unwrap();
    let source = volumes.path().join("SOUND_01");
    let rows = vec![
        FileRow::new("DAY01/T001.WAV", 500, "s1"),
        FileRow::new("DAY01/T002.wav", 600, "s2"),
        FileRow::new("DAY01/report.pdf", 1, "s3"),
    ];
    write_file(&source, "DAY01.mhl", &classic_manifest(&rows));

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let report = resolver
        .ingest(&mut store, IngestKind::Sound, &[source])
        .await
        .unwrap();

    assert_eq!(report.clips_added, vec!["T001", "T002"]);
    assert!(store.ocf.is_empty());
}

#[tokio::test]
async fn test_metadata_attached_to_new_clips_only() {
    let volumes = TempDir::new().unwrap();
    let shuttle = volumes.path().join("SHUTTLE_01");
    let raid = volumes.path().join("RAID");

    write_file(
        &shuttle,
        "A001.mhl",
        &classic_manifest(&[FileRow::new("A001/A001C001.mov", 10, "h1")]),
    );
    write_file(
        &shuttle,
        "A001/A001.ale",
        &ale_export(&[("A001C001.mov", "10:00:00:00", "10:00:10:00", "A001")]),
    );

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    let first = resolver
        .ingest(&mut store, IngestKind::Ocf, &[shuttle])
        .await
        .unwrap();
    assert_eq!(first.metadata_attached, 1);
    assert_eq!(store.ocf["A001C001"].metadata.reel.as_deref(), Some("A001"));
    assert_eq!(
        store.ocf["A001C001"].metadata.duration.as_deref(),
        Some("00:00:10:00")
    );

    // A second copy with a different ALE never rewrites descriptive fields
    write_file(
        &raid,
        "A001.mhl",
        &classic_manifest(&[
            FileRow::new("A001/A001C001.mov", 10, "h1"),
            FileRow::new("A001/A001C002.mov", 20, "h2"),
        ]),
    );
    write_file(
        &raid,
        "A001.ale",
        &ale_export(&[
            ("A001C001.mov", "11:00:00:00", "11:00:10:00", "Z999"),
            ("A001C002.mov", "10:01:00:00", "10:01:05:00", "A001"),
        ]),
    );

    let second = resolver
        .ingest(&mut store, IngestKind::Ocf, &[raid])
        .await
        .unwrap();
    assert_eq!(second.clips_added, vec!["A001C002"]);
    assert_eq!(second.metadata_attached, 1);
    assert_eq!(store.ocf["A001C001"].metadata.reel.as_deref(), Some("A001"));
    assert_eq!(store.ocf["A001C001"].copies.len(), 2);
    assert_eq!(
        store.ocf["A001C002"].metadata.tc_start.as_deref(),
        Some("10:01:00:00")
    );
}

#[tokio::test]
async fn test_store_round_trip_after_ingest() {
    let volumes = TempDir::new().unwrap();
    let source = volumes.path().join("SHUTTLE_01");
    write_file(&source, "A001.mhl", &classic_manifest(&a001_rows()));

    let resolver = ClipIdentityResolver::new(volumes_config(volumes.path()));
    let mut store = ClipStore::new();
    resolver
        .ingest(&mut store, IngestKind::Ocf, &[source])
        .await
        .unwrap();

    let store_path = volumes.path().join("session").join("clips.json");
    store.save(&store_path).unwrap();
    assert_eq!(ClipStore::load(&store_path).unwrap(), store);
}
