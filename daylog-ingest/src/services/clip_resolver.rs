//! Clip identity resolution
//!
//! Reconciles the manifests of one ingest call, spread over several source
//! paths, against the clips already in the store:
//!
//! 1. Discover manifests under every path; parse them all in parallel
//! 2. Record per-file and per-path failures without stopping siblings
//! 3. Merge parsed clips into the store sequentially, in path order:
//!    a known clip only gains copies on volumes it is not yet on, a new clip
//!    is inserted and queued
//! 4. Parse camera metadata once from the first path and attach it to the
//!    clips that are new in this call; unreadable metadata files become
//!    warnings

use crate::error::{IngestError, IngestResult};
use crate::models::{ClipRecord, IngestIssue, IngestKind, IngestReport, IssueSeverity};
use crate::services::file_scanner::{volume_label, FileScanner, MANIFEST_EXTENSIONS};
use crate::services::manifest_parser::ManifestParser;
use crate::services::metadata_extractor::MetadataExtractor;
use crate::store::ClipStore;
use daylog_common::config::TomlConfig;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One manifest to parse, tied back to the source path it came from
struct ManifestJob {
    path_index: usize,
    manifest: PathBuf,
    volume: String,
}

/// Clip identity resolver service
pub struct ClipIdentityResolver {
    config: TomlConfig,
    file_scanner: FileScanner,
    metadata_extractor: MetadataExtractor,
}

impl ClipIdentityResolver {
    pub fn new(config: TomlConfig) -> Self {
        Self {
            config,
            file_scanner: FileScanner::new(),
            metadata_extractor: MetadataExtractor::new(),
        }
    }

    /// Run one ingest call
    ///
    /// Per-file and per-path problems land in the report's issues. The call
    /// itself fails only when no path yields a single usable clip: with the
    /// one error behind that when there is exactly one, otherwise with
    /// `NothingUsable` carrying every issue.
    pub async fn ingest(
        &self,
        store: &mut ClipStore,
        kind: IngestKind,
        paths: &[PathBuf],
    ) -> IngestResult<IngestReport> {
        let first_path = paths
            .first()
            .ok_or_else(|| IngestError::InvalidInput("no source paths given".to_string()))?;

        let mut report = IngestReport::new(kind, paths.to_vec());
        let mut failures: Vec<IngestError> = Vec::new();
        let parser = ManifestParser::new(kind, &self.config);

        // Discovery
        let mut jobs = Vec::new();
        for (path_index, path) in paths.iter().enumerate() {
            let manifests = match self.file_scanner.scan(path, MANIFEST_EXTENSIONS) {
                Ok(manifests) => manifests,
                Err(e) => {
                    let error = IngestError::from(e);
                    tracing::warn!(path = %path.display(), error = %error, "Skipping source path");
                    skip(&mut report, &mut failures, path, error);
                    continue;
                }
            };

            if manifests.is_empty() {
                tracing::warn!(path = %path.display(), "No manifests found");
                skip(
                    &mut report,
                    &mut failures,
                    path,
                    IngestError::NoManifests { path: path.clone() },
                );
                continue;
            }

            let volume = volume_label(path, &self.config);
            tracing::debug!(
                path = %path.display(),
                volume = %volume,
                manifests = manifests.len(),
                "Discovered manifests"
            );
            jobs.extend(manifests.into_iter().map(|manifest| ManifestJob {
                path_index,
                manifest,
                volume: volume.clone(),
            }));
        }

        // Parallel parse, one blocking task per manifest
        let tasks = jobs.into_iter().map(|job| {
            let parser = parser.clone();
            tokio::task::spawn_blocking(move || {
                let result = parser.parse_file(&job.manifest, &job.volume);
                (job, result)
            })
        });
        let outcomes = join_all(tasks).await;

        let mut parsed_per_path = vec![0usize; paths.len()];
        let mut clips_per_path = vec![0usize; paths.len()];
        let mut parsed: Vec<ClipRecord> = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok((job, Ok(clips))) => {
                    report.manifests_parsed += 1;
                    parsed_per_path[job.path_index] += 1;
                    clips_per_path[job.path_index] += clips.len();
                    parsed.extend(clips);
                }
                Ok((job, Err(error))) => {
                    tracing::warn!(
                        file = %job.manifest.display(),
                        error = %error,
                        "Skipping manifest"
                    );
                    skip(&mut report, &mut failures, &job.manifest, error);
                }
                Err(join_error) => {
                    let error = IngestError::from(join_error);
                    tracing::error!(error = %error, "Manifest task did not complete");
                    report.issues.push(IngestIssue::from_error(
                        first_path,
                        &error,
                        IssueSeverity::Critical,
                    ));
                    failures.push(error);
                }
            }
        }

        for (index, path) in paths.iter().enumerate() {
            if parsed_per_path[index] > 0 && clips_per_path[index] == 0 {
                tracing::warn!(path = %path.display(), kind = %kind, "Manifests list no usable files");
                skip(
                    &mut report,
                    &mut failures,
                    path,
                    IngestError::NoUsableFiles { path: path.clone() },
                );
            }
        }

        if parsed.is_empty() {
            return Err(match failures.len() {
                1 => failures.remove(0),
                _ => IngestError::NothingUsable {
                    issues: report.issues,
                },
            });
        }

        // Sequential merge into the store
        let stored = store.clips_mut(kind);
        let mut added: HashSet<String> = HashSet::new();
        for clip in parsed {
            match stored.get_mut(&clip.clip) {
                Some(existing) => {
                    let gained = existing.add_copies(&clip.copies);
                    if gained > 0
                        && !added.contains(&clip.clip)
                        && !report.clips_updated.contains(&clip.clip)
                    {
                        report.clips_updated.push(clip.clip.clone());
                    }
                }
                None => {
                    added.insert(clip.clip.clone());
                    report.clips_added.push(clip.clip.clone());
                    stored.insert(clip.clip.clone(), clip);
                }
            }
        }

        // Camera metadata for net-new clips only
        if !report.clips_added.is_empty() {
            let extraction = self.metadata_extractor.extract_path(first_path).await;
            for name in &report.clips_added {
                if let (Some(clip), Some(fields)) =
                    (stored.get_mut(name), extraction.records.get(name))
                {
                    clip.metadata = fields.clone();
                    report.metadata_attached += 1;
                }
            }
            for (file, error) in extraction.failures {
                report
                    .issues
                    .push(IngestIssue::warning(&file, &IngestError::from(error)));
            }
        }

        tracing::info!(
            kind = %kind,
            paths = paths.len(),
            manifests = report.manifests_parsed,
            added = report.clips_added.len(),
            updated = report.clips_updated.len(),
            metadata = report.metadata_attached,
            issues = report.issues.len(),
            "Ingest complete"
        );

        Ok(report)
    }
}

/// Record a file or path that contributed nothing
fn skip(report: &mut IngestReport, failures: &mut Vec<IngestError>, path: &Path, error: IngestError) {
    report.issues.push(IngestIssue::skip(path, &error));
    failures.push(error);
}
