//! Camera metadata extraction
//!
//! Reads two export formats into per-clip `CameraMetadata`:
//! - ALE: tab-delimited; the header is the first line carrying both `Name`
//!   and `Reel_name`, rows follow until EOF (lines starting `Data` skipped)
//! - Sony NonRealTimeMeta XML sidecars, gated on their namespace
//!
//! Both formats are reduced to the same raw field map and pass through one
//! normalization step, so validation rules are shared. A row that fails
//! validation is dropped with a warning; the rest of the file is kept.

use crate::models::{CameraMetadata, CameraMetadataRecord};
use crate::services::file_scanner::{FileScanner, METADATA_EXTENSIONS};
use crate::services::xml_scan::scan_document;
use daylog_common::timecode::parse_fps;
use daylog_common::Timecode;
use futures::future::join_all;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Namespace prefix of Sony non-real-time metadata sidecars
pub const SONY_NRT_NAMESPACE: &str = "urn:schemas-professionalDisc:nonRealTimeMeta";

static CODEC_QUALIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("codec pattern is valid"));

static SONY_CLIP_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"M\d\d$").expect("sidecar suffix pattern is valid"));

/// File-level metadata errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// I/O error (file read)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Sidecar is not well-formed XML
    #[error("Malformed XML: {0}")]
    Xml(String),

    /// ALE has no line naming both `Name` and `Reel_name`
    #[error("No ALE header row")]
    NoHeader,
}

/// Row-level validation failure; the row is dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataRowError {
    #[error("missing clip name")]
    MissingName,

    #[error("invalid timecode in {column}: '{value}'")]
    InvalidTimecode { column: &'static str, value: String },

    #[error("invalid frame rate '{0}'")]
    InvalidFps(String),
}

/// Raw values keyed by normalized field name
type RawFields = HashMap<&'static str, String>;

// ============================================================================
// ALE
// ============================================================================

/// Normalized field for an ALE column heading
fn ale_column(heading: &str) -> Option<&'static str> {
    let field = match heading.trim().to_ascii_lowercase().as_str() {
        "name" => "name",
        "start" => "tc_start",
        "end" => "tc_end",
        "duration" => "duration",
        "fps" => "fps",
        "reel_name" => "reel",
        "manufacturer" => "manufacturer",
        "camera_model" | "camera model" => "model",
        "image_width" => "width",
        "image_height" => "height",
        "resolution" => "resolution",
        "codec" | "video_codec" => "codec",
        "lens" | "lens_type" | "lens_model" => "lens",
        "white_balance" | "whitebalance" => "white_balance",
        "tint" | "white_balance_tint" => "tint",
        "shutter" | "shutter_angle" => "shutter",
        "exposure_index" | "ei" | "asa" | "iso" => "exposure_index",
        "gamma" | "gamma_name" => "gamma",
        "lut" | "look_name" | "lut_file" => "lut",
        _ => return None,
    };
    Some(field)
}

/// Parse ALE text into metadata records
pub fn parse_ale(text: &str) -> Result<Vec<CameraMetadataRecord>, MetadataError> {
    let mut lines = text.lines();

    let columns: Vec<Option<&'static str>> = loop {
        let line = lines.next().ok_or(MetadataError::NoHeader)?;
        let tokens: Vec<&str> = line.split('\t').map(str::trim).collect();
        let has = |name: &str| tokens.iter().any(|t| t.eq_ignore_ascii_case(name));
        if has("Name") && has("Reel_name") {
            break tokens.iter().map(|t| ale_column(t)).collect();
        }
    };

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() || line.starts_with("Data") {
            continue;
        }

        let mut raw = RawFields::new();
        for (column, value) in columns.iter().zip(line.split('\t')) {
            let value = value.trim();
            if let (Some(field), false) = (*column, value.is_empty()) {
                raw.entry(field).or_insert_with(|| value.to_string());
            }
        }

        match normalize(raw) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(row = index + 1, error = %e, "Dropping ALE row"),
        }
    }

    Ok(records)
}

// ============================================================================
// Sony NonRealTimeMeta XML
// ============================================================================

/// Parse a Sony sidecar
///
/// Returns `Ok(None)` for well-formed XML outside the recognized namespace.
pub fn parse_sony_xml(
    xml: &str,
    file_stem: &str,
) -> Result<Option<CameraMetadataRecord>, MetadataError> {
    let info = scan_document(xml).map_err(MetadataError::Xml)?;
    let recognized = info.root == "NonRealTimeMeta"
        && info
            .root_attribute("xmlns")
            .map(|ns| ns.starts_with(SONY_NRT_NAMESPACE))
            .unwrap_or(false);
    if !recognized {
        return Ok(None);
    }

    let mut raw = RawFields::new();
    raw.insert("name", SONY_CLIP_SUFFIX.replace(file_stem, "").into_owned());

    let mut duration_frames: Option<u64> = None;
    let mut capture_fps: Option<String> = None;
    let mut in_acquisition = false;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        let element = match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"AcquisitionRecord" {
                    in_acquisition = true;
                }
                e
            }
            Ok(Event::Empty(e)) => e,
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"AcquisitionRecord" {
                    in_acquisition = false;
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(e) => return Err(MetadataError::Xml(e.to_string())),
        };

        match element.local_name().as_ref() {
            b"Duration" => {
                duration_frames = attr(&element, "value").and_then(|v| v.parse().ok());
            }
            b"LtcChangeTable" => {
                if let Some(fps) = attr(&element, "tcFps") {
                    raw.insert("fps", fps);
                }
            }
            b"LtcChange" => {
                let tc = attr(&element, "value").and_then(|v| decode_ltc(&v));
                let status = attr(&element, "status").unwrap_or_default();
                let first = attr(&element, "frameCount").as_deref() == Some("0");
                if let Some(tc) = tc {
                    if first {
                        raw.entry("tc_start").or_insert_with(|| tc.to_string());
                    }
                    if status == "end" {
                        raw.insert("tc_end", tc.to_string());
                    }
                }
            }
            b"VideoFrame" => {
                set_attr(&mut raw, "codec", &element, "videoCodec");
                capture_fps = attr(&element, "captureFps");
            }
            b"VideoLayout" => {
                set_attr(&mut raw, "width", &element, "pixel");
                set_attr(&mut raw, "height", &element, "numOfVerticalLine");
            }
            b"Device" => {
                set_attr(&mut raw, "manufacturer", &element, "manufacturer");
                set_attr(&mut raw, "model", &element, "modelName");
            }
            b"Lens" => set_attr(&mut raw, "lens", &element, "modelName"),
            b"Item" if in_acquisition => {
                if let (Some(name), Some(value)) = (attr(&element, "name"), attr(&element, "value")) {
                    if let Some(field) = acquisition_item(&name) {
                        raw.entry(field).or_insert(value);
                    }
                }
            }
            _ => {}
        }
    }

    if !raw.contains_key("fps") {
        if let Some(fps) = capture_fps {
            raw.insert("fps", fps);
        }
    }

    if let (Some(frames), Some(fps)) = (duration_frames, raw.get("fps").and_then(|f| parse_fps(f))) {
        if let Ok(tc) = Timecode::from_frames(frames, fps) {
            raw.insert("duration", tc.to_string());
        }
    }

    match normalize(raw) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::warn!(clip = %file_stem, error = %e, "Dropping camera XML sidecar");
            Ok(None)
        }
    }
}

/// Normalized field for an acquisition-record item name
fn acquisition_item(name: &str) -> Option<&'static str> {
    let field = match name {
        "WhiteBalance" | "ColorTemperature" => "white_balance",
        "Tint" | "TintCorrection" => "tint",
        "ShutterSpeedAngle" | "ShutterAngle" | "ShutterSpeedTime" => "shutter",
        "ISOSensitivity" | "ExposureIndex" | "ExposureIndexOfPhotoMeter" => "exposure_index",
        "CaptureGammaEquation" | "Gamma" => "gamma",
        "LutFileName" | "LUTFileName" | "MonitoringLut" => "lut",
        _ => return None,
    };
    Some(field)
}

/// Decode an LTC value: four BCD bytes `FFSSMMHH` with flag bits masked off
fn decode_ltc(value: &str) -> Option<Timecode> {
    if value.len() != 8 || !value.is_ascii() {
        return None;
    }
    let byte = |index: usize, mask: u8| -> Option<u32> {
        let b = u8::from_str_radix(&value[index * 2..index * 2 + 2], 16).ok()? & mask;
        let (tens, units) = (b >> 4, b & 0x0F);
        (units <= 9).then(|| u32::from(tens) * 10 + u32::from(units))
    };
    Some(Timecode {
        frames: byte(0, 0x3F)?,
        seconds: byte(1, 0x7F)?,
        minutes: byte(2, 0x7F)?,
        hours: byte(3, 0x3F)?,
    })
}

fn attr(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn set_attr(raw: &mut RawFields, field: &'static str, element: &BytesStart<'_>, name: &str) {
    if let Some(value) = attr(element, name) {
        raw.insert(field, value);
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 && name[dot + 1..].bytes().any(|b| b.is_ascii_alphabetic()) => {
            &name[..dot]
        }
        _ => name,
    }
}

fn take_timecode(
    raw: &mut RawFields,
    column: &'static str,
) -> Result<Option<Timecode>, MetadataRowError> {
    raw.remove(column)
        .map(|value| {
            value
                .parse::<Timecode>()
                .map_err(|_| MetadataRowError::InvalidTimecode { column, value })
        })
        .transpose()
}

fn frames_at(tc: Timecode, column: &'static str, fps: f64) -> Result<u64, MetadataRowError> {
    tc.to_frames(fps).map_err(|_| MetadataRowError::InvalidTimecode {
        column,
        value: tc.to_string(),
    })
}

/// Validate raw fields and build a record
fn normalize(mut raw: RawFields) -> Result<CameraMetadataRecord, MetadataRowError> {
    let clip = raw
        .remove("name")
        .map(|name| strip_extension(name.trim()).to_string())
        .filter(|name| !name.is_empty())
        .ok_or(MetadataRowError::MissingName)?;

    let fps = raw
        .remove("fps")
        .map(|value| parse_fps(&value).ok_or(MetadataRowError::InvalidFps(value)))
        .transpose()?;

    let tc_start = take_timecode(&mut raw, "tc_start")?;
    let tc_end = take_timecode(&mut raw, "tc_end")?;
    let declared = take_timecode(&mut raw, "duration")?;

    let duration = match fps {
        Some(fps) => {
            let start = tc_start.map(|tc| frames_at(tc, "tc_start", fps)).transpose()?;
            let end = tc_end.map(|tc| frames_at(tc, "tc_end", fps)).transpose()?;
            let frames = match (declared, start, end) {
                (Some(tc), _, _) => Some(frames_at(tc, "duration", fps)?),
                (None, Some(start), Some(end)) => end.checked_sub(start),
                _ => None,
            };
            frames
                .map(|f| Timecode::from_frames(f, fps))
                .transpose()
                .map_err(|_| MetadataRowError::InvalidFps(fps.to_string()))?
        }
        None => declared,
    };

    let camera_model = match (raw.remove("manufacturer"), raw.remove("model")) {
        (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
        (make, model) => model.or(make),
    };

    let resolution = match (raw.remove("width"), raw.remove("height")) {
        (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
        _ => raw.remove("resolution"),
    };

    let codec = raw
        .remove("codec")
        .map(|c| CODEC_QUALIFIER.replace_all(&c, "").trim().to_string())
        .filter(|c| !c.is_empty());

    Ok(CameraMetadataRecord {
        clip,
        metadata: CameraMetadata {
            tc_start: tc_start.map(|tc| tc.to_string()),
            tc_end: tc_end.map(|tc| tc.to_string()),
            duration: duration.map(|tc| tc.to_string()),
            fps,
            reel: raw.remove("reel"),
            camera_model,
            resolution,
            codec,
            lens: raw.remove("lens"),
            white_balance: raw.remove("white_balance"),
            tint: raw.remove("tint"),
            shutter: raw.remove("shutter"),
            exposure_index: raw.remove("exposure_index"),
            gamma: raw.remove("gamma"),
            lut: raw.remove("lut"),
        },
    })
}

// ============================================================================
// Extraction service
// ============================================================================

/// Extract records from one metadata file, dispatching on extension
pub fn extract_file(path: &Path) -> Result<Vec<CameraMetadataRecord>, MetadataError> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "ale" => parse_ale(&text),
        "xml" => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(parse_sony_xml(&text, &stem)?.into_iter().collect())
        }
        _ => Ok(Vec::new()),
    }
}

/// Camera metadata found under one path
#[derive(Debug, Default)]
pub struct MetadataExtraction {
    /// First record per clip, in path order
    pub records: IndexMap<String, CameraMetadata>,
    /// Metadata files that could not be read
    pub failures: Vec<(PathBuf, MetadataError)>,
}

/// Metadata extractor service
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Parse every metadata file under `root` in parallel
    ///
    /// Files that fail are logged and returned as failures. When two files
    /// describe the same clip the first in path order wins.
    pub async fn extract_path(&self, root: &Path) -> MetadataExtraction {
        let mut extraction = MetadataExtraction::default();
        let files = match FileScanner::new().scan(root, METADATA_EXTENSIONS) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(path = %root.display(), error = %e, "Metadata scan failed");
                return extraction;
            }
        };

        let tasks = files.into_iter().map(|path| {
            tokio::task::spawn_blocking(move || {
                let result = extract_file(&path);
                (path, result)
            })
        });

        for joined in join_all(tasks).await {
            match joined {
                Ok((_, Ok(records))) => {
                    for CameraMetadataRecord { clip, metadata } in records {
                        extraction.records.entry(clip).or_insert(metadata);
                    }
                }
                Ok((path, Err(e))) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping metadata file");
                    extraction.failures.push((path, e));
                }
                Err(e) => tracing::warn!(error = %e, "Metadata task failed"),
            }
        }

        tracing::debug!(
            path = %root.display(),
            clips = extraction.records.len(),
            failures = extraction.failures.len(),
            "Camera metadata parsed"
        );
        extraction
    }
}
