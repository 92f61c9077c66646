//! Custom field parsing strategies
//!
//! Turns already-split CSV cells into typed `FieldValue`s. Each `FieldSpec`
//! variant has exactly one parsing function. Reading the CSV file itself is
//! left to the caller.

use crate::error::{IngestError, IngestResult};
use crate::models::{CustomRecord, FieldValue};
use daylog_common::format::DurationParts;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

fn default_list_delimiter() -> String {
    ",".to_string()
}

fn default_row_delimiter() -> String {
    ";".to_string()
}

fn default_column_delimiter() -> String {
    ",".to_string()
}

/// Unit of a numeric duration cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
    /// `HH:MM:SS` or `MM:SS`
    Clock,
}

/// How one custom column is parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSpec {
    /// Text, optionally narrowed by a regex (first group, else whole match)
    String {
        #[serde(default)]
        pattern: Option<String>,
    },
    List {
        #[serde(default = "default_list_delimiter")]
        delimiter: String,
    },
    /// `key<separator>value` pairs split by `pair_delimiter`
    KeyValue {
        pair_delimiter: String,
        separator: String,
    },
    ArrayOfArrays {
        #[serde(default = "default_row_delimiter")]
        row_delimiter: String,
        #[serde(default = "default_column_delimiter")]
        column_delimiter: String,
    },
    /// Rows of columns named by `keys`
    ArrayOfObjects {
        keys: Vec<String>,
        #[serde(default = "default_row_delimiter")]
        row_delimiter: String,
        #[serde(default = "default_column_delimiter")]
        column_delimiter: String,
    },
    Duration {
        #[serde(default)]
        unit: DurationUnit,
    },
}

/// A `FieldSpec` with its pattern compiled
#[derive(Debug, Clone)]
pub struct FieldParser {
    spec: FieldSpec,
    pattern: Option<Regex>,
}

impl FieldParser {
    /// Build a parser for `spec`; a bad regex is an `InvalidPattern` error
    pub fn new(spec: FieldSpec) -> IngestResult<Self> {
        let pattern = match &spec {
            FieldSpec::String {
                pattern: Some(pattern),
            } => Some(Regex::new(pattern).map_err(|e| IngestError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?),
            _ => None,
        };
        Ok(Self { spec, pattern })
    }

    /// Parse one cell; empty or non-matching cells yield `None`
    pub fn parse(&self, cell: &str) -> Option<FieldValue> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        match &self.spec {
            FieldSpec::String { .. } => parse_string(cell, self.pattern.as_ref()),
            FieldSpec::List { delimiter } => parse_list(cell, delimiter),
            FieldSpec::KeyValue {
                pair_delimiter,
                separator,
            } => parse_key_value(cell, pair_delimiter, separator),
            FieldSpec::ArrayOfArrays {
                row_delimiter,
                column_delimiter,
            } => parse_array_of_arrays(cell, row_delimiter, column_delimiter),
            FieldSpec::ArrayOfObjects {
                keys,
                row_delimiter,
                column_delimiter,
            } => parse_array_of_objects(cell, keys, row_delimiter, column_delimiter),
            FieldSpec::Duration { unit } => parse_duration(cell, *unit),
        }
    }
}

fn split_trimmed<'a>(text: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    text.split(delimiter).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_string(cell: &str, pattern: Option<&Regex>) -> Option<FieldValue> {
    let text = match pattern {
        None => cell,
        Some(regex) => {
            let caps = regex.captures(cell)?;
            caps.get(1).or_else(|| caps.get(0))?.as_str()
        }
    };
    Some(FieldValue::Text(text.to_string()))
}

fn parse_list(cell: &str, delimiter: &str) -> Option<FieldValue> {
    let items: Vec<String> = split_trimmed(cell, delimiter).map(str::to_string).collect();
    (!items.is_empty()).then_some(FieldValue::List(items))
}

fn parse_key_value(cell: &str, pair_delimiter: &str, separator: &str) -> Option<FieldValue> {
    let pairs: IndexMap<String, String> = split_trimmed(cell, pair_delimiter)
        .filter_map(|pair| {
            let (key, value) = pair.split_once(separator)?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect();
    (!pairs.is_empty()).then_some(FieldValue::KeyValue(pairs))
}

fn parse_array_of_arrays(
    cell: &str,
    row_delimiter: &str,
    column_delimiter: &str,
) -> Option<FieldValue> {
    let rows: Vec<Vec<String>> = split_trimmed(cell, row_delimiter)
        .map(|row| row.split(column_delimiter).map(|c| c.trim().to_string()).collect())
        .collect();
    (!rows.is_empty()).then_some(FieldValue::ArrayOfArrays(rows))
}

fn parse_array_of_objects(
    cell: &str,
    keys: &[String],
    row_delimiter: &str,
    column_delimiter: &str,
) -> Option<FieldValue> {
    let rows: Vec<IndexMap<String, String>> = split_trimmed(cell, row_delimiter)
        .map(|row| {
            keys.iter()
                .cloned()
                .zip(row.split(column_delimiter).map(|c| c.trim().to_string()))
                .collect()
        })
        .collect();
    (!rows.is_empty()).then_some(FieldValue::ArrayOfObjects(rows))
}

fn parse_duration(cell: &str, unit: DurationUnit) -> Option<FieldValue> {
    let seconds = match unit {
        DurationUnit::Clock => {
            let fields: Vec<u64> = cell
                .split(':')
                .map(|f| f.trim().parse::<u64>())
                .collect::<Result<_, _>>()
                .ok()?;
            match fields.as_slice() {
                [hours, minutes, seconds] => hours * 3600 + minutes * 60 + seconds,
                [minutes, seconds] => minutes * 60 + seconds,
                _ => return None,
            }
        }
        numeric => {
            let value: f64 = cell.parse().ok()?;
            if !value.is_finite() || value < 0.0 {
                return None;
            }
            let scale = match numeric {
                DurationUnit::Hours => 3600.0,
                DurationUnit::Minutes => 60.0,
                _ => 1.0,
            };
            (value * scale).round() as u64
        }
    };
    Some(FieldValue::Duration(DurationParts::from_seconds(seconds)))
}

/// One custom column to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Key on the merged clip
    pub key: String,
    /// Zero-based column index
    pub column: usize,
    #[serde(flatten)]
    pub spec: FieldSpec,
}

/// Row-to-record mapping for a custom CSV source
#[derive(Debug, Clone)]
pub struct CustomFieldMapping {
    clip_column: usize,
    fields: Vec<(String, usize, FieldParser)>,
}

impl CustomFieldMapping {
    /// Compile every field; fails on the first bad pattern
    pub fn new(clip_column: usize, mappings: Vec<FieldMapping>) -> IngestResult<Self> {
        let fields = mappings
            .into_iter()
            .map(|m| Ok((m.key, m.column, FieldParser::new(m.spec)?)))
            .collect::<IngestResult<Vec<_>>>()?;
        Ok(Self {
            clip_column,
            fields,
        })
    }

    /// Map one pre-split row; rows without a clip name are skipped
    pub fn map_row(&self, row: &[&str]) -> Option<CustomRecord> {
        let clip = row.get(self.clip_column)?.trim();
        if clip.is_empty() {
            return None;
        }
        let mut record = CustomRecord::new(clip);
        for (key, column, parser) in &self.fields {
            if let Some(value) = row.get(*column).and_then(|cell| parser.parse(cell)) {
                record.fields.insert(key.clone(), value);
            }
        }
        Some(record)
    }

    pub fn map_rows<'a>(&self, rows: impl IntoIterator<Item = &'a [&'a str]>) -> Vec<CustomRecord> {
        rows.into_iter().filter_map(|row| self.map_row(row)).collect()
    }
}
