//! Human-readable byte and duration formatting for reports
//!
//! Pure presentation helpers. Sizes are divided by binary multiples (1024ⁿ)
//! while automatic unit selection uses decimal thresholds (1000ⁿ), so the
//! integer part of an automatically formatted size never exceeds three digits.

use serde::{Deserialize, Serialize};

/// Unit labels indexed by power of 1024
const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Significant digits kept by automatic formatting
const AUTO_SIGNIFICANT_DIGITS: i32 = 3;

/// Default decimals for explicit units
const DEFAULT_DECIMALS: u32 = 2;

/// Target unit for byte formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteUnit {
    /// Largest unit that keeps the integer part within three digits
    #[default]
    Auto,
    Bytes,
    Mb,
    Gb,
    Tb,
}

impl ByteUnit {
    fn power(self) -> Option<usize> {
        match self {
            ByteUnit::Auto => None,
            ByteUnit::Bytes => Some(0),
            ByteUnit::Mb => Some(2),
            ByteUnit::Gb => Some(3),
            ByteUnit::Tb => Some(4),
        }
    }
}

/// Shape of the formatted result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOutput {
    /// "117 MB"
    #[default]
    String,
    /// 117.0
    Number,
    /// (117.0, "MB")
    Tuple,
}

/// Options for [`format_bytes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ByteFormatOptions {
    #[serde(default)]
    pub unit: ByteUnit,
    #[serde(default)]
    pub output: ByteOutput,
    /// Decimal places for explicit units (ignored by `Auto`)
    #[serde(default)]
    pub decimals: Option<u32>,
}

/// Result of [`format_bytes`], shaped by [`ByteOutput`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormattedBytes {
    Text(String),
    Number(f64),
    Tuple(f64, &'static str),
}

impl FormattedBytes {
    /// Text form regardless of output mode
    pub fn into_text(self) -> String {
        match self {
            FormattedBytes::Text(text) => text,
            FormattedBytes::Number(value) => trim_decimal(value, 3),
            FormattedBytes::Tuple(value, unit) => format!("{} {}", trim_decimal(value, 3), unit),
        }
    }
}

/// Format a byte count
///
/// # Examples
///
/// ```
/// use daylog_common::format::{format_bytes, ByteFormatOptions, FormattedBytes};
///
/// let auto = ByteFormatOptions::default();
/// assert_eq!(format_bytes(1000, auto), FormattedBytes::Text("1 KB".into()));
/// assert_eq!(format_bytes(123_456_789, auto), FormattedBytes::Text("117 MB".into()));
/// ```
pub fn format_bytes(bytes: u64, options: ByteFormatOptions) -> FormattedBytes {
    if bytes == 0 {
        return match options.output {
            ByteOutput::String => FormattedBytes::Text(String::new()),
            ByteOutput::Number => FormattedBytes::Number(0.0),
            ByteOutput::Tuple => FormattedBytes::Tuple(0.0, BYTE_UNITS[0]),
        };
    }

    let (value, power, decimals) = match options.unit.power() {
        None => {
            let power = auto_power(bytes);
            let (value, decimals) = truncate_significant(scaled(bytes, power));
            (value, power, decimals)
        }
        Some(power) => {
            let decimals = options.decimals.unwrap_or(DEFAULT_DECIMALS);
            let factor = 10f64.powi(decimals as i32);
            let value = (scaled(bytes, power) * factor).round() / factor;
            (value, power, decimals)
        }
    };

    let unit = BYTE_UNITS[power];
    match options.output {
        ByteOutput::String => {
            FormattedBytes::Text(format!("{} {}", trim_decimal(value, decimals), unit))
        }
        ByteOutput::Number => FormattedBytes::Number(value),
        ByteOutput::Tuple => FormattedBytes::Tuple(value, unit),
    }
}

/// Shorthand for string output in the given unit
pub fn format_bytes_string(bytes: u64, unit: ByteUnit) -> String {
    format_bytes(
        bytes,
        ByteFormatOptions {
            unit,
            ..Default::default()
        },
    )
    .into_text()
}

fn auto_power(bytes: u64) -> usize {
    let mut power = 0;
    while power + 1 < BYTE_UNITS.len() && bytes >= 1000u64.pow(power as u32 + 1) {
        power += 1;
    }
    power
}

fn scaled(bytes: u64, power: usize) -> f64 {
    bytes as f64 / 1024f64.powi(power as i32)
}

/// Truncate to three significant digits, never below 1
fn truncate_significant(value: f64) -> (f64, u32) {
    let int_digits = if value >= 1.0 {
        value.log10().floor() as i32 + 1
    } else {
        1
    };
    let decimals = (AUTO_SIGNIFICANT_DIGITS - int_digits).max(0) as u32;
    let factor = 10f64.powi(decimals as i32);
    // Epsilon absorbs binary representation error before flooring
    let truncated = ((value * factor) + 1e-9).floor() / factor;
    (truncated.max(1.0), decimals)
}

fn trim_decimal(value: f64, decimals: u32) -> String {
    let text = format!("{:.*}", decimals as usize, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// A second count split into clock units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationParts {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl DurationParts {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn as_tuple(&self) -> (u64, u64, u64) {
        (self.hours, self.minutes, self.seconds)
    }
}

/// Duration display style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationStyle {
    /// `HH:MM:SS`
    #[default]
    Clock,
    /// `1h 02m 03s`, leading zero units omitted
    Human,
}

/// Format a second count
///
/// # Examples
///
/// ```
/// use daylog_common::format::{format_duration, DurationStyle};
///
/// assert_eq!(format_duration(3723, DurationStyle::Clock), "01:02:03");
/// assert_eq!(format_duration(3723, DurationStyle::Human), "1h 02m 03s");
/// assert_eq!(format_duration(65, DurationStyle::Human), "1m 05s");
/// ```
pub fn format_duration(seconds: u64, style: DurationStyle) -> String {
    let parts = DurationParts::from_seconds(seconds);
    match style {
        DurationStyle::Clock => format!(
            "{:02}:{:02}:{:02}",
            parts.hours, parts.minutes, parts.seconds
        ),
        DurationStyle::Human => {
            if parts.hours > 0 {
                format!("{}h {:02}m {:02}s", parts.hours, parts.minutes, parts.seconds)
            } else if parts.minutes > 0 {
                format!("{}m {:02}s", parts.minutes, parts.seconds)
            } else {
                format!("{}s", parts.seconds)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto(bytes: u64) -> String {
        format_bytes_string(bytes, ByteUnit::Auto)
    }

    #[test]
    fn test_auto_examples() {
        assert_eq!(auto(1000), "1 KB");
        assert_eq!(auto(123_456_789), "117 MB");
    }

    #[test]
    fn test_auto_small_values_stay_in_bytes() {
        assert_eq!(auto(1), "1 B");
        assert_eq!(auto(999), "999 B");
    }

    #[test]
    fn test_auto_keeps_three_significant_digits() {
        // 1.5e6 / 1024² = 1.430511...
        assert_eq!(auto(1_500_000), "1.43 MB");
        // 25e9 / 1024³ = 23.283...
        assert_eq!(auto(25_000_000_000), "23.2 GB");
    }

    #[test]
    fn test_auto_caps_at_terabytes() {
        assert_eq!(auto(5_000_000_000_000_000), "4547 TB");
    }

    #[test]
    fn test_zero_per_output_mode() {
        assert_eq!(auto(0), "");
        let number = ByteFormatOptions {
            output: ByteOutput::Number,
            ..Default::default()
        };
        assert_eq!(format_bytes(0, number), FormattedBytes::Number(0.0));
        let tuple = ByteFormatOptions {
            output: ByteOutput::Tuple,
            ..Default::default()
        };
        assert_eq!(format_bytes(0, tuple), FormattedBytes::Tuple(0.0, "B"));
    }

    #[test]
    fn test_explicit_units() {
        assert_eq!(format_bytes_string(1_073_741_824, ByteUnit::Gb), "1 GB");
        assert_eq!(format_bytes_string(1_610_612_736, ByteUnit::Gb), "1.5 GB");
        assert_eq!(format_bytes_string(123_456_789, ByteUnit::Mb), "117.74 MB");
        assert_eq!(format_bytes_string(2048, ByteUnit::Bytes), "2048 B");
    }

    #[test]
    fn test_explicit_decimals_and_tuple() {
        let options = ByteFormatOptions {
            unit: ByteUnit::Mb,
            output: ByteOutput::Tuple,
            decimals: Some(0),
        };
        assert_eq!(
            format_bytes(123_456_789, options),
            FormattedBytes::Tuple(118.0, "MB")
        );
    }

    #[test]
    fn test_duration_parts() {
        let parts = DurationParts::from_seconds(90_061);
        assert_eq!(parts.as_tuple(), (25, 1, 1));
    }

    #[test]
    fn test_duration_styles() {
        assert_eq!(format_duration(0, DurationStyle::Clock), "00:00:00");
        assert_eq!(format_duration(0, DurationStyle::Human), "0s");
        assert_eq!(format_duration(59, DurationStyle::Human), "59s");
        assert_eq!(format_duration(90_061, DurationStyle::Clock), "25:01:01");
    }
}
