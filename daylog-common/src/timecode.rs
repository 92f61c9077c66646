//! Timecode arithmetic
//!
//! Converts `HH:MM:SS:FF` timecodes to and from frame counts and seconds at a
//! given frame rate, and tests frame-range overlap.
//!
//! Fractional rates (23.976, 29.97, 59.94) count frames at their nominal
//! integer timebase (24, 30, 60). Drop-frame timecodes (`;` separator) are
//! accepted but counted as non-drop.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed `HH:MM:SS:FF` timecode
///
/// Hours are not bounded to 24 so that summed durations stay representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

impl Timecode {
    /// Total frame count at the given rate
    ///
    /// Fails if the frame field does not fit the rate's timebase.
    pub fn to_frames(&self, fps: f64) -> Result<u64> {
        let base = timebase(fps)?;
        if self.frames >= base {
            return Err(Error::Timecode(format!(
                "{} has frame field {} at {} fps",
                self, self.frames, fps
            )));
        }
        let total_seconds =
            u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds);
        Ok(total_seconds * u64::from(base) + u64::from(self.frames))
    }

    /// Build a timecode from a frame count at the given rate
    pub fn from_frames(frames: u64, fps: f64) -> Result<Self> {
        let base = u64::from(timebase(fps)?);
        let total_seconds = frames / base;
        Ok(Self {
            hours: (total_seconds / 3600) as u32,
            minutes: ((total_seconds % 3600) / 60) as u32,
            seconds: (total_seconds % 60) as u32,
            frames: (frames % base) as u32,
        })
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

impl FromStr for Timecode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split([':', ';']).collect();
        if parts.len() != 4 {
            return Err(Error::Timecode(format!("'{}' is not HH:MM:SS:FF", s)));
        }

        let mut fields = [0u32; 4];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::Timecode(format!("'{}' is not HH:MM:SS:FF", s)));
            }
            *slot = part
                .parse()
                .map_err(|_| Error::Timecode(format!("'{}' is out of range", s)))?;
        }

        let [hours, minutes, seconds, frames] = fields;
        if minutes >= 60 || seconds >= 60 {
            return Err(Error::Timecode(format!("'{}' has minutes or seconds >= 60", s)));
        }

        Ok(Self {
            hours,
            minutes,
            seconds,
            frames,
        })
    }
}

/// Nominal integer frames-per-second for a rate
pub fn timebase(fps: f64) -> Result<u32> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(Error::Timecode(format!("invalid frame rate {}", fps)));
    }
    let base = fps.round();
    if base < 1.0 || base > 1000.0 {
        return Err(Error::Timecode(format!("unsupported frame rate {}", fps)));
    }
    Ok(base as u32)
}

/// Parse a frame rate as written in metadata exports
///
/// Accepts plain numbers ("25", "23.976") and scan suffixes ("25p", "59.94i").
pub fn parse_fps(value: &str) -> Option<f64> {
    let trimmed = value
        .trim()
        .trim_end_matches(|c: char| c == 'p' || c == 'P' || c == 'i' || c == 'I');
    let fps: f64 = trimmed.trim().parse().ok()?;
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Convert a timecode string to a frame count
pub fn tc_to_frames(tc: &str, fps: f64) -> Result<u64> {
    tc.parse::<Timecode>()?.to_frames(fps)
}

/// Convert a frame count back to a timecode string
pub fn frames_to_tc(frames: u64, fps: f64) -> Result<String> {
    Ok(Timecode::from_frames(frames, fps)?.to_string())
}

/// Convert a timecode string to seconds
pub fn tc_to_seconds(tc: &str, fps: f64) -> Result<f64> {
    let frames = tc_to_frames(tc, fps)?;
    Ok(frames as f64 / f64::from(timebase(fps)?))
}

/// Convert seconds to a timecode string, rounding to the nearest frame
pub fn seconds_to_tc(seconds: f64, fps: f64) -> Result<String> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(Error::Timecode(format!("invalid second count {}", seconds)));
    }
    let frames = (seconds * f64::from(timebase(fps)?)).round() as u64;
    frames_to_tc(frames, fps)
}

/// Closed-interval overlap test
///
/// True unless one range ends strictly before the other starts.
pub fn ranges_overlap(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> bool {
    !(a_end < b_start || b_end < a_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let tc: Timecode = "01:02:03:04".parse().unwrap();
        assert_eq!(tc.hours, 1);
        assert_eq!(tc.frames, 4);
        assert_eq!(tc.to_string(), "01:02:03:04");

        let drop: Timecode = "00:00:10;12".parse().unwrap();
        assert_eq!(drop.seconds, 10);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("01:02:03".parse::<Timecode>().is_err());
        assert!("aa:02:03:04".parse::<Timecode>().is_err());
        assert!("00:61:00:00".parse::<Timecode>().is_err());
        assert!("".parse::<Timecode>().is_err());
    }

    #[test]
    fn test_frames_round_trip_at_25() {
        assert_eq!(tc_to_frames("00:00:01:00", 25.0).unwrap(), 25);
        assert_eq!(tc_to_frames("01:00:00:00", 25.0).unwrap(), 90_000);
        assert_eq!(frames_to_tc(90_024, 25.0).unwrap(), "01:00:00:24");
    }

    #[test]
    fn test_fractional_rates_use_nominal_timebase() {
        assert_eq!(timebase(23.976).unwrap(), 24);
        assert_eq!(timebase(29.97).unwrap(), 30);
        assert_eq!(tc_to_frames("00:00:01:00", 23.976).unwrap(), 24);
    }

    #[test]
    fn test_frame_field_must_fit_timebase() {
        assert!(tc_to_frames("00:00:00:25", 25.0).is_err());
        assert!(tc_to_frames("00:00:00:24", 25.0).is_ok());
    }

    #[test]
    fn test_invalid_fps() {
        assert!(timebase(0.0).is_err());
        assert!(timebase(f64::NAN).is_err());
        assert!(tc_to_frames("00:00:00:00", -25.0).is_err());
    }

    #[test]
    fn test_seconds_conversion() {
        assert_eq!(tc_to_seconds("00:01:00:12", 24.0).unwrap(), 60.5);
        assert_eq!(seconds_to_tc(60.5, 24.0).unwrap(), "00:01:00:12");
        assert!(seconds_to_tc(-1.0, 24.0).is_err());
    }

    #[test]
    fn test_parse_fps() {
        assert_eq!(parse_fps("25"), Some(25.0));
        assert_eq!(parse_fps("23.976"), Some(23.976));
        assert_eq!(parse_fps("25p"), Some(25.0));
        assert_eq!(parse_fps("59.94i"), Some(59.94));
        assert_eq!(parse_fps("fast"), None);
        assert_eq!(parse_fps("0"), None);
    }

    #[test]
    fn test_ranges_overlap_is_closed_and_symmetric() {
        assert!(ranges_overlap(0, 10, 10, 20));
        assert!(ranges_overlap(10, 20, 0, 10));
        assert!(ranges_overlap(0, 100, 40, 50));
        assert!(!ranges_overlap(0, 9, 10, 20));
        assert!(!ranges_overlap(10, 20, 0, 9));

        for (a1, a2, b1, b2) in [(0, 5, 3, 8), (0, 2, 3, 8), (4, 4, 4, 4), (9, 12, 1, 8)] {
            assert_eq!(
                ranges_overlap(a1, a2, b1, b2),
                ranges_overlap(b1, b2, a1, a2)
            );
            assert_eq!(ranges_overlap(a1, a2, b1, b2), !(a2 < b1 || b2 < a1));
        }
    }
}
