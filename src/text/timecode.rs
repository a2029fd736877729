//! Conversion between textual timestamps and seconds.
//!
//! Clock times (`MM:SS`, `HH:MM:SS`) appear inline in speaker headers; SRT
//! timecodes (`HH:MM:SS,mmm`) appear on cue lines. None of these functions
//! fail: a malformed field means "no timestamp", never an error.

use regex::Regex;
use std::sync::LazyLock;

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}):(\d{2})(?::(\d{2}))?").expect("Invalid clock time regex")
});

static SRT_TIMECODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{1,3})\s*$")
        .expect("Invalid SRT timecode regex")
});

/// Clock time fields as matched, before any range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClockFields {
    hours: u64,
    minutes: u64,
    seconds: u64,
}

impl ClockFields {
    fn total_seconds(&self) -> f64 {
        (self.hours * 3600 + self.minutes * 60 + self.seconds) as f64
    }

    fn in_range(&self) -> bool {
        self.minutes < 60 && self.seconds < 60
    }
}

fn clock_fields(text: &str) -> Option<ClockFields> {
    let cap = CLOCK_TIME.captures(text)?;
    let first: u64 = cap.get(1)?.as_str().parse().ok()?;
    let second: u64 = cap.get(2)?.as_str().parse().ok()?;

    let fields = match cap.get(3) {
        // HH:MM:SS
        Some(third) => ClockFields {
            hours: first,
            minutes: second,
            seconds: third.as_str().parse().ok()?,
        },
        // MM:SS
        None => ClockFields {
            hours: 0,
            minutes: first,
            seconds: second,
        },
    };

    Some(fields)
}

/// Parse the first `MM:SS` or `HH:MM:SS` clock time in `text`.
///
/// Returns `None` when no clock time is present. Field values are not range
/// checked, so `00:75` yields 75 seconds.
pub fn try_parse_clock_time(text: &str) -> Option<f64> {
    clock_fields(text).map(|f| f.total_seconds())
}

/// Parse a clock time, falling back to `0.0` when none is present.
pub fn parse_clock_time(text: &str) -> f64 {
    try_parse_clock_time(text).unwrap_or(0.0)
}

/// Parse a clock time, rejecting minute or second fields of 60 or more.
///
/// Speaker headers use this: an out-of-range timestamp is treated as absent
/// so the caller falls back to time inference.
pub fn parse_clock_time_strict(text: &str) -> Option<f64> {
    clock_fields(text)
        .filter(ClockFields::in_range)
        .map(|f| f.total_seconds())
}

/// Parse an SRT timecode (`HH:MM:SS,mmm`, a `.` separator is also accepted).
pub fn parse_srt_timecode(text: &str) -> Option<f64> {
    let cap = SRT_TIMECODE.captures(text)?;
    let hours: u64 = cap[1].parse().ok()?;
    let minutes: u64 = cap[2].parse().ok()?;
    let seconds: u64 = cap[3].parse().ok()?;

    // "5" after the separator means 500ms, not 5ms
    let fraction = &cap[4];
    let millis: u64 = format!("{:0<3}", fraction).parse().ok()?;

    let total_millis = ((hours * 3600 + minutes * 60 + seconds) * 1000) + millis;
    Some(total_millis as f64 / 1000.0)
}

/// Format seconds as an SRT timecode.
pub fn format_srt_timecode(seconds: f64) -> String {
    let total_millis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
