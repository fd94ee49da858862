//! Time formatting, differences and parsing.
//!
//! Instants are stored in UTC and only converted to the host's local
//! timezone for display and for reading naive user input.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};

pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_SECOND: i64 = 1_000;

/// Used when a configured pattern cannot be rendered
const FALLBACK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Naive forms accepted for local input, most specific last
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("no time given")]
    Empty,
    #[error("unrecognized time '{0}' (try 2025-05-01T14:30, +15m or now)")]
    Unrecognized(String),
    #[error("'{0}' does not exist in the local timezone")]
    NonexistentLocal(String),
    #[error("offset out of range: {0}")]
    OutOfRange(String),
}

/// Render an instant in local time with a strftime pattern.
///
/// An invalid pattern falls back to `%Y-%m-%d %H:%M:%S` rather than
/// panicking inside `Display`.
pub fn format_instant(instant: DateTime<Utc>, pattern: &str) -> String {
    let local = instant.with_timezone(&Local);
    let mut out = String::new();
    if write!(out, "{}", local.format(pattern)).is_ok() {
        return out;
    }
    local.format(FALLBACK_FORMAT).to_string()
}

/// Signed difference `a - b`, millisecond precision.
pub fn diff(a: DateTime<Utc>, b: DateTime<Utc>) -> TimeDelta {
    a.signed_duration_since(b)
}

/// A remaining duration split into whole hours, minutes and seconds.
///
/// Always floored. Hours are not wrapped at 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hms {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Hms {
    pub fn from_millis(ms: i64) -> Self {
        let ms = ms.max(0);
        Hms {
            hours: ms / MS_PER_HOUR,
            minutes: (ms % MS_PER_HOUR) / MS_PER_MINUTE,
            seconds: (ms % MS_PER_MINUTE) / MS_PER_SECOND,
        }
    }

    pub fn from_delta(delta: TimeDelta) -> Self {
        Self::from_millis(delta.num_milliseconds())
    }

    pub fn total_seconds(&self) -> i64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
    }
}

/// Parse user input into an instant.
///
/// Accepts `now`, relative offsets (`+90s`, `+15m`, `+2h`, `+1d`), RFC 3339,
/// and naive local `YYYY-MM-DD[T ]HH:MM[:SS]`.
pub fn parse_instant(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TimeParseError::Empty);
    }
    if input.eq_ignore_ascii_case("now") {
        return Ok(now);
    }
    if let Some(offset) = input.strip_prefix('+') {
        let delta = parse_offset(offset)?;
        return now
            .checked_add_signed(delta)
            .ok_or_else(|| TimeParseError::OutOfRange(input.to_string()));
    }
    parse_stored_instant(input)
}

/// Parse an absolute instant as found in the store: RFC 3339 or naive local.
pub fn parse_stored_instant(raw: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TimeParseError::Empty);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return local_to_utc(&naive, raw);
        }
    }
    Err(TimeParseError::Unrecognized(raw.to_string()))
}

/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
fn local_to_utc(naive: &NaiveDateTime, raw: &str) -> Result<DateTime<Utc>, TimeParseError> {
    Local
        .from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TimeParseError::NonexistentLocal(raw.to_string()))
}

fn parse_offset(offset: &str) -> Result<TimeDelta, TimeParseError> {
    let unrecognized = || TimeParseError::Unrecognized(format!("+{}", offset));
    let split = offset
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(unrecognized)?;
    let (digits, unit) = offset.split_at(split);
    let amount: i64 = digits.parse().map_err(|_| unrecognized())?;
    let seconds_per_unit = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        _ => return Err(unrecognized()),
    };
    amount
        .checked_mul(seconds_per_unit)
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| TimeParseError::OutOfRange(format!("+{}", offset)))
}
