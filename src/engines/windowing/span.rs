//! Duration and row-count spans used to size windows, gaps and lead-in data.

use crate::error::{LabelcraftError, Result};
use crate::types::{parse_timestamp, Timestamp};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fixed calendar-free duration written like `20min`, `1h30min`, `2d` or `500ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Offset(TimeDelta);

const UNITS: [(&str, i64); 6] = [
    ("w", 7 * 24 * 3_600_000),
    ("d", 24 * 3_600_000),
    ("h", 3_600_000),
    ("min", 60_000),
    ("s", 1_000),
    ("ms", 1),
];

impl Offset {
    pub fn new(delta: TimeDelta) -> Self {
        Self(delta)
    }

    pub fn zero() -> Self {
        Self(TimeDelta::zero())
    }

    pub fn milliseconds(ms: i64) -> Self {
        Self(TimeDelta::milliseconds(ms))
    }

    pub fn seconds(s: i64) -> Self {
        Self(TimeDelta::seconds(s))
    }

    pub fn minutes(m: i64) -> Self {
        Self(TimeDelta::minutes(m))
    }

    pub fn hours(h: i64) -> Self {
        Self(TimeDelta::hours(h))
    }

    pub fn days(d: i64) -> Self {
        Self(TimeDelta::days(d))
    }

    pub fn delta(&self) -> TimeDelta {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > TimeDelta::zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < TimeDelta::zero()
    }

    /// `ts + self`, saturating at the representable bounds.
    pub fn after(&self, ts: Timestamp) -> Timestamp {
        ts.checked_add_signed(self.0).unwrap_or(if self.is_negative() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }

    /// `ts - self`, saturating at the representable bounds.
    pub fn before(&self, ts: Timestamp) -> Timestamp {
        ts.checked_sub_signed(self.0).unwrap_or(if self.is_negative() {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        })
    }

    fn unit_millis(unit: &str) -> Option<i64> {
        let canonical = match unit {
            "w" | "week" | "weeks" => "w",
            "d" | "day" | "days" => "d",
            "h" | "hr" | "hour" | "hours" => "h",
            "m" | "min" | "mins" | "minute" | "minutes" | "T" => "min",
            "s" | "sec" | "secs" | "second" | "seconds" => "s",
            "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => "ms",
            _ => return None,
        };
        UNITS.iter().find(|(name, _)| *name == canonical).map(|(_, ms)| *ms)
    }
}

impl FromStr for Offset {
    type Err = LabelcraftError;

    fn from_str(text: &str) -> Result<Self> {
        let malformed = || {
            LabelcraftError::Configuration(format!(
                "Cannot parse duration '{}' (expected e.g. '20min', '1h30min', '2d')",
                text
            ))
        };

        let mut rest = text.trim();
        if rest.is_empty() {
            return Err(malformed());
        }

        let mut total: i64 = 0;
        while !rest.is_empty() {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return Err(malformed());
            }
            let amount: i64 = rest[..digits].parse().map_err(|_| malformed())?;
            rest = rest[digits..].trim_start();

            let unit_len = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()).len();
            let unit_ms = Self::unit_millis(&rest[..unit_len]).ok_or_else(malformed)?;
            rest = rest[unit_len..].trim_start();

            total = amount
                .checked_mul(unit_ms)
                .and_then(|ms| total.checked_add(ms))
                .ok_or_else(malformed)?;
        }

        Ok(Self(TimeDelta::milliseconds(total)))
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0.num_milliseconds();
        if ms == 0 {
            return f.write_str("0s");
        }
        let sign = if ms < 0 { "-" } else { "" };
        let ms = ms.abs();
        for (unit, size) in UNITS {
            if ms % size == 0 {
                return write!(f, "{}{}{}", sign, ms / size, unit);
            }
        }
        write!(f, "{}{}ms", sign, ms)
    }
}

impl TryFrom<String> for Offset {
    type Error = LabelcraftError;

    fn try_from(text: String) -> Result<Self> {
        text.parse()
    }
}

impl From<Offset> for String {
    fn from(offset: Offset) -> Self {
        offset.to_string()
    }
}

impl From<TimeDelta> for Offset {
    fn from(delta: TimeDelta) -> Self {
        Self(delta)
    }
}

/// Wire shape shared by every span type: a bare integer or a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSpan {
    Rows(i64),
    Text(String),
}

fn parse_rows(parameter: &str, rows: i64) -> Result<usize> {
    usize::try_from(rows).map_err(|_| {
        LabelcraftError::invalid(parameter, format!("row count must be non-negative, got {}", rows))
    })
}

fn is_row_count(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Advance between consecutive cutoffs, or a `maximum_data` horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSpan", into = "RawSpan")]
pub enum Span {
    Duration(Offset),
    Rows(usize),
}

impl FromStr for Span {
    type Err = LabelcraftError;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        if is_row_count(text) {
            return Ok(Span::Rows(parse_rows("span", text.parse().unwrap_or(i64::MAX))?));
        }
        Ok(Span::Duration(text.parse()?))
    }
}

impl TryFrom<RawSpan> for Span {
    type Error = LabelcraftError;

    fn try_from(raw: RawSpan) -> Result<Self> {
        match raw {
            RawSpan::Rows(rows) => Ok(Span::Rows(parse_rows("span", rows)?)),
            RawSpan::Text(text) => text.parse(),
        }
    }
}

impl From<Span> for RawSpan {
    fn from(span: Span) -> Self {
        match span {
            Span::Duration(offset) => RawSpan::Text(offset.to_string()),
            Span::Rows(rows) => RawSpan::Rows(rows as i64),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::Duration(offset) => write!(f, "{}", offset),
            Span::Rows(rows) => write!(f, "{} rows", rows),
        }
    }
}

/// Size of each window. `All` labels the whole remaining stream once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSpan", into = "RawSpan")]
pub enum WindowSize {
    Duration(Offset),
    Rows(usize),
    All,
}

impl WindowSize {
    /// Gap used when none is configured: non-overlapping tiling.
    pub fn default_gap(&self) -> Option<Span> {
        match self {
            WindowSize::Duration(offset) => Some(Span::Duration(*offset)),
            WindowSize::Rows(rows) => Some(Span::Rows(*rows)),
            WindowSize::All => None,
        }
    }
}

impl FromStr for WindowSize {
    type Err = LabelcraftError;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("all") {
            return Ok(WindowSize::All);
        }
        Ok(match text.parse::<Span>()? {
            Span::Duration(offset) => WindowSize::Duration(offset),
            Span::Rows(rows) => WindowSize::Rows(rows),
        })
    }
}

impl TryFrom<RawSpan> for WindowSize {
    type Error = LabelcraftError;

    fn try_from(raw: RawSpan) -> Result<Self> {
        match raw {
            RawSpan::Rows(rows) => Ok(WindowSize::Rows(parse_rows("window_size", rows)?)),
            RawSpan::Text(text) => text.parse(),
        }
    }
}

impl From<WindowSize> for RawSpan {
    fn from(size: WindowSize) -> Self {
        match size {
            WindowSize::Duration(offset) => RawSpan::Text(offset.to_string()),
            WindowSize::Rows(rows) => RawSpan::Rows(rows as i64),
            WindowSize::All => RawSpan::Text("all".to_string()),
        }
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowSize::Duration(offset) => write!(f, "{}", offset),
            WindowSize::Rows(rows) => write!(f, "{} rows", rows),
            WindowSize::All => f.write_str("all"),
        }
    }
}

/// Lead-in history required before the first cutoff, or an explicit first cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSpan", into = "RawSpan")]
pub enum MinimumData {
    Duration(Offset),
    Rows(usize),
    Cutoff(Timestamp),
}

impl FromStr for MinimumData {
    type Err = LabelcraftError;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        if is_row_count(text) {
            return Ok(MinimumData::Rows(parse_rows(
                "minimum_data",
                text.parse().unwrap_or(i64::MAX),
            )?));
        }
        if let Ok(offset) = text.parse::<Offset>() {
            return Ok(MinimumData::Duration(offset));
        }
        parse_timestamp(text).map(MinimumData::Cutoff).ok_or_else(|| {
            LabelcraftError::invalid(
                "minimum_data",
                format!("'{}' is neither a duration, a row count nor a timestamp", text),
            )
        })
    }
}

impl TryFrom<RawSpan> for MinimumData {
    type Error = LabelcraftError;

    fn try_from(raw: RawSpan) -> Result<Self> {
        match raw {
            RawSpan::Rows(rows) => Ok(MinimumData::Rows(parse_rows("minimum_data", rows)?)),
            RawSpan::Text(text) => text.parse(),
        }
    }
}

impl From<MinimumData> for RawSpan {
    fn from(minimum: MinimumData) -> Self {
        match minimum {
            MinimumData::Duration(offset) => RawSpan::Text(offset.to_string()),
            MinimumData::Rows(rows) => RawSpan::Rows(rows as i64),
            MinimumData::Cutoff(ts) => RawSpan::Text(ts.to_rfc3339()),
        }
    }
}

impl fmt::Display for MinimumData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinimumData::Duration(offset) => write!(f, "{}", offset),
            MinimumData::Rows(rows) => write!(f, "{} rows", rows),
            MinimumData::Cutoff(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}
