//! Human-friendly duration strings ("10d", "72h", "1.5h").
//!
//! The accepted grammar is `<number><unit>` where the number may be
//! fractional and the unit is one of h, m, s, ms, us/µs, ns, d, w, mo, y.
//! An empty string parses to a zero duration; anything else malformed is a
//! hard error. Filter fields are lenient, durations are not: a caller that
//! sends "10x" made a mistake worth surfacing, while "" legitimately means
//! "no time filter".

use chrono::Duration;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Errors produced while parsing a duration string.
#[derive(Debug, Error)]
pub enum DurationParseError {
    /// Missing numeric part or missing unit suffix.
    #[error("invalid duration: {0}")]
    Invalid(String),

    /// Numeric part parsed but the suffix is not a recognized unit.
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    /// The numeric prefix is not a valid floating-point value.
    #[error(transparent)]
    InvalidNumber(#[from] std::num::ParseFloatError),
}

/// A signed time span that round-trips through a human-readable string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(Duration);

impl HumanDuration {
    pub fn zero() -> Self {
        HumanDuration(Duration::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Duration::zero()
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for HumanDuration {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Duration> for HumanDuration {
    fn from(d: Duration) -> Self {
        HumanDuration(d)
    }
}

fn unit_nanos(unit: &str) -> Option<i64> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        "d" => 24 * 3_600 * NANOS_PER_SEC,
        "w" => 7 * 24 * 3_600 * NANOS_PER_SEC,
        // Approximations, good enough for "last month" style questions.
        "mo" => 30 * 24 * 3_600 * NANOS_PER_SEC,
        "y" => 365 * 24 * 3_600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

impl FromStr for HumanDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::zero());
        }

        // The numeric prefix is ASCII digits plus at most a decimal point;
        // the first character outside that set starts the unit suffix.
        let boundary = s
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
            .map(|(i, _)| i)
            .ok_or_else(|| DurationParseError::Invalid(s.to_string()))?;

        let (number_part, unit_part) = s.split_at(boundary);
        if number_part.is_empty() || unit_part.is_empty() {
            return Err(DurationParseError::Invalid(s.to_string()));
        }

        let multiplier = unit_nanos(unit_part).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit_part.to_string(),
            input: s.to_string(),
        })?;

        let value: f64 = number_part.parse()?;

        // Fractional results truncate to nanosecond resolution.
        let nanos = (value * multiplier as f64) as i64;
        Ok(HumanDuration(Duration::nanoseconds(nanos)))
    }
}

impl fmt::Display for HumanDuration {
    /// Canonical form: non-zero components from hours down, e.g. "1h30m".
    /// Not necessarily the unit the caller used on input.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nanos = match self.0.num_nanoseconds() {
            Some(n) => n,
            None => return write!(f, "{}h", self.0.num_hours()),
        };
        if nanos == 0 {
            return write!(f, "0s");
        }
        if nanos < 0 {
            write!(f, "-")?;
            nanos = -nanos;
        }

        let units: &[(&str, i64)] = &[
            ("h", 3_600 * NANOS_PER_SEC),
            ("m", 60 * NANOS_PER_SEC),
            ("s", NANOS_PER_SEC),
            ("ms", 1_000_000),
            ("us", 1_000),
            ("ns", 1),
        ];
        for (suffix, size) in units {
            let count = nanos / size;
            if count > 0 {
                write!(f, "{}{}", count, suffix)?;
                nanos %= size;
            }
        }
        Ok(())
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // null is treated like an absent field: zero duration.
        let s = Option::<String>::deserialize(deserializer)?;
        match s {
            None => Ok(Self::zero()),
            Some(s) => s.parse().map_err(D::Error::custom),
        }
    }
}
