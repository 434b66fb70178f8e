//! Bar intervals (timeframes) and lookback periods.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bar interval. Ordered from the shortest to the longest timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1wk")]
    W1,
}

impl Interval {
    /// All intervals, highest timeframe first (hierarchy order).
    pub const HIERARCHY: [Interval; 4] = [Interval::W1, Interval::D1, Interval::H1, Interval::M15];

    /// Provider-facing code ("15m", "1h", "1d", "1wk").
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M15 => "15m",
            Interval::H1 => "1h",
            Interval::D1 => "1d",
            Interval::W1 => "1wk",
        }
    }

    /// Default hierarchy weight used by the reconciler: weekly dominates.
    pub fn default_weight(&self) -> f64 {
        match self {
            Interval::W1 => 40.0,
            Interval::D1 => 30.0,
            Interval::H1 => 20.0,
            Interval::M15 => 10.0,
        }
    }

    /// Default history requested when analysing this interval.
    pub fn default_period(&self) -> Period {
        match self {
            Interval::M15 => Period::Months(1),
            Interval::H1 => Period::Months(3),
            Interval::D1 => Period::Years(1),
            Interval::W1 => Period::Years(2),
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Interval::M15 => Duration::minutes(15),
            Interval::H1 => Duration::hours(1),
            Interval::D1 => Duration::days(1),
            Interval::W1 => Duration::weeks(1),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown interval '{0}' (expected 15m, 1h, 1d or 1wk)")]
    Interval(String),

    #[error("unknown period '{0}' (expected e.g. 5d, 1mo, 3mo, 1y, 2y, max)")]
    Period(String),
}

impl FromStr for Interval {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "15m" => Ok(Interval::M15),
            "1h" | "60m" => Ok(Interval::H1),
            "1d" => Ok(Interval::D1),
            "1wk" | "1w" => Ok(Interval::W1),
            _ => Err(ParseError::Interval(s.to_string())),
        }
    }
}

/// How much history to request from the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Days(u32),
    Months(u32),
    Years(u32),
    Max,
}

impl Period {
    /// Earliest timestamp covered by this period when counting back from `end`.
    /// `None` means unbounded.
    pub fn start_from(&self, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Period::Days(d) => Some(end - Duration::days(i64::from(d))),
            Period::Months(m) => end.checked_sub_months(Months::new(m)),
            Period::Years(y) => end.checked_sub_months(Months::new(y.saturating_mul(12))),
            Period::Max => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Days(d) => write!(f, "{d}d"),
            Period::Months(m) => write!(f, "{m}mo"),
            Period::Years(y) => write!(f, "{y}y"),
            Period::Max => f.write_str("max"),
        }
    }
}

impl FromStr for Period {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "max" {
            return Ok(Period::Max);
        }
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let n: u32 = digits
            .parse()
            .map_err(|_| ParseError::Period(s.clone()))?;
        if n == 0 {
            return Err(ParseError::Period(s.clone()));
        }
        match unit {
            "d" => Ok(Period::Days(n)),
            "mo" => Ok(Period::Months(n)),
            "y" => Ok(Period::Years(n)),
            _ => Err(ParseError::Period(s.clone())),
        }
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
