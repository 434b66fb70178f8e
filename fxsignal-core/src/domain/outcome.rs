//! Result-or-absent union for fan-out work that may fail per item.

use serde::{Deserialize, Serialize};

/// Outcome of one independent unit of work (a timeframe, a symbol).
///
/// Failures are absorbed into `Absent` with a reason; aggregates simply skip
/// absent entries and never abort sibling work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Present(T),
    Absent { reason: String },
}

impl<T> Outcome<T> {
    pub fn absent(reason: impl Into<String>) -> Self {
        Outcome::Absent {
            reason: reason.into(),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Outcome::Present(_))
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            Outcome::Present(v) => Some(v),
            Outcome::Absent { .. } => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Outcome::Present(v),
            Err(e) => Outcome::absent(e.to_string()),
        }
    }
}
