//! Directional labels: trade direction, per-timeframe trend, overall bias.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for buys, -1 for sells. Multiplies price offsets.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend label for a single timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    Undetermined,
}

impl Trend {
    /// Direction a trade would take with this trend, if any.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Trend::Up => Some(Direction::Buy),
            Trend::Down => Some(Direction::Sell),
            Trend::Undetermined => None,
        }
    }
}

/// Overall directional bias across timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bias {
    Up,
    Down,
    Neutral,
}

impl Bias {
    /// Whether a trade in `direction` is not against this bias.
    pub fn permits(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Bias::Neutral, _) | (Bias::Up, Direction::Buy) | (Bias::Down, Direction::Sell)
        )
    }
}
