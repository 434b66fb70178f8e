//! Series: an ordered run of bars for one symbol and interval.

use super::{Bar, Interval};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} of {symbol} does not advance the timestamp")]
    NonIncreasingTimestamp { symbol: String, index: usize },

    #[error("series symbol must not be empty")]
    EmptySymbol,
}

/// Ordered bars for one symbol+interval. Timestamps strictly increase.
///
/// Length is not checked against indicator windows here: consumers degrade to
/// "insufficient data" on short input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct Series {
    symbol: String,
    interval: Interval,
    bars: Vec<Bar>,
}

/// Wire form of a `Series`; only reaches callers through `Series::new`.
#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    interval: Interval,
    bars: Vec<Bar>,
}

impl TryFrom<RawSeries> for Series {
    type Error = SeriesError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Series::new(raw.symbol, raw.interval, raw.bars)
    }
}

impl Series {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(SeriesError::EmptySymbol);
        }
        if let Some(index) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SeriesError::NonIncreasingTimestamp {
                symbol,
                index: index + 1,
            });
        }
        Ok(Self {
            symbol,
            interval,
            bars,
        })
    }

    /// An empty series: the provider had nothing for this symbol.
    pub fn empty(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Whether any bar carries real volume.
    pub fn has_volume(&self) -> bool {
        self.bars.iter().any(|b| b.volume > 0)
    }

    /// Keep only the most recent `n` bars.
    pub fn tail(&self, n: usize) -> Series {
        let start = self.bars.len().saturating_sub(n);
        Series {
            symbol: self.symbol.clone(),
            interval: self.interval,
            bars: self.bars[start..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar_at(minutes: i64, close: f64, volume: u64) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        Bar::new(ts, close, close + 0.001, close - 0.001, close, volume)
    }

    #[test]
    fn rejects_non_increasing_timestamps() {
        let bars = vec![bar_at(0, 1.0, 0), bar_at(15, 1.1, 0), bar_at(15, 1.2, 0)];
        let err = Series::new("EURUSD=X", Interval::M15, bars).unwrap_err();
        assert_eq!(
            err,
            SeriesError::NonIncreasingTimestamp {
                symbol: "EURUSD=X".into(),
                index: 2
            }
        );
    }

    #[test]
    fn rejects_empty_symbol() {
        assert_eq!(
            Series::new(" ", Interval::D1, vec![]).unwrap_err(),
            SeriesError::EmptySymbol
        );
    }

    #[test]
    fn volume_detection() {
        let flat = Series::new("X", Interval::M15, vec![bar_at(0, 1.0, 0), bar_at(15, 1.0, 0)]).unwrap();
        assert!(!flat.has_volume());
        let traded =
            Series::new("X", Interval::M15, vec![bar_at(0, 1.0, 0), bar_at(15, 1.0, 10)]).unwrap();
        assert!(traded.has_volume());
    }

    #[test]
    fn deserialization_checks_ordering() {
        let series = Series::new("EURUSD=X", Interval::M15, vec![bar_at(0, 1.0, 0), bar_at(15, 1.1, 0)]).unwrap();
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(serde_json::from_str::<Series>(&json).unwrap(), series);

        let swapped = Series {
            symbol: "EURUSD=X".into(),
            interval: Interval::M15,
            bars: vec![bar_at(15, 1.1, 0), bar_at(0, 1.0, 0)],
        };
        let json = serde_json::to_string(&swapped).unwrap();
        let err = serde_json::from_str::<Series>(&json).unwrap_err();
        assert!(err.to_string().contains("does not advance the timestamp"), "{err}");
    }

    #[test]
    fn tail_keeps_most_recent() {
        let bars: Vec<Bar> = (0..5).map(|i| bar_at(i * 15, 1.0 + i as f64, 0)).collect();
        let series = Series::new("X", Interval::M15, bars).unwrap();
        let tail = series.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.bars()[0].close, 4.0);
        assert_eq!(series.tail(10).len(), 5);
    }
}
