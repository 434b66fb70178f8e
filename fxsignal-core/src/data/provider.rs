//! Market-data collaborator boundary.
//!
//! The engine only ever asks for "bars of symbol S over period P at interval
//! I". An empty series is a valid answer and means "no signal"; errors are
//! reserved for the provider failing to answer at all.

use crate::domain::{Bar, Interval, Period, Series, SeriesError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("unsupported request: {0}")]
    Unsupported(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error(transparent)]
    InvalidSeries(#[from] SeriesError),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvFile,
    Synthetic,
}

/// A source of OHLCV bars.
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Bars for `symbol` covering `period` back from the latest available bar.
    fn fetch_bars(&self, symbol: &str, period: Period, interval: Interval) -> Result<Series, DataError>;

    /// False while the provider refuses requests (rate limit, ban).
    fn is_available(&self) -> bool {
        true
    }
}

/// Sort, drop void bars and duplicate timestamps, then keep only bars inside
/// `period` counted back from the last one.
///
/// Of several bars sharing a timestamp the last one received wins: it is the
/// freshest update of a still-forming bar.
pub fn assemble_series(
    symbol: &str,
    interval: Interval,
    period: Period,
    mut bars: Vec<Bar>,
) -> Result<Series, DataError> {
    bars.retain(|b| !b.is_void());
    // Stable sort keeps arrival order among equal timestamps.
    bars.sort_by_key(|b| b.timestamp);
    bars.reverse();
    bars.dedup_by_key(|b| b.timestamp);
    bars.reverse();

    if let Some(end) = bars.last().map(|b| b.timestamp) {
        if let Some(start) = period.start_from(end) {
            bars.retain(|b| b.timestamp > start);
        }
    }
    Ok(Series::new(symbol, interval, bars)?)
}

/// Number of `interval` bars that fit in `period` before `end`, capped.
pub(crate) fn bars_in_period(period: Period, interval: Interval, end: DateTime<Utc>, cap: usize) -> usize {
    let Some(start) = period.start_from(end) else {
        return cap;
    };
    let span = (end - start).num_seconds().max(0);
    let step = interval.duration().num_seconds().max(1);
    usize::try_from(span / step).map_or(cap, |n| n.min(cap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar_at(ts: DateTime<Utc>, close: f64) -> Bar {
        Bar::new(ts, close, close + 0.001, close - 0.001, close, 0)
    }

    #[test]
    fn assemble_sorts_dedups_and_trims() {
        let end = Utc.with_ymd_and_hms(2024, 6, 28, 0, 0, 0).unwrap();
        let bars = vec![
            bar_at(end, 1.3),
            bar_at(end - Duration::days(40), 1.0),
            bar_at(end - Duration::days(2), 1.2),
            bar_at(end - Duration::days(2), 1.25),
            Bar::new(end - Duration::days(1), f64::NAN, 1.0, 1.0, 1.0, 0),
        ];
        let series = assemble_series("EURUSD=X", Interval::D1, Period::Months(1), bars).unwrap();
        let closes = series.closes();
        assert_eq!(closes, vec![1.25, 1.3]);
    }

    #[test]
    fn latest_update_of_a_bar_wins() {
        let end = Utc.with_ymd_and_hms(2024, 6, 28, 10, 0, 0).unwrap();
        let bars = vec![
            bar_at(end - Duration::hours(1), 1.10),
            bar_at(end, 1.11),
            bar_at(end, 1.12),
            bar_at(end, 1.13),
        ];
        let series = assemble_series("EURUSD=X", Interval::H1, Period::Days(5), bars).unwrap();
        assert_eq!(series.closes(), vec![1.10, 1.13]);
    }

    #[test]
    fn assemble_empty_is_ok() {
        let series = assemble_series("EURUSD=X", Interval::H1, Period::Months(3), Vec::new()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn bars_in_period_counts_intervals() {
        let end = Utc.with_ymd_and_hms(2024, 6, 28, 0, 0, 0).unwrap();
        assert_eq!(bars_in_period(Period::Days(5), Interval::H1, end, 10_000), 120);
        assert_eq!(bars_in_period(Period::Days(5), Interval::M15, end, 100), 100);
        assert_eq!(bars_in_period(Period::Max, Interval::D1, end, 700), 700);
    }
}
