//! IndicatorEngine building blocks.
//!
//! Indicators are pure functions: bar history in, one value per bar out.
//! Leading values are `f64::NAN` until the window fills; consumers must read
//! NaN as "not yet decidable", never as zero (see [`defined`]).

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod vwap;

pub use atr::{true_range, Atr};
pub use ema::{ewm_of_series, Ema};
pub use rsi::Rsi;
pub use sma::{rolling_mean, Sma};
pub use vwap::Vwap;

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
/// No value at bar t may depend on bars after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_21", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// `Some(v)` unless `v` is NaN or infinite.
pub fn defined(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 0.001, low = min(open,close) - 0.001,
/// volume = 1000. Bars are 15 minutes apart.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 0.001,
                low: open.min(close) - 0.001,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
