//! IndicatorFrame: a series plus every derived column, computed once.
//!
//! The frame is built in one pass and then only read. Setup detectors, trend
//! analysis and the signal builder all borrow the same frame; none of them
//! can write into it.

use crate::config::{IndicatorConfig, PatternThresholds};
use crate::domain::{Bar, Series};
use crate::indicators::{defined, Atr, Ema, Indicator, Rsi, Sma, Vwap};
use crate::patterns::{CandlePatterns, PatternDetector};
use serde::{Deserialize, Serialize};

/// Series with parallel indicator columns. Every column has exactly one value
/// per bar; leading values are NaN until the window fills.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    series: Series,
    ema_fast: Vec<f64>,
    sma_short: Vec<f64>,
    sma_mid: Vec<f64>,
    sma_long: Vec<f64>,
    sma_trend: Vec<f64>,
    ema_slow: Vec<f64>,
    vwap: Vec<f64>,
    atr: Vec<f64>,
    rsi: Vec<f64>,
    patterns: Vec<CandlePatterns>,
}

/// Values of every column at one bar. `None` means not yet decidable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRow {
    pub bar: Bar,
    pub ema_fast: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_mid: Option<f64>,
    pub sma_long: Option<f64>,
    pub sma_trend: Option<f64>,
    pub ema_slow: Option<f64>,
    pub vwap: Option<f64>,
    pub atr: Option<f64>,
    pub rsi: Option<f64>,
    pub body: f64,
    pub upper_shadow: f64,
    pub lower_shadow: f64,
    pub patterns: CandlePatterns,
}

impl IndicatorFrame {
    pub fn build(series: Series, indicators: &IndicatorConfig, thresholds: &PatternThresholds) -> Self {
        let bars = series.bars();
        let ema_fast = Ema::new(indicators.ema_fast).compute(bars);
        let sma_short = Sma::new(indicators.sma_short).compute(bars);
        let sma_mid = Sma::new(indicators.sma_mid).compute(bars);
        let sma_long = Sma::new(indicators.sma_long).compute(bars);
        let sma_trend = Sma::new(indicators.sma_trend).compute(bars);
        let ema_slow = Ema::new(indicators.ema_slow).compute(bars);
        let vwap = Vwap::new().compute(bars);
        let atr = Atr::new(indicators.atr_period).compute(bars);
        let rsi = Rsi::new(indicators.rsi_period).compute(bars);
        let patterns =
            PatternDetector::new(thresholds.clone(), indicators.body_average_window).detect(bars);

        Self {
            series,
            ema_fast,
            sma_short,
            sma_mid,
            sma_long,
            sma_trend,
            ema_slow,
            vwap,
            atr,
            rsi,
            patterns,
        }
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn bars(&self) -> &[Bar] {
        self.series.bars()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// EMA 9 by default.
    pub fn ema_fast(&self) -> &[f64] {
        &self.ema_fast
    }

    /// SMA 3 by default.
    pub fn sma_short(&self) -> &[f64] {
        &self.sma_short
    }

    /// SMA 21 by default.
    pub fn sma_mid(&self) -> &[f64] {
        &self.sma_mid
    }

    /// SMA 50 by default.
    pub fn sma_long(&self) -> &[f64] {
        &self.sma_long
    }

    /// SMA 200 by default.
    pub fn sma_trend(&self) -> &[f64] {
        &self.sma_trend
    }

    /// EMA 400 by default.
    pub fn ema_slow(&self) -> &[f64] {
        &self.ema_slow
    }

    pub fn vwap(&self) -> &[f64] {
        &self.vwap
    }

    pub fn atr(&self) -> &[f64] {
        &self.atr
    }

    pub fn rsi(&self) -> &[f64] {
        &self.rsi
    }

    pub fn patterns(&self) -> &[CandlePatterns] {
        &self.patterns
    }

    pub fn row(&self, i: usize) -> Option<FrameRow> {
        let bar = self.bars().get(i)?.clone();
        Some(FrameRow {
            ema_fast: defined(self.ema_fast[i]),
            sma_short: defined(self.sma_short[i]),
            sma_mid: defined(self.sma_mid[i]),
            sma_long: defined(self.sma_long[i]),
            sma_trend: defined(self.sma_trend[i]),
            ema_slow: defined(self.ema_slow[i]),
            vwap: defined(self.vwap[i]),
            atr: defined(self.atr[i]),
            rsi: defined(self.rsi[i]),
            body: bar.body(),
            upper_shadow: bar.upper_shadow(),
            lower_shadow: bar.lower_shadow(),
            patterns: self.patterns[i],
            bar,
        })
    }

    pub fn last_row(&self) -> Option<FrameRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }
}

/// `values[i] - values[i-1]`, or `None` when either side is undefined.
pub fn slope_at(values: &[f64], i: usize) -> Option<f64> {
    let prev = *values.get(i.checked_sub(1)?)?;
    defined(*values.get(i)? - prev)
}

/// Value at `i` if defined.
pub fn value_at(values: &[f64], i: usize) -> Option<f64> {
    values.get(i).copied().and_then(defined)
}

#[cfg(test)]
pub(crate) fn frame_from_bars(bars: Vec<Bar>) -> IndicatorFrame {
    use crate::domain::Interval;
    let series = Series::new("EURUSD=X", Interval::M15, bars).unwrap();
    IndicatorFrame::build(series, &IndicatorConfig::default(), &PatternThresholds::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn every_column_matches_bar_count() {
        let closes: Vec<f64> = (0..60).map(|i| 1.10 + i as f64 * 0.0001).collect();
        let frame = frame_from_bars(make_bars(&closes));
        let n = frame.len();
        for col in [
            frame.ema_fast(),
            frame.sma_short(),
            frame.sma_mid(),
            frame.sma_long(),
            frame.sma_trend(),
            frame.ema_slow(),
            frame.vwap(),
            frame.atr(),
            frame.rsi(),
        ] {
            assert_eq!(col.len(), n);
        }
        assert_eq!(frame.patterns().len(), n);
    }

    #[test]
    fn warmup_is_none_in_rows() {
        let closes: Vec<f64> = (0..30).map(|i| 1.10 + i as f64 * 0.0001).collect();
        let frame = frame_from_bars(make_bars(&closes));
        let first = frame.row(0).unwrap();
        assert!(first.ema_fast.is_some(), "EMA is defined from the first bar");
        assert!(first.sma_mid.is_none());
        let last = frame.last_row().unwrap();
        assert!(last.sma_mid.is_some());
        assert!(last.sma_long.is_none(), "30 bars cannot fill SMA 50");
        assert!(frame.row(30).is_none());
    }

    #[test]
    fn slope_needs_both_values() {
        let values = [f64::NAN, 1.0, 1.5];
        assert_eq!(slope_at(&values, 0), None);
        assert_eq!(slope_at(&values, 1), None);
        assert_eq!(slope_at(&values, 2), Some(0.5));
        assert_eq!(slope_at(&values, 3), None);
    }
}
