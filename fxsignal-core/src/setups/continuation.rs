//! Continuation point: a pullback that touches a rising SMA 21.
//!
//! Fires at bar i when the mid SMA is rising, the bar's low is within the
//! tolerance of it, and every one of the preceding lookback bars closed above
//! it. Entry one tick above the high; stop a fixed offset below the SMA.
//! Always a buy.

use super::{SetupDetector, SetupKind, Trigger};
use crate::config::SetupConfig;
use crate::domain::Direction;
use crate::frame::{slope_at, value_at, IndicatorFrame};

#[derive(Debug, Clone)]
pub struct ContinuationPoint {
    tick: f64,
    stop_offset: f64,
    tolerance: f64,
    lookback: usize,
    risk_ceiling: f64,
    min_bars: usize,
    confidence: f64,
}

impl ContinuationPoint {
    pub fn new(cfg: &SetupConfig) -> Self {
        Self {
            tick: cfg.tick,
            stop_offset: cfg.stop_offset,
            tolerance: cfg.continuation_tolerance,
            lookback: cfg.continuation_lookback,
            risk_ceiling: cfg.structural_risk_ceiling,
            min_bars: cfg.min_bars.continuation,
            confidence: cfg.confidence.continuation,
        }
    }
}

impl SetupDetector for ContinuationPoint {
    fn kind(&self) -> SetupKind {
        SetupKind::ContinuationPoint
    }

    fn min_bars(&self) -> usize {
        self.min_bars
    }

    fn risk_ceiling(&self) -> f64 {
        self.risk_ceiling
    }

    fn confidence(&self, _direction: Direction) -> f64 {
        self.confidence
    }

    fn trigger(&self, frame: &IndicatorFrame, i: usize) -> Option<Trigger> {
        let sma = frame.sma_mid();
        if slope_at(sma, i)? <= 0.0 {
            return None;
        }
        let level = value_at(sma, i)?;
        let bars = frame.bars();
        let bar = &bars[i];

        if (bar.low - level).abs() / bar.close > self.tolerance {
            return None;
        }
        // NaN compares false, so an undefined SMA in the window rejects.
        let held_above = (i.saturating_sub(self.lookback)..i).all(|j| bars[j].close > sma[j]);
        held_above.then(|| Trigger {
            direction: Direction::Buy,
            entry: bar.high + self.tick,
            stop: level - self.stop_offset,
        })
    }
}
