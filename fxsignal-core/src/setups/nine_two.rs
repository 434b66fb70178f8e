//! 9.2: trigger displacement inside a rising EMA.
//!
//! The fast EMA is still rising at bar i but the bar closes below the
//! previous bar's low. Entry one tick above the bar's high, stop at its low.
//! Always a buy.

use super::{SetupDetector, SetupKind, Trigger};
use crate::config::SetupConfig;
use crate::domain::Direction;
use crate::frame::{slope_at, IndicatorFrame};

#[derive(Debug, Clone)]
pub struct NineTwo {
    tick: f64,
    risk_ceiling: f64,
    min_bars: usize,
    confidence: f64,
}

impl NineTwo {
    pub fn new(cfg: &SetupConfig) -> Self {
        Self {
            tick: cfg.tick,
            risk_ceiling: cfg.structural_risk_ceiling,
            min_bars: cfg.min_bars.nine_two,
            confidence: cfg.confidence.nine_two,
        }
    }
}

impl SetupDetector for NineTwo {
    fn kind(&self) -> SetupKind {
        SetupKind::NineTwo
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
        if slope_at(frame.ema_fast(), i)? <= 0.0 {
            return None;
        }
        let bars = frame.bars();
        let (curr, prev) = (&bars[i], &bars[i - 1]);
        (curr.close < prev.low).then(|| Trigger {
            direction: Direction::Buy,
            entry: curr.high + self.tick,
            stop: curr.low,
        })
    }
}
