//! 9.1: the fast EMA turns.
//!
//! Buy when the EMA slope flips from negative to positive between bar i-1 and
//! bar i; sell on the opposite flip. Entry one tick beyond the turning bar's
//! extreme, stop at its other extreme.

use super::{SetupDetector, SetupKind, Trigger};
use crate::config::SetupConfig;
use crate::domain::Direction;
use crate::frame::{slope_at, IndicatorFrame};

#[derive(Debug, Clone)]
pub struct NineOne {
    side: Direction,
    tick: f64,
    risk_ceiling: f64,
    min_bars: usize,
    confidence: f64,
}

impl NineOne {
    pub fn buy(cfg: &SetupConfig) -> Self {
        Self::with_side(Direction::Buy, cfg)
    }

    pub fn sell(cfg: &SetupConfig) -> Self {
        Self::with_side(Direction::Sell, cfg)
    }

    fn with_side(side: Direction, cfg: &SetupConfig) -> Self {
        Self {
            side,
            tick: cfg.tick,
            risk_ceiling: cfg.structural_risk_ceiling,
            min_bars: cfg.min_bars.nine_one,
            confidence: cfg.confidence.nine_one,
        }
    }
}

impl SetupDetector for NineOne {
    fn kind(&self) -> SetupKind {
        match self.side {
            Direction::Buy => SetupKind::NineOneBuy,
            Direction::Sell => SetupKind::NineOneSell,
        }
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
        let prev = slope_at(frame.ema_fast(), i - 1)?;
        let curr = slope_at(frame.ema_fast(), i)?;
        let bar = &frame.bars()[i];

        match self.side {
            Direction::Buy if prev < 0.0 && curr > 0.0 => Some(Trigger {
                direction: Direction::Buy,
                entry: bar.high + self.tick,
                stop: bar.low,
            }),
            Direction::Sell if prev > 0.0 && curr < 0.0 => Some(Trigger {
                direction: Direction::Sell,
                entry: bar.low - self.tick,
                stop: bar.high,
            }),
            _ => None,
        }
    }
}
