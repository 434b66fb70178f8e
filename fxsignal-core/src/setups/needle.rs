//! Needle alignment: one candle pierced by three ordered averages.
//!
//! Bull: EMA9 > SMA21 > SMA50, all three inside [low, high], EMA9 and SMA21
//! rising and SMA50 not falling. Bear is the mirror. The stop sits a fixed
//! offset beyond the nearer of EMA9/SMA21.

use super::{SetupDetector, SetupKind, Trigger};
use crate::config::SetupConfig;
use crate::domain::Direction;
use crate::frame::{slope_at, value_at, IndicatorFrame};

#[derive(Debug, Clone)]
pub struct NeedleAlignment {
    tick: f64,
    stop_offset: f64,
    risk_ceiling: f64,
    min_bars: usize,
    buy_confidence: f64,
    sell_confidence: f64,
}

impl NeedleAlignment {
    pub fn new(cfg: &SetupConfig) -> Self {
        Self {
            tick: cfg.tick,
            stop_offset: cfg.stop_offset,
            risk_ceiling: cfg.needle_risk_ceiling,
            min_bars: cfg.min_bars.needle,
            buy_confidence: cfg.confidence.needle_buy,
            sell_confidence: cfg.confidence.needle_sell,
        }
    }
}

impl SetupDetector for NeedleAlignment {
    fn kind(&self) -> SetupKind {
        SetupKind::NeedleAlignment
    }

    fn min_bars(&self) -> usize {
        self.min_bars
    }

    fn risk_ceiling(&self) -> f64 {
        self.risk_ceiling
    }

    fn confidence(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Buy => self.buy_confidence,
            Direction::Sell => self.sell_confidence,
        }
    }

    fn trigger(&self, frame: &IndicatorFrame, i: usize) -> Option<Trigger> {
        let fast = value_at(frame.ema_fast(), i)?;
        let mid = value_at(frame.sma_mid(), i)?;
        let long = value_at(frame.sma_long(), i)?;
        let bar = &frame.bars()[i];

        if !(bar.contains(fast) && bar.contains(mid) && bar.contains(long)) {
            return None;
        }

        let fast_slope = slope_at(frame.ema_fast(), i)?;
        let mid_slope = slope_at(frame.sma_mid(), i)?;
        let long_slope = slope_at(frame.sma_long(), i)?;

        if fast > mid && mid > long {
            (fast_slope > 0.0 && mid_slope > 0.0 && long_slope >= 0.0).then(|| Trigger {
                direction: Direction::Buy,
                entry: bar.high + self.tick,
                stop: fast.min(mid) - self.stop_offset,
            })
        } else if fast < mid && mid < long {
            (fast_slope < 0.0 && mid_slope < 0.0 && long_slope <= 0.0).then(|| Trigger {
                direction: Direction::Sell,
                entry: bar.low - self.tick,
                stop: fast.max(mid) + self.stop_offset,
            })
        } else {
            None
        }
    }
}
