//! PatternDetector: per-bar candle shape classification.
//!
//! Every pattern except engulfing depends only on the bar itself and the
//! trailing average body. Engulfing compares each bar with its predecessor.

use crate::config::PatternThresholds;
use crate::domain::{Bar, Direction};
use crate::indicators::{defined, rolling_mean};
use serde::{Deserialize, Serialize};

/// Named candle shapes present on one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandlePatterns {
    pub hammer: bool,
    pub shooting_star: bool,
    pub hanging_man: bool,
    pub doji: bool,
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
    pub bullish_marubozu: bool,
    pub bearish_marubozu: bool,
}

impl CandlePatterns {
    /// Hammer, bullish engulfing or bullish marubozu.
    pub fn is_bullish_reversal(&self) -> bool {
        self.hammer || self.bullish_engulfing || self.bullish_marubozu
    }

    /// Shooting star, bearish engulfing or bearish marubozu.
    pub fn is_bearish_reversal(&self) -> bool {
        self.shooting_star || self.bearish_engulfing || self.bearish_marubozu
    }

    /// Whether the bar carries a pattern pointing in `direction`.
    pub fn confirms(&self, direction: Direction) -> bool {
        match direction {
            Direction::Buy => self.is_bullish_reversal(),
            Direction::Sell => self.is_bearish_reversal(),
        }
    }
}

/// Classifies bars with fixed shape ratios.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    thresholds: PatternThresholds,
    average_window: usize,
}

impl PatternDetector {
    pub fn new(thresholds: PatternThresholds, average_window: usize) -> Self {
        assert!(average_window >= 1, "body average window must be >= 1");
        Self {
            thresholds,
            average_window,
        }
    }

    /// One flag set per bar. Bars before the average body is defined never
    /// flag doji or marubozu.
    pub fn detect(&self, bars: &[Bar]) -> Vec<CandlePatterns> {
        let bodies: Vec<f64> = bars.iter().map(Bar::body).collect();
        let avg_body = rolling_mean(&bodies, self.average_window);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                let prev = i.checked_sub(1).map(|p| &bars[p]);
                self.classify(bar, prev, defined(avg_body[i]))
            })
            .collect()
    }

    fn classify(&self, bar: &Bar, prev: Option<&Bar>, avg_body: Option<f64>) -> CandlePatterns {
        let t = &self.thresholds;
        let body = bar.body();
        let upper = bar.upper_shadow();
        let lower = bar.lower_shadow();

        let long_lower = lower >= t.long_shadow_ratio * body && upper <= t.short_shadow_ratio * body;
        let long_upper = upper >= t.long_shadow_ratio * body && lower <= t.short_shadow_ratio * body;

        let marubozu = avg_body.is_some_and(|avg| {
            body >= avg * t.marubozu_body_ratio
                && upper <= body * t.marubozu_shadow_ratio
                && lower <= body * t.marubozu_shadow_ratio
        });

        CandlePatterns {
            hammer: long_lower && body > 0.0,
            shooting_star: long_upper && body > 0.0,
            hanging_man: long_lower && bar.is_bearish(),
            doji: avg_body.is_some_and(|avg| body <= avg * t.doji_body_ratio),
            bullish_engulfing: prev.is_some_and(|p| is_bullish_engulfing(p, bar)),
            bearish_engulfing: prev.is_some_and(|p| is_bearish_engulfing(p, bar)),
            bullish_marubozu: marubozu && bar.is_bullish(),
            bearish_marubozu: marubozu && bar.is_bearish(),
        }
    }
}

/// Bearish bar followed by a bullish bar whose body contains it.
pub fn is_bullish_engulfing(prev: &Bar, curr: &Bar) -> bool {
    prev.is_bearish() && curr.is_bullish() && curr.open < prev.close && curr.close > prev.open
}

/// Bullish bar followed by a bearish bar whose body contains it.
pub fn is_bearish_engulfing(prev: &Bar, curr: &Bar) -> bool {
    prev.is_bullish() && curr.is_bearish() && curr.open > prev.close && curr.close < prev.open
}
