//! Multi-timeframe aggregation.
//!
//! Pure functions over already-computed per-timeframe analyses. Fetching and
//! fan-out live in the runner; this module only decides the bias, the
//! aggregate confidence and the confluences from whatever timeframes are
//! present.

use crate::config::ReconcileConfig;
use crate::domain::{Bias, Interval, Outcome, Trend};
use crate::trend::TimeframeAnalysis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cross-timeframe observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confluence {
    MultiTimeframeUptrend,
    MultiTimeframeDowntrend,
    AlignedAverages,
    ConsistentStrength,
}

impl fmt::Display for Confluence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confluence::MultiTimeframeUptrend => "Multi-timeframe uptrend",
            Confluence::MultiTimeframeDowntrend => "Multi-timeframe downtrend",
            Confluence::AlignedAverages => "Moving averages aligned on multiple timeframes",
            Confluence::ConsistentStrength => "Consistent trend strength across timeframes",
        })
    }
}

/// One configured timeframe and what became of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSlot {
    pub interval: Interval,
    pub outcome: Outcome<TimeframeAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTimeframeAnalysis {
    pub symbol: String,
    pub timeframes: Vec<TimeframeSlot>,
    pub overall_bias: Bias,
    pub confidence: f64,
    pub confluences: Vec<Confluence>,
}

impl MultiTimeframeAnalysis {
    /// Aggregate over the present slots; absent ones are skipped.
    pub fn aggregate(symbol: impl Into<String>, timeframes: Vec<TimeframeSlot>, cfg: &ReconcileConfig) -> Self {
        let present: Vec<&TimeframeAnalysis> = timeframes
            .iter()
            .filter_map(|slot| slot.outcome.present())
            .collect();

        let overall_bias = overall_bias(&present, cfg);
        let confidence = mtf_confidence(&present, cfg);
        let confluences = find_confluences(&present, cfg);

        Self {
            symbol: symbol.into(),
            timeframes,
            overall_bias,
            confidence,
            confluences,
        }
    }

    /// No timeframe data at all: neutral, zero confidence.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::aggregate(symbol, Vec::new(), &ReconcileConfig::default())
    }

    pub fn present(&self) -> impl Iterator<Item = &TimeframeAnalysis> {
        self.timeframes.iter().filter_map(|s| s.outcome.present())
    }

    pub fn get(&self, interval: Interval) -> Option<&TimeframeAnalysis> {
        self.timeframes
            .iter()
            .find(|s| s.interval == interval)
            .and_then(|s| s.outcome.present())
    }
}

/// Strength-scaled hierarchy vote. The denominator is the unscaled weight of
/// every present timeframe.
pub fn overall_bias(present: &[&TimeframeAnalysis], cfg: &ReconcileConfig) -> Bias {
    let mut up = 0.0;
    let mut down = 0.0;
    let mut total = 0.0;

    for tf in present {
        let weight = cfg.weights.weight(tf.interval);
        let scaled = weight * (tf.trend_strength / 100.0);
        match tf.trend {
            Trend::Up => up += scaled,
            Trend::Down => down += scaled,
            Trend::Undetermined => {}
        }
        total += weight;
    }

    if total <= 0.0 {
        return Bias::Neutral;
    }
    if up / total > cfg.bias_threshold {
        Bias::Up
    } else if down / total > cfg.bias_threshold {
        Bias::Down
    } else {
        Bias::Neutral
    }
}

/// Mean of (strength + alignment bonus), capped at 100.
pub fn mtf_confidence(present: &[&TimeframeAnalysis], cfg: &ReconcileConfig) -> f64 {
    if present.is_empty() {
        return 0.0;
    }
    let total: f64 = present
        .iter()
        .map(|tf| {
            let bonus = if tf.ma_alignment.aligned {
                cfg.alignment_bonus
            } else {
                0.0
            };
            tf.trend_strength + bonus
        })
        .sum();
    (total / present.len() as f64).min(100.0)
}

pub fn find_confluences(present: &[&TimeframeAnalysis], cfg: &ReconcileConfig) -> Vec<Confluence> {
    let mut out = Vec::new();
    let count = |pred: &dyn Fn(&TimeframeAnalysis) -> bool| present.iter().filter(|tf| pred(tf)).count();

    if count(&|tf| tf.trend == Trend::Up) >= cfg.trend_confluence_count {
        out.push(Confluence::MultiTimeframeUptrend);
    } else if count(&|tf| tf.trend == Trend::Down) >= cfg.trend_confluence_count {
        out.push(Confluence::MultiTimeframeDowntrend);
    }
    if count(&|tf| tf.ma_alignment.aligned) >= cfg.alignment_confluence_count {
        out.push(Confluence::AlignedAverages);
    }
    if count(&|tf| tf.trend_strength > cfg.strong_trend_threshold) >= cfg.strength_confluence_count {
        out.push(Confluence::ConsistentStrength);
    }
    out
}

#[cfg(test)]
pub(crate) fn timeframe(interval: Interval, trend: Trend, strength: f64, aligned: bool) -> TimeframeAnalysis {
    use crate::trend::{MaAlignment, SupportResistance};
    TimeframeAnalysis {
        interval,
        trend,
        trend_strength: strength,
        support_resistance: SupportResistance::default(),
        ma_alignment: MaAlignment {
            aligned,
            direction: if aligned { trend } else { Trend::Undetermined },
        },
        price_position: None,
    }
}
