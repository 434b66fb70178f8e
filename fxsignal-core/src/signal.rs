//! TradingSignal assembly.
//!
//! The best named setup wins when one fired: its entry and stop are staged on
//! the setup ladder and must pass risk validation. Otherwise a five-condition
//! majority vote over the last bar may still produce a signal, staged on the
//! ATR plan.

use crate::config::{EngineConfig, SignalConfig};
use crate::domain::{Bias, Direction, Interval, Trend};
use crate::frame::{FrameRow, IndicatorFrame};
use crate::patterns::CandlePatterns;
use crate::reconcile::{Confluence, MultiTimeframeAnalysis};
use crate::risk::{atr_plan, setup_ladder, validate_trade_setup, RiskValidation, TakeProfitLadder};
use crate::setups::{best_setup, SetupReport, SetupSignal};
use crate::trend::{fibonacci_levels, mean_volume, structure_trend, FibonacciLevels};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where the entry and stop came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalSource {
    Setup { setup: SetupSignal },
    General { votes: usize, signal_confidence: f64, atr: f64 },
}

/// Moving averages at the signal bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaSnapshot {
    pub ema_fast: Option<f64>,
    pub sma_mid: Option<f64>,
    pub sma_long: Option<f64>,
    pub sma_trend: Option<f64>,
}

impl MaSnapshot {
    fn of(row: &FrameRow) -> Self {
        Self {
            ema_fast: row.ema_fast,
            sma_mid: row.sma_mid,
            sma_long: row.sma_long,
            sma_trend: row.sma_trend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalAnalysis {
    pub source: SignalSource,
    pub ladder: TakeProfitLadder,
    pub mtf: MultiTimeframeAnalysis,
    pub structure_trend: Trend,
    pub averages: MaSnapshot,
    pub patterns: CandlePatterns,
    pub fibonacci: Option<FibonacciLevels>,
    /// Present on the setup path only.
    pub risk_validation: Option<RiskValidation>,
    pub confluences: Vec<Confluence>,
}

/// A risk-checked trade recommendation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub symbol: String,
    pub timeframe: Interval,
    pub direction: Direction,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profits: [f64; 3],
    pub risk_reward_ratio: f64,
    /// Bar the entry refers to.
    pub trigger_time: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub analysis: SignalAnalysis,
}

impl TradingSignal {
    /// Stable identity of the trade idea: the same setup on the same bar
    /// hashes the same on every run, whatever the generation time.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        hasher.update(self.timeframe.as_str().as_bytes());
        hasher.update(self.direction.as_str().as_bytes());
        hasher.update(&self.entry_price.to_le_bytes());
        hasher.update(&self.stop_loss.to_le_bytes());
        hasher.update(&self.trigger_time.timestamp().to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Setup path first, general path as fallback. `None` when neither clears
/// its floors.
pub fn build_signal(
    frame: &IndicatorFrame,
    reports: &[SetupReport],
    mtf: &MultiTimeframeAnalysis,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<TradingSignal> {
    match best_setup(reports) {
        Some(setup) => setup_signal(frame, setup, mtf, cfg, now),
        None => general_signal(frame, mtf, cfg, now),
    }
}

pub fn setup_signal(
    frame: &IndicatorFrame,
    setup: &SetupSignal,
    mtf: &MultiTimeframeAnalysis,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<TradingSignal> {
    let symbol = frame.series().symbol();
    let row = frame.last_row()?;

    let ladder = match setup_ladder(setup.entry_price, setup.stop_loss, setup.direction, &cfg.risk) {
        Ok(ladder) => ladder,
        Err(e) => {
            warn!(symbol, setup = %setup.kind, error = %e, "setup rejected");
            return None;
        }
    };

    let confidence = cfg.signal.setup_weight * setup.confidence + cfg.signal.setup_mtf_weight * mtf.confidence;
    let validation = validate_trade_setup(
        setup.entry_price,
        setup.stop_loss,
        ladder.tp2(),
        Some(confidence),
        now,
        &cfg.risk,
    );
    if !validation.valid {
        warn!(symbol, setup = %setup.kind, errors = ?validation.errors, "setup failed risk validation");
        return None;
    }

    Some(TradingSignal {
        symbol: symbol.to_string(),
        timeframe: frame.series().interval(),
        direction: setup.direction,
        confidence,
        entry_price: setup.entry_price,
        stop_loss: setup.stop_loss,
        take_profits: ladder.prices(),
        risk_reward_ratio: validation.risk_reward_ratio,
        trigger_time: setup.timestamp,
        generated_at: now,
        analysis: SignalAnalysis {
            source: SignalSource::Setup { setup: setup.clone() },
            ladder,
            mtf: mtf.clone(),
            structure_trend: structure_trend(frame.bars(), cfg.signal.structure_window, cfg.trend.swing_neighbors),
            averages: MaSnapshot::of(&row),
            patterns: row.patterns,
            fibonacci: fibonacci_levels(frame.bars(), cfg.trend.fibonacci_lookback),
            risk_validation: Some(validation),
            confluences: mtf.confluences.clone(),
        },
    })
}

/// Majority vote on the last bar, blended with MTF confidence and staged on
/// the ATR plan.
pub fn general_signal(
    frame: &IndicatorFrame,
    mtf: &MultiTimeframeAnalysis,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<TradingSignal> {
    let symbol = frame.series().symbol();
    let row = frame.last_row()?;
    let (direction, votes) = general_direction(&row, mtf.overall_bias, &cfg.signal)?;

    let signal_confidence = signal_confidence(frame, direction, cfg);
    let confidence = cfg.signal.general_weight * signal_confidence + cfg.signal.general_mtf_weight * mtf.confidence;
    if confidence < cfg.signal.min_confidence {
        debug!(symbol, %direction, confidence, "general signal below confidence floor");
        return None;
    }

    let entry = row.bar.close;
    let plan = match row.atr.map(|atr| atr_plan(entry, atr, direction, &cfg.risk)) {
        Some(Ok(plan)) => plan,
        _ => {
            debug!(symbol, "no ATR risk plan for general signal");
            return None;
        }
    };

    Some(TradingSignal {
        symbol: symbol.to_string(),
        timeframe: frame.series().interval(),
        direction,
        confidence,
        entry_price: entry,
        stop_loss: plan.stop_loss,
        take_profits: plan.take_profits.prices(),
        risk_reward_ratio: plan.risk_reward_ratio,
        trigger_time: row.bar.timestamp,
        generated_at: now,
        analysis: SignalAnalysis {
            source: SignalSource::General {
                votes,
                signal_confidence,
                atr: plan.atr,
            },
            ladder: plan.take_profits,
            mtf: mtf.clone(),
            structure_trend: structure_trend(frame.bars(), cfg.signal.structure_window, cfg.trend.swing_neighbors),
            averages: MaSnapshot::of(&row),
            patterns: row.patterns,
            fibonacci: fibonacci_levels(frame.bars(), cfg.trend.fibonacci_lookback),
            risk_validation: None,
            confluences: mtf.confluences.clone(),
        },
    })
}

/// Buy is checked before sell. Undefined averages never vote.
pub fn general_direction(row: &FrameRow, bias: Bias, cfg: &SignalConfig) -> Option<(Direction, usize)> {
    let close = Some(row.bar.close);
    [Direction::Buy, Direction::Sell].into_iter().find_map(|direction| {
        let votes = [
            beyond(close, row.ema_fast, direction),
            beyond(row.ema_fast, row.sma_mid, direction),
            beyond(row.sma_mid, row.sma_long, direction),
            row.patterns.confirms(direction),
            bias.permits(direction),
        ]
        .into_iter()
        .filter(|v| *v)
        .count();
        (votes >= cfg.general_votes).then_some((direction, votes))
    })
}

/// Additive 0-100 confluence score of the last bar for `direction`.
pub fn signal_confidence(frame: &IndicatorFrame, direction: Direction, cfg: &EngineConfig) -> f64 {
    let s = &cfg.signal;
    let Some(row) = frame.last_row() else {
        return 0.0;
    };
    let mut score = 0.0;

    let close = Some(row.bar.close);
    if beyond(close, row.ema_fast, direction)
        && beyond(row.ema_fast, row.sma_mid, direction)
        && beyond(row.sma_mid, row.sma_long, direction)
    {
        score += s.ma_confluence_points;
    }

    if row.patterns.confirms(direction) {
        score += s.pattern_points;
    }

    let structure = structure_trend(frame.bars(), s.structure_window, cfg.trend.swing_neighbors);
    if structure.direction() == Some(direction) {
        score += s.structure_points;
    }

    if let (Some(ema), Some(sma)) = (row.ema_fast, row.sma_mid) {
        if (ema - sma).abs() / row.bar.close < s.proximity_threshold {
            score += s.proximity_points;
        }
    }

    let bars = frame.bars();
    if bars.len() > s.volume_window {
        let average = mean_volume(bars, s.volume_window);
        if row.bar.volume as f64 > average * s.volume_spike_ratio {
            score += s.volume_points;
        }
    }

    score.min(100.0)
}

/// `a` is strictly past `b` in the trade's favor: above for buys, below for
/// sells.
fn beyond(a: Option<f64>, b: Option<f64>, direction: Direction) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            Direction::Buy => a > b,
            Direction::Sell => a < b,
        },
        _ => false,
    }
}
