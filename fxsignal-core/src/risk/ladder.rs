//! Staged take-profit ladders.

use super::{ensure_price, RiskError};
use crate::config::RiskConfig;
use crate::domain::Direction;
use serde::{Deserialize, Serialize};

/// Which distance the ladder multiples apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderKind {
    /// Multiples of the setup's |entry - stop| (1.5 / 2.5 / 4.0).
    SetupRisk,
    /// Multiples of ATR (1.5 / 3.0 / 4.5).
    Atr,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitLevel {
    pub price: f64,
    pub multiple: f64,
    /// Percent of the position closed at this level.
    pub weight_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitLadder {
    pub kind: LadderKind,
    pub direction: Direction,
    /// Distance the multiples are applied to.
    pub unit: f64,
    pub levels: [TakeProfitLevel; 3],
}

impl TakeProfitLadder {
    fn build(kind: LadderKind, entry: f64, unit: f64, direction: Direction, multiples: [f64; 3], weights: [f64; 3]) -> Self {
        let level = |k: usize| TakeProfitLevel {
            price: entry + direction.sign() * unit * multiples[k],
            multiple: multiples[k],
            weight_pct: weights[k],
        };
        Self {
            kind,
            direction,
            unit,
            levels: [level(0), level(1), level(2)],
        }
    }

    pub fn prices(&self) -> [f64; 3] {
        [self.levels[0].price, self.levels[1].price, self.levels[2].price]
    }

    /// The level validation measures reward against.
    pub fn tp2(&self) -> f64 {
        self.levels[1].price
    }
}

/// Targets at 1.5x, 2.5x and 4.0x the setup's own stop distance.
pub fn setup_ladder(entry: f64, stop: f64, direction: Direction, cfg: &RiskConfig) -> Result<TakeProfitLadder, RiskError> {
    ensure_price("entry", entry)?;
    ensure_price("stop", stop)?;
    let risk = (entry - stop).abs();
    if risk <= 0.0 {
        return Err(RiskError::InvalidRisk { entry, stop });
    }
    Ok(TakeProfitLadder::build(
        LadderKind::SetupRisk,
        entry,
        risk,
        direction,
        cfg.setup_ladder,
        cfg.exit_weights,
    ))
}

/// Stop and targets derived from volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrPlan {
    pub atr: f64,
    pub stop_loss: f64,
    pub take_profits: TakeProfitLadder,
    /// Reward at the second target over the stop distance.
    pub risk_reward_ratio: f64,
}

/// Stop at `atr_stop_multiple` ATRs, targets at 1.5x, 3.0x and 4.5x ATR.
pub fn atr_plan(entry: f64, atr: f64, direction: Direction, cfg: &RiskConfig) -> Result<AtrPlan, RiskError> {
    ensure_price("entry", entry)?;
    if !(atr.is_finite() && atr > 0.0) {
        return Err(RiskError::InvalidInput(format!("ATR must be positive, got {atr}")));
    }
    let stop_loss = entry - direction.sign() * cfg.atr_stop_multiple * atr;
    let take_profits = TakeProfitLadder::build(LadderKind::Atr, entry, atr, direction, cfg.atr_ladder, cfg.exit_weights);
    let risk = (entry - stop_loss).abs();
    let reward = (take_profits.tp2() - entry).abs();

    Ok(AtrPlan {
        atr,
        stop_loss,
        risk_reward_ratio: reward / risk,
        take_profits,
    })
}
