//! Fractional Kelly risk suggestion.

use super::RiskError;
use crate::config::RiskConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellySizing {
    /// Raw `(b·p - q) / b`.
    pub kelly_fraction: f64,
    /// Raw fraction scaled by confidence.
    pub adjusted_kelly: f64,
    /// Fractional Kelly, capped at the maximum.
    pub safe_kelly: f64,
    pub recommended_risk_pct: f64,
    pub recommended_risk_amount: f64,
    pub win_loss_ratio: f64,
}

/// Kelly fraction from a win rate in percent and average win/loss sizes,
/// scaled by `confidence / 100`, then clamped to
/// `[kelly_min_pct, kelly_max_pct]` percent of balance.
pub fn kelly_sizing(
    balance: f64,
    win_rate_pct: f64,
    avg_win: f64,
    avg_loss: f64,
    confidence: f64,
    cfg: &RiskConfig,
) -> Result<KellySizing, RiskError> {
    if !(avg_loss.is_finite() && avg_loss > 0.0) {
        return Err(RiskError::InvalidInput(format!("average loss must be positive, got {avg_loss}")));
    }
    if !(0.0..=100.0).contains(&win_rate_pct) {
        return Err(RiskError::InvalidInput(format!("win rate must be in [0, 100], got {win_rate_pct}")));
    }
    if !(avg_win.is_finite() && avg_win > 0.0) {
        return Err(RiskError::InvalidInput(format!("average win must be positive, got {avg_win}")));
    }

    let p = win_rate_pct / 100.0;
    let q = 1.0 - p;
    let b = avg_win / avg_loss;

    let kelly_fraction = (b * p - q) / b;
    let adjusted_kelly = kelly_fraction * (confidence / 100.0);
    let safe_kelly = (adjusted_kelly * cfg.kelly_fraction).min(cfg.kelly_max_pct / 100.0);
    let recommended_risk_pct = (safe_kelly * 100.0).max(cfg.kelly_min_pct);

    Ok(KellySizing {
        kelly_fraction,
        adjusted_kelly,
        safe_kelly,
        recommended_risk_pct,
        recommended_risk_amount: balance * recommended_risk_pct / 100.0,
        win_loss_ratio: b,
    })
}
