//! Reward:risk and confidence checks on a candidate trade.

use crate::config::RiskConfig;
use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Outcome of validating a candidate. Every reason is collected, not just
/// the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub risk_reward_ratio: f64,
    /// `None` when no confidence was supplied.
    pub confidence_check: Option<bool>,
}

/// Reject when reward:risk against `take_profit` is below the floor or the
/// price risk is zero. Low confidence and a closed market only warn.
pub fn validate_trade_setup(
    entry: f64,
    stop: f64,
    take_profit: f64,
    confidence: Option<f64>,
    now: DateTime<Utc>,
    cfg: &RiskConfig,
) -> RiskValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut risk_reward_ratio = 0.0;

    let risk = (entry - stop).abs();
    if risk > 0.0 {
        risk_reward_ratio = (take_profit - entry).abs() / risk;
        if risk_reward_ratio < cfg.min_reward_risk {
            errors.push(format!(
                "reward:risk {risk_reward_ratio:.2} below minimum {}",
                cfg.min_reward_risk
            ));
        }
    } else {
        errors.push("invalid risk: stop loss equals entry".to_string());
    }

    let confidence_check = confidence.map(|c| {
        let ok = c >= cfg.min_confidence;
        if !ok {
            warnings.push(format!("confidence {c:.1}% below recommended {}%", cfg.min_confidence));
        }
        ok
    });

    if is_weekend(now) {
        warnings.push("forex market closed (weekend)".to_string());
    }

    RiskValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
        risk_reward_ratio,
        confidence_check,
    }
}

pub fn is_weekend(now: DateTime<Utc>) -> bool {
    matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}
