//! RiskManager: take-profit ladders, trade validation, position sizing.
//!
//! Two ladder strategies exist side by side: the setup ladder spaces targets
//! by the setup's own stop distance, the ATR plan spaces stop and targets by
//! volatility. They feed different code paths and are never unified.

pub mod kelly;
pub mod ladder;
pub mod portfolio;
pub mod sizing;
pub mod validation;

pub use kelly::{kelly_sizing, KellySizing};
pub use ladder::{atr_plan, setup_ladder, AtrPlan, LadderKind, TakeProfitLadder, TakeProfitLevel};
pub use portfolio::{
    drawdown_metrics, portfolio_risk, risk_report, ClosedTrade, DrawdownMetrics, OpenPosition,
    PortfolioRisk, Recommendation, RiskReport, SymbolRisk,
};
pub use sizing::{is_reduced_risk_week, position_size, PositionSize};
pub use validation::{validate_trade_setup, RiskValidation};

use crate::config::RiskConfig;
use crate::domain::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("invalid risk: entry {entry} and stop {stop} leave no price risk")]
    InvalidRisk { entry: f64, stop: f64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Arguments of a standalone risk computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRequest {
    pub entry: f64,
    pub stop: f64,
    pub direction: Direction,
    pub balance: f64,
    pub risk_pct: f64,
    /// Force the reduced-risk week on or off; `None` derives it from the date.
    #[serde(default)]
    pub reduced_risk: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub position: PositionSize,
    pub take_profits: TakeProfitLadder,
    pub validation: RiskValidation,
}

/// Size, stage and validate one entry/stop pair on the setup ladder.
pub fn compute_risk(req: &RiskRequest, now: DateTime<Utc>, cfg: &RiskConfig) -> Result<RiskAssessment, RiskError> {
    let reduced = req.reduced_risk.unwrap_or_else(|| is_reduced_risk_week(now, cfg));
    let position = position_size(req.balance, req.entry, req.stop, req.risk_pct, reduced, cfg)?;
    let take_profits = setup_ladder(req.entry, req.stop, req.direction, cfg)?;
    let validation = validate_trade_setup(req.entry, req.stop, take_profits.tp2(), req.confidence, now, cfg);

    Ok(RiskAssessment {
        position,
        take_profits,
        validation,
    })
}

pub(crate) fn ensure_price(name: &str, value: f64) -> Result<(), RiskError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RiskError::InvalidInput(format!("{name} must be a positive price, got {value}")))
    }
}

#[cfg(test)]
pub(crate) fn weekday_mid_month() -> DateTime<Utc> {
    use chrono::TimeZone;
    // Wednesday the 15th.
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RiskRequest {
        RiskRequest {
            entry: 1.1000,
            stop: 1.0950,
            direction: Direction::Buy,
            balance: 10_000.0,
            risk_pct: 1.0,
            reduced_risk: None,
            confidence: Some(75.0),
        }
    }

    #[test]
    fn assessment_combines_sizing_ladder_and_validation() {
        let out = compute_risk(&request(), weekday_mid_month(), &RiskConfig::default()).unwrap();
        assert!(!out.position.reduced_risk);
        assert!((out.position.risk_amount - 100.0).abs() < 1e-9);
        assert!((out.position.size - 20_000.0).abs() < 1e-6);
        assert!((out.take_profits.tp2() - 1.1125).abs() < 1e-9);
        assert!(out.validation.valid);
        assert_eq!(out.validation.confidence_check, Some(true));
    }

    #[test]
    fn equal_entry_and_stop_is_invalid_risk() {
        let req = RiskRequest {
            stop: 1.1000,
            ..request()
        };
        let err = compute_risk(&req, weekday_mid_month(), &RiskConfig::default()).unwrap_err();
        assert!(matches!(err, RiskError::InvalidRisk { .. }));
    }

    #[test]
    fn forced_flag_overrides_calendar() {
        let req = RiskRequest {
            reduced_risk: Some(true),
            ..request()
        };
        let out = compute_risk(&req, weekday_mid_month(), &RiskConfig::default()).unwrap();
        assert!(out.position.reduced_risk);
        assert!((out.position.risk_amount - 50.0).abs() < 1e-9);
    }

    #[test]
    fn request_deserializes_with_optional_fields_missing() {
        let req: RiskRequest = serde_json::from_str(
            r#"{"entry": 1.1, "stop": 1.09, "direction": "SELL", "balance": 5000, "risk_pct": 1}"#,
        )
        .unwrap();
        assert_eq!(req.direction, Direction::Sell);
        assert_eq!(req.reduced_risk, None);
        assert_eq!(req.confidence, None);
    }
}
