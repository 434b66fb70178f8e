//! Position sizing against account balance.

use super::{ensure_price, RiskError};
use crate::config::RiskConfig;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    /// Units of the base currency.
    pub size: f64,
    /// Money lost if the stop is hit.
    pub risk_amount: f64,
    /// Requested risk percent, before any reduction.
    pub risk_pct: f64,
    pub price_risk: f64,
    pub reduced_risk: bool,
}

/// Days 1 through `reduced_risk_last_day` of each month.
pub fn is_reduced_risk_week(now: DateTime<Utc>, cfg: &RiskConfig) -> bool {
    now.day() <= cfg.reduced_risk_last_day
}

/// `risk_amount = balance * pct / 100`, `size = risk_amount / |entry - stop|`,
/// both scaled by the reduced-risk multiplier when `reduced` holds.
pub fn position_size(
    balance: f64,
    entry: f64,
    stop: f64,
    risk_pct: f64,
    reduced: bool,
    cfg: &RiskConfig,
) -> Result<PositionSize, RiskError> {
    ensure_price("entry", entry)?;
    ensure_price("stop", stop)?;
    if !(balance.is_finite() && balance > 0.0) {
        return Err(RiskError::InvalidInput(format!("balance must be positive, got {balance}")));
    }
    if !(risk_pct.is_finite() && risk_pct > 0.0 && risk_pct <= 100.0) {
        return Err(RiskError::InvalidInput(format!("risk percent must be in (0, 100], got {risk_pct}")));
    }

    let price_risk = (entry - stop).abs();
    if price_risk <= 0.0 {
        return Err(RiskError::InvalidRisk { entry, stop });
    }

    let mut risk_amount = balance * risk_pct / 100.0;
    let mut size = risk_amount / price_risk;
    if reduced {
        risk_amount *= cfg.reduced_risk_multiplier;
        size *= cfg.reduced_risk_multiplier;
    }

    Ok(PositionSize {
        size,
        risk_amount,
        risk_pct,
        price_risk,
        reduced_risk: reduced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_three_halves_size_and_risk() {
        let cfg = RiskConfig::default();
        let third = Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap();
        assert!(is_reduced_risk_week(third, &cfg));

        let reduced = position_size(10_000.0, 1.1000, 1.0950, 1.0, is_reduced_risk_week(third, &cfg), &cfg).unwrap();
        let full = position_size(10_000.0, 1.1000, 1.0950, 1.0, false, &cfg).unwrap();
        assert_eq!(reduced.size, full.size * 0.5);
        assert_eq!(reduced.risk_amount, full.risk_amount * 0.5);
        assert!(reduced.reduced_risk);
        assert!(!full.reduced_risk);
    }

    #[test]
    fn week_boundary() {
        let cfg = RiskConfig::default();
        assert!(is_reduced_risk_week(Utc.with_ymd_and_hms(2024, 6, 7, 23, 0, 0).unwrap(), &cfg));
        assert!(!is_reduced_risk_week(Utc.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).unwrap(), &cfg));
    }

    #[test]
    fn sell_side_uses_absolute_distance() {
        let cfg = RiskConfig::default();
        let p = position_size(5_000.0, 1.2500, 1.2550, 2.0, false, &cfg).unwrap();
        assert!((p.price_risk - 0.0050).abs() < 1e-12);
        assert!((p.risk_amount - 100.0).abs() < 1e-9);
        assert!((p.size - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_inputs() {
        let cfg = RiskConfig::default();
        assert!(matches!(
            position_size(10_000.0, 1.1, 1.1, 1.0, false, &cfg),
            Err(RiskError::InvalidRisk { .. })
        ));
        assert!(position_size(0.0, 1.1, 1.09, 1.0, false, &cfg).is_err());
        assert!(position_size(10_000.0, 1.1, 1.09, 0.0, false, &cfg).is_err());
        assert!(position_size(10_000.0, 1.1, 1.09, f64::NAN, false, &cfg).is_err());
    }
}
