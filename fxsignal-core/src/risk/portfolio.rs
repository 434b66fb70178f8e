//! Exposure across open positions, drawdown and the daily risk report.

use super::sizing::is_reduced_risk_week;
use crate::config::RiskConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Known pair correlations, looked up in the order written.
const CORRELATIONS: &[(&str, &str, f64)] = &[
    ("EURUSD", "GBPUSD", 0.7),
    ("EURUSD", "AUDUSD", 0.6),
    ("GBPUSD", "AUDUSD", 0.5),
    ("USDCHF", "EURUSD", -0.8),
    ("USDJPY", "USDCHF", 0.4),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub risk_amount: f64,
    #[serde(default)]
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRisk {
    pub risk: f64,
    pub positions: usize,
    /// Share of total risk, in percent.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRisk {
    pub total_risk: f64,
    pub position_count: usize,
    pub correlation_risk: f64,
    pub adjusted_risk: f64,
    pub distribution: BTreeMap<String, SymbolRisk>,
}

/// Correlation of two symbols from the fixed table. Provider suffixes such
/// as `=X` are ignored; unknown or reversed pairs are 0.
pub fn pair_correlation(a: &str, b: &str) -> f64 {
    let a = a.trim_end_matches("=X");
    let b = b.trim_end_matches("=X");
    CORRELATIONS
        .iter()
        .find(|(x, y, _)| *x == a && *y == b)
        .map_or(0.0, |(_, _, rho)| *rho)
}

pub fn portfolio_risk(positions: &[OpenPosition], cfg: &RiskConfig) -> PortfolioRisk {
    let total_risk: f64 = positions.iter().map(|p| p.risk_amount).sum();

    let mut correlation_risk = 0.0;
    for (i, first) in positions.iter().enumerate() {
        for second in &positions[i + 1..] {
            let rho = pair_correlation(&first.symbol, &second.symbol).abs();
            if rho > cfg.correlation_threshold {
                correlation_risk += (first.risk_amount + second.risk_amount) * rho * cfg.correlation_surcharge;
            }
        }
    }

    let mut distribution: BTreeMap<String, SymbolRisk> = BTreeMap::new();
    for p in positions {
        let entry = distribution.entry(p.symbol.clone()).or_insert(SymbolRisk {
            risk: 0.0,
            positions: 0,
            percentage: 0.0,
        });
        entry.risk += p.risk_amount;
        entry.positions += 1;
    }
    if total_risk > 0.0 {
        for s in distribution.values_mut() {
            s.percentage = s.risk / total_risk * 100.0;
        }
    }

    PortfolioRisk {
        total_risk,
        position_count: positions.len(),
        correlation_risk,
        adjusted_risk: total_risk + correlation_risk,
        distribution,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownMetrics {
    /// Most negative drawdown from the running peak, in percent (<= 0).
    pub max_drawdown_pct: f64,
    pub current_drawdown_pct: f64,
    /// Consecutive trailing points below the running peak.
    pub duration: usize,
    /// Last equity over |max drawdown|; 0 without a drawdown.
    pub recovery_factor: f64,
}

pub fn drawdown_metrics(equity: &[f64]) -> DrawdownMetrics {
    if equity.len() < 2 {
        return DrawdownMetrics {
            max_drawdown_pct: 0.0,
            current_drawdown_pct: 0.0,
            duration: 0,
            recovery_factor: 0.0,
        };
    }

    let mut peak = f64::NEG_INFINITY;
    let drawdowns: Vec<f64> = equity
        .iter()
        .map(|&e| {
            peak = peak.max(e);
            // Drawdown is undefined below a positive peak.
            if peak > 0.0 {
                (e - peak) / peak * 100.0
            } else {
                0.0
            }
        })
        .collect();

    let max_drawdown_pct = drawdowns.iter().copied().fold(0.0, f64::min);
    let current_drawdown_pct = drawdowns[drawdowns.len() - 1];
    let duration = drawdowns.iter().rev().take_while(|d| **d < 0.0).count();
    let recovery_factor = if max_drawdown_pct != 0.0 {
        equity[equity.len() - 1] / max_drawdown_pct.abs()
    } else {
        0.0
    };

    DrawdownMetrics {
        max_drawdown_pct,
        current_drawdown_pct,
        duration,
        recovery_factor,
    }
}

const HIGH_DAILY_RISK_PCT: f64 = 1.5;
const LOW_DAILY_RISK_PCT: f64 = 0.5;
const LOW_WIN_RATE_PCT: f64 = 40.0;
const HIGH_WIN_RATE_PCT: f64 = 70.0;
const OVERTRADING_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    ReduceExposure,
    RoomForHighConfidenceSetups,
    ReviewStrategy,
    KeepDiscipline,
    ReducedRiskWeek,
    PauseTrading,
    WaitForQualitySetups,
    WithinLimits,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::ReduceExposure => "daily risk is high, consider reducing exposure",
            Recommendation::RoomForHighConfidenceSetups => {
                "daily risk is low, exposure can grow on high-confidence setups"
            }
            Recommendation::ReviewStrategy => "win rate is low, review the strategy and wait for better setups",
            Recommendation::KeepDiscipline => "strong performance, keep the discipline",
            Recommendation::ReducedRiskWeek => "reduced-risk week active, build capital with smaller risk",
            Recommendation::PauseTrading => "many trades today, consider pausing",
            Recommendation::WaitForQualitySetups => "no trades today, wait for quality setups",
            Recommendation::WithinLimits => "risk within limits",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub generated_at: DateTime<Utc>,
    pub balance: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub daily_pnl_pct: f64,
    pub daily_risk_used: f64,
    pub daily_risk_pct: f64,
    pub max_daily_risk_pct: f64,
    pub risk_remaining: f64,
    pub reduced_risk_week: bool,
    pub trades_today: usize,
    pub winning_trades: usize,
    pub win_rate_pct: f64,
    pub open_positions: usize,
    pub recommendations: Vec<Recommendation>,
}

/// Summary of the day's exposure and results against the daily budget.
pub fn risk_report(
    balance: f64,
    open: &[OpenPosition],
    closed_today: &[ClosedTrade],
    now: DateTime<Utc>,
    cfg: &RiskConfig,
) -> RiskReport {
    let daily_risk_used: f64 = open.iter().map(|p| p.risk_amount).sum();
    let daily_risk_pct = if balance > 0.0 {
        daily_risk_used / balance * 100.0
    } else {
        0.0
    };
    let realized_pnl: f64 = closed_today.iter().map(|t| t.pnl).sum();
    let unrealized_pnl: f64 = open.iter().map(|p| p.unrealized_pnl).sum();
    let daily_pnl_pct = if balance > 0.0 {
        (realized_pnl + unrealized_pnl) / balance * 100.0
    } else {
        0.0
    };

    let trades_today = closed_today.len();
    let winning_trades = closed_today.iter().filter(|t| t.pnl > 0.0).count();
    let win_rate_pct = if trades_today > 0 {
        winning_trades as f64 / trades_today as f64 * 100.0
    } else {
        0.0
    };
    let reduced_risk_week = is_reduced_risk_week(now, cfg);

    let mut recommendations = Vec::new();
    if daily_risk_pct > HIGH_DAILY_RISK_PCT {
        recommendations.push(Recommendation::ReduceExposure);
    } else if daily_risk_pct < LOW_DAILY_RISK_PCT {
        recommendations.push(Recommendation::RoomForHighConfidenceSetups);
    }
    if win_rate_pct < LOW_WIN_RATE_PCT && trades_today >= 3 {
        recommendations.push(Recommendation::ReviewStrategy);
    } else if win_rate_pct > HIGH_WIN_RATE_PCT && trades_today >= 2 {
        recommendations.push(Recommendation::KeepDiscipline);
    }
    if reduced_risk_week {
        recommendations.push(Recommendation::ReducedRiskWeek);
    }
    if trades_today > OVERTRADING_COUNT {
        recommendations.push(Recommendation::PauseTrading);
    } else if trades_today == 0 {
        recommendations.push(Recommendation::WaitForQualitySetups);
    }
    if recommendations.is_empty() {
        recommendations.push(Recommendation::WithinLimits);
    }

    RiskReport {
        generated_at: now,
        balance,
        realized_pnl,
        unrealized_pnl,
        daily_pnl_pct,
        daily_risk_used,
        daily_risk_pct,
        max_daily_risk_pct: cfg.max_daily_risk_pct,
        risk_remaining: balance * cfg.max_daily_risk_pct / 100.0 - daily_risk_used,
        reduced_risk_week,
        trades_today,
        winning_trades,
        win_rate_pct,
        open_positions: open.len(),
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;
    use crate::risk::weekday_mid_month;

    fn pos(symbol: &str, risk: f64) -> OpenPosition {
        OpenPosition {
            symbol: symbol.to_string(),
            risk_amount: risk,
            unrealized_pnl: 0.0,
        }
    }

    #[test]
    fn correlation_lookup_is_ordered() {
        assert_eq!(pair_correlation("EURUSD=X", "GBPUSD=X"), 0.7);
        assert_eq!(pair_correlation("GBPUSD=X", "EURUSD=X"), 0.0);
        assert_eq!(pair_correlation("USDCHF", "EURUSD"), -0.8);
        assert_eq!(pair_correlation("NZDUSD=X", "EURUSD=X"), 0.0);
    }

    #[test]
    fn correlated_pairs_add_surcharge() {
        let cfg = RiskConfig::default();
        let positions = [pos("EURUSD=X", 100.0), pos("GBPUSD=X", 50.0), pos("USDJPY=X", 25.0)];
        let r = portfolio_risk(&positions, &cfg);
        assert_approx(r.total_risk, 175.0, 1e-9);
        // only EURUSD/GBPUSD: 150 * 0.7 * 0.1
        assert_approx(r.correlation_risk, 10.5, 1e-9);
        assert_approx(r.adjusted_risk, 185.5, 1e-9);
        assert_eq!(r.position_count, 3);
    }

    #[test]
    fn threshold_is_strict() {
        // GBPUSD/AUDUSD is exactly 0.5
        let r = portfolio_risk(&[pos("GBPUSD=X", 100.0), pos("AUDUSD=X", 100.0)], &RiskConfig::default());
        assert_eq!(r.correlation_risk, 0.0);
    }

    #[test]
    fn negative_correlation_counts_by_magnitude() {
        let r = portfolio_risk(&[pos("USDCHF=X", 100.0), pos("EURUSD=X", 100.0)], &RiskConfig::default());
        assert_approx(r.correlation_risk, 16.0, 1e-9);
    }

    #[test]
    fn distribution_groups_by_symbol() {
        let r = portfolio_risk(
            &[pos("EURUSD=X", 30.0), pos("EURUSD=X", 30.0), pos("USDJPY=X", 40.0)],
            &RiskConfig::default(),
        );
        let eur = &r.distribution["EURUSD=X"];
        assert_eq!(eur.positions, 2);
        assert_approx(eur.percentage, 60.0, 1e-9);
        assert_approx(r.distribution["USDJPY=X"].percentage, 40.0, 1e-9);
    }

    #[test]
    fn drawdown_from_equity_curve() {
        let m = drawdown_metrics(&[100.0, 110.0, 99.0, 104.5, 108.0]);
        assert_approx(m.max_drawdown_pct, -10.0, 1e-9);
        assert_approx(m.current_drawdown_pct, (108.0 - 110.0) / 110.0 * 100.0, 1e-9);
        assert_eq!(m.duration, 3);
        assert_approx(m.recovery_factor, 10.8, 1e-9);
    }

    #[test]
    fn short_curve_has_no_drawdown() {
        let m = drawdown_metrics(&[100.0]);
        assert_eq!(m.max_drawdown_pct, 0.0);
        assert_eq!(m.duration, 0);
        let flat = drawdown_metrics(&[100.0, 100.0, 101.0]);
        assert_eq!(flat.recovery_factor, 0.0);
    }

    #[test]
    fn non_positive_peak_counts_as_no_drawdown() {
        let m = drawdown_metrics(&[0.0, -5.0, -2.0]);
        assert_eq!(m.max_drawdown_pct, 0.0);
        assert_eq!(m.current_drawdown_pct, 0.0);
        assert_eq!(m.duration, 0);
        assert_eq!(m.recovery_factor, 0.0);

        let recovered = drawdown_metrics(&[0.0, 50.0, 25.0]);
        assert!(recovered.max_drawdown_pct.is_finite());
        assert_approx(recovered.max_drawdown_pct, -50.0, 1e-9);
        assert_eq!(recovered.duration, 1);
    }

    #[test]
    fn report_flags_heavy_losing_day() {
        let open = [pos("EURUSD=X", 120.0), pos("GBPUSD=X", 80.0)];
        let closed = vec![
            ClosedTrade { symbol: "EURUSD=X".into(), pnl: -50.0 },
            ClosedTrade { symbol: "USDJPY=X".into(), pnl: -20.0 },
            ClosedTrade { symbol: "AUDUSD=X".into(), pnl: 30.0 },
        ];
        let report = risk_report(10_000.0, &open, &closed, weekday_mid_month(), &RiskConfig::default());
        assert_approx(report.daily_risk_pct, 2.0, 1e-9);
        assert_approx(report.risk_remaining, 0.0, 1e-9);
        assert_approx(report.win_rate_pct, 100.0 / 3.0, 1e-9);
        assert_eq!(
            report.recommendations,
            vec![Recommendation::ReduceExposure, Recommendation::ReviewStrategy]
        );
    }

    #[test]
    fn quiet_day_in_reduced_week() {
        use chrono::TimeZone;
        let second = Utc.with_ymd_and_hms(2024, 7, 2, 9, 0, 0).unwrap();
        let report = risk_report(10_000.0, &[], &[], second, &RiskConfig::default());
        assert!(report.reduced_risk_week);
        assert_eq!(
            report.recommendations,
            vec![
                Recommendation::RoomForHighConfidenceSetups,
                Recommendation::ReducedRiskWeek,
                Recommendation::WaitForQualitySetups,
            ]
        );
    }
}
