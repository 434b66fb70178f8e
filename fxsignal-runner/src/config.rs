//! Runner configuration, loaded from TOML.
//!
//! Everything the orchestrator needs is in one value passed to its
//! constructor: the engine tuning, the symbol universe, which timeframes to
//! reconcile and how much history each one fetches, the worker-pool bound,
//! the broadcast schedule and the account used for sizing.

use fxsignal_core::config::{ConfigError, EngineConfig};
use fxsignal_core::domain::{Interval, Period};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Default forex universe (Yahoo symbols).
pub const DEFAULT_SYMBOLS: [&str; 8] = [
    "EURUSD=X", "GBPUSD=X", "USDJPY=X", "USDCHF=X", "AUDUSD=X", "USDCAD=X", "NZDUSD=X", "EURJPY=X",
];

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// One timeframe the reconciler analyses and how far back it fetches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSpec {
    pub interval: Interval,
    pub period: Period,
}

impl TimeframeSpec {
    pub fn with_default_period(interval: Interval) -> Self {
        Self {
            interval,
            period: interval.default_period(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub interval_secs: u64,
    /// Symbols re-run on each tick; the subset rotates through the universe.
    pub symbols_per_tick: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            symbols_per_tick: 4,
        }
    }
}

impl BroadcastConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Account figures used when sizing a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub balance: f64,
    /// Percent of balance risked per trade.
    pub risk_pct: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            balance: 10_000.0,
            risk_pct: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub symbols: Vec<String>,
    /// Reconciled timeframes, highest first.
    pub timeframes: Vec<TimeframeSpec>,
    /// History fetched for the signal timeframe.
    pub signal_period: Period,
    /// Fewer bars than this and no signal is attempted.
    pub min_signal_bars: usize,
    /// Worker threads for timeframe and symbol fan-out. Bounded by what the
    /// data provider tolerates.
    pub max_concurrency: usize,
    pub broadcast: BroadcastConfig,
    pub account: AccountConfig,
    pub engine: EngineConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            timeframes: Interval::HIERARCHY
                .iter()
                .map(|&iv| TimeframeSpec::with_default_period(iv))
                .collect(),
            signal_period: Period::Months(3),
            min_signal_bars: 50,
            max_concurrency: 4,
            broadcast: BroadcastConfig::default(),
            account: AccountConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate. Missing sections keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;

        if self.symbols.is_empty() {
            return Err(invalid("symbols", "at least one symbol is required"));
        }
        if self.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("symbols", "symbols must not be blank"));
        }
        if self.timeframes.is_empty() {
            return Err(invalid("timeframes", "at least one timeframe is required"));
        }
        let mut seen = HashSet::new();
        for tf in &self.timeframes {
            if !seen.insert(tf.interval) {
                return Err(invalid("timeframes", format!("{} listed twice", tf.interval)));
            }
        }
        if self.min_signal_bars == 0 {
            return Err(invalid("min_signal_bars", "must be >= 1"));
        }
        if self.max_concurrency == 0 {
            return Err(invalid("max_concurrency", "must be >= 1"));
        }
        if self.broadcast.interval_secs == 0 {
            return Err(invalid("broadcast.interval_secs", "must be >= 1"));
        }
        if self.broadcast.symbols_per_tick == 0 {
            return Err(invalid("broadcast.symbols_per_tick", "must be >= 1"));
        }
        if !(self.account.balance.is_finite() && self.account.balance > 0.0) {
            return Err(invalid("account.balance", "must be > 0"));
        }
        if !(self.account.risk_pct > 0.0 && self.account.risk_pct <= 100.0) {
            return Err(invalid("account.risk_pct", "must be in (0, 100]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_hierarchy() {
        let cfg = RunnerConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.symbols.len(), 8);
        let periods: Vec<String> = cfg.timeframes.iter().map(|t| t.period.to_string()).collect();
        assert_eq!(periods, vec!["2y", "1y", "3mo", "1mo"]);
        assert_eq!(cfg.timeframes[0].interval, Interval::W1);
        assert_eq!(cfg.broadcast.interval(), Duration::from_secs(30));
    }

    #[test]
    fn partial_toml_overrides_only_what_it_names() {
        let cfg = RunnerConfig::from_toml(
            r#"
symbols = ["EURUSD=X", "GBPUSD=X"]
signal_period = "1mo"

[account]
balance = 5000.0

[engine.risk]
min_reward_risk = 3.0
"#,
        )
        .unwrap();
        assert_eq!(cfg.symbols, vec!["EURUSD=X", "GBPUSD=X"]);
        assert_eq!(cfg.signal_period, Period::Months(1));
        assert_eq!(cfg.account.balance, 5000.0);
        assert_eq!(cfg.account.risk_pct, 1.0);
        assert_eq!(cfg.engine.risk.min_reward_risk, 3.0);
        assert_eq!(cfg.engine.risk.setup_ladder, [1.5, 2.5, 4.0]);
        assert_eq!(cfg.timeframes.len(), 4);
    }

    #[test]
    fn timeframes_parse_from_toml() {
        let cfg = RunnerConfig::from_toml(
            r#"
[[timeframes]]
interval = "1d"
period = "6mo"

[[timeframes]]
interval = "1h"
period = "1mo"
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.timeframes,
            vec![
                TimeframeSpec {
                    interval: Interval::D1,
                    period: Period::Months(6)
                },
                TimeframeSpec {
                    interval: Interval::H1,
                    period: Period::Months(1)
                },
            ]
        );
    }

    #[test]
    fn duplicate_timeframe_rejected() {
        let err = RunnerConfig::from_toml(
            r#"
[[timeframes]]
interval = "1h"
period = "1mo"

[[timeframes]]
interval = "1h"
period = "3mo"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeframes"), "{err}");
    }

    #[test]
    fn malformed_engine_values_are_fatal() {
        let err = RunnerConfig::from_toml("[engine.indicators]\nsma_mid = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "indicators.sma_mid", .. }));
    }

    #[test]
    fn unknown_interval_is_a_parse_error() {
        let err = RunnerConfig::from_toml("[[timeframes]]\ninterval = \"4h\"\nperiod = \"1mo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = RunnerConfig::default();
        let text = cfg.to_toml().unwrap();
        assert_eq!(RunnerConfig::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = RunnerConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
