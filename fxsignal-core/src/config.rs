//! Engine configuration.
//!
//! One named structure per component so each stage can be tuned and tested
//! in isolation. Every field has a default; a partial TOML/JSON document only
//! overrides what it names.

use crate::domain::Interval;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub patterns: PatternThresholds,
    pub setups: SetupConfig,
    pub trend: TrendConfig,
    pub reconcile: ReconcileConfig,
    pub signal: SignalConfig,
    pub risk: RiskConfig,
}

impl EngineConfig {
    /// Reject values no detector could work with. Malformed configuration is
    /// the only fatal error class in the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;
        self.patterns.validate()?;
        self.setups.validate()?;
        self.trend.validate()?;
        self.reconcile.validate()?;
        self.signal.validate()?;
        self.risk.validate()
    }
}

/// Moving average periods and indicator windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Fast EMA span (9).
    pub ema_fast: usize,
    /// Short SMA window (3).
    pub sma_short: usize,
    /// Mid SMA window (21).
    pub sma_mid: usize,
    /// Long SMA window (50).
    pub sma_long: usize,
    /// Trend SMA window (200).
    pub sma_trend: usize,
    /// Slow EMA span (400).
    pub ema_slow: usize,
    pub atr_period: usize,
    pub rsi_period: usize,
    /// Window of the average candle body used by doji/marubozu.
    pub body_average_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            sma_short: 3,
            sma_mid: 21,
            sma_long: 50,
            sma_trend: 200,
            ema_slow: 400,
            atr_period: 14,
            rsi_period: 14,
            body_average_window: 20,
        }
    }
}

impl IndicatorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("indicators.ema_fast", self.ema_fast),
            ("indicators.sma_short", self.sma_short),
            ("indicators.sma_mid", self.sma_mid),
            ("indicators.sma_long", self.sma_long),
            ("indicators.sma_trend", self.sma_trend),
            ("indicators.ema_slow", self.ema_slow),
            ("indicators.atr_period", self.atr_period),
            ("indicators.rsi_period", self.rsi_period),
            ("indicators.body_average_window", self.body_average_window),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(invalid(field, "period must be >= 1"));
            }
        }
        Ok(())
    }
}

/// Candle shape ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternThresholds {
    /// Dominant shadow must be at least this multiple of the body (2.5).
    pub long_shadow_ratio: f64,
    /// Opposite shadow may be at most this fraction of the body (0.1).
    pub short_shadow_ratio: f64,
    /// Doji body ceiling as a fraction of the average body (0.1).
    pub doji_body_ratio: f64,
    /// Marubozu body floor as a multiple of the average body (1.5).
    pub marubozu_body_ratio: f64,
    /// Marubozu shadow ceiling as a fraction of the body (0.1).
    pub marubozu_shadow_ratio: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            long_shadow_ratio: 2.5,
            short_shadow_ratio: 0.1,
            doji_body_ratio: 0.1,
            marubozu_body_ratio: 1.5,
            marubozu_shadow_ratio: 0.1,
        }
    }
}

impl PatternThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            ("patterns.long_shadow_ratio", self.long_shadow_ratio),
            ("patterns.short_shadow_ratio", self.short_shadow_ratio),
            ("patterns.doji_body_ratio", self.doji_body_ratio),
            ("patterns.marubozu_body_ratio", self.marubozu_body_ratio),
            ("patterns.marubozu_shadow_ratio", self.marubozu_shadow_ratio),
        ];
        for (field, value) in ratios {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("ratio must be finite and >= 0, got {value}")));
            }
        }
        Ok(())
    }
}

/// Setup detector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Entry offset beyond the trigger bar's extreme (one pip).
    pub tick: f64,
    /// Stop offset beyond a moving average.
    pub stop_offset: f64,
    /// Risk ceiling for 9.1, 9.2 and continuation point.
    pub structural_risk_ceiling: f64,
    /// Risk ceiling for needle alignment.
    pub needle_risk_ceiling: f64,
    /// Maximum |low - SMA21| / close for a continuation touch.
    pub continuation_tolerance: f64,
    /// Bars before the touch that must close above SMA21.
    pub continuation_lookback: usize,
    pub min_bars: SetupMinBars,
    pub confidence: SetupConfidence,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            tick: 0.0001,
            stop_offset: 0.0002,
            structural_risk_ceiling: 0.02,
            needle_risk_ceiling: 0.025,
            continuation_tolerance: 0.001,
            continuation_lookback: 5,
            min_bars: SetupMinBars::default(),
            confidence: SetupConfidence::default(),
        }
    }
}

impl SetupConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick.is_finite() && self.tick >= 0.0) {
            return Err(invalid("setups.tick", "must be finite and >= 0"));
        }
        if !(self.stop_offset.is_finite() && self.stop_offset >= 0.0) {
            return Err(invalid("setups.stop_offset", "must be finite and >= 0"));
        }
        for (field, ceiling) in [
            ("setups.structural_risk_ceiling", self.structural_risk_ceiling),
            ("setups.needle_risk_ceiling", self.needle_risk_ceiling),
        ] {
            if !(ceiling > 0.0 && ceiling < 1.0) {
                return Err(invalid(field, format!("ceiling must be in (0, 1), got {ceiling}")));
            }
        }
        if !(self.continuation_tolerance > 0.0 && self.continuation_tolerance < 1.0) {
            return Err(invalid("setups.continuation_tolerance", "must be in (0, 1)"));
        }
        if self.continuation_lookback == 0 {
            return Err(invalid("setups.continuation_lookback", "must be >= 1"));
        }
        Ok(())
    }
}

/// Minimum history per detector; below it the detector reports insufficient data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupMinBars {
    pub nine_one: usize,
    pub nine_two: usize,
    pub continuation: usize,
    pub needle: usize,
}

impl Default for SetupMinBars {
    fn default() -> Self {
        Self {
            nine_one: 10,
            nine_two: 10,
            continuation: 25,
            needle: 55,
        }
    }
}

/// Fixed base confidence per setup kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfidence {
    pub nine_one: f64,
    pub nine_two: f64,
    pub continuation: f64,
    pub needle_buy: f64,
    pub needle_sell: f64,
}

impl Default for SetupConfidence {
    fn default() -> Self {
        Self {
            nine_one: 75.0,
            nine_two: 70.0,
            continuation: 80.0,
            needle_buy: 85.0,
            needle_sell: 80.0,
        }
    }
}

/// Trend, strength and level analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// History needed before a trend vote is attempted.
    pub min_bars: usize,
    /// Recent bars examined by the votes.
    pub window: usize,
    /// Strict neighbors on each side of a swing high/low.
    pub swing_neighbors: usize,
    /// SMA21 slope is measured over this many bars.
    pub slope_span: usize,
    /// History needed before strength is scored.
    pub strength_min_bars: usize,
    /// (max average MA spacing / close, points), tightest first.
    pub proximity_tiers: Vec<(f64, f64)>,
    pub alignment_points: f64,
    pub slope_points: f64,
    /// Bars averaged for the slope agreement score.
    pub slope_window: usize,
    pub volume_recent_window: usize,
    pub volume_average_window: usize,
    pub volume_surge_ratio: f64,
    pub volume_surge_points: f64,
    pub volume_rising_points: f64,
    pub no_volume_points: f64,
    /// Bars scanned for support and resistance.
    pub level_window: usize,
    /// Adjacent levels within this fraction of price merge into one.
    pub level_cluster_tolerance: f64,
    pub fibonacci_lookback: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_bars: 50,
            window: 20,
            swing_neighbors: 2,
            slope_span: 5,
            strength_min_bars: 20,
            proximity_tiers: vec![(0.001, 25.0), (0.005, 15.0), (0.01, 10.0)],
            alignment_points: 25.0,
            slope_points: 25.0,
            slope_window: 5,
            volume_recent_window: 5,
            volume_average_window: 20,
            volume_surge_ratio: 1.2,
            volume_surge_points: 25.0,
            volume_rising_points: 15.0,
            no_volume_points: 10.0,
            level_window: 50,
            level_cluster_tolerance: 0.002,
            fibonacci_lookback: 50,
        }
    }
}

impl TrendConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window < 2 * self.swing_neighbors + 1 {
            return Err(invalid(
                "trend.window",
                "must hold at least one swing point with its neighbors",
            ));
        }
        if self.slope_span == 0 || self.slope_span > self.window {
            return Err(invalid("trend.slope_span", "must be in 1..=window"));
        }
        if self.slope_window == 0 || self.volume_recent_window == 0 || self.volume_average_window == 0 {
            return Err(invalid("trend.volume_*_window", "windows must be >= 1"));
        }
        if self.level_window == 0 || self.fibonacci_lookback == 0 {
            return Err(invalid("trend.level_window", "windows must be >= 1"));
        }
        if !(self.level_cluster_tolerance >= 0.0 && self.level_cluster_tolerance.is_finite()) {
            return Err(invalid("trend.level_cluster_tolerance", "must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Hierarchy weight per timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyWeights {
    pub weekly: f64,
    pub daily: f64,
    pub hourly: f64,
    pub quarter_hour: f64,
}

impl Default for HierarchyWeights {
    fn default() -> Self {
        Self {
            weekly: Interval::W1.default_weight(),
            daily: Interval::D1.default_weight(),
            hourly: Interval::H1.default_weight(),
            quarter_hour: Interval::M15.default_weight(),
        }
    }
}

impl HierarchyWeights {
    pub fn weight(&self, interval: Interval) -> f64 {
        match interval {
            Interval::W1 => self.weekly,
            Interval::D1 => self.daily,
            Interval::H1 => self.hourly,
            Interval::M15 => self.quarter_hour,
        }
    }
}

/// Multi-timeframe aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub weights: HierarchyWeights,
    /// Share of total weight a direction needs to become the bias.
    pub bias_threshold: f64,
    /// Confidence bonus for a timeframe with aligned moving averages.
    pub alignment_bonus: f64,
    pub trend_confluence_count: usize,
    pub alignment_confluence_count: usize,
    pub strength_confluence_count: usize,
    /// Strength above which a timeframe counts as strong.
    pub strong_trend_threshold: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            weights: HierarchyWeights::default(),
            bias_threshold: 0.6,
            alignment_bonus: 10.0,
            trend_confluence_count: 3,
            alignment_confluence_count: 2,
            strength_confluence_count: 2,
            strong_trend_threshold: 70.0,
        }
    }
}

impl ReconcileConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        let all = [w.weekly, w.daily, w.hourly, w.quarter_hour];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid("reconcile.weights", "weights must be finite and >= 0"));
        }
        if all.iter().sum::<f64>() <= 0.0 {
            return Err(invalid("reconcile.weights", "weights must not sum to zero"));
        }
        if !(self.bias_threshold > 0.0 && self.bias_threshold <= 1.0) {
            return Err(invalid("reconcile.bias_threshold", "must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Signal selection and the general (no-setup) path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Setup confidence share of the combined score.
    pub setup_weight: f64,
    /// MTF confidence share of the combined score on the setup path.
    pub setup_mtf_weight: f64,
    pub general_weight: f64,
    pub general_mtf_weight: f64,
    /// Combined confidence floor for the general path.
    pub min_confidence: f64,
    /// Conditions out of five that must agree on the general path.
    pub general_votes: usize,
    pub ma_confluence_points: f64,
    pub pattern_points: f64,
    pub structure_points: f64,
    pub proximity_points: f64,
    pub volume_points: f64,
    /// |EMA9 - SMA21| / close below this earns the proximity points.
    pub proximity_threshold: f64,
    pub volume_spike_ratio: f64,
    pub volume_window: usize,
    /// Bars used for the structure-only trend in the analysis trail.
    pub structure_window: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            setup_weight: 0.7,
            setup_mtf_weight: 0.3,
            general_weight: 0.6,
            general_mtf_weight: 0.4,
            min_confidence: 60.0,
            general_votes: 3,
            ma_confluence_points: 30.0,
            pattern_points: 25.0,
            structure_points: 20.0,
            proximity_points: 15.0,
            volume_points: 10.0,
            proximity_threshold: 0.002,
            volume_spike_ratio: 1.2,
            volume_window: 20,
            structure_window: 20,
        }
    }
}

impl SignalConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("signal.setup_weight", self.setup_weight),
            ("signal.setup_mtf_weight", self.setup_mtf_weight),
            ("signal.general_weight", self.general_weight),
            ("signal.general_mtf_weight", self.general_mtf_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("blend weight must be in [0, 1], got {value}")));
            }
        }
        if self.general_votes == 0 || self.general_votes > 5 {
            return Err(invalid("signal.general_votes", "must be in 1..=5"));
        }
        if self.volume_window == 0 || self.structure_window == 0 {
            return Err(invalid("signal.volume_window", "windows must be >= 1"));
        }
        Ok(())
    }
}

/// Take-profit ladders, validation floors, sizing and Kelly limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub min_reward_risk: f64,
    pub min_confidence: f64,
    /// Take-profit multiples of the setup's own |entry - stop|.
    pub setup_ladder: [f64; 3],
    /// Take-profit multiples of ATR on the general path.
    pub atr_ladder: [f64; 3],
    /// Stop distance in ATRs on the general path.
    pub atr_stop_multiple: f64,
    /// Share of the position closed at each take-profit, in percent.
    pub exit_weights: [f64; 3],
    /// Days of month 1..=N are the reduced-risk week.
    pub reduced_risk_last_day: u32,
    pub reduced_risk_multiplier: f64,
    pub kelly_fraction: f64,
    pub kelly_min_pct: f64,
    pub kelly_max_pct: f64,
    /// |correlation| above which a pair adds a surcharge.
    pub correlation_threshold: f64,
    pub correlation_surcharge: f64,
    /// Daily risk budget in percent of balance.
    pub max_daily_risk_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_reward_risk: 2.0,
            min_confidence: 60.0,
            setup_ladder: [1.5, 2.5, 4.0],
            atr_ladder: [1.5, 3.0, 4.5],
            atr_stop_multiple: 2.0,
            exit_weights: [30.0, 40.0, 30.0],
            reduced_risk_last_day: 7,
            reduced_risk_multiplier: 0.5,
            kelly_fraction: 0.25,
            kelly_min_pct: 0.5,
            kelly_max_pct: 2.0,
            correlation_threshold: 0.5,
            correlation_surcharge: 0.1,
            max_daily_risk_pct: 2.0,
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_reward_risk.is_finite() && self.min_reward_risk > 0.0) {
            return Err(invalid("risk.min_reward_risk", "must be > 0"));
        }
        for (field, ladder) in [("risk.setup_ladder", self.setup_ladder), ("risk.atr_ladder", self.atr_ladder)] {
            if ladder.iter().any(|m| !(m.is_finite() && *m > 0.0)) {
                return Err(invalid(field, "multiples must be > 0"));
            }
            if !ladder.windows(2).all(|w| w[0] < w[1]) {
                return Err(invalid(field, "multiples must increase"));
            }
        }
        if !(self.atr_stop_multiple.is_finite() && self.atr_stop_multiple > 0.0) {
            return Err(invalid("risk.atr_stop_multiple", "must be > 0"));
        }
        if (self.exit_weights.iter().sum::<f64>() - 100.0).abs() > 1e-9 {
            return Err(invalid("risk.exit_weights", "must sum to 100"));
        }
        if !(0.0..=1.0).contains(&self.reduced_risk_multiplier) {
            return Err(invalid("risk.reduced_risk_multiplier", "must be in [0, 1]"));
        }
        if !(self.kelly_min_pct > 0.0 && self.kelly_min_pct <= self.kelly_max_pct) {
            return Err(invalid("risk.kelly_min_pct", "must be > 0 and <= kelly_max_pct"));
        }
        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            return Err(invalid("risk.kelly_fraction", "must be in (0, 1]"));
        }
        Ok(())
    }
}
