//! TrendAndLevelAnalyzer: trend label, trend strength and price levels for
//! one timeframe.
//!
//! Trend is a three-vote majority over the most recent bars: strict moving
//! average ordering, swing structure, and the SMA 21 slope. Strength is an
//! additive 0-100 score. Support and resistance are clustered local extrema.

use crate::config::TrendConfig;
use crate::domain::{Bar, Interval, Trend};
use crate::frame::{value_at, IndicatorFrame};
use serde::{Deserialize, Serialize};

/// Clustered price levels, each list ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

/// Strict four-average ordering at the last bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaAlignment {
    pub aligned: bool,
    pub direction: Trend,
}

/// Where the last close sits relative to the averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePosition {
    pub price: f64,
    pub above_ema_fast: bool,
    pub above_sma_mid: bool,
    pub above_sma_long: bool,
    pub above_sma_trend: bool,
    /// (price - average) / price
    pub distance_to_ema_fast: Option<f64>,
    pub distance_to_sma_mid: Option<f64>,
    pub distance_to_vwap: Option<f64>,
}

/// Retracement levels between the highest high and lowest low of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub high: f64,
    pub low: f64,
    pub level_236: f64,
    pub level_382: f64,
    pub level_500: f64,
    pub level_618: f64,
    pub level_786: f64,
}

/// Everything the reconciler records for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAnalysis {
    pub interval: Interval,
    pub trend: Trend,
    pub trend_strength: f64,
    pub support_resistance: SupportResistance,
    pub ma_alignment: MaAlignment,
    pub price_position: Option<PricePosition>,
}

pub fn analyze_timeframe(frame: &IndicatorFrame, cfg: &TrendConfig) -> TimeframeAnalysis {
    TimeframeAnalysis {
        interval: frame.series().interval(),
        trend: identify_trend(frame, cfg),
        trend_strength: trend_strength(frame, cfg),
        support_resistance: support_resistance(frame, cfg),
        ma_alignment: ma_alignment(frame),
        price_position: price_position(frame),
    }
}

/// Majority of the three votes; undetermined below `cfg.min_bars`.
pub fn identify_trend(frame: &IndicatorFrame, cfg: &TrendConfig) -> Trend {
    let n = frame.len();
    if n < cfg.min_bars.max(cfg.window) {
        return Trend::Undetermined;
    }
    let last = n - 1;

    let ordering = ma_alignment(frame).direction;
    let structure = swing_structure(&frame.bars()[n - cfg.window..], cfg.swing_neighbors);
    let slope = match (
        value_at(frame.sma_mid(), last),
        value_at(frame.sma_mid(), n - cfg.slope_span),
    ) {
        (Some(now), Some(then)) if now > then => Trend::Up,
        (Some(now), Some(then)) if now < then => Trend::Down,
        _ => Trend::Undetermined,
    };

    majority(&[ordering, structure, slope])
}

/// Up or down when at least two votes agree.
pub fn majority(votes: &[Trend]) -> Trend {
    let up = votes.iter().filter(|v| **v == Trend::Up).count();
    let down = votes.iter().filter(|v| **v == Trend::Down).count();
    if up >= 2 {
        Trend::Up
    } else if down >= 2 {
        Trend::Down
    } else {
        Trend::Undetermined
    }
}

/// Structure-only trend over the last `window` bars.
pub fn structure_trend(bars: &[Bar], window: usize, neighbors: usize) -> Trend {
    if bars.len() < window {
        return Trend::Undetermined;
    }
    swing_structure(&bars[bars.len() - window..], neighbors)
}

/// Up when the last two swing highs and the last two swing lows both rise,
/// down when both fall.
fn swing_structure(bars: &[Bar], neighbors: usize) -> Trend {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let peaks = local_extrema(&highs, neighbors, |a, b| a > b);
    let troughs = local_extrema(&lows, neighbors, |a, b| a < b);

    match (&peaks[..], &troughs[..]) {
        ([.., h1, h2], [.., l1, l2]) if h2 > h1 && l2 > l1 => Trend::Up,
        ([.., h1, h2], [.., l1, l2]) if h2 < h1 && l2 < l1 => Trend::Down,
        _ => Trend::Undetermined,
    }
}

/// Values that strictly dominate `neighbors` bars on each side.
fn local_extrema(values: &[f64], neighbors: usize, dominates: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let n = values.len();
    if n < 2 * neighbors + 1 {
        return Vec::new();
    }
    (neighbors..n - neighbors)
        .filter(|&i| {
            (1..=neighbors).all(|k| dominates(values[i], values[i - k]) && dominates(values[i], values[i + k]))
        })
        .map(|i| values[i])
        .collect()
}

/// Additive 0-100 strength score.
pub fn trend_strength(frame: &IndicatorFrame, cfg: &TrendConfig) -> f64 {
    let n = frame.len();
    if n < cfg.strength_min_bars || n == 0 {
        return 0.0;
    }
    let last = n - 1;
    let close = frame.bars()[last].close;
    let fast = value_at(frame.ema_fast(), last);
    let mid = value_at(frame.sma_mid(), last);
    let long = value_at(frame.sma_long(), last);

    let mut strength = 0.0;

    if let (Some(f), Some(m), Some(l)) = (fast, mid, long) {
        let spacing = ((f - m).abs() / close + (m - l).abs() / close) / 2.0;
        if let Some((_, points)) = cfg
            .proximity_tiers
            .iter()
            .find(|(limit, _)| spacing < *limit)
        {
            strength += points;
        }
        if (f > m && m > l) || (f < m && m < l) {
            strength += cfg.alignment_points;
        }
    }

    let slopes = [
        mean_recent_slope(frame.ema_fast(), cfg.slope_window),
        mean_recent_slope(frame.sma_mid(), cfg.slope_window),
        mean_recent_slope(frame.sma_long(), cfg.slope_window),
    ];
    if let [Some(a), Some(b), Some(c)] = slopes {
        if (a > 0.0 && b > 0.0 && c > 0.0) || (a < 0.0 && b < 0.0 && c < 0.0) {
            strength += cfg.slope_points;
        }
    }

    if !frame.series().has_volume() {
        strength += cfg.no_volume_points;
    } else if n > cfg.volume_average_window {
        let recent = mean_volume(frame.bars(), cfg.volume_recent_window);
        let average = mean_volume(frame.bars(), cfg.volume_average_window);
        if recent > average * cfg.volume_surge_ratio {
            strength += cfg.volume_surge_points;
        } else if recent > average {
            strength += cfg.volume_rising_points;
        }
    }

    strength.min(100.0)
}

/// Mean of the defined one-bar changes among the last `window` changes.
fn mean_recent_slope(values: &[f64], window: usize) -> Option<f64> {
    let start = values.len().saturating_sub(window).max(1);
    let diffs: Vec<f64> = (start..values.len())
        .map(|i| values[i] - values[i - 1])
        .filter(|d| d.is_finite())
        .collect();
    (!diffs.is_empty()).then(|| diffs.iter().sum::<f64>() / diffs.len() as f64)
}

/// Mean volume of the last `window` bars.
pub fn mean_volume(bars: &[Bar], window: usize) -> f64 {
    let tail = &bars[bars.len().saturating_sub(window)..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().map(|b| b.volume as f64).sum::<f64>() / tail.len() as f64
}

/// Clustered swing highs (resistance) and lows (support) of the last
/// `cfg.level_window` bars. Empty below that many bars.
pub fn support_resistance(frame: &IndicatorFrame, cfg: &TrendConfig) -> SupportResistance {
    let bars = frame.bars();
    if bars.len() < cfg.level_window {
        return SupportResistance::default();
    }
    let recent = &bars[bars.len() - cfg.level_window..];
    let price = recent[recent.len() - 1].close;
    let highs: Vec<f64> = recent.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = recent.iter().map(|b| b.low).collect();

    SupportResistance {
        support: cluster_levels(
            &local_extrema(&lows, cfg.swing_neighbors, |a, b| a < b),
            price,
            cfg.level_cluster_tolerance,
        ),
        resistance: cluster_levels(
            &local_extrema(&highs, cfg.swing_neighbors, |a, b| a > b),
            price,
            cfg.level_cluster_tolerance,
        ),
    }
}

/// Sort ascending, chain together levels whose gap to the previous member is
/// within `tolerance * price`, and average each chain.
pub fn cluster_levels(levels: &[f64], price: f64, tolerance: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = levels.iter().copied().filter(|l| l.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let mut clusters: Vec<Vec<f64>> = Vec::new();
    for level in sorted {
        match clusters.last_mut() {
            Some(cluster)
                if cluster
                    .last()
                    .is_some_and(|prev| (level - prev).abs() / price <= tolerance) =>
            {
                cluster.push(level)
            }
            _ => clusters.push(vec![level]),
        }
    }
    clusters
        .iter()
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect()
}

/// Strict EMA9 > SMA21 > SMA50 > SMA200 (or reversed) at the last bar.
pub fn ma_alignment(frame: &IndicatorFrame) -> MaAlignment {
    let unaligned = MaAlignment {
        aligned: false,
        direction: Trend::Undetermined,
    };
    let Some(last) = frame.len().checked_sub(1) else {
        return unaligned;
    };
    let values = [
        value_at(frame.ema_fast(), last),
        value_at(frame.sma_mid(), last),
        value_at(frame.sma_long(), last),
        value_at(frame.sma_trend(), last),
    ];
    let [Some(a), Some(b), Some(c), Some(d)] = values else {
        return unaligned;
    };
    if a > b && b > c && c > d {
        MaAlignment {
            aligned: true,
            direction: Trend::Up,
        }
    } else if a < b && b < c && c < d {
        MaAlignment {
            aligned: true,
            direction: Trend::Down,
        }
    } else {
        unaligned
    }
}

pub fn price_position(frame: &IndicatorFrame) -> Option<PricePosition> {
    let row = frame.last_row()?;
    let price = row.bar.close;
    let above = |ma: Option<f64>| ma.is_some_and(|v| price > v);
    let distance = |ma: Option<f64>| ma.map(|v| (price - v) / price);

    Some(PricePosition {
        price,
        above_ema_fast: above(row.ema_fast),
        above_sma_mid: above(row.sma_mid),
        above_sma_long: above(row.sma_long),
        above_sma_trend: above(row.sma_trend),
        distance_to_ema_fast: distance(row.ema_fast),
        distance_to_sma_mid: distance(row.sma_mid),
        distance_to_vwap: distance(row.vwap),
    })
}

/// Retracements of the last `lookback` bars; `None` with less history.
pub fn fibonacci_levels(bars: &[Bar], lookback: usize) -> Option<FibonacciLevels> {
    if lookback == 0 || bars.len() < lookback {
        return None;
    }
    let recent = &bars[bars.len() - lookback..];
    let high = recent.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = recent.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let range = high - low;
    let at = |ratio: f64| high - range * ratio;

    Some(FibonacciLevels {
        high,
        low,
        level_236: at(0.236),
        level_382: at(0.382),
        level_500: at(0.5),
        level_618: at(0.618),
        level_786: at(0.786),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::Bar;
    use chrono::{Duration, TimeZone, Utc};

    /// Bars whose high/low hug the close, so swings follow the closes.
    pub fn tight_bars(closes: &[f64], volume: u64) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(base + Duration::hours(i as i64), c, c + 0.0005, c - 0.0005, c, volume))
            .collect()
    }

    /// Linear drift plus a period-4 triangle wave (0, 1, 2, 1) * 0.001.
    pub fn zigzag(start: f64, drift: f64, n: usize) -> Vec<f64> {
        const WAVE: [f64; 4] = [0.0, 1.0, 2.0, 1.0];
        (0..n)
            .map(|i| start + drift * i as f64 + WAVE[i % 4] * 0.001)
            .collect()
    }
}
