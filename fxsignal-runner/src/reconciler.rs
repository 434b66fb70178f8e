//! Multi-timeframe fan-out.
//!
//! Each configured timeframe is fetched and analysed independently on the
//! current rayon pool. An unavailable provider, a failed fetch or an empty
//! series becomes an absent slot with its reason; siblings carry on and
//! aggregation skips the gap.

use crate::config::TimeframeSpec;
use fxsignal_core::config::EngineConfig;
use fxsignal_core::data::DataProvider;
use fxsignal_core::domain::Outcome;
use fxsignal_core::reconcile::{MultiTimeframeAnalysis, TimeframeSlot};
use fxsignal_core::trend::{analyze_timeframe, TimeframeAnalysis};
use fxsignal_core::IndicatorFrame;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Fetch, build the frame and analyse one timeframe.
pub fn timeframe_outcome(
    provider: &dyn DataProvider,
    symbol: &str,
    spec: TimeframeSpec,
    cfg: &EngineConfig,
) -> Outcome<TimeframeAnalysis> {
    if !provider.is_available() {
        warn!(symbol, interval = %spec.interval, provider = provider.name(), "timeframe omitted: provider unavailable");
        return Outcome::absent(format!("{} unavailable", provider.name()));
    }
    let series = match provider.fetch_bars(symbol, spec.period, spec.interval) {
        Ok(series) => series,
        Err(e) => {
            warn!(symbol, interval = %spec.interval, error = %e, "timeframe omitted: fetch failed");
            return Outcome::absent(e.to_string());
        }
    };
    if series.is_empty() {
        warn!(symbol, interval = %spec.interval, "timeframe omitted: no bars");
        return Outcome::absent("no bars");
    }

    let frame = IndicatorFrame::build(series, &cfg.indicators, &cfg.patterns);
    let analysis = analyze_timeframe(&frame, &cfg.trend);
    debug!(
        symbol,
        interval = %spec.interval,
        trend = ?analysis.trend,
        strength = analysis.trend_strength,
        "timeframe analysed"
    );
    Outcome::Present(analysis)
}

/// Analyse every timeframe in parallel and aggregate what came back.
///
/// Runs on whichever rayon pool the caller installed.
pub fn reconcile(
    provider: &dyn DataProvider,
    symbol: &str,
    timeframes: &[TimeframeSpec],
    cfg: &EngineConfig,
) -> MultiTimeframeAnalysis {
    let slots: Vec<TimeframeSlot> = timeframes
        .par_iter()
        .map(|&spec| TimeframeSlot {
            interval: spec.interval,
            outcome: timeframe_outcome(provider, symbol, spec, cfg),
        })
        .collect();
    MultiTimeframeAnalysis::aggregate(symbol, slots, &cfg.reconcile)
}
