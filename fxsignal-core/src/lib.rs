//! FxSignal Core: indicators, setups, trend analysis, reconciliation math, risk.
//!
//! This crate is pure computation over price series:
//! - Domain types (bars, series, intervals, directions, outcomes)
//! - IndicatorFrame: every indicator column computed once, then read-only
//! - Candle pattern flags and the five setup detectors
//! - Per-timeframe trend, strength and support/resistance
//! - Multi-timeframe bias, confidence and confluences
//! - Take-profit ladders, trade validation and position sizing
//! - TradingSignal assembly
//!
//! Market data comes in through the `DataProvider` trait; fan-out and
//! scheduling live in `fxsignal-runner`.

pub mod config;
pub mod data;
pub mod domain;
pub mod frame;
pub mod indicators;
pub mod patterns;
pub mod reconcile;
pub mod risk;
pub mod setups;
pub mod signal;
pub mod trend;

pub use config::{ConfigError, EngineConfig};
pub use frame::IndicatorFrame;
pub use reconcile::MultiTimeframeAnalysis;
pub use signal::TradingSignal;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner moves across worker threads
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::Outcome<trend::TimeframeAnalysis>>();
        require_sync::<domain::Outcome<trend::TimeframeAnalysis>>();

        // Analysis types
        require_send::<IndicatorFrame>();
        require_sync::<IndicatorFrame>();
        require_send::<setups::SetupScanner>();
        require_sync::<setups::SetupScanner>();
        require_send::<setups::SetupReport>();
        require_sync::<setups::SetupReport>();
        require_send::<MultiTimeframeAnalysis>();
        require_sync::<MultiTimeframeAnalysis>();
        require_send::<TradingSignal>();
        require_sync::<TradingSignal>();
        require_send::<risk::RiskAssessment>();
        require_sync::<risk::RiskAssessment>();
        require_send::<EngineConfig>();
        require_sync::<EngineConfig>();

        // Providers
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
    }

    /// Architecture contract: detectors only ever see a shared frame.
    ///
    /// `trigger` takes `&IndicatorFrame`; there is no `&mut` path from one
    /// detector into another's view.
    #[test]
    fn detectors_borrow_the_frame_immutably() {
        fn _check_trait_object_builds(
            detector: &dyn setups::SetupDetector,
            frame: &IndicatorFrame,
        ) -> setups::ScanOutcome {
            detector.scan(frame)
        }
    }
}
