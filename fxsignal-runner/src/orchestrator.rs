//! Signal orchestration.
//!
//! `Orchestrator` owns the provider, the runner config and a private worker
//! pool. It sequences fetch, indicator frame, multi-timeframe reconciliation,
//! setup scan and signal assembly for one symbol, and fans the same pipeline
//! out across a symbol list for batch runs.
//!
//! Nothing here is fatal except building the orchestrator itself: a symbol
//! whose data cannot be fetched yields no signal and is counted as a failure
//! in batch results.

use crate::config::RunnerConfig;
use crate::reconciler::reconcile;
use chrono::{DateTime, Utc};
use fxsignal_core::config::ConfigError;
use fxsignal_core::data::{DataError, DataProvider};
use fxsignal_core::domain::{Direction, Interval, Series};
use fxsignal_core::reconcile::MultiTimeframeAnalysis;
use fxsignal_core::risk::{compute_risk, RiskAssessment, RiskError, RiskRequest};
use fxsignal_core::setups::{SetupReport, SetupScanner};
use fxsignal_core::signal::{build_signal, TradingSignal};
use fxsignal_core::IndicatorFrame;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A symbol that produced no answer at all (as opposed to "no signal").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: String,
}

/// Result of one batch run: partial results plus counts, never all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBatch {
    pub interval: Interval,
    pub generated_at: DateTime<Utc>,
    pub signals: Vec<TradingSignal>,
    pub count: usize,
    /// Symbols scanned, including those without a signal.
    pub scanned: usize,
    pub failures: Vec<SymbolFailure>,
}

pub struct Orchestrator {
    provider: Arc<dyn DataProvider>,
    config: RunnerConfig,
    scanner: SetupScanner,
    pool: rayon::ThreadPool,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn DataProvider>, config: RunnerConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrency)
            .thread_name(|i| format!("fxsignal-worker-{i}"))
            .build()?;
        let scanner = SetupScanner::new(&config.engine.setups);
        Ok(Self {
            provider,
            config,
            scanner,
            pool,
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn DataProvider {
        self.provider.as_ref()
    }

    /// Bias, confidence and confluences across the configured timeframes.
    pub fn analyze_multi_timeframe(&self, symbol: &str) -> MultiTimeframeAnalysis {
        self.pool.install(|| {
            reconcile(
                self.provider.as_ref(),
                symbol,
                &self.config.timeframes,
                &self.config.engine,
            )
        })
    }

    /// Raw results of the five detectors over `series`.
    pub fn scan_setups(&self, series: &Series) -> Vec<SetupReport> {
        let frame = self.frame(series.clone());
        self.scanner.scan(&frame)
    }

    /// Fetch the signal history for `symbol` and scan it.
    pub fn scan_symbol(&self, symbol: &str, interval: Interval) -> Result<Vec<SetupReport>, DataError> {
        let series = self
            .provider
            .fetch_bars(symbol, self.config.signal_period, interval)?;
        Ok(self.scan_setups(&series))
    }

    pub fn compute_risk(&self, request: &RiskRequest) -> Result<RiskAssessment, RiskError> {
        compute_risk(request, Utc::now(), &self.config.engine.risk)
    }

    /// A request for the configured account.
    pub fn risk_request(&self, entry: f64, stop: f64, direction: Direction) -> RiskRequest {
        RiskRequest {
            entry,
            stop,
            direction,
            balance: self.config.account.balance,
            risk_pct: self.config.account.risk_pct,
            reduced_risk: None,
            confidence: None,
        }
    }

    /// `None` when the data is missing or short, or nothing clears the
    /// risk and confidence floors.
    pub fn generate_signal(&self, symbol: &str, interval: Interval) -> Option<TradingSignal> {
        self.generate_signal_at(symbol, interval, Utc::now())
    }

    pub fn generate_signal_at(&self, symbol: &str, interval: Interval, now: DateTime<Utc>) -> Option<TradingSignal> {
        match self.try_signal(symbol, interval, now) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(symbol, %interval, error = %e, "signal skipped: data unavailable");
                None
            }
        }
    }

    fn try_signal(
        &self,
        symbol: &str,
        interval: Interval,
        now: DateTime<Utc>,
    ) -> Result<Option<TradingSignal>, DataError> {
        let series = self
            .provider
            .fetch_bars(symbol, self.config.signal_period, interval)?;
        if series.len() < self.config.min_signal_bars {
            debug!(
                symbol,
                %interval,
                bars = series.len(),
                required = self.config.min_signal_bars,
                "not enough history for a signal"
            );
            return Ok(None);
        }

        let frame = self.frame(series);
        let mtf = self.analyze_multi_timeframe(symbol);
        let reports = self.scanner.scan(&frame);
        let signal = build_signal(&frame, &reports, &mtf, &self.config.engine, now);
        if let Some(s) = &signal {
            debug!(
                symbol,
                %interval,
                direction = %s.direction,
                confidence = s.confidence,
                "signal generated"
            );
        }
        Ok(signal)
    }

    /// Run every symbol on the worker pool and collect what came back.
    pub fn generate_all(&self, symbols: &[String], interval: Interval) -> SignalBatch {
        self.generate_all_at(symbols, interval, Utc::now())
    }

    pub fn generate_all_at(&self, symbols: &[String], interval: Interval, now: DateTime<Utc>) -> SignalBatch {
        let results: Vec<(String, Result<Option<TradingSignal>, DataError>)> = self.pool.install(|| {
            symbols
                .par_iter()
                .map(|symbol| (symbol.clone(), self.try_signal(symbol, interval, now)))
                .collect()
        });

        let mut signals = Vec::new();
        let mut failures = Vec::new();
        for (symbol, result) in results {
            match result {
                Ok(Some(signal)) => signals.push(signal),
                Ok(None) => {}
                Err(e) => {
                    warn!(symbol = %symbol, %interval, error = %e, "symbol skipped: data unavailable");
                    failures.push(SymbolFailure {
                        symbol,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            %interval,
            scanned = symbols.len(),
            signals = signals.len(),
            failures = failures.len(),
            "batch complete"
        );

        SignalBatch {
            interval,
            generated_at: now,
            count: signals.len(),
            scanned: symbols.len(),
            signals,
            failures,
        }
    }

    fn frame(&self, series: Series) -> IndicatorFrame {
        IndicatorFrame::build(series, &self.config.engine.indicators, &self.config.engine.patterns)
    }
}
