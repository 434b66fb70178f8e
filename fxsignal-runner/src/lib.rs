//! FxSignal Runner: multi-timeframe fan-out, signal orchestration, batches
//! and periodic broadcast.
//!
//! This crate builds on `fxsignal-core` to provide:
//! - TOML runner configuration (universe, timeframes, pool size, account)
//! - Parallel per-timeframe analysis with partial-failure absorption
//! - `Orchestrator`: generate_signal, analyze_multi_timeframe, scan, risk
//! - Batch generation across symbols with failure counts
//! - A background broadcaster delivering batches over a channel

pub mod broadcast;
pub mod config;
pub mod orchestrator;
pub mod reconciler;

pub use broadcast::Broadcaster;
pub use config::{AccountConfig, BroadcastConfig, RunnerConfig, TimeframeSpec};
pub use orchestrator::{Orchestrator, RunnerError, SignalBatch, SymbolFailure};
pub use reconciler::reconcile;
