//! Periodic signal broadcast.
//!
//! A named background thread re-runs the batch for a rotating subset of the
//! universe every `broadcast.interval_secs` and sends each `SignalBatch` down
//! an mpsc channel. Stopping only prevents the next run; a batch already in
//! flight completes and is delivered.

use crate::orchestrator::{Orchestrator, SignalBatch};
use fxsignal_core::domain::Interval;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Granularity of the stop check while waiting for the next tick.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// The `n` symbols due on `tick`, wrapping around the universe.
pub fn rotation(symbols: &[String], tick: usize, n: usize) -> Vec<String> {
    if symbols.is_empty() {
        return Vec::new();
    }
    let n = n.min(symbols.len());
    let start = (tick * n) % symbols.len();
    symbols.iter().cycle().skip(start).take(n).cloned().collect()
}

pub struct Broadcaster {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Broadcaster {
    /// Start broadcasting `interval` signals. The first batch goes out
    /// immediately.
    pub fn spawn(
        orchestrator: Arc<Orchestrator>,
        interval: Interval,
        sender: Sender<SignalBatch>,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("fxsignal-broadcast".into())
            .spawn(move || run(&orchestrator, interval, &sender, &flag))?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Shared flag; setting it ends the loop before the next tick.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the loop to stop and wait for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            // A panicked broadcast thread has nothing left to clean up.
            let _ = handle.join();
        }
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(orchestrator: &Orchestrator, interval: Interval, sender: &Sender<SignalBatch>, stop: &AtomicBool) {
    let cfg = &orchestrator.config().broadcast;
    let symbols = &orchestrator.config().symbols;
    info!(%interval, every_secs = cfg.interval_secs, per_tick = cfg.symbols_per_tick, "broadcast started");

    let mut tick = 0usize;
    while !stop.load(Ordering::Relaxed) {
        let started = Instant::now();
        let subset = rotation(symbols, tick, cfg.symbols_per_tick);
        debug!(tick, symbols = ?subset, "broadcast tick");

        let batch = orchestrator.generate_all(&subset, interval);
        if sender.send(batch).is_err() {
            debug!("broadcast receiver dropped");
            break;
        }
        tick = tick.wrapping_add(1);

        let next = started + cfg.interval();
        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= next {
                break;
            }
            std::thread::sleep(SLEEP_SLICE.min(next - now));
        }
    }
    info!(ticks = tick, "broadcast stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BroadcastConfig, RunnerConfig};
    use crate::test_support::FlakyProvider;
    use std::sync::mpsc;

    fn universe() -> Vec<String> {
        ["A", "B", "C", "D", "E"].map(String::from).to_vec()
    }

    #[test]
    fn rotation_walks_the_universe() {
        let u = universe();
        assert_eq!(rotation(&u, 0, 2), vec!["A", "B"]);
        assert_eq!(rotation(&u, 1, 2), vec!["C", "D"]);
        assert_eq!(rotation(&u, 2, 2), vec!["E", "A"]);
        assert_eq!(rotation(&u, 0, 9), u);
        assert!(rotation(&[], 3, 4).is_empty());
    }

    fn orchestrator() -> Arc<Orchestrator> {
        let config = RunnerConfig {
            symbols: ["EURUSD=X", "GBPUSD=X", "USDJPY=X"].map(String::from).to_vec(),
            max_concurrency: 2,
            broadcast: BroadcastConfig {
                interval_secs: 1,
                symbols_per_tick: 2,
            },
            ..RunnerConfig::default()
        };
        Arc::new(Orchestrator::new(Arc::new(FlakyProvider::healthy(9)), config).unwrap())
    }

    #[test]
    fn first_batch_is_immediate_and_stop_joins() {
        let (tx, rx) = mpsc::channel();
        let broadcaster = Broadcaster::spawn(orchestrator(), Interval::H1, tx).unwrap();
        let batch = rx.recv_timeout(Duration::from_secs(30)).unwrap();
        assert_eq!(batch.scanned, 2);
        assert_eq!(batch.interval, Interval::H1);
        assert!(batch.failures.is_empty());

        let started = Instant::now();
        broadcaster.stop();
        assert!(started.elapsed() < Duration::from_secs(30));
        // The sender went away with the thread.
        while rx.try_recv().is_ok() {}
        assert!(matches!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected)));
    }

    #[test]
    fn dropped_receiver_ends_the_loop() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let broadcaster = Broadcaster::spawn(orchestrator(), Interval::H1, tx).unwrap();
        let deadline = Instant::now() + Duration::from_secs(30);
        while broadcaster.is_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!broadcaster.is_running());
    }

    #[test]
    fn stop_flag_is_shared() {
        let (tx, _rx) = mpsc::channel();
        let broadcaster = Broadcaster::spawn(orchestrator(), Interval::H1, tx).unwrap();
        let flag = broadcaster.stop_flag();
        flag.store(true, Ordering::Relaxed);
        let deadline = Instant::now() + Duration::from_secs(30);
        while broadcaster.is_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!broadcaster.is_running());
    }
}
