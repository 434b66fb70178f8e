//! Criterion benchmarks for the signal hot paths.
//!
//! Benchmarks:
//! 1. IndicatorFrame build (every column over one series)
//! 2. Setup scan (five detectors over a prebuilt frame)
//! 3. Full signal assembly (frame, scan, timeframe analysis, signal)

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fxsignal_core::config::EngineConfig;
use fxsignal_core::data::SyntheticProvider;
use fxsignal_core::domain::{Interval, Outcome, Period, Series};
use fxsignal_core::reconcile::{MultiTimeframeAnalysis, TimeframeSlot};
use fxsignal_core::setups::SetupScanner;
use fxsignal_core::signal::build_signal;
use fxsignal_core::trend::analyze_timeframe;
use fxsignal_core::IndicatorFrame;

// ── Helpers ──────────────────────────────────────────────────────────

fn series(days: u32) -> Series {
    let end = Utc.with_ymd_and_hms(2024, 6, 28, 0, 0, 0).unwrap();
    let provider = SyntheticProvider::new(7, end);
    let bars = provider.generate("EURUSD=X", Period::Days(days), Interval::H1);
    Series::new("EURUSD=X", Interval::H1, bars).unwrap()
}

// ── 1. Frame Build ───────────────────────────────────────────────────

fn bench_frame(c: &mut Criterion) {
    let cfg = EngineConfig::default();
    let mut group = c.benchmark_group("frame_build");
    for days in [30u32, 90, 180] {
        let s = series(days);
        group.bench_with_input(BenchmarkId::from_parameter(s.len()), &s, |b, s| {
            b.iter(|| IndicatorFrame::build(black_box(s.clone()), &cfg.indicators, &cfg.patterns));
        });
    }
    group.finish();
}

// ── 2. Setup Scan ────────────────────────────────────────────────────

fn bench_scan(c: &mut Criterion) {
    let cfg = EngineConfig::default();
    let scanner = SetupScanner::new(&cfg.setups);
    let mut group = c.benchmark_group("setup_scan");
    for days in [30u32, 90, 180] {
        let frame = IndicatorFrame::build(series(days), &cfg.indicators, &cfg.patterns);
        group.bench_with_input(BenchmarkId::from_parameter(frame.len()), &frame, |b, frame| {
            b.iter(|| scanner.scan(black_box(frame)));
        });
    }
    group.finish();
}

// ── 3. Signal Assembly ───────────────────────────────────────────────

fn bench_signal(c: &mut Criterion) {
    let cfg = EngineConfig::default();
    let scanner = SetupScanner::new(&cfg.setups);
    let now = Utc.with_ymd_and_hms(2024, 6, 26, 12, 0, 0).unwrap();
    let s = series(90);

    c.bench_function("signal_90d_h1", |b| {
        b.iter(|| {
            let frame = IndicatorFrame::build(black_box(s.clone()), &cfg.indicators, &cfg.patterns);
            let slot = TimeframeSlot {
                interval: Interval::H1,
                outcome: Outcome::Present(analyze_timeframe(&frame, &cfg.trend)),
            };
            let mtf = MultiTimeframeAnalysis::aggregate("EURUSD=X", vec![slot], &cfg.reconcile);
            let reports = scanner.scan(&frame);
            build_signal(&frame, &reports, &mtf, &cfg, now)
        });
    });
}

criterion_group!(benches, bench_frame, bench_scan, bench_signal);
criterion_main!(benches);
