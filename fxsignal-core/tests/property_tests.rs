//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Risk ceiling: no detector ever emits a setup above its ceiling
//! 2. Idempotence: EMA/SMA recomputation gives bit-identical output
//! 3. Ladder ordering: take-profits move away from entry, stop on the other side
//! 4. Kelly clamp: recommended risk stays inside [0.5%, 2%]
//! 5. Reconciliation bounds: confidence in [0, 100] whatever the inputs

use chrono::{TimeZone, Utc};
use fxsignal_core::config::{EngineConfig, ReconcileConfig, RiskConfig};
use fxsignal_core::data::{DataProvider, SyntheticProvider};
use fxsignal_core::domain::{Bar, Direction, Interval, Period, Trend};
use fxsignal_core::indicators::{Ema, Indicator, Sma};
use fxsignal_core::reconcile::{mtf_confidence, overall_bias};
use fxsignal_core::risk::{atr_plan, kelly_sizing, setup_ladder};
use fxsignal_core::setups::{ContinuationPoint, NeedleAlignment, NineOne, NineTwo, SetupDetector};
use fxsignal_core::trend::{MaAlignment, SupportResistance, TimeframeAnalysis};
use fxsignal_core::IndicatorFrame;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.9..1.4_f64, 1..300)
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Buy), Just(Direction::Sell)]
}

fn arb_trend() -> impl Strategy<Value = Trend> {
    prop_oneof![Just(Trend::Up), Just(Trend::Down), Just(Trend::Undetermined)]
}

fn bars_from(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let open = if i == 0 { c } else { closes[i - 1] };
            Bar::new(
                base + chrono::Duration::hours(i as i64),
                open,
                open.max(c) + 0.0005,
                open.min(c) - 0.0005,
                c,
                1000,
            )
        })
        .collect()
}

fn same_bits(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

// ── 1. Risk Ceiling ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every occurrence a detector keeps, not just the reported one, is
    /// within that detector's ceiling.
    #[test]
    fn detectors_never_exceed_their_risk_ceiling(
        seed in any::<u64>(),
        volatility in 0.0002..0.02_f64,
    ) {
        let end = Utc.with_ymd_and_hms(2024, 6, 28, 0, 0, 0).unwrap();
        let series = SyntheticProvider::new(seed, end)
            .with_volatility(volatility)
            .fetch_bars("EURUSD=X", Period::Days(12), Interval::H1)
            .unwrap();
        let cfg = EngineConfig::default();
        let frame = IndicatorFrame::build(series, &cfg.indicators, &cfg.patterns);

        let detectors: Vec<Box<dyn SetupDetector>> = vec![
            Box::new(NineOne::buy(&cfg.setups)),
            Box::new(NineOne::sell(&cfg.setups)),
            Box::new(NineTwo::new(&cfg.setups)),
            Box::new(ContinuationPoint::new(&cfg.setups)),
            Box::new(NeedleAlignment::new(&cfg.setups)),
        ];
        for detector in &detectors {
            for signal in detector.matches(&frame) {
                let fraction = (signal.entry_price - signal.stop_loss).abs() / signal.entry_price;
                prop_assert!(fraction <= detector.risk_ceiling(), "{:?} {}", signal.kind, fraction);
                prop_assert!((signal.risk_fraction - fraction).abs() < 1e-12);
            }
        }
    }
}

// ── 2. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn moving_averages_are_idempotent(closes in arb_closes(), period in 1usize..60) {
        let bars = bars_from(&closes);
        let sma = Sma::new(period);
        let ema = Ema::new(period);
        prop_assert!(same_bits(&sma.compute(&bars), &sma.compute(&bars)));
        prop_assert!(same_bits(&ema.compute(&bars), &ema.compute(&bars)));
        // A fresh instance has no memory of the previous one either.
        prop_assert!(same_bits(&Sma::new(period).compute(&bars), &sma.compute(&bars)));
    }

    #[test]
    fn sma_output_is_one_value_per_bar(closes in arb_closes(), period in 1usize..60) {
        let bars = bars_from(&closes);
        let out = Sma::new(period).compute(&bars);
        prop_assert_eq!(out.len(), bars.len());
        for (i, v) in out.iter().enumerate() {
            prop_assert_eq!(v.is_nan(), i + 1 < period);
        }
    }
}

// ── 3. Ladder Ordering ───────────────────────────────────────────────

proptest! {
    #[test]
    fn setup_ladder_moves_away_from_entry(
        entry in 0.5..200.0_f64,
        risk_frac in 0.0001..0.05_f64,
        direction in arb_direction(),
    ) {
        let stop = entry - direction.sign() * entry * risk_frac;
        let ladder = setup_ladder(entry, stop, direction, &RiskConfig::default()).unwrap();
        let [tp1, tp2, tp3] = ladder.prices();
        let s = direction.sign();
        prop_assert!(s * (tp1 - entry) > 0.0);
        prop_assert!(s * (tp2 - tp1) > 0.0);
        prop_assert!(s * (tp3 - tp2) > 0.0);
        prop_assert!(s * (entry - stop) > 0.0);
        // tp2 sits at 2.5R, so the default ladder always clears the 2.0 floor.
        prop_assert!((ladder.tp2() - entry).abs() / (entry - stop).abs() >= 2.0 - 1e-9);
    }

    #[test]
    fn atr_plan_brackets_entry(
        entry in 0.5..200.0_f64,
        atr_frac in 0.0001..0.02_f64,
        direction in arb_direction(),
    ) {
        let plan = atr_plan(entry, entry * atr_frac, direction, &RiskConfig::default()).unwrap();
        let s = direction.sign();
        prop_assert!(s * (entry - plan.stop_loss) > 0.0);
        let tps = plan.take_profits.prices();
        prop_assert!(s * (tps[0] - entry) > 0.0);
        prop_assert!(s * (tps[1] - tps[0]) > 0.0);
        prop_assert!(s * (tps[2] - tps[1]) > 0.0);
        prop_assert!((plan.risk_reward_ratio - 1.5).abs() < 1e-9);
    }
}

// ── 4. Kelly Clamp ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn kelly_recommendation_is_clamped(
        win_rate in 0.0..=100.0_f64,
        avg_win in 0.01..1000.0_f64,
        avg_loss in 0.01..1000.0_f64,
        confidence in 0.0..=100.0_f64,
    ) {
        let cfg = RiskConfig::default();
        let k = kelly_sizing(10_000.0, win_rate, avg_win, avg_loss, confidence, &cfg).unwrap();
        prop_assert!(k.recommended_risk_pct >= cfg.kelly_min_pct - 1e-12);
        prop_assert!(k.recommended_risk_pct <= cfg.kelly_max_pct + 1e-12);
        prop_assert!((k.recommended_risk_amount - 10_000.0 * k.recommended_risk_pct / 100.0).abs() < 1e-6);
    }
}

// ── 5. Reconciliation Bounds ─────────────────────────────────────────

fn timeframe(interval: Interval, trend: Trend, strength: f64, aligned: bool) -> TimeframeAnalysis {
    TimeframeAnalysis {
        interval,
        trend,
        trend_strength: strength,
        support_resistance: SupportResistance::default(),
        ma_alignment: MaAlignment {
            aligned,
            direction: trend,
        },
        price_position: None,
    }
}

proptest! {
    #[test]
    fn mtf_confidence_is_bounded(
        slots in prop::collection::vec((arb_trend(), 0.0..=100.0_f64, any::<bool>()), 0..=4),
    ) {
        let analyses: Vec<TimeframeAnalysis> = slots
            .iter()
            .zip(Interval::HIERARCHY)
            .map(|(&(trend, strength, aligned), iv)| timeframe(iv, trend, strength, aligned))
            .collect();
        let refs: Vec<&TimeframeAnalysis> = analyses.iter().collect();
        let cfg = ReconcileConfig::default();
        let confidence = mtf_confidence(&refs, &cfg);
        prop_assert!((0.0..=100.0).contains(&confidence));
        // The bias never contradicts a unanimous field.
        let bias = overall_bias(&refs, &cfg);
        if !refs.is_empty() && refs.iter().all(|t| t.trend == Trend::Up) {
            prop_assert_ne!(bias, fxsignal_core::domain::Bias::Down);
        }
    }
}
