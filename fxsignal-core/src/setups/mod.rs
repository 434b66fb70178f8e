//! SetupScanner: five independent rule detectors over one IndicatorFrame.
//!
//! Each detector walks the whole frame, keeps every bar that satisfies its
//! trigger *and* its risk ceiling, and reports only the most recent one.
//! Candidates above the ceiling are dropped, never flagged.

pub mod continuation;
pub mod needle;
pub mod nine_one;
pub mod nine_two;

pub use continuation::ContinuationPoint;
pub use needle::NeedleAlignment;
pub use nine_one::NineOne;
pub use nine_two::NineTwo;

use crate::config::{EngineConfig, SetupConfig};
use crate::domain::{Direction, Series};
use crate::frame::IndicatorFrame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five setup kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupKind {
    NineOneBuy,
    NineOneSell,
    NineTwo,
    ContinuationPoint,
    NeedleAlignment,
}

impl SetupKind {
    pub fn label(&self) -> &'static str {
        match self {
            SetupKind::NineOneBuy => "9.1 Buy",
            SetupKind::NineOneSell => "9.1 Sell",
            SetupKind::NineTwo => "9.2",
            SetupKind::ContinuationPoint => "Continuation Point",
            SetupKind::NeedleAlignment => "Needle Alignment",
        }
    }
}

impl fmt::Display for SetupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A setup that fired on a specific bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupSignal {
    pub kind: SetupKind,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    /// |entry - stop| / entry
    pub risk_fraction: f64,
    /// Fixed per setup kind (and side, for needle alignment).
    pub confidence: f64,
}

/// Result of one detector over one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    InsufficientData { required: usize, available: usize },
    NotFound,
    Found(SetupSignal),
}

impl ScanOutcome {
    /// Collapses the tri-state to the boolean callers see.
    pub fn found(&self) -> bool {
        matches!(self, ScanOutcome::Found(_))
    }

    pub fn signal(&self) -> Option<&SetupSignal> {
        match self {
            ScanOutcome::Found(s) => Some(s),
            _ => None,
        }
    }
}

/// One detector's result, labelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupReport {
    pub kind: SetupKind,
    pub found: bool,
    pub outcome: ScanOutcome,
}

impl SetupReport {
    pub fn new(kind: SetupKind, outcome: ScanOutcome) -> Self {
        Self {
            kind,
            found: outcome.found(),
            outcome,
        }
    }

    pub fn signal(&self) -> Option<&SetupSignal> {
        self.outcome.signal()
    }
}

/// Entry and stop proposed by a detector at one bar, before the risk check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
}

/// A setup rule evaluated bar by bar.
///
/// Implementors only describe the trigger; history checks, the risk ceiling
/// and "most recent wins" live in the provided methods.
pub trait SetupDetector: Send + Sync {
    fn kind(&self) -> SetupKind;

    /// Bars required before the detector runs at all.
    fn min_bars(&self) -> usize;

    /// Maximum |entry - stop| / entry.
    fn risk_ceiling(&self) -> f64;

    fn confidence(&self, direction: Direction) -> f64;

    /// Trigger at bar `i`, if the rule fires there. Called for `i >= 2`.
    fn trigger(&self, frame: &IndicatorFrame, i: usize) -> Option<Trigger>;

    /// Every risk-acceptable occurrence, oldest first.
    fn matches(&self, frame: &IndicatorFrame) -> Vec<SetupSignal> {
        let bars = frame.bars();
        (2..frame.len())
            .filter_map(|i| {
                let t = self.trigger(frame, i)?;
                if !(t.entry > 0.0) {
                    return None;
                }
                let risk_fraction = (t.entry - t.stop).abs() / t.entry;
                if !(risk_fraction <= self.risk_ceiling()) {
                    return None;
                }
                Some(SetupSignal {
                    kind: self.kind(),
                    direction: t.direction,
                    entry_price: t.entry,
                    stop_loss: t.stop,
                    bar_index: i,
                    timestamp: bars[i].timestamp,
                    risk_fraction,
                    confidence: self.confidence(t.direction),
                })
            })
            .collect()
    }

    fn scan(&self, frame: &IndicatorFrame) -> ScanOutcome {
        if frame.len() < self.min_bars() {
            return ScanOutcome::InsufficientData {
                required: self.min_bars(),
                available: frame.len(),
            };
        }
        match self.matches(frame).pop() {
            Some(signal) => ScanOutcome::Found(signal),
            None => ScanOutcome::NotFound,
        }
    }
}

/// Runs a fixed set of detectors over one shared frame.
pub struct SetupScanner {
    detectors: Vec<Box<dyn SetupDetector>>,
}

impl SetupScanner {
    /// The five standard detectors, in reporting order.
    pub fn new(cfg: &SetupConfig) -> Self {
        Self::with_detectors(vec![
            Box::new(NineOne::buy(cfg)),
            Box::new(NineOne::sell(cfg)),
            Box::new(NineTwo::new(cfg)),
            Box::new(ContinuationPoint::new(cfg)),
            Box::new(NeedleAlignment::new(cfg)),
        ])
    }

    pub fn with_detectors(detectors: Vec<Box<dyn SetupDetector>>) -> Self {
        Self { detectors }
    }

    pub fn scan(&self, frame: &IndicatorFrame) -> Vec<SetupReport> {
        self.detectors
            .iter()
            .map(|d| SetupReport::new(d.kind(), d.scan(frame)))
            .collect()
    }
}

/// Build the frame for `series` and run the five detectors over it.
pub fn scan_setups(series: &Series, cfg: &EngineConfig) -> Vec<SetupReport> {
    let frame = IndicatorFrame::build(series.clone(), &cfg.indicators, &cfg.patterns);
    SetupScanner::new(&cfg.setups).scan(&frame)
}

/// Highest base confidence among the found setups. Ties keep the earlier
/// report.
pub fn best_setup(reports: &[SetupReport]) -> Option<&SetupSignal> {
    reports
        .iter()
        .filter_map(SetupReport::signal)
        .fold(None, |best: Option<&SetupSignal>, s| match best {
            Some(b) if b.confidence >= s.confidence => Some(b),
            _ => Some(s),
        })
}
