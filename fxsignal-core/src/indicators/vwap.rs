//! Volume Weighted Average Price (VWAP).
//!
//! Cumulative from the start of the series, not a rolling window:
//! VWAP[t] = sum(close * volume, 0..=t) / sum(volume, 0..=t)
//!
//! A series without any volume falls back to the close. Bars before the
//! first traded volume are NaN.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        if !bars.iter().any(|b| b.volume > 0) {
            return bars.iter().map(|b| b.close).collect();
        }

        let mut pv = 0.0;
        let mut vol = 0.0;
        bars.iter()
            .map(|b| {
                pv += b.close * b.volume as f64;
                vol += b.volume as f64;
                if vol > 0.0 {
                    pv / vol
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn vwap_five_bars_known_volumes() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let volumes = [100, 200, 300, 400, 500];
        for (bar, v) in bars.iter_mut().zip(volumes) {
            bar.volume = v;
        }
        let result = Vwap::new().compute(&bars);

        let mut pv = 0.0;
        let mut vol = 0.0;
        for (i, bar) in bars.iter().enumerate() {
            pv += bar.close * bar.volume as f64;
            vol += bar.volume as f64;
            assert_approx(result[i], pv / vol, DEFAULT_EPSILON);
        }
        // (1000 + 2200 + 3600 + 5200 + 7000) / 1500
        assert_approx(result[4], 19000.0 / 1500.0, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_without_volume_is_close() {
        let mut bars = make_bars(&[1.10, 1.12, 1.11]);
        for bar in &mut bars {
            bar.volume = 0;
        }
        assert_eq!(Vwap::new().compute(&bars), vec![1.10, 1.12, 1.11]);
    }

    #[test]
    fn vwap_undefined_before_first_volume() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[0].volume = 0;
        bars[1].volume = 10;
        bars[2].volume = 10;
        let result = Vwap::new().compute(&bars);
        assert!(result[0].is_nan());
        assert_approx(result[1], 2.0, DEFAULT_EPSILON);
        assert_approx(result[2], 2.5, DEFAULT_EPSILON);
    }
}
