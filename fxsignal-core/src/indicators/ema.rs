//! Exponential Moving Average (EMA) by smoothing span.
//!
//! alpha = 2 / (span + 1). Uses the bias-adjusted form: every value is the
//! weighted mean of all closes so far with weights (1 - alpha)^k, so output is
//! defined from the first bar on.
//!
//! num[t] = close[t] + (1 - alpha) * num[t-1]
//! den[t] = 1        + (1 - alpha) * den[t-1]
//! EMA[t] = num[t] / den[t]
//!
//! Lookback: 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ewm_of_series(&closes, self.span)
    }
}

/// Span-adjusted exponential mean of an arbitrary series.
///
/// A NaN input taints every later value.
pub fn ewm_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if span == 0 {
        return result;
    }

    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut num = 0.0;
    let mut den = 0.0;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return result;
        }
        num = v + decay * num;
        den = 1.0 + decay * den;
        result[i] = num / den;
    }

    result
}
