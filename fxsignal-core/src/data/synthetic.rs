//! Deterministic random-walk provider for offline runs, demos and benches.
//!
//! The same seed, symbol, interval and end time always produce the same bars.

use super::provider::{assemble_series, bars_in_period, DataError, DataProvider, DataSource};
use crate::domain::{Bar, Interval, Period, Series};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bars generated for `Period::Max` and the ceiling for any request.
const MAX_BARS: usize = 5_000;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    end: DateTime<Utc>,
    /// Per-bar volatility as a fraction of price.
    volatility: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64, end: DateTime<Utc>) -> Self {
        Self {
            seed,
            end,
            volatility: 0.0008,
        }
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    fn rng_for(&self, symbol: &str, interval: Interval) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(interval.as_str().as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    fn start_price(symbol: &str) -> f64 {
        if symbol.contains("JPY") {
            150.0
        } else {
            1.10
        }
    }

    pub fn generate(&self, symbol: &str, period: Period, interval: Interval) -> Vec<Bar> {
        let n = bars_in_period(period, interval, self.end, MAX_BARS);
        let mut rng = self.rng_for(symbol, interval);
        let step = interval.duration();
        let first = self.end - step * (n as i32 - 1).max(0);

        let mut close = Self::start_price(symbol);
        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            let open = close;
            // Slow drift regime plus noise keeps trends and pullbacks in the data.
            let drift = (i as f64 / 60.0).sin() * self.volatility * 0.3;
            close = open * (1.0 + drift + rng.gen_range(-1.0..1.0) * self.volatility);
            let wick = open.max(close) * self.volatility * rng.gen_range(0.0..0.6);
            let tail = open.min(close) * self.volatility * rng.gen_range(0.0..0.6);
            bars.push(Bar::new(
                first + step * i as i32,
                open,
                open.max(close) + wick,
                open.min(close) - tail,
                close,
                rng.gen_range(500..1500),
            ));
        }
        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch_bars(&self, symbol: &str, period: Period, interval: Interval) -> Result<Series, DataError> {
        assemble_series(symbol, interval, period, self.generate(symbol, period, interval))
    }
}
