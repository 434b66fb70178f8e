//! CSV directory provider.
//!
//! One file per symbol and interval, `<dir>/<symbol>_<interval>.csv`, with a
//! `timestamp,open,high,low,close,volume` header. Timestamps are RFC 3339;
//! volume may be empty.

use super::provider::{assemble_series, DataError, DataProvider, DataSource};
use crate::domain::{Bar, Interval, Period, Series};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, interval: Interval) -> PathBuf {
        self.dir.join(format!("{symbol}_{interval}.csv"))
    }

    /// Write `series` where `fetch_bars` will look for it.
    pub fn write_series(&self, series: &Series) -> Result<PathBuf, DataError> {
        let path = self.path_for(series.symbol(), series.interval());
        let mut writer = csv::Writer::from_path(&path).map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;
        for bar in series.bars() {
            writer
                .serialize(CsvRow {
                    timestamp: bar.timestamp,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: Some(bar.volume),
                })
                .map_err(|e| DataError::Csv(e.to_string()))?;
        }
        writer.flush().map_err(|e| DataError::Csv(e.to_string()))?;
        Ok(path)
    }

    fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;
        reader
            .deserialize::<CsvRow>()
            .enumerate()
            .map(|(i, row)| {
                let row = row.map_err(|e| DataError::Csv(format!("{} row {}: {e}", path.display(), i + 1)))?;
                Ok(Bar::new(
                    row.timestamp,
                    row.open,
                    row.high,
                    row.low,
                    row.close,
                    row.volume.unwrap_or(0),
                ))
            })
            .collect()
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvFile
    }

    fn fetch_bars(&self, symbol: &str, period: Period, interval: Interval) -> Result<Series, DataError> {
        let path = self.path_for(symbol, interval);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars = Self::read_bars(&path)?;
        assemble_series(symbol, interval, period, bars)
    }
}
