//! Market-data providers: Yahoo chart API, CSV directory, synthetic walk.

pub mod circuit_breaker;
pub mod csv_file;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_file::CsvProvider;
pub use provider::{assemble_series, DataError, DataProvider, DataSource};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
