//! Domain types for fxsignal

pub mod bar;
pub mod direction;
pub mod interval;
pub mod outcome;
pub mod series;

pub use bar::Bar;
pub use direction::{Bias, Direction, Trend};
pub use interval::{Interval, ParseError, Period};
pub use outcome::Outcome;
pub use series::{Series, SeriesError};
