pub mod indicators;

pub use indicators::{CountryIndicator, IndicatorError, IndicatorStore};
