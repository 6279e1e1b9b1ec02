//! Business-day calendar derived from the supplied rate series.

pub mod business_days;
pub mod lookback;
pub mod rate_series;

pub use business_days::BusinessDayIndex;
pub use lookback::{Lookback, LookbackResolver};
pub use rate_series::RateSeries;
