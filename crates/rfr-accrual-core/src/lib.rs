//! Compounded-in-arrears interest on risk-free-rate (RFR) loans.
//!
//! The rate series doubles as the business-day calendar: every date carrying a
//! fixing is a business day. Interest compounds over business-day blocks using
//! the fixing observed `L` business days earlier (lookback without observation
//! shift); margin and credit adjustment spread accrue as simple interest.

pub mod accrual;
pub mod calendar;
pub mod error;
pub mod types;

pub use error::RfrError;
pub use types::*;

/// Standard result type for all rfr-accrual operations
pub type RfrResult<T> = Result<T, RfrError>;
