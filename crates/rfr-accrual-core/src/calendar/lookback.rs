use chrono::NaiveDate;

use crate::calendar::business_days::BusinessDayIndex;
use crate::error::RfrError;
use crate::RfrResult;

/// Number of business days (at least one) between an accrual day and the
/// fixing it observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookback(u32);

impl Lookback {
    pub fn new(days: i64) -> RfrResult<Self> {
        if days < 1 || days > u32::MAX as i64 {
            return Err(RfrError::InvalidLookback(days));
        }
        Ok(Lookback(days as u32))
    }

    pub fn days(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Lookback {
    type Error = RfrError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        Lookback::new(days)
    }
}

impl From<Lookback> for u32 {
    fn from(lookback: Lookback) -> Self {
        lookback.0
    }
}

/// Maps a business day to its observation date `L` business days earlier.
#[derive(Debug, Clone, Copy)]
pub struct LookbackResolver<'a> {
    index: &'a BusinessDayIndex,
    lookback: Lookback,
}

impl<'a> LookbackResolver<'a> {
    pub fn new(index: &'a BusinessDayIndex, lookback: Lookback) -> Self {
        LookbackResolver { index, lookback }
    }

    pub fn lookback(&self) -> Lookback {
        self.lookback
    }

    pub fn resolve(&self, business_day: NaiveDate) -> RfrResult<NaiveDate> {
        let pos = self.index.position(business_day)?;
        self.index.at_offset(pos, self.lookback.days())
    }

    /// Resolve the observation date of the business day governing `start`.
    ///
    /// Run before any compounding so a history shortfall is reported without
    /// a partially built factor.
    pub fn preflight(&self, start: NaiveDate) -> RfrResult<NaiveDate> {
        let first_business_day = self.index.previous_business_day(start)?;
        self.resolve(first_business_day)
    }
}
