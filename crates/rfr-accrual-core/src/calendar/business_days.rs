use chrono::NaiveDate;

use crate::calendar::rate_series::RateSeries;
use crate::error::RfrError;
use crate::RfrResult;

/// Ascending, duplicate-free business days taken from a rate series.
///
/// All queries are binary searches over the sorted days; the index is never
/// empty, so `earliest`/`latest` always exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessDayIndex {
    days: Vec<NaiveDate>,
}

impl BusinessDayIndex {
    pub fn from_series(series: &RateSeries) -> RfrResult<Self> {
        Self::from_dates(series.dates())
    }

    /// Sort and deduplicate arbitrary dates into an index.
    pub fn from_dates<I>(dates: I) -> RfrResult<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut days: Vec<NaiveDate> = dates.into_iter().collect();
        if days.is_empty() {
            return Err(RfrError::EmptyRateSeries);
        }
        days.sort_unstable();
        days.dedup();
        Ok(BusinessDayIndex { days })
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn earliest(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn latest(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.days.binary_search(&date).is_ok()
    }

    /// Latest business day on or before `date`.
    pub fn previous_business_day(&self, date: NaiveDate) -> RfrResult<NaiveDate> {
        let after = self.days.partition_point(|&d| d <= date);
        if after == 0 {
            return Err(RfrError::NoPriorBusinessDay {
                date,
                earliest: self.earliest(),
            });
        }
        Ok(self.days[after - 1])
    }

    /// Earliest business day on or after `date`.
    pub fn next_business_day(&self, date: NaiveDate) -> RfrResult<NaiveDate> {
        let pos = self.days.partition_point(|&d| d < date);
        self.days
            .get(pos)
            .copied()
            .ok_or(RfrError::NoSubsequentBusinessDay {
                date,
                latest: self.latest(),
            })
    }

    pub fn position(&self, date: NaiveDate) -> RfrResult<usize> {
        self.days
            .binary_search(&date)
            .map_err(|_| RfrError::NotABusinessDay(date))
    }

    /// Business day `lookback` positions before `pos`.
    pub fn at_offset(&self, pos: usize, lookback: u32) -> RfrResult<NaiveDate> {
        let date = self
            .days
            .get(pos)
            .copied()
            .ok_or_else(|| RfrError::InvalidInput {
                field: "position".into(),
                reason: format!(
                    "position {} is outside the index of {} business days",
                    pos,
                    self.days.len()
                ),
            })?;
        pos.checked_sub(lookback as usize)
            .map(|i| self.days[i])
            .ok_or(RfrError::InsufficientHistory {
                date,
                lookback,
                earliest: self.earliest(),
            })
    }
}
