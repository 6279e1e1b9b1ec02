//! Business-day block compounding of an RFR series over an accrual period.
//!
//! The period `[start, end)` is walked in blocks: each block starts on a
//! calendar day, is governed by the business day on or before it, and runs
//! until the next business day (or the period end). One block contributes
//! `1 + r * n / N` to the compounded factor, where `r` is the fixing observed
//! `L` business days before the governing business day and `n` the block's
//! length in calendar days.
//!
//! [`AccrualBlocks`] performs the walk lazily, one block per `next()`, and
//! [`DailyDetails`] expands the same walk into one record per calendar day.
//! Both are forward-only: the running factor lives inside the iterator and is
//! read back with `factor()` once the walk is exhausted.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accrual::basis::Basis;
use crate::calendar::{BusinessDayIndex, Lookback, LookbackResolver, RateSeries};
use crate::error::RfrError;
use crate::types::Rate;
use crate::RfrResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One compounding step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualBlock {
    /// First calendar day covered by the block
    pub start: NaiveDate,
    /// Calendar days covered (always >= 1)
    pub days: i64,
    /// Business day whose observation governs the block
    pub business_day: NaiveDate,
    /// Lookback-shifted fixing date
    pub observation_date: NaiveDate,
    /// Fixing applied, decimal form
    pub rate: Rate,
    /// Compounded factor after this block
    pub factor: Decimal,
}

impl AccrualBlock {
    /// Exclusive end of the block.
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(self.days)
    }
}

/// Audit record for a single calendar day of the accrual period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDetailRecord {
    pub date: NaiveDate,
    pub business_day: NaiveDate,
    pub observation_date: NaiveDate,
    pub daily_rate: Rate,
    /// Factor after the block containing this day; shared by the whole block
    pub cumulative_factor_after_block: Decimal,
    /// Length of the containing block
    pub days_applied: i64,
    pub is_business_day: bool,
}

// ---------------------------------------------------------------------------
// Block iterator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct CompoundingState {
    factor: Decimal,
    cursor: NaiveDate,
}

/// Lazy walk over the compounding blocks of one accrual period.
///
/// Construction validates the period and resolves the lookback of the first
/// business day, so an `InsufficientHistory` failure happens before any
/// compounding. Errors met during the walk are yielded once, after which the
/// iterator is fused.
///
/// A period running past the last business day in the series accrues its tail
/// at the last business day's observed fixing.
#[derive(Debug)]
pub struct AccrualBlocks<'a> {
    rates: &'a RateSeries,
    index: &'a BusinessDayIndex,
    resolver: LookbackResolver<'a>,
    basis: Basis,
    end: NaiveDate,
    state: CompoundingState,
    failed: bool,
}

impl<'a> AccrualBlocks<'a> {
    pub fn new(
        rates: &'a RateSeries,
        index: &'a BusinessDayIndex,
        start: NaiveDate,
        end: NaiveDate,
        lookback: Lookback,
        basis: Basis,
    ) -> RfrResult<Self> {
        if end <= start {
            return Err(RfrError::InvalidPeriod { start, end });
        }
        let resolver = LookbackResolver::new(index, lookback);
        resolver.preflight(start)?;

        Ok(AccrualBlocks {
            rates,
            index,
            resolver,
            basis,
            end,
            state: CompoundingState {
                factor: Decimal::ONE,
                cursor: start,
            },
            failed: false,
        })
    }

    /// Running compounded factor (final once the iterator is exhausted).
    pub fn factor(&self) -> Decimal {
        self.state.factor
    }

    fn is_finished(&self) -> bool {
        self.failed || self.state.cursor >= self.end
    }

    /// Drive the walk to completion and return the compounded factor.
    pub fn run(mut self) -> RfrResult<Decimal> {
        for block in self.by_ref() {
            block?;
        }
        Ok(self.factor())
    }

    /// Expand the remaining walk into per-calendar-day records.
    pub fn daily_details(self) -> DailyDetails<'a> {
        DailyDetails {
            blocks: self,
            current: None,
            offset: 0,
        }
    }

    fn step(&mut self) -> RfrResult<AccrualBlock> {
        let d = self.state.cursor;
        let (business_day, search_from) = if self.index.is_business_day(d) {
            (d, d + Duration::days(1))
        } else {
            (self.index.previous_business_day(d)?, d)
        };

        let remaining = (self.end - d).num_days();
        let days = match self.index.next_business_day(search_from) {
            Ok(next) => (next - d).num_days().min(remaining),
            // Past the last fixing, the last business day governs the rest of the period
            Err(RfrError::NoSubsequentBusinessDay { .. }) => remaining,
            Err(e) => return Err(e),
        };

        let observation_date = self.resolver.resolve(business_day)?;
        let rate = self
            .rates
            .get(observation_date)
            .ok_or(RfrError::MissingRate(observation_date))?;

        let period_factor =
            Decimal::ONE + rate * Decimal::from(days) / self.basis.denominator();
        let factor = self.basis.quantize(self.state.factor * period_factor);

        debug!(
            %d,
            %business_day,
            %observation_date,
            %rate,
            days,
            %factor,
            "compounding block"
        );

        self.state = CompoundingState {
            factor,
            cursor: d + Duration::days(days),
        };

        Ok(AccrualBlock {
            start: d,
            days,
            business_day,
            observation_date,
            rate,
            factor,
        })
    }
}

impl Iterator for AccrualBlocks<'_> {
    type Item = RfrResult<AccrualBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished() {
            return None;
        }
        let block = self.step();
        if block.is_err() {
            self.failed = true;
        }
        Some(block)
    }
}

impl std::iter::FusedIterator for AccrualBlocks<'_> {}

// ---------------------------------------------------------------------------
// Daily detail iterator
// ---------------------------------------------------------------------------

/// Per-calendar-day view of an [`AccrualBlocks`] walk, produced in the same
/// pass that compounds the factor.
#[derive(Debug)]
pub struct DailyDetails<'a> {
    blocks: AccrualBlocks<'a>,
    current: Option<AccrualBlock>,
    offset: i64,
}

impl DailyDetails<'_> {
    /// Running compounded factor of the underlying walk.
    pub fn factor(&self) -> Decimal {
        self.blocks.factor()
    }
}

impl Iterator for DailyDetails<'_> {
    type Item = RfrResult<DailyDetailRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(block) = &self.current {
                if self.offset < block.days {
                    let date = block.start + Duration::days(self.offset);
                    self.offset += 1;
                    return Some(Ok(DailyDetailRecord {
                        date,
                        business_day: block.business_day,
                        observation_date: block.observation_date,
                        daily_rate: block.rate,
                        cumulative_factor_after_block: block.factor,
                        days_applied: block.days,
                        is_business_day: date == block.business_day,
                    }));
                }
            }
            match self.blocks.next()? {
                Ok(block) => {
                    self.current = Some(block);
                    self.offset = 0;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl std::iter::FusedIterator for DailyDetails<'_> {}

// ---------------------------------------------------------------------------
// Convenience
// ---------------------------------------------------------------------------

/// Compounded RFR factor `C` for `[start, end)`.
pub fn compounded_factor(
    rates: &RateSeries,
    start: NaiveDate,
    end: NaiveDate,
    lookback: Lookback,
    basis: Basis,
) -> RfrResult<Decimal> {
    let index = BusinessDayIndex::from_series(rates)?;
    AccrualBlocks::new(rates, &index, start, end, lookback, basis)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn lookback(days: i64) -> Lookback {
        Lookback::new(days).unwrap()
    }

    /// Every calendar day from 1 Mar 2024 to 10 Mar 2024 at 5%.
    fn flat_daily_series() -> RateSeries {
        (1..=10).map(|day| (d(2024, 3, day), dec!(0.05))).collect()
    }

    /// Weekday fixings, Mon 1 Jul 2024 .. Fri 12 Jul 2024, rate rising by 1bp a day.
    fn weekday_series() -> RateSeries {
        let mut rate = dec!(0.0500);
        let mut out = Vec::new();
        for day in [1, 2, 3, 4, 5, 8, 9, 10, 11, 12] {
            out.push((d(2024, 7, day), rate));
            rate += dec!(0.0001);
        }
        out.into_iter().collect()
    }

    #[test]
    fn test_flat_five_day_sofr_factor() {
        let series = flat_daily_series();
        let c = compounded_factor(&series, d(2024, 3, 2), d(2024, 3, 7), lookback(1), Basis::Sofr)
            .unwrap();
        let step = Decimal::ONE + dec!(0.05) / dec!(360);
        let expected = step * step * step * step * step;
        assert_eq!(c, expected);
        assert!(c > dec!(1.000694) && c < dec!(1.000695));
    }

    #[test]
    fn test_weekend_collapses_into_friday_block() {
        let series = weekday_series();
        let index = BusinessDayIndex::from_series(&series).unwrap();
        // Friday 5 Jul to Monday 8 Jul: one block of three days
        let blocks: Vec<AccrualBlock> = AccrualBlocks::new(
            &series,
            &index,
            d(2024, 7, 5),
            d(2024, 7, 8),
            lookback(1),
            Basis::Sonia,
        )
        .unwrap()
        .collect::<RfrResult<_>>()
        .unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].days, 3);
        assert_eq!(blocks[0].business_day, d(2024, 7, 5));
        assert_eq!(blocks[0].observation_date, d(2024, 7, 4));
        assert_eq!(blocks[0].end(), d(2024, 7, 8));
    }

    #[test]
    fn test_non_business_start_uses_previous_business_day() {
        let series = weekday_series();
        let index = BusinessDayIndex::from_series(&series).unwrap();
        // Saturday start: the first block is Sat..Sun governed by Friday
        let blocks: Vec<AccrualBlock> = AccrualBlocks::new(
            &series,
            &index,
            d(2024, 7, 6),
            d(2024, 7, 10),
            lookback(2),
            Basis::Sofr,
        )
        .unwrap()
        .collect::<RfrResult<_>>()
        .unwrap();

        let shape: Vec<(NaiveDate, i64, NaiveDate)> = blocks
            .iter()
            .map(|b| (b.start, b.days, b.observation_date))
            .collect();
        assert_eq!(
            shape,
            vec![
                (d(2024, 7, 6), 2, d(2024, 7, 3)),
                (d(2024, 7, 8), 1, d(2024, 7, 4)),
                (d(2024, 7, 9), 1, d(2024, 7, 5)),
            ]
        );
    }

    #[test]
    fn test_final_block_truncated_at_end() {
        let series = weekday_series();
        let index = BusinessDayIndex::from_series(&series).unwrap();
        // End on Saturday: the Friday block only covers one day
        let blocks: Vec<AccrualBlock> = AccrualBlocks::new(
            &series,
            &index,
            d(2024, 7, 4),
            d(2024, 7, 6),
            lookback(1),
            Basis::Sofr,
        )
        .unwrap()
        .collect::<RfrResult<_>>()
        .unwrap();
        assert_eq!(blocks.iter().map(|b| b.days).collect::<Vec<_>>(), vec![1, 1]);
    }

    #[test]
    fn test_block_lengths_sum_to_day_count() {
        let series = weekday_series();
        let index = BusinessDayIndex::from_series(&series).unwrap();
        let start = d(2024, 7, 3);
        let end = d(2024, 7, 12);
        let total: i64 = AccrualBlocks::new(&series, &index, start, end, lookback(2), Basis::Sonia)
            .unwrap()
            .map(|b| b.unwrap().days)
            .sum();
        assert_eq!(total, (end - start).num_days());
    }

    #[test]
    fn test_sonia_factor_quantized_every_step() {
        let series = weekday_series();
        let index = BusinessDayIndex::from_series(&series).unwrap();
        let blocks = AccrualBlocks::new(
            &series,
            &index,
            d(2024, 7, 3),
            d(2024, 7, 12),
            lookback(2),
            Basis::Sonia,
        )
        .unwrap();
        let mut previous = Decimal::ONE;
        for block in blocks {
            let block = block.unwrap();
            assert!(block.factor.scale() <= 18);
            assert!(block.factor >= previous);
            previous = block.factor;
        }
    }

    #[test]
    fn test_insufficient_history_fails_at_construction() {
        let series = weekday_series();
        let index = BusinessDayIndex::from_series(&series).unwrap();
        let err = AccrualBlocks::new(
            &series,
            &index,
            d(2024, 7, 2),
            d(2024, 7, 10),
            lookback(2),
            Basis::Sonia,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RfrError::InsufficientHistory {
                date: d(2024, 7, 2),
                lookback: 2,
                earliest: d(2024, 7, 1)
            }
        );
    }

    #[test]
    fn test_invalid_period() {
        let series = weekday_series();
        let err = compounded_factor(&series, d(2024, 7, 9), d(2024, 7, 9), lookback(1), Basis::Sofr)
            .unwrap_err();
        assert!(matches!(err, RfrError::InvalidPeriod { .. }));
    }

    #[test]
    fn test_start_before_series() {
        let series = weekday_series();
        let err = compounded_factor(&series, d(2024, 6, 28), d(2024, 7, 9), lookback(1), Basis::Sofr)
            .unwrap_err();
        assert!(matches!(err, RfrError::NoPriorBusinessDay { .. }));
    }

    #[test]
    fn test_last_business_day_governs_past_series_end() {
        let series = weekday_series();
        let index = BusinessDayIndex::from_series(&series).unwrap();
        let blocks: Vec<AccrualBlock> = AccrualBlocks::new(
            &series,
            &index,
            d(2024, 7, 11),
            d(2024, 7, 20),
            lookback(1),
            Basis::Sofr,
        )
        .unwrap()
        .collect::<RfrResult<_>>()
        .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].business_day, d(2024, 7, 12));
        assert_eq!(blocks[1].days, 8);
        assert_eq!(blocks[1].end(), d(2024, 7, 20));
    }

    #[test]
    fn test_missing_rate_fails_and_fuses() {
        let series = weekday_series();
        // Index built from a wider calendar than the rates cover
        let mut dates: Vec<NaiveDate> = series.dates().collect();
        dates.push(d(2024, 6, 28));
        let index = BusinessDayIndex::from_dates(dates).unwrap();
        let mut blocks = AccrualBlocks::new(
            &series,
            &index,
            d(2024, 7, 2),
            d(2024, 7, 4),
            lookback(2),
            Basis::Sofr,
        )
        .unwrap();
        let err = blocks.next().unwrap().unwrap_err();
        assert_eq!(err, RfrError::MissingRate(d(2024, 6, 28)));
        assert!(blocks.next().is_none());
        assert_eq!(blocks.factor(), Decimal::ONE);
    }

    #[test]
    fn test_daily_details_one_record_per_calendar_day() {
        let series = weekday_series();
        let index = BusinessDayIndex::from_series(&series).unwrap();
        let start = d(2024, 7, 4);
        let end = d(2024, 7, 9);
        let mut details = AccrualBlocks::new(&series, &index, start, end, lookback(1), Basis::Sonia)
            .unwrap()
            .daily_details();
        let records: Vec<DailyDetailRecord> = details.by_ref().collect::<RfrResult<_>>().unwrap();

        assert_eq!(records.len() as i64, (end - start).num_days());
        assert_eq!(records[0].date, start);
        assert_eq!(records.last().unwrap().date, d(2024, 7, 8));

        // Fri, Sat, Sun share the Friday block and its post-step factor
        let weekend: Vec<&DailyDetailRecord> = records[1..4].iter().collect();
        assert!(weekend.iter().all(|r| r.business_day == d(2024, 7, 5)));
        assert!(weekend.iter().all(|r| r.days_applied == 3));
        assert!(weekend
            .iter()
            .all(|r| r.cumulative_factor_after_block == weekend[0].cumulative_factor_after_block));
        assert!(weekend[0].is_business_day);
        assert!(!weekend[1].is_business_day);

        assert_eq!(
            records.last().unwrap().cumulative_factor_after_block,
            details.factor()
        );
    }

    #[test]
    fn test_daily_details_match_block_walk_factor() {
        let series = weekday_series();
        let start = d(2024, 7, 3);
        let end = d(2024, 7, 12);
        let direct = compounded_factor(&series, start, end, lookback(2), Basis::Sonia).unwrap();

        let index = BusinessDayIndex::from_series(&series).unwrap();
        let mut details = AccrualBlocks::new(&series, &index, start, end, lookback(2), Basis::Sonia)
            .unwrap()
            .daily_details();
        for record in details.by_ref() {
            record.unwrap();
        }
        assert_eq!(details.factor(), direct);
    }
}
