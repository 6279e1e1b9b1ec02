use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Rate, RateObservation};

/// Normalized daily fixings keyed by date, rates in decimal form (0.05 = 5%).
///
/// Every date present is a business day; nothing else is. Built once and
/// never mutated, so a [`BusinessDayIndex`](super::BusinessDayIndex) derived
/// from it stays in step with its lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSeries(BTreeMap<NaiveDate, Rate>);

impl RateSeries {
    pub fn new(rates: BTreeMap<NaiveDate, Rate>) -> Self {
        RateSeries(rates)
    }

    /// Build from raw observations. A date supplied twice keeps its last rate.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = RateObservation>,
    {
        observations
            .into_iter()
            .map(|obs| (obs.date, obs.rate))
            .collect()
    }

    pub fn get(&self, date: NaiveDate) -> Option<Rate> {
        self.0.get(&date).copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.keys().copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.keys().next_back().copied()
    }

    /// Dates whose fixing is below zero.
    pub fn negative_rate_dates(&self) -> Vec<NaiveDate> {
        self.0
            .iter()
            .filter(|(_, r)| **r < Decimal::ZERO)
            .map(|(d, _)| *d)
            .collect()
    }
}

impl FromIterator<(NaiveDate, Rate)> for RateSeries {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, Rate)>>(iter: T) -> Self {
        RateSeries(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_duplicate_dates_keep_last_rate() {
        let series = RateSeries::from_observations(vec![
            RateObservation { date: d(2024, 1, 2), rate: dec!(0.05) },
            RateObservation { date: d(2024, 1, 3), rate: dec!(0.051) },
            RateObservation { date: d(2024, 1, 2), rate: dec!(0.052) },
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(d(2024, 1, 2)), Some(dec!(0.052)));
    }

    #[test]
    fn test_dates_are_sorted_regardless_of_input_order() {
        let series: RateSeries = vec![
            (d(2024, 1, 5), dec!(0.05)),
            (d(2024, 1, 2), dec!(0.05)),
            (d(2024, 1, 3), dec!(0.05)),
        ]
        .into_iter()
        .collect();
        let dates: Vec<NaiveDate> = series.dates().collect();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 5)]);
        assert_eq!(series.first_date(), Some(d(2024, 1, 2)));
        assert_eq!(series.last_date(), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_negative_rate_dates() {
        let series: RateSeries = vec![
            (d(2024, 1, 2), dec!(0.05)),
            (d(2024, 1, 3), dec!(-0.001)),
        ]
        .into_iter()
        .collect();
        assert_eq!(series.negative_rate_dates(), vec![d(2024, 1, 3)]);
    }

    #[test]
    fn test_deserializes_from_date_keyed_object() {
        let series: RateSeries =
            serde_json::from_str(r#"{"2024-01-02": "0.05", "2024-01-03": "0.0525"}"#).unwrap();
        assert_eq!(series.get(d(2024, 1, 3)), Some(dec!(0.0525)));
        assert!(!series.contains(d(2024, 1, 4)));
    }
}
