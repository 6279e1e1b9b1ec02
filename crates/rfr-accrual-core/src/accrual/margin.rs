//! Simple-interest margin and CAS legs, with an optional single margin step.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accrual::basis::Basis;
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Margin terms of the facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginSchedule {
    /// Margin in force from the start of the period (m1)
    pub initial: Rate,
    /// Margin after the step (m2); defaults to `initial`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Rate>,
    /// First day on which `after` applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_date: Option<NaiveDate>,
}

impl MarginSchedule {
    pub fn flat(margin: Rate) -> Self {
        MarginSchedule {
            initial: margin,
            after: None,
            change_date: None,
        }
    }

    pub fn stepped(initial: Rate, after: Rate, change_date: NaiveDate) -> Self {
        MarginSchedule {
            initial,
            after: Some(after),
            change_date: Some(change_date),
        }
    }

    fn after_or_initial(&self) -> Rate {
        self.after.unwrap_or(self.initial)
    }
}

/// Where the margin step falls relative to the accrual period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginStep {
    /// No change date supplied
    None,
    /// Change date on or before the start: post-step margin throughout
    InForce,
    /// Change date on or after the end: step has no effect
    Ignored,
    /// Change date strictly inside the period
    Split,
}

/// Day counts and margins either side of the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginSplit {
    pub step: MarginStep,
    /// Calendar days in the period
    pub dc: i64,
    pub pre_days: i64,
    pub post_days: i64,
    pub pre_margin: Rate,
    pub post_margin: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    pub dcf_total: Decimal,
    pub dcf_pre: Decimal,
    pub dcf_post: Decimal,
}

/// Reported margin legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginBreakdown {
    pub pre: MarginLeg,
    pub post: MarginLeg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginLeg {
    pub days: i64,
    pub margin_pa: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Split `[start, end)` around the schedule's change date. The change date
/// itself accrues at the post-step margin.
pub fn split_margin(
    schedule: &MarginSchedule,
    start: NaiveDate,
    end: NaiveDate,
    basis: Basis,
) -> MarginSplit {
    let dc = (end - start).num_days();
    let m1 = schedule.initial;

    let (step, pre_days, post_days, pre_margin, post_margin) = match schedule.change_date {
        None => (MarginStep::None, 0, dc, m1, m1),
        Some(change) if change <= start => {
            let m2 = schedule.after_or_initial();
            (MarginStep::InForce, 0, dc, m2, m2)
        }
        Some(change) if change >= end => (MarginStep::Ignored, dc, 0, m1, m1),
        Some(change) => (
            MarginStep::Split,
            (change - start).num_days(),
            (end - change).num_days(),
            m1,
            schedule.after_or_initial(),
        ),
    };

    MarginSplit {
        step,
        dc,
        pre_days,
        post_days,
        pre_margin,
        post_margin,
        effective_date: schedule.change_date,
        dcf_total: basis.day_count_fraction(dc),
        dcf_pre: basis.day_count_fraction(pre_days),
        dcf_post: basis.day_count_fraction(post_days),
    }
}

impl MarginSplit {
    /// `m1 * DCF_pre + m2 * DCF_post`
    fn weighted_fraction(&self) -> Decimal {
        self.pre_margin * self.dcf_pre + self.post_margin * self.dcf_post
    }

    pub fn margin_interest(&self, principal: Money) -> Money {
        self.weighted_fraction() * principal
    }

    pub fn cas_interest(&self, cas: Rate, principal: Money) -> Money {
        cas * self.dcf_total * principal
    }

    /// Day-weighted margin, absent for an empty period.
    pub fn weighted_margin(&self) -> Option<Rate> {
        if self.dcf_total.is_zero() {
            None
        } else {
            Some(self.weighted_fraction() / self.dcf_total)
        }
    }

    pub fn breakdown(&self) -> MarginBreakdown {
        MarginBreakdown {
            pre: MarginLeg {
                days: self.pre_days,
                margin_pa: self.pre_margin,
                effective_date: None,
            },
            post: MarginLeg {
                days: self.post_days,
                margin_pa: self.post_margin,
                effective_date: self.effective_date,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const PRINCIPAL: Decimal = dec!(1000000);

    fn assert_close(actual: Decimal, expected: Decimal) {
        let diff = (actual - expected).abs();
        assert!(
            diff < dec!(0.000000000000000001),
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_flat_margin() {
        let split = split_margin(
            &MarginSchedule::flat(dec!(0.02)),
            d(2024, 1, 1),
            d(2024, 4, 1),
            Basis::Sofr,
        );
        assert_eq!(split.step, MarginStep::None);
        assert_eq!(split.dc, 91);
        assert_eq!((split.pre_days, split.post_days), (0, 91));
        // 0.02 * 91/360 * 1m
        assert_eq!(
            split.margin_interest(PRINCIPAL),
            dec!(0.02) * (dec!(91) / dec!(360)) * PRINCIPAL
        );
        assert_close(split.weighted_margin().unwrap(), dec!(0.02));
    }

    #[test]
    fn test_mid_period_step() {
        let split = split_margin(
            &MarginSchedule::stepped(dec!(0.02), dec!(0.03), d(2024, 1, 11)),
            d(2024, 1, 1),
            d(2024, 1, 31),
            Basis::Sonia,
        );
        assert_eq!(split.step, MarginStep::Split);
        assert_eq!(split.pre_days, 10);
        assert_eq!(split.post_days, 20);
        assert_eq!(split.pre_days + split.post_days, split.dc);

        let expected = (dec!(0.02) * (dec!(10) / dec!(365))
            + dec!(0.03) * (dec!(20) / dec!(365)))
            * PRINCIPAL;
        assert_eq!(split.margin_interest(PRINCIPAL), expected);

        // (0.02 * 10 + 0.03 * 20) / 30
        assert_close(
            split.weighted_margin().unwrap(),
            dec!(0.0266666666666666666666666667),
        );
    }

    #[test]
    fn test_step_on_or_before_start_in_force() {
        for change in [d(2023, 12, 1), d(2024, 1, 1)] {
            let split = split_margin(
                &MarginSchedule::stepped(dec!(0.02), dec!(0.03), change),
                d(2024, 1, 1),
                d(2024, 1, 31),
                Basis::Sofr,
            );
            assert_eq!(split.step, MarginStep::InForce);
            assert_eq!((split.pre_days, split.post_days), (0, 30));
            assert_eq!(split.pre_margin, dec!(0.03));
            assert_eq!(
                split.margin_interest(PRINCIPAL),
                dec!(0.03) * split.dcf_total * PRINCIPAL
            );
        }
    }

    #[test]
    fn test_step_on_or_after_end_ignored() {
        let flat = split_margin(
            &MarginSchedule::flat(dec!(0.02)),
            d(2024, 1, 1),
            d(2024, 1, 31),
            Basis::Sofr,
        );
        for change in [d(2024, 1, 31), d(2024, 6, 1)] {
            let split = split_margin(
                &MarginSchedule::stepped(dec!(0.02), dec!(0.03), change),
                d(2024, 1, 1),
                d(2024, 1, 31),
                Basis::Sofr,
            );
            assert_eq!(split.step, MarginStep::Ignored);
            assert_eq!((split.pre_days, split.post_days), (30, 0));
            assert_eq!(split.post_margin, dec!(0.02));
            assert_eq!(split.margin_interest(PRINCIPAL), flat.margin_interest(PRINCIPAL));
        }
    }

    #[test]
    fn test_change_date_without_after_keeps_initial() {
        let schedule = MarginSchedule {
            initial: dec!(0.025),
            after: None,
            change_date: Some(d(2024, 1, 15)),
        };
        let split = split_margin(&schedule, d(2024, 1, 1), d(2024, 1, 31), Basis::Sonia);
        assert_eq!(split.post_margin, dec!(0.025));
        assert_close(split.weighted_margin().unwrap(), dec!(0.025));
    }

    #[test]
    fn test_cas_interest() {
        let split = split_margin(
            &MarginSchedule::flat(Decimal::ZERO),
            d(2024, 1, 1),
            d(2024, 4, 1),
            Basis::Sonia,
        );
        assert_eq!(
            split.cas_interest(dec!(0.001193), PRINCIPAL),
            dec!(0.001193) * (dec!(91) / dec!(365)) * PRINCIPAL
        );
    }

    #[test]
    fn test_breakdown_reports_effective_date_on_post_leg() {
        let split = split_margin(
            &MarginSchedule::stepped(dec!(0.02), dec!(0.03), d(2024, 1, 11)),
            d(2024, 1, 1),
            d(2024, 1, 31),
            Basis::Sonia,
        );
        let breakdown = split.breakdown();
        assert_eq!(breakdown.pre.days, 10);
        assert_eq!(breakdown.pre.effective_date, None);
        assert_eq!(breakdown.post.margin_pa, dec!(0.03));
        assert_eq!(breakdown.post.effective_date, Some(d(2024, 1, 11)));
    }
}
