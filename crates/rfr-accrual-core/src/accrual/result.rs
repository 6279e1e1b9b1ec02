//! Combines the compounded factor and the margin/CAS legs into the reported
//! accrual.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accrual::basis::Basis;
use crate::accrual::compounding::DailyDetailRecord;
use crate::accrual::margin::{MarginBreakdown, MarginSplit};
use crate::types::{Money, Rate};

/// Full-precision accrual for one period. Monetary rounding is left to the
/// caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualResult {
    pub interest_total: Money,
    pub interest_rfr: Money,
    pub interest_margin: Money,
    pub interest_cas: Money,
    pub compounded_factor: Decimal,
    /// `(C - 1) * N / dc`
    pub rfr_annualized: Rate,
    /// Annualized RFR plus day-weighted margin plus CAS
    pub applicable_annualized_rate: Rate,
    /// Calendar days in the period
    pub dc: i64,
    /// Day-count denominator
    #[serde(rename = "N")]
    pub basis_days: u32,
    pub margin_breakdown: MarginBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_details: Option<Vec<DailyDetailRecord>>,
}

pub fn assemble_result(
    principal: Money,
    compounded_factor: Decimal,
    basis: Basis,
    split: &MarginSplit,
    cas: Rate,
    daily_details: Option<Vec<DailyDetailRecord>>,
) -> AccrualResult {
    let growth = compounded_factor - Decimal::ONE;

    let interest_rfr = growth * principal;
    let interest_margin = split.margin_interest(principal);
    let interest_cas = split.cas_interest(cas, principal);
    let interest_total = interest_rfr + interest_margin + interest_cas;

    let rfr_annualized = if split.dc > 0 {
        growth * (basis.denominator() / Decimal::from(split.dc))
    } else {
        Decimal::ZERO
    };
    let applicable_annualized_rate =
        rfr_annualized + split.weighted_margin().unwrap_or(Decimal::ZERO) + cas;

    AccrualResult {
        interest_total,
        interest_rfr,
        interest_margin,
        interest_cas,
        compounded_factor,
        rfr_annualized,
        applicable_annualized_rate,
        dc: split.dc,
        basis_days: basis.days(),
        margin_breakdown: split.breakdown(),
        daily_details,
    }
}
