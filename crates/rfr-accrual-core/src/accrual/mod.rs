//! Compounded-in-arrears interest for a single accrual period.
//!
//! [`compute`] validates the request, builds the business-day index from the
//! rate series, walks the period in compounding blocks (collecting the daily
//! trace in the same pass when asked to), splits margin around the optional
//! step and assembles the result. [`accrue`] wraps the same computation in the
//! standard output envelope.

pub mod basis;
pub mod compounding;
pub mod margin;
pub mod result;

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calendar::{BusinessDayIndex, Lookback, RateSeries};
use crate::error::RfrError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RfrResult;

pub use basis::{Basis, Quantization};
pub use compounding::{
    compounded_factor, AccrualBlock, AccrualBlocks, DailyDetailRecord, DailyDetails,
};
pub use margin::{split_margin, MarginBreakdown, MarginLeg, MarginSchedule, MarginSplit, MarginStep};
pub use result::{assemble_result, AccrualResult};

fn default_lookback() -> i64 {
    5
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single accrual request. Rates, margin and CAS are decimals (0.05 = 5%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualInput {
    pub principal: Money,
    /// First accruing day
    pub start_date: NaiveDate,
    /// Exclusive end of the period
    pub end_date: NaiveDate,
    #[serde(default)]
    pub pricing_option: Basis,
    /// Lookback in business days (>= 1)
    #[serde(default = "default_lookback")]
    pub lookback: i64,
    pub rates: RateSeries,
    #[serde(default)]
    pub margin: Rate,
    #[serde(default)]
    pub cas: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_change_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_after: Option<Rate>,
    #[serde(default)]
    pub emit_daily_details: bool,
}

impl AccrualInput {
    pub fn margin_schedule(&self) -> MarginSchedule {
        MarginSchedule {
            initial: self.margin,
            after: self.margin_after,
            change_date: self.margin_change_date,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute compounded-in-arrears interest plus margin and CAS for one period.
pub fn compute(input: &AccrualInput) -> RfrResult<AccrualResult> {
    let start = input.start_date;
    let end = input.end_date;
    let basis = input.pricing_option;

    if end <= start {
        return Err(RfrError::InvalidPeriod { start, end });
    }
    let lookback = Lookback::new(input.lookback)?;
    let index = BusinessDayIndex::from_series(&input.rates)?;

    info!(
        %start,
        %end,
        %basis,
        lookback = lookback.days(),
        business_days = index.len(),
        "accruing period"
    );

    let blocks = AccrualBlocks::new(&input.rates, &index, start, end, lookback, basis)?;
    let (factor, daily_details) = if input.emit_daily_details {
        let mut details = blocks.daily_details();
        let records = details.by_ref().collect::<RfrResult<Vec<_>>>()?;
        (details.factor(), Some(records))
    } else {
        (blocks.run()?, None)
    };

    let split = split_margin(&input.margin_schedule(), start, end, basis);
    let result = assemble_result(input.principal, factor, basis, &split, input.cas, daily_details);

    info!(
        factor = %result.compounded_factor,
        interest_total = %result.interest_total,
        "accrual complete"
    );
    Ok(result)
}

/// [`compute`] wrapped in the standard envelope, with warnings for inputs
/// that are accepted but probably unintended.
pub fn accrue(input: &AccrualInput) -> RfrResult<ComputationOutput<AccrualResult>> {
    let started = Instant::now();
    let warnings = input_warnings(input);
    for w in &warnings {
        warn!("{}", w);
    }

    let result = compute(input)?;

    let quantization = match input.pricing_option.quantization() {
        Some(q) => format!("{} dp, half-up, after every step", q.decimal_places),
        None => "none".to_string(),
    };

    let elapsed = started.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "RFR compounded in arrears, business-day lookback without observation shift",
        &serde_json::json!({
            "pricing_option": input.pricing_option,
            "day_count": format!("ACT/{}", input.pricing_option.days()),
            "lookback_business_days": input.lookback,
            "factor_quantization": quantization,
            "margin_and_cas": "simple interest on the full period",
            "margin_step_boundary": "change date accrues at the post-step margin",
        }),
        warnings,
        elapsed,
        result,
    ))
}

fn input_warnings(input: &AccrualInput) -> Vec<String> {
    let mut warnings = Vec::new();

    let negative = input.rates.negative_rate_dates();
    if let Some(first) = negative.first() {
        warnings.push(format!(
            "{} negative fixing(s) in the rate series (first on {})",
            negative.len(),
            first
        ));
    }

    if input.principal < Decimal::ZERO {
        warnings.push("Principal is negative; interest amounts will be negative".into());
    }

    match (input.margin_change_date, input.margin_after) {
        (None, Some(_)) => {
            warnings.push("margin_after supplied without margin_change_date; ignored".into())
        }
        (Some(_), None) => warnings
            .push("margin_change_date supplied without margin_after; margin unchanged".into()),
        (Some(change), Some(_)) if change <= input.start_date => warnings.push(format!(
            "Margin change date {} is on or before the start date; post-step margin applies throughout",
            change
        )),
        (Some(change), Some(_)) if change >= input.end_date => warnings.push(format!(
            "Margin change date {} is on or after the end date; margin step ignored",
            change
        )),
        _ => {}
    }

    warnings
}
