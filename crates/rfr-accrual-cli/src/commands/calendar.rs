use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use rfr_accrual_core::calendar::{BusinessDayIndex, Lookback, LookbackResolver};
use rfr_accrual_core::RfrError;

use crate::input;

/// Arguments for resolving the observation date of a single day
#[derive(Args)]
pub struct ObservationArgs {
    /// Rate file (.json array of {date, rate} or date,rate CSV)
    #[arg(long)]
    pub rates: String,

    /// Calendar date to resolve (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Lookback in business days
    #[arg(long, default_value_t = 5, allow_hyphen_values = true)]
    pub lookback: i64,
}

pub fn run_observation(args: ObservationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series = input::rates::load_rates_file(&args.rates)?;
    let index = BusinessDayIndex::from_series(&series)?;
    let lookback = Lookback::new(args.lookback)?;
    let resolver = LookbackResolver::new(&index, lookback);

    let business_day = index.previous_business_day(args.date)?;
    let observation_date = resolver.resolve(business_day)?;
    let rate = series
        .get(observation_date)
        .ok_or(RfrError::MissingRate(observation_date))?;

    Ok(json!({
        "result": {
            "date": args.date,
            "business_day": business_day,
            "is_business_day": index.is_business_day(args.date),
            "observation_date": observation_date,
            "rate": rate,
            "lookback": lookback.days(),
            "series_start": index.earliest(),
            "series_end": index.latest(),
        }
    }))
}
