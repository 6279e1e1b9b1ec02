use clap::Args;
use serde_json::Value;

use rfr_accrual_core::accrual::{self, AccrualResult};

use crate::input;
use crate::input::rates::AccrualRequest;
use crate::output::money::round_money;

/// Arguments for a compounded-in-arrears accrual
#[derive(Args)]
pub struct AccrueArgs {
    /// Path to JSON request file (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Rate file (.json array of {date, rate} or date,rate CSV); replaces request rates
    #[arg(long)]
    pub rates: Option<String>,

    /// Include the per-calendar-day trace
    #[arg(long)]
    pub daily_details: bool,

    /// Report interest amounts unrounded instead of to 2 dp
    #[arg(long)]
    pub full_precision: bool,
}

pub fn run_accrue(args: AccrueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: AccrualRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_json::<AccrualRequest>()? {
        request
    } else {
        return Err("--input file or a JSON request on stdin is required".into());
    };

    let rates = args
        .rates
        .as_deref()
        .map(input::rates::load_rates_file)
        .transpose()?;

    let mut accrual_input = request.into_input(rates)?;
    accrual_input.emit_daily_details |= args.daily_details;

    let mut output = accrual::accrue(&accrual_input)?;
    if !args.full_precision {
        round_amounts(&mut output.result);
    }
    Ok(serde_json::to_value(output)?)
}

/// Money fields go to 2 dp; the factor and rates keep full precision.
fn round_amounts(result: &mut AccrualResult) {
    result.interest_total = round_money(result.interest_total);
    result.interest_rfr = round_money(result.interest_rfr);
    result.interest_margin = round_money(result.interest_margin);
    result.interest_cas = round_money(result.interest_cas);
}
