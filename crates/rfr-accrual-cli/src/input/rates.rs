//! Turns loosely formatted requests and rate files into the normalized
//! [`AccrualInput`] the core expects.
//!
//! Rate feeds arrive either as `{date, rate}` arrays or as CSV text, in
//! percent (5.19) or decimal (0.0519) form. Any value above 1 is taken as a
//! percentage. The same rule applies to margin, CAS and the stepped margin.

use std::error::Error;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;

use rfr_accrual_core::accrual::{AccrualInput, Basis};
use rfr_accrual_core::calendar::RateSeries;
use rfr_accrual_core::RateObservation;

use crate::input::file::{self, RateFileFormat};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d %b %Y", "%d-%b-%Y"];

fn default_lookback() -> i64 {
    5
}

/// An accrual request as callers write it: rates may be percentages and may
/// be given inline, as CSV text, or left for `--rates`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualRequest {
    pub principal: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub pricing_option: Basis,
    #[serde(default = "default_lookback")]
    pub lookback: i64,
    #[serde(default)]
    pub rates: Vec<RateObservation>,
    #[serde(default)]
    pub rates_csv: Option<String>,
    #[serde(default)]
    pub margin: Option<Decimal>,
    #[serde(default)]
    pub cas: Option<Decimal>,
    #[serde(default)]
    pub margin_change_date: Option<NaiveDate>,
    #[serde(default)]
    pub margin_after: Option<Decimal>,
    #[serde(default, alias = "emit_daily_details")]
    pub return_daily_details: bool,
}

impl AccrualRequest {
    /// Normalize into core input. `rates_override` (from `--rates`) wins over
    /// anything embedded in the request.
    pub fn into_input(
        self,
        rates_override: Option<RateSeries>,
    ) -> Result<AccrualInput, Box<dyn Error>> {
        let rates = match (rates_override, self.rates_csv) {
            (Some(series), _) => series,
            (None, Some(csv_text)) => parse_rates_csv(&csv_text)?,
            (None, None) => normalize_observations(self.rates),
        };

        Ok(AccrualInput {
            principal: self.principal,
            start_date: self.start_date,
            end_date: self.end_date,
            pricing_option: self.pricing_option,
            lookback: self.lookback,
            rates,
            margin: self.margin.map(normalize_rate).unwrap_or(Decimal::ZERO),
            cas: self.cas.map(normalize_rate).unwrap_or(Decimal::ZERO),
            margin_change_date: self.margin_change_date,
            margin_after: self.margin_after.map(normalize_rate),
            emit_daily_details: self.return_daily_details,
        })
    }
}

/// Percent-or-decimal detection: values above 1 are percentages.
pub fn normalize_rate(value: Decimal) -> Decimal {
    if value > Decimal::ONE {
        value / dec!(100)
    } else {
        value
    }
}

pub fn normalize_observations(observations: Vec<RateObservation>) -> RateSeries {
    let (series, percent_rows) = rescale_percentages(observations);
    debug!(
        fixings = series.len(),
        percent_rows,
        "normalized rate observations"
    );
    series
}

/// Series in decimal form plus the number of rows that were percentages.
fn rescale_percentages(observations: Vec<RateObservation>) -> (RateSeries, usize) {
    let percent_rows = observations
        .iter()
        .filter(|obs| obs.rate > Decimal::ONE)
        .count();
    let series = RateSeries::from_observations(observations.into_iter().map(|obs| {
        RateObservation {
            date: obs.date,
            rate: normalize_rate(obs.rate),
        }
    }));
    (series, percent_rows)
}

/// Load a rate series from a `.json` array or a CSV file.
pub fn load_rates_file(path: &str) -> Result<RateSeries, Box<dyn Error>> {
    let format = RateFileFormat::from_path(path);
    debug!(path, ?format, "loading rate file");
    match format {
        RateFileFormat::Json => {
            let observations: Vec<RateObservation> = file::read_json(path)?;
            Ok(normalize_observations(observations))
        }
        RateFileFormat::Csv => parse_rates_csv(&file::read_text(path)?),
    }
}

/// Parse `date,rate` CSV text. A first row whose date does not parse is
/// treated as a header; blank rows are skipped; a trailing `%` on the rate is
/// allowed.
pub fn parse_rates_csv(text: &str) -> Result<RateSeries, Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut observations = Vec::new();
    let mut header_skipped = false;
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = i + 1;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let (Some(date_field), Some(rate_field)) = (record.get(0), record.get(1)) else {
            return Err(format!("line {}: expected 'date,rate'", line).into());
        };

        let date = match parse_date(date_field) {
            Some(date) => date,
            None if i == 0 => {
                header_skipped = true;
                continue;
            }
            None => {
                return Err(format!("line {}: unrecognised date '{}'", line, date_field).into())
            }
        };
        let rate = Decimal::from_str(rate_field.trim_end_matches('%').trim())
            .map_err(|e| format!("line {}: invalid rate '{}': {}", line, rate_field, e))?;

        observations.push(RateObservation { date, rate });
    }

    debug!(rows = observations.len(), header_skipped, "parsed rate CSV");
    Ok(normalize_observations(observations))
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text.trim(), fmt).ok())
}
