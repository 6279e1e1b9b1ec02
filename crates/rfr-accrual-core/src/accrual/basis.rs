use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::RfrError;

/// Fixed-point rounding applied to the running factor after every
/// compounding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantization {
    pub decimal_places: u32,
    pub strategy: RoundingStrategy,
}

impl Quantization {
    /// 18 decimal places, half-up.
    pub const EIGHTEEN_DP_HALF_UP: Quantization = Quantization {
        decimal_places: 18,
        strategy: RoundingStrategy::MidpointAwayFromZero,
    };

    pub fn apply(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.decimal_places, self.strategy)
    }
}

/// RFR pricing option: carries the day-count denominator and the
/// per-step quantization rule of its compounding convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Basis {
    /// Sterling Overnight Index Average, ACT/365F
    #[default]
    #[serde(alias = "sonia", alias = "Sonia")]
    Sonia,
    /// Secured Overnight Financing Rate, ACT/360
    #[serde(alias = "sofr", alias = "Sofr")]
    Sofr,
}

impl Basis {
    /// Day-count denominator `N`.
    pub fn days(self) -> u32 {
        match self {
            Basis::Sonia => 365,
            Basis::Sofr => 360,
        }
    }

    pub fn denominator(self) -> Decimal {
        Decimal::from(self.days())
    }

    pub fn quantization(self) -> Option<Quantization> {
        match self {
            Basis::Sonia => Some(Quantization::EIGHTEEN_DP_HALF_UP),
            Basis::Sofr => None,
        }
    }

    /// Apply this basis' post-step quantization (identity when it has none).
    pub fn quantize(self, factor: Decimal) -> Decimal {
        match self.quantization() {
            Some(q) => q.apply(factor),
            None => factor,
        }
    }

    /// `days / N`
    pub fn day_count_fraction(self, days: i64) -> Decimal {
        Decimal::from(days) / self.denominator()
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Sonia => write!(f, "SONIA"),
            Basis::Sofr => write!(f, "SOFR"),
        }
    }
}

impl FromStr for Basis {
    type Err = RfrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SONIA" => Ok(Basis::Sonia),
            "SOFR" => Ok(Basis::Sofr),
            other => Err(RfrError::InvalidInput {
                field: "pricing_option".into(),
                reason: format!("unknown pricing option '{}' (expected SONIA or SOFR)", other),
            }),
        }
    }
}
