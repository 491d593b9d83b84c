//! Annual interest rate in percent (`1.95` means 1.95% a year).

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct InterestRate(Decimal);

impl InterestRate {
    pub const MAX: Decimal = Decimal::ONE_HUNDRED;

    pub fn new(rate: Decimal) -> Result<Self, ValidationError> {
        if (rate.is_sign_negative() && !rate.is_zero()) || rate > Self::MAX {
            return Err(ValidationError::RateOutOfRange {
                rate: rate.to_string(),
            });
        }
        Ok(Self(rate.round_dp_with_strategy(
            2,
            RoundingStrategy::MidpointAwayFromZero,
        )))
    }

    pub fn from_f64(rate: f64) -> Result<Self, ValidationError> {
        let decimal = Decimal::try_from(rate).map_err(|_| ValidationError::RateOutOfRange {
            rate: rate.to_string(),
        })?;
        Self::new(decimal)
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `rate / 1200`, kept unrounded for amortization.
    pub fn monthly_rate(&self) -> f64 {
        self.0.to_f64().unwrap_or_default() / 1200.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for InterestRate {
    type Error = ValidationError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        InterestRate::new(rate)
    }
}

impl From<InterestRate> for Decimal {
    fn from(rate: InterestRate) -> Self {
        rate.0
    }
}

impl fmt::Display for InterestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
