//! Currency-tagged monetary amounts.
//!
//! Amounts are stored as [`Decimal`] rounded to two places at construction.
//! Calculations that need floating point (amortization) work on `f64` and only
//! come back through [`Money::from_f64`], which is where rounding happens.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default currency for catalog products and parsed queries.
pub const DEFAULT_CURRENCY: &str = "TRY";

/// A non-negative amount in a specific currency.
///
/// ```
/// use loanscout_domain::Money;
///
/// let a = Money::from_f64(1_000.0061, "try").unwrap();
/// assert_eq!(a.to_string(), "1000.01 TRY");
/// assert!(Money::from_f64(-1.0, "TRY").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr")]
pub struct Money {
    amount: Decimal,
    currency: String,
}

#[derive(Deserialize)]
struct MoneyRepr {
    amount: Decimal,
    currency: String,
}

impl TryFrom<MoneyRepr> for Money {
    type Error = ValidationError;

    fn try_from(repr: MoneyRepr) -> Result<Self, Self::Error> {
        Money::new(repr.amount, &repr.currency)
    }
}

impl Money {
    /// Number of decimal places kept for every currency.
    pub const PRECISION: u32 = 2;

    pub fn new(amount: Decimal, currency: &str) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::NegativeAmount {
                amount: amount.to_string(),
            });
        }
        let currency = normalize_currency(currency)?;
        let mut amount =
            amount.round_dp_with_strategy(Self::PRECISION, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(Self::PRECISION);
        Ok(Self { amount, currency })
    }

    /// Build from a floating point value, rounding half away from zero to 2 places.
    pub fn from_f64(amount: f64, currency: &str) -> Result<Self, ValidationError> {
        if !amount.is_finite() {
            return Err(ValidationError::InvalidAmount(amount.to_string()));
        }
        if amount < 0.0 {
            return Err(ValidationError::NegativeAmount {
                amount: amount.to_string(),
            });
        }
        let decimal = Decimal::from_f64_retain(amount)
            .ok_or_else(|| ValidationError::InvalidAmount(amount.to_string()))?;
        Self::new(decimal, currency)
    }

    pub fn zero(currency: &str) -> Result<Self, ValidationError> {
        Self::new(Decimal::ZERO, currency)
    }

    #[inline]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    #[inline]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Amount as `f64`, for feeding into amortization math.
    pub fn to_f64(&self) -> f64 {
        self.amount.to_f64().unwrap_or_default()
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    pub fn checked_add(&self, rhs: &Money) -> Result<Money, ValidationError> {
        self.ensure_same_currency(rhs)?;
        let sum = self
            .amount
            .checked_add(rhs.amount)
            .ok_or_else(|| ValidationError::InvalidAmount("amount overflow".to_string()))?;
        Money::new(sum, &self.currency)
    }

    /// Fails if the currencies differ or the result would be negative.
    pub fn checked_sub(&self, rhs: &Money) -> Result<Money, ValidationError> {
        self.ensure_same_currency(rhs)?;
        Money::new(self.amount - rhs.amount, &self.currency)
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), ValidationError> {
        if self.same_currency(other) {
            Ok(())
        } else {
            Err(ValidationError::CurrencyMismatch {
                expected: self.currency.clone(),
                actual: other.currency.clone(),
            })
        }
    }
}

fn normalize_currency(code: &str) -> Result<String, ValidationError> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(ValidationError::InvalidCurrency {
            code: code.to_string(),
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
