//! Loan term in months.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A repayment term between 1 and [`Term::MAX_MONTHS`] months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Term(u32);

impl Term {
    /// Thirty years.
    pub const MAX_MONTHS: u32 = 360;

    pub fn new(months: i64) -> Result<Self, ValidationError> {
        if months < 1 || months > Self::MAX_MONTHS as i64 {
            return Err(ValidationError::TermOutOfRange {
                months,
                max: Self::MAX_MONTHS,
            });
        }
        Ok(Self(months as u32))
    }

    pub fn from_years(years: u32) -> Result<Self, ValidationError> {
        Self::new(years as i64 * 12)
    }

    #[inline]
    pub fn months(&self) -> u32 {
        self.0
    }

    /// Term in years, rounded to two decimals.
    pub fn years(&self) -> f64 {
        (self.0 as f64 / 12.0 * 100.0).round() / 100.0
    }
}

impl TryFrom<i64> for Term {
    type Error = ValidationError;

    fn try_from(months: i64) -> Result<Self, Self::Error> {
        Term::new(months)
    }
}

impl From<Term> for u32 {
    fn from(term: Term) -> Self {
        term.0
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} months", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bounds() {
        assert!(Term::new(0).is_err());
        assert!(Term::new(-12).is_err());
        assert!(Term::new(361).is_err());
        assert_eq!(Term::new(1).unwrap().months(), 1);
        assert_eq!(Term::new(360).unwrap().months(), 360);
    }

    #[test]
    fn test_years() {
        assert_eq!(Term::new(48).unwrap().years(), 4.0);
        assert_eq!(Term::new(18).unwrap().years(), 1.5);
        assert_eq!(Term::new(10).unwrap().years(), 0.83);
        assert_eq!(Term::from_years(30).unwrap().months(), 360);
        assert!(Term::from_years(31).is_err());
    }

    #[test]
    fn test_serde_uses_plain_months() {
        let term = Term::new(60).unwrap();
        assert_eq!(serde_json::to_string(&term).unwrap(), "60");
        assert!(serde_json::from_str::<Term>("400").is_err());
    }

    proptest! {
        #[test]
        fn years_are_rounded_months_over_twelve(months in 1i64..=360) {
            let term = Term::new(months).unwrap();
            let expected = ((months as f64 / 12.0) * 100.0).round() / 100.0;
            prop_assert_eq!(term.years(), expected);
        }

        #[test]
        fn out_of_range_terms_rejected(months in prop_oneof![i64::MIN..=0, 361i64..i64::MAX]) {
            prop_assert!(Term::new(months).is_err());
        }
    }
}
