//! Loan products offered by a bank.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::bank::Bank;
use crate::error::{EligibilityError, ValidationError};
use crate::loan_type::LoanType;
use crate::money::Money;
use crate::rate::InterestRate;
use crate::term::Term;

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
pub struct LoanId(pub String);

impl LoanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("loan_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for LoanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A loan product. The bank is shared between all products it offers.
#[derive(Clone, Debug, Serialize)]
pub struct Loan {
    id: LoanId,
    bank: Arc<Bank>,
    loan_type: LoanType,
    rate: InterestRate,
    min_amount: Money,
    max_amount: Money,
    max_term: Term,
    eligibility_note: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn new(
        id: LoanId,
        bank: Arc<Bank>,
        loan_type: LoanType,
        rate: InterestRate,
        min_amount: Money,
        max_amount: Money,
        max_term: Term,
    ) -> Result<Self, ValidationError> {
        if !min_amount.same_currency(&max_amount) {
            return Err(ValidationError::CurrencyMismatch {
                expected: min_amount.currency().to_string(),
                actual: max_amount.currency().to_string(),
            });
        }
        if min_amount.amount() > max_amount.amount() {
            return Err(ValidationError::InvalidAmountRange {
                min: min_amount.to_string(),
                max: max_amount.to_string(),
            });
        }
        let now = Utc::now();
        Ok(Self {
            id,
            bank,
            loan_type,
            rate,
            min_amount,
            max_amount,
            max_term,
            eligibility_note: None,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.eligibility_note = (!note.trim().is_empty()).then_some(note);
        self
    }

    pub fn id(&self) -> &LoanId {
        &self.id
    }

    pub fn bank(&self) -> &Arc<Bank> {
        &self.bank
    }

    pub fn loan_type(&self) -> LoanType {
        self.loan_type
    }

    pub fn rate(&self) -> InterestRate {
        self.rate
    }

    pub fn min_amount(&self) -> &Money {
        &self.min_amount
    }

    pub fn max_amount(&self) -> &Money {
        &self.max_amount
    }

    pub fn max_term(&self) -> Term {
        self.max_term
    }

    pub fn eligibility_note(&self) -> Option<&str> {
        self.eligibility_note.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn activate(self) -> Self {
        self.with_active(true)
    }

    pub fn deactivate(self) -> Self {
        self.with_active(false)
    }

    fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self.updated_at = Utc::now().max(self.updated_at);
        self
    }

    /// Eligible iff active, `min <= amount <= max` and `term <= max_term`.
    pub fn is_eligible(&self, amount: &Money, term: Term) -> bool {
        self.check_eligibility(amount, term).is_ok()
    }

    /// Like [`Loan::is_eligible`] but says which condition failed.
    pub fn check_eligibility(&self, amount: &Money, term: Term) -> Result<(), EligibilityError> {
        if !self.active {
            return Err(EligibilityError::LoanInactive {
                loan_id: self.id.to_string(),
            });
        }
        if !amount.same_currency(&self.min_amount) {
            return Err(EligibilityError::CurrencyMismatch {
                expected: self.min_amount.currency().to_string(),
                actual: amount.currency().to_string(),
            });
        }
        if amount.amount() < self.min_amount.amount() || amount.amount() > self.max_amount.amount() {
            return Err(EligibilityError::AmountOutOfRange {
                amount: amount.to_string(),
                min: self.min_amount.to_string(),
                max: self.max_amount.to_string(),
            });
        }
        if term > self.max_term {
            return Err(EligibilityError::TermExceeded {
                term: term.months(),
                max_term: self.max_term.months(),
            });
        }
        Ok(())
    }
}
