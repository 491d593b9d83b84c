//! Domain error types.

use thiserror::Error;

/// Raised when a value object or entity is constructed from invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must not be negative: {amount}")]
    NegativeAmount { amount: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid currency code '{code}' (expected 3 letters)")]
    InvalidCurrency { code: String },

    #[error("term must be between 1 and {max} months, got {months}")]
    TermOutOfRange { months: i64, max: u32 },

    #[error("interest rate must be between 0 and 100, got {rate}")]
    RateOutOfRange { rate: String },

    #[error("minimum amount {min} exceeds maximum amount {max}")]
    InvalidAmountRange { min: String, max: String },

    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("unknown loan type: '{0}'")]
    UnknownLoanType(String),
}

/// Why a loan does not apply to a requested amount and term.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityError {
    #[error("loan {loan_id} is not active")]
    LoanInactive { loan_id: String },

    #[error("amount {amount} is outside the allowed range {min} - {max}")]
    AmountOutOfRange {
        amount: String,
        min: String,
        max: String,
    },

    #[error("term of {term} months exceeds the maximum of {max_term} months")]
    TermExceeded { term: u32, max_term: u32 },

    #[error("loan is offered in {expected}, requested amount is in {actual}")]
    CurrencyMismatch { expected: String, actual: String },
}

/// All errors that can occur in the LoanScout domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("eligibility error: {0}")]
    Eligibility(#[from] EligibilityError),
}

/// Errors surfaced by a [`crate::catalog::LoanCatalog`] implementation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("loan not found: {0}")]
    NotFound(String),

    #[error("catalog storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
