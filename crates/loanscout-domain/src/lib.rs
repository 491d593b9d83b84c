//! LoanScout domain - value objects, entities, amortization and the loan catalog
//!
//! Every value object validates on construction, so a `Money`, `Term`,
//! `InterestRate` or `Loan` that exists is always well-formed.

pub mod bank;
pub mod calculation;
pub mod catalog;
pub mod error;
pub mod loan;
pub mod loan_type;
pub mod money;
pub mod rate;
pub mod term;

pub use bank::{Bank, BankId};
pub use calculation::{amortized_payment, LoanCalculator, LoanComparison, LoanQuote, PaymentBreakdown};
pub use catalog::{InMemoryCatalog, LoanCatalog};
pub use error::{CatalogError, DomainError, EligibilityError, ValidationError};
pub use loan::{Loan, LoanId};
pub use loan_type::{fold_keyword, LoanType};
pub use money::{Money, DEFAULT_CURRENCY};
pub use rate::InterestRate;
pub use term::Term;
