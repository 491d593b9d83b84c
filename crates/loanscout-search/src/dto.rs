//! Request and response types for loan search

use loanscout_domain::{InterestRate, LoanQuote, LoanType, Money, Term};
use loanscout_llm::{LanguageContext, ParsedQuery, ProviderKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Force a provider instead of the current selection.
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    #[serde(default)]
    pub context: Option<LanguageContext>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_context(mut self, context: LanguageContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Outcome of a search. Failures are data, not errors.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResponse {
    Success(SearchResults),
    Failure(SearchFailure),
}

impl SearchResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn results(&self) -> Option<&SearchResults> {
        match self {
            Self::Success(results) => Some(results),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SearchFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// Parameters the search actually ran with.
#[derive(Debug, Clone, Serialize)]
pub struct SearchParameters {
    pub loan_type: LoanType,
    pub label: String,
    pub amount: Money,
    pub term_months: u32,
    pub term_years: f64,
}

impl SearchParameters {
    pub fn new(loan_type: LoanType, amount: Money, term: Term) -> Self {
        Self {
            loan_type,
            label: loan_type.label().to_string(),
            amount,
            term_months: term.months(),
            term_years: term.years(),
        }
    }
}

/// One ranked loan.
#[derive(Debug, Clone, Serialize)]
pub struct LoanOffer {
    /// 1-based; 1 is the cheapest by total payment.
    pub rank: usize,
    pub loan_id: String,
    pub bank_name: String,
    pub loan_type: LoanType,
    pub label: String,
    pub rate: InterestRate,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub note: Option<String>,
}

impl LoanOffer {
    pub fn from_quote(rank: usize, quote: &LoanQuote) -> Self {
        let loan = &quote.loan;
        Self {
            rank,
            loan_id: loan.id().to_string(),
            bank_name: loan.bank().name().to_string(),
            loan_type: loan.loan_type(),
            label: loan.loan_type().label().to_string(),
            rate: loan.rate(),
            monthly_payment: quote.payment.monthly_payment.clone(),
            total_payment: quote.payment.total_payment.clone(),
            total_interest: quote.payment.total_interest.clone(),
            note: loan.eligibility_note().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub request_id: String,
    pub query: String,
    pub parameters: SearchParameters,
    pub offers: Vec<LoanOffer>,
    pub total_found: usize,
    /// Difference in total payment between the dearest and cheapest offer.
    pub potential_savings: Option<Money>,
    pub provider: String,
    pub confidence: f64,
}

impl SearchResults {
    pub fn best_offer(&self) -> Option<&LoanOffer> {
        self.offers.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailureKind {
    /// The query could not be turned into type, amount and term.
    ParseFailure,
    /// Parsed values were out of range.
    ValidationError,
    /// A collaborator failed.
    InternalError,
}

impl std::fmt::Display for SearchFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailure => write!(f, "parse_failure"),
            Self::ValidationError => write!(f, "validation_error"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchFailure {
    pub request_id: String,
    pub query: String,
    pub kind: SearchFailureKind,
    pub message: String,
    /// Fields the parse did not produce; empty unless `kind` is `ParseFailure`.
    pub missing_fields: Vec<String>,
    pub parsed: Option<ParsedQuery>,
}
