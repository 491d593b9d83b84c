//! Search pipeline: parse, validate, find eligible loans, rank

use std::sync::Arc;

use loanscout_domain::{
    CatalogError, LoanCalculator, LoanCatalog, LoanComparison, LoanType, Money, Term,
    ValidationError,
};
use loanscout_llm::{ParseOptions, ParsedQuery, QueryParserService};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::dto::{
    LoanOffer, SearchFailure, SearchFailureKind, SearchParameters, SearchRequest, SearchResponse,
    SearchResults,
};

/// Natural-language loan search over a [`LoanCatalog`].
pub struct LoanSearchService {
    parser: Arc<QueryParserService>,
    catalog: Arc<dyn LoanCatalog>,
    calculator: LoanCalculator,
    currency: String,
}

impl LoanSearchService {
    /// Amounts are interpreted in the currency from the parser's settings.
    pub fn new(parser: Arc<QueryParserService>, catalog: Arc<dyn LoanCatalog>) -> Self {
        let currency = parser.registry().settings().currency.clone();
        Self {
            parser,
            catalog,
            calculator: LoanCalculator::new(),
            currency,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn parser(&self) -> &Arc<QueryParserService> {
        &self.parser
    }

    pub fn catalog(&self) -> &Arc<dyn LoanCatalog> {
        &self.catalog
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[instrument(skip(self, request), fields(request_id = tracing::field::Empty))]
    pub async fn search_loans(&self, request: SearchRequest) -> SearchResponse {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let opts = ParseOptions {
            provider: request.provider,
            context: request.context,
        };
        let parsed = self.parser.parse_query_with(&request.query, opts).await;
        let failure = |kind: SearchFailureKind,
                       message: String,
                       missing: Vec<String>,
                       parsed: Option<ParsedQuery>| {
            warn!(%kind, %message, "search failed");
            SearchResponse::Failure(SearchFailure {
                request_id: request_id.clone(),
                query: request.query.clone(),
                kind,
                message,
                missing_fields: missing,
                parsed,
            })
        };

        let (loan_type, amount, term) = match (parsed.credit_type, parsed.amount, parsed.term) {
            (Some(loan_type), Some(amount), Some(term)) if !parsed.is_failure() => {
                (loan_type, amount, term)
            }
            _ => {
                let missing: Vec<String> =
                    parsed.missing_fields().into_iter().map(String::from).collect();
                let message = if parsed.is_failure() {
                    format!("could not interpret the query: {}", parsed.reasoning)
                } else {
                    format!("query is missing: {}", missing.join(", "))
                };
                return failure(SearchFailureKind::ParseFailure, message, missing, Some(parsed));
            }
        };

        let (amount, term) = match self.validate(amount, term) {
            Ok(values) => values,
            Err(e) => {
                return failure(SearchFailureKind::ValidationError, e.to_string(), vec![], Some(parsed))
            }
        };

        let comparison = match self.search_by_parameters(loan_type, &amount, term).await {
            Ok(comparison) => comparison,
            Err(e) => return failure(SearchFailureKind::InternalError, e.to_string(), vec![], None),
        };

        let offers: Vec<LoanOffer> = comparison
            .quotes()
            .iter()
            .enumerate()
            .map(|(i, quote)| LoanOffer::from_quote(i + 1, quote))
            .collect();
        info!(
            loan_type = %loan_type,
            amount = %amount,
            term = term.months(),
            found = offers.len(),
            provider = %parsed.provider,
            "search completed"
        );

        SearchResponse::Success(SearchResults {
            request_id,
            query: request.query,
            parameters: SearchParameters::new(loan_type, amount, term),
            total_found: offers.len(),
            potential_savings: comparison.potential_savings(),
            offers,
            provider: parsed.provider,
            confidence: parsed.confidence,
        })
    }

    /// Catalog lookup and ranking for already-structured parameters.
    pub async fn search_by_parameters(
        &self,
        loan_type: LoanType,
        amount: &Money,
        term: Term,
    ) -> Result<LoanComparison, CatalogError> {
        let eligible = self.catalog.find_eligible(loan_type, amount, term).await?;
        debug!(loan_type = %loan_type, eligible = eligible.len(), "catalog scan finished");
        Ok(self.calculator.compare_loans(&eligible, amount, term))
    }

    fn validate(&self, amount: f64, term: u32) -> Result<(Money, Term), ValidationError> {
        let amount = Money::from_f64(amount, &self.currency)?;
        let term = Term::new(i64::from(term))?;
        Ok((amount, term))
    }
}
