use std::sync::Arc;

use async_trait::async_trait;
use loanscout_domain::{
    Bank, BankId, CatalogError, InMemoryCatalog, InterestRate, Loan, LoanCatalog, LoanId, LoanType,
    Money, Term,
};
use loanscout_llm::{AiSettings, ProviderKind, ProviderRegistry, QueryParserService, StaticCredentials};
use loanscout_search::{LoanSearchService, SearchFailureKind, SearchRequest};
use rust_decimal_macros::dec;

fn try_money(amount: i64) -> Money {
    Money::new(amount.into(), "TRY").unwrap()
}

fn catalog() -> InMemoryCatalog {
    let ziraat = Arc::new(Bank::new(BankId::new("ziraat"), "Ziraat Bankası").unwrap());
    let garanti = Arc::new(Bank::new(BankId::new("garanti"), "Garanti BBVA").unwrap());

    InMemoryCatalog::with_loans(vec![
        Loan::new(
            LoanId::new("garanti-konut"),
            garanti.clone(),
            LoanType::Housing,
            InterestRate::new(dec!(2.49)).unwrap(),
            try_money(100_000),
            try_money(5_000_000),
            Term::new(240).unwrap(),
        )
        .unwrap(),
        Loan::new(
            LoanId::new("ziraat-konut"),
            ziraat,
            LoanType::Housing,
            InterestRate::new(dec!(1.95)).unwrap(),
            try_money(150_000),
            try_money(8_000_000),
            Term::new(360).unwrap(),
        )
        .unwrap()
        .with_note("Devlet destekli"),
        Loan::new(
            LoanId::new("garanti-tasit"),
            garanti,
            LoanType::Vehicle,
            InterestRate::new(dec!(3.19)).unwrap(),
            try_money(50_000),
            try_money(2_000_000),
            Term::new(48).unwrap(),
        )
        .unwrap(),
    ])
}

/// No API keys, so every query goes through the keyword heuristic.
fn parser() -> Arc<QueryParserService> {
    Arc::new(QueryParserService::new(ProviderRegistry::new(
        AiSettings::default(),
        Arc::new(StaticCredentials::new()),
    )))
}

fn service() -> LoanSearchService {
    LoanSearchService::new(parser(), Arc::new(catalog()))
}

#[tokio::test]
async fn housing_query_returns_ranked_offers() {
    let response = service()
        .search_loans(SearchRequest::new("2 milyon 60 ay konut kredisi"))
        .await;
    let results = response.results().expect("search should succeed");

    assert_eq!(results.parameters.loan_type, LoanType::Housing);
    assert_eq!(results.parameters.amount, try_money(2_000_000));
    assert_eq!(results.parameters.term_months, 60);
    assert_eq!(results.parameters.term_years, 5.0);
    assert_eq!(results.total_found, 2);
    assert_eq!(results.provider, "deterministic");
    assert!(results.confidence > 0.0);

    let best = results.best_offer().unwrap();
    assert_eq!(best.rank, 1);
    assert_eq!(best.loan_id, "ziraat-konut");
    assert_eq!(best.note.as_deref(), Some("Devlet destekli"));
    assert_eq!(best.label, "Konut Kredisi");
    assert!(results.offers[0].total_payment.amount() <= results.offers[1].total_payment.amount());
    assert!(results.potential_savings.is_some());
}

#[tokio::test]
async fn missing_fields_are_a_parse_failure() {
    let response = service().search_loans(SearchRequest::new("konut kredisi")).await;
    let failure = response.failure().expect("search should fail");

    assert_eq!(failure.kind, SearchFailureKind::ParseFailure);
    assert_eq!(failure.missing_fields, vec!["amount", "term"]);
    assert!(failure.parsed.is_some());
}

#[tokio::test]
async fn out_of_range_term_is_a_validation_error() {
    let response = service()
        .search_loans(SearchRequest::new("konut 2 milyon 400 ay"))
        .await;
    let failure = response.failure().expect("search should fail");

    assert_eq!(failure.kind, SearchFailureKind::ValidationError);
    assert!(failure.missing_fields.is_empty());
}

#[tokio::test]
async fn no_matching_loan_is_an_empty_success() {
    let response = service()
        .search_loans(SearchRequest::new("taşıt kredisi 5 milyon 12 ay"))
        .await;
    let results = response.results().expect("search should succeed");

    assert_eq!(results.total_found, 0);
    assert!(results.offers.is_empty());
    assert!(results.potential_savings.is_none());
}

#[tokio::test]
async fn explicit_provider_is_honoured() {
    let response = service()
        .search_loans(
            SearchRequest::new("araba 500 bin 36 ay").with_provider(ProviderKind::Deterministic),
        )
        .await;
    let results = response.results().unwrap();
    assert_eq!(results.parameters.loan_type, LoanType::Vehicle);
    assert_eq!(results.total_found, 1);
}

struct BrokenCatalog;

#[async_trait]
impl LoanCatalog for BrokenCatalog {
    async fn find_eligible(&self, _: LoanType, _: &Money, _: Term) -> Result<Vec<Loan>, CatalogError> {
        Err(CatalogError::Storage("connection refused".into()))
    }

    async fn find_all(&self) -> Result<Vec<Loan>, CatalogError> {
        Err(CatalogError::Storage("connection refused".into()))
    }

    async fn find_by_id(&self, _: &LoanId) -> Result<Option<Loan>, CatalogError> {
        Err(CatalogError::Storage("connection refused".into()))
    }

    async fn find_by_type(&self, _: LoanType) -> Result<Vec<Loan>, CatalogError> {
        Err(CatalogError::Storage("connection refused".into()))
    }

    async fn save(&self, _: Loan) -> Result<(), CatalogError> {
        Err(CatalogError::Storage("connection refused".into()))
    }

    async fn delete(&self, _: &LoanId) -> Result<bool, CatalogError> {
        Err(CatalogError::Storage("connection refused".into()))
    }
}

#[tokio::test]
async fn catalog_failure_is_an_internal_error() {
    let service = LoanSearchService::new(parser(), Arc::new(BrokenCatalog));
    let response = service
        .search_loans(SearchRequest::new("5 milyon 48 ay konut"))
        .await;
    let failure = response.failure().expect("search should fail");

    assert_eq!(failure.kind, SearchFailureKind::InternalError);
    assert!(failure.message.contains("connection refused"));
}

#[tokio::test]
async fn response_serializes_with_status_tag() {
    let response = service()
        .search_loans(SearchRequest::new("5 milyon 48 ay konut"))
        .await;
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["offers"][0]["rank"], 1);

    let response = service().search_loans(SearchRequest::new("merhaba")).await;
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "failure");
    assert_eq!(json["kind"], "parse_failure");
}

#[tokio::test]
async fn search_by_parameters_skips_parsing() {
    let ranking = service()
        .search_by_parameters(LoanType::Housing, &try_money(4_000_000), Term::new(120).unwrap())
        .await
        .unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking.cheapest().unwrap().loan.id().0, "ziraat-konut");
}
