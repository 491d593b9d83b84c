//! Loan catalog collaborator.
//!
//! The search layer only needs [`LoanCatalog::find_eligible`]; the rest of the
//! trait exists for seeding and maintenance. [`InMemoryCatalog`] keeps loans in
//! insertion order, which is the tie-breaker used when ranking.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::CatalogError;
use crate::loan::{Loan, LoanId};
use crate::loan_type::LoanType;
use crate::money::Money;
use crate::term::Term;

#[async_trait]
pub trait LoanCatalog: Send + Sync {
    /// Active loans of `loan_type` that accept `amount` over `term`, in catalog order.
    async fn find_eligible(
        &self,
        loan_type: LoanType,
        amount: &Money,
        term: Term,
    ) -> Result<Vec<Loan>, CatalogError>;

    async fn find_all(&self) -> Result<Vec<Loan>, CatalogError>;

    async fn find_by_id(&self, id: &LoanId) -> Result<Option<Loan>, CatalogError>;

    async fn find_by_type(&self, loan_type: LoanType) -> Result<Vec<Loan>, CatalogError>;

    /// Insert or replace. A replaced loan keeps its position.
    async fn save(&self, loan: Loan) -> Result<(), CatalogError>;

    /// Returns `true` if a loan was removed.
    async fn delete(&self, id: &LoanId) -> Result<bool, CatalogError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    loans: RwLock<Vec<Loan>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loans(loans: impl IntoIterator<Item = Loan>) -> Self {
        let catalog = Self::new();
        {
            let mut guard = catalog.loans.write();
            for loan in loans {
                upsert(&mut guard, loan);
            }
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.loans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.read().is_empty()
    }
}

fn upsert(loans: &mut Vec<Loan>, loan: Loan) {
    match loans.iter_mut().find(|l| l.id() == loan.id()) {
        Some(existing) => *existing = loan,
        None => loans.push(loan),
    }
}

#[async_trait]
impl LoanCatalog for InMemoryCatalog {
    async fn find_eligible(
        &self,
        loan_type: LoanType,
        amount: &Money,
        term: Term,
    ) -> Result<Vec<Loan>, CatalogError> {
        let loans = self.loans.read();
        let eligible: Vec<Loan> = loans
            .iter()
            .filter(|l| l.loan_type() == loan_type && l.is_eligible(amount, term))
            .cloned()
            .collect();
        tracing::debug!(
            %loan_type,
            %amount,
            term = term.months(),
            scanned = loans.len(),
            matched = eligible.len(),
            "catalog eligibility scan"
        );
        Ok(eligible)
    }

    async fn find_all(&self) -> Result<Vec<Loan>, CatalogError> {
        Ok(self.loans.read().clone())
    }

    async fn find_by_id(&self, id: &LoanId) -> Result<Option<Loan>, CatalogError> {
        Ok(self.loans.read().iter().find(|l| l.id() == id).cloned())
    }

    async fn find_by_type(&self, loan_type: LoanType) -> Result<Vec<Loan>, CatalogError> {
        Ok(self
            .loans
            .read()
            .iter()
            .filter(|l| l.loan_type() == loan_type)
            .cloned()
            .collect())
    }

    async fn save(&self, loan: Loan) -> Result<(), CatalogError> {
        upsert(&mut self.loans.write(), loan);
        Ok(())
    }

    async fn delete(&self, id: &LoanId) -> Result<bool, CatalogError> {
        let mut loans = self.loans.write();
        let before = loans.len();
        loans.retain(|l| l.id() != id);
        Ok(loans.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::Bank;
    use crate::rate::InterestRate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn money(amount: i64) -> Money {
        Money::new(amount.into(), "TRY").unwrap()
    }

    fn loan(id: &str, loan_type: LoanType, max_term: i64) -> Loan {
        let bank = Arc::new(Bank::with_name(format!("{} bank", id)).unwrap());
        Loan::new(
            LoanId::new(id),
            bank,
            loan_type,
            InterestRate::new(dec!(2.5)).unwrap(),
            money(10_000),
            money(1_000_000),
            Term::new(max_term).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_eligible_filters_type_and_constraints() {
        let catalog = InMemoryCatalog::with_loans(vec![
            loan("h1", LoanType::Housing, 120),
            loan("v1", LoanType::Vehicle, 48),
            loan("h2", LoanType::Housing, 360),
            loan("h3", LoanType::Housing, 360).deactivate(),
        ]);

        let found = catalog
            .find_eligible(LoanType::Housing, &money(500_000), Term::new(240).unwrap())
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|l| l.id().0.as_str()).collect();
        assert_eq!(ids, vec!["h2"]);

        let none = catalog
            .find_eligible(LoanType::Personal, &money(500_000), Term::new(12).unwrap())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_in_place_and_delete() {
        let catalog = InMemoryCatalog::new();
        catalog.save(loan("a", LoanType::Personal, 36)).await.unwrap();
        catalog.save(loan("b", LoanType::Personal, 36)).await.unwrap();
        catalog
            .save(loan("a", LoanType::Personal, 36).deactivate())
            .await
            .unwrap();

        let all = catalog.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id().0, "a");
        assert!(!all[0].is_active());

        assert!(catalog.delete(&LoanId::new("a")).await.unwrap());
        assert!(!catalog.delete(&LoanId::new("a")).await.unwrap());
        assert!(catalog.find_by_id(&LoanId::new("a")).await.unwrap().is_none());
        assert_eq!(catalog.find_by_type(LoanType::Personal).await.unwrap().len(), 1);
    }
}
