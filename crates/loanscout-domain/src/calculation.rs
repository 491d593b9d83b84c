//! Amortization math and loan ranking.
//!
//! All figures are computed on unrounded `f64` and only rounded to currency
//! precision when they are turned into [`Money`].

use serde::Serialize;

use crate::error::{DomainError, ValidationError};
use crate::loan::Loan;
use crate::money::Money;
use crate::rate::InterestRate;
use crate::term::Term;

/// Fixed monthly payment for `principal` at `monthly_rate` over `months`.
///
/// `P·r·(1+r)^n / ((1+r)^n − 1)`, or `P/n` when the rate is zero.
pub fn amortized_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    let n = months as f64;
    if monthly_rate == 0.0 {
        return principal / n;
    }
    let growth = (1.0 + monthly_rate).powf(n);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Payment figures for one loan at one (amount, term).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentBreakdown {
    pub principal: Money,
    pub term: Term,
    pub monthly_rate: f64,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

/// A loan together with what it would cost.
#[derive(Debug, Clone, Serialize)]
pub struct LoanQuote {
    pub loan: Loan,
    pub payment: PaymentBreakdown,
}

/// Eligible loans sorted by total payment, cheapest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoanComparison {
    quotes: Vec<LoanQuote>,
}

impl LoanComparison {
    pub fn quotes(&self) -> &[LoanQuote] {
        &self.quotes
    }

    pub fn into_quotes(self) -> Vec<LoanQuote> {
        self.quotes
    }

    pub fn cheapest(&self) -> Option<&LoanQuote> {
        self.quotes.first()
    }

    pub fn most_expensive(&self) -> Option<&LoanQuote> {
        self.quotes.last()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Difference in total payment between the most and least expensive offer.
    pub fn potential_savings(&self) -> Option<Money> {
        let cheapest = self.cheapest()?;
        let priciest = self.most_expensive()?;
        priciest
            .payment
            .total_payment
            .checked_sub(&cheapest.payment.total_payment)
            .ok()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoanCalculator;

impl LoanCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Figures for an arbitrary rate, with no product constraints applied.
    pub fn breakdown(
        &self,
        principal: &Money,
        rate: InterestRate,
        term: Term,
    ) -> Result<PaymentBreakdown, ValidationError> {
        let amount = principal.to_f64();
        let monthly_rate = rate.monthly_rate();
        let months = term.months();
        let monthly = amortized_payment(amount, monthly_rate, months);
        let total = monthly * months as f64;
        let interest = (total - amount).max(0.0);

        let currency = principal.currency();
        Ok(PaymentBreakdown {
            principal: principal.clone(),
            term,
            monthly_rate,
            monthly_payment: Money::from_f64(monthly, currency)?,
            total_payment: Money::from_f64(total, currency)?,
            total_interest: Money::from_f64(interest, currency)?,
        })
    }

    /// Figures for `loan`; fails if the loan does not accept `amount`/`term`.
    pub fn calculate(
        &self,
        loan: &Loan,
        amount: &Money,
        term: Term,
    ) -> Result<PaymentBreakdown, DomainError> {
        loan.check_eligibility(amount, term)?;
        Ok(self.breakdown(amount, loan.rate(), term)?)
    }

    /// Ranks the loans that accept `amount`/`term` by total payment.
    ///
    /// Ineligible or inactive loans are dropped. Ties keep input order.
    pub fn compare_loans<'a, I>(&self, loans: I, amount: &Money, term: Term) -> LoanComparison
    where
        I: IntoIterator<Item = &'a Loan>,
    {
        let mut quotes: Vec<LoanQuote> = loans
            .into_iter()
            .filter_map(|loan| match self.calculate(loan, amount, term) {
                Ok(payment) => Some(LoanQuote {
                    loan: loan.clone(),
                    payment,
                }),
                Err(DomainError::Eligibility(reason)) => {
                    tracing::trace!(loan_id = %loan.id(), %reason, "loan excluded from ranking");
                    None
                }
                Err(e) => {
                    tracing::warn!(loan_id = %loan.id(), error = %e, "failed to price loan");
                    None
                }
            })
            .collect();

        // sort_by is stable
        quotes.sort_by(|a, b| {
            a.payment
                .total_payment
                .amount()
                .cmp(&b.payment.total_payment.amount())
        });

        LoanComparison { quotes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{Bank, BankId};
    use crate::error::EligibilityError;
    use crate::loan::tests::{housing_loan, try_money};
    use crate::loan::LoanId;
    use crate::loan_type::LoanType;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn loan_at(id: &str, rate: rust_decimal::Decimal, max_term: i64) -> Loan {
        let bank = Arc::new(Bank::new(BankId::new(id), format!("Bank {}", id)).unwrap());
        Loan::new(
            LoanId::new(id),
            bank,
            LoanType::Housing,
            InterestRate::new(rate).unwrap(),
            try_money(100_000),
            try_money(10_000_000),
            Term::new(max_term).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_housing_scenario() {
        let loan = housing_loan();
        let amount = try_money(2_000_000);
        let term = Term::new(60).unwrap();
        let b = LoanCalculator::new().calculate(&loan, &amount, term).unwrap();

        assert!((b.monthly_rate - 0.001625).abs() < 1e-12);
        let r: f64 = 0.001625;
        let growth = (1.0 + r).powf(60.0);
        let expected = 2_000_000.0 * r * growth / (growth - 1.0);
        assert!((b.monthly_payment.to_f64() - expected).abs() <= 0.005);
        assert!((b.total_payment.to_f64() - expected * 60.0).abs() <= 0.005);
        assert!((b.total_interest.to_f64() - (expected * 60.0 - 2_000_000.0)).abs() <= 0.005);
    }

    #[test]
    fn test_zero_rate_is_straight_division() {
        let calc = LoanCalculator::new();
        let b = calc
            .breakdown(&try_money(120_000), InterestRate::new(dec!(0)).unwrap(), Term::new(48).unwrap())
            .unwrap();
        assert_eq!(b.monthly_payment.amount(), dec!(2500.00));
        assert_eq!(b.total_payment.amount(), dec!(120000.00));
        assert!(b.total_interest.is_zero());
    }

    #[test]
    fn test_calculate_rejects_ineligible_pairs() {
        let calc = LoanCalculator::new();
        let loan = loan_at("short", dec!(2.0), 120);
        assert!(matches!(
            calc.calculate(&loan, &try_money(50_000), Term::new(60).unwrap()),
            Err(DomainError::Eligibility(EligibilityError::AmountOutOfRange { .. }))
        ));
        assert!(matches!(
            calc.calculate(&loan, &try_money(500_000), Term::new(240).unwrap()),
            Err(DomainError::Eligibility(EligibilityError::TermExceeded { .. }))
        ));
    }

    #[test]
    fn test_compare_loans_orders_and_filters() {
        let calc = LoanCalculator::new();
        let loans = vec![
            loan_at("expensive", dec!(3.1), 360),
            loan_at("cheap", dec!(1.5), 360),
            loan_at("too-short", dec!(0.5), 24),
            loan_at("inactive", dec!(0.1), 360).deactivate(),
            loan_at("mid", dec!(2.2), 360),
        ];
        let ranking = calc.compare_loans(&loans, &try_money(1_000_000), Term::new(120).unwrap());

        let ids: Vec<&str> = ranking.quotes().iter().map(|q| q.loan.id().0.as_str()).collect();
        assert_eq!(ids, vec!["cheap", "mid", "expensive"]);
        assert_eq!(ranking.cheapest().unwrap().loan.id().0, "cheap");
        assert_eq!(ranking.most_expensive().unwrap().loan.id().0, "expensive");
        assert!(ranking.potential_savings().unwrap().amount() > dec!(0));
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let calc = LoanCalculator::new();
        let loans = vec![
            loan_at("first", dec!(1.9), 360),
            loan_at("second", dec!(1.9), 360),
            loan_at("third", dec!(1.9), 360),
        ];
        let ranking = calc.compare_loans(&loans, &try_money(500_000), Term::new(60).unwrap());
        let ids: Vec<&str> = ranking.quotes().iter().map(|q| q.loan.id().0.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_ranking() {
        let none: Vec<Loan> = Vec::new();
        let ranking = LoanCalculator::new().compare_loans(&none, &try_money(1), Term::new(1).unwrap());
        assert!(ranking.is_empty());
        assert!(ranking.cheapest().is_none());
        assert!(ranking.potential_savings().is_none());
    }

    proptest! {
        #[test]
        fn ranking_is_non_decreasing(
            rates in proptest::collection::vec(0u32..=3000, 1..12),
            amount in 100_000i64..=10_000_000,
            months in 1i64..=360,
        ) {
            let loans: Vec<Loan> = rates
                .iter()
                .enumerate()
                .map(|(i, r)| loan_at(&format!("l{}", i), rust_decimal::Decimal::new(*r as i64, 2), 360))
                .collect();
            let ranking = LoanCalculator::new().compare_loans(&loans, &try_money(amount), Term::new(months).unwrap());
            prop_assert_eq!(ranking.len(), loans.len());
            for pair in ranking.quotes().windows(2) {
                prop_assert!(pair[0].payment.total_payment.amount() <= pair[1].payment.total_payment.amount());
            }
        }

        #[test]
        fn zero_rate_payment_is_amount_over_term(amount in 1.0f64..1.0e9, months in 1u32..=360) {
            let payment = amortized_payment(amount, 0.0, months);
            prop_assert!((payment - amount / months as f64).abs() < 1e-9);
        }
    }
}
