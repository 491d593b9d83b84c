//! Built-in catalog of Turkish bank loan products for the CLI.

use std::collections::HashMap;
use std::sync::Arc;

use loanscout_domain::{
    Bank, BankId, InMemoryCatalog, InterestRate, Loan, LoanId, LoanType, Money, Term,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct Product {
    bank: &'static str,
    loan_type: LoanType,
    rate: Decimal,
    min: i64,
    max: i64,
    max_term: i64,
    note: &'static str,
}

const BANKS: &[(&str, &str)] = &[
    ("ziraat", "Ziraat Bankası"),
    ("garanti", "Garanti BBVA"),
    ("isbank", "Türkiye İş Bankası"),
    ("akbank", "Akbank"),
    ("yapikredi", "Yapı Kredi"),
    ("vakifbank", "VakıfBank"),
    ("halkbank", "Halkbank"),
];

fn products() -> Vec<Product> {
    use LoanType::*;
    let p = |bank, loan_type, rate, min, max, max_term, note| Product {
        bank,
        loan_type,
        rate,
        min,
        max,
        max_term,
        note,
    };
    vec![
        p("ziraat", Housing, dec!(1.95), 150_000, 8_000_000, 360, "Devlet destekli konut kampanyası"),
        p("garanti", Housing, dec!(2.49), 100_000, 5_000_000, 240, ""),
        p("isbank", Housing, dec!(2.29), 200_000, 10_000_000, 240, "Maaş müşterilerine ek indirim"),
        p("vakifbank", Housing, dec!(2.09), 150_000, 6_000_000, 180, ""),
        p("halkbank", Housing, dec!(2.15), 100_000, 7_500_000, 240, "İlk ev alanlara özel"),
        p("garanti", Vehicle, dec!(3.19), 50_000, 2_000_000, 48, ""),
        p("akbank", Vehicle, dec!(3.05), 75_000, 3_000_000, 48, "Sıfır araçlar için"),
        p("yapikredi", Vehicle, dec!(3.29), 50_000, 2_500_000, 36, ""),
        p("ziraat", Vehicle, dec!(2.99), 100_000, 1_500_000, 48, ""),
        p("isbank", Personal, dec!(3.49), 10_000, 500_000, 36, ""),
        p("akbank", Personal, dec!(3.59), 5_000, 400_000, 36, "Dijital başvuruya özel"),
        p("yapikredi", Personal, dec!(3.39), 10_000, 750_000, 48, ""),
        p("halkbank", Personal, dec!(3.25), 20_000, 300_000, 36, ""),
    ]
}

pub fn demo_catalog(currency: &str) -> anyhow::Result<InMemoryCatalog> {
    let mut banks: HashMap<&str, Arc<Bank>> = HashMap::new();
    for (id, name) in BANKS {
        banks.insert(*id, Arc::new(Bank::new(BankId::new(*id), *name)?));
    }

    let mut loans = Vec::new();
    for product in products() {
        let bank = banks
            .get(product.bank)
            .ok_or_else(|| anyhow::anyhow!("unknown bank {}", product.bank))?;
        let loan = Loan::new(
            LoanId::new(format!("{}-{}", product.bank, product.loan_type)),
            bank.clone(),
            product.loan_type,
            InterestRate::new(product.rate)?,
            Money::new(product.min.into(), currency)?,
            Money::new(product.max.into(), currency)?,
            Term::new(product.max_term)?,
        )?
        .with_note(product.note);
        loans.push(loan);
    }
    Ok(InMemoryCatalog::with_loans(loans))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_covers_every_type() {
        let catalog = demo_catalog("TRY").unwrap();
        assert_eq!(catalog.len(), products().len());
        let types: Vec<LoanType> = products().iter().map(|p| p.loan_type).collect();
        for loan_type in LoanType::ALL {
            assert!(types.contains(&loan_type));
        }
    }
}
