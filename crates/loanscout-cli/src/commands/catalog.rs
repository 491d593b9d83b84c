//! Catalog listing command

use colored::*;
use loanscout_domain::{LoanCatalog, LoanType};

use crate::display;

pub async fn list_catalog(catalog: &dyn LoanCatalog) -> anyhow::Result<()> {
    for loan_type in LoanType::ALL {
        let loans = catalog.find_by_type(loan_type).await?;
        display::section(&format!("{} ({})", loan_type.label(), loans.len()));
        for loan in &loans {
            let status = if loan.is_active() {
                "●".bright_green()
            } else {
                "○".bright_black()
            };
            println!(
                "  {} {} {}",
                status,
                loan.bank().name().bright_white().bold(),
                format!("{}%", loan.rate().value()).bright_cyan()
            );
            display::kv(
                "Amount",
                &format!(
                    "{} - {}",
                    display::money(loan.min_amount()),
                    display::money(loan.max_amount())
                ),
            );
            display::kv("Max term", &loan.max_term().to_string());
            if let Some(note) = loan.eligibility_note() {
                display::kv("Note", note);
            }
        }
    }
    Ok(())
}
