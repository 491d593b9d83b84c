//! Display utilities for the CLI

use colored::*;
use loanscout_domain::Money;
use loanscout_llm::{ApiKeyStatus, ConnectionStatus, Diagnostics, ParsedQuery};
use loanscout_search::LoanOffer;

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    println!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

/// Print a labeled value
pub fn labeled(label: &str, value: &str) {
    println!("  {}: {}", label.bright_white(), value.bright_cyan());
}

/// Turkish grouping: "1.234.567,89 TRY".
pub fn money(value: &Money) -> String {
    let text = format!("{:.2}", value.amount());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }
    format!("{},{} {}", grouped, fraction, value.currency())
}

pub fn offer(offer: &LoanOffer) {
    let rank = format!("#{}", offer.rank);
    let rank = if offer.rank == 1 {
        rank.bright_green().bold()
    } else {
        rank.bright_white()
    };
    println!(
        "  {} {} {} ({}%)",
        rank,
        offer.bank_name.bright_white().bold(),
        offer.label.bright_black(),
        offer.rate.value()
    );
    kv("Monthly", &money(&offer.monthly_payment));
    kv("Total", &money(&offer.total_payment));
    kv("Interest", &money(&offer.total_interest));
    if let Some(note) = &offer.note {
        kv("Note", note);
    }
}

pub fn parsed_query(parsed: &ParsedQuery) {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    labeled("Provider", &parsed.provider);
    labeled(
        "Type",
        &or_dash(parsed.credit_type.map(|t| format!("{} ({})", t, t.label()))),
    );
    labeled("Amount", &or_dash(parsed.amount.map(|a| format!("{:.2}", a))));
    labeled("Term", &or_dash(parsed.term.map(|t| format!("{} months", t))));
    labeled("Confidence", &format!("{:.0}%", parsed.confidence * 100.0));
    labeled("Loan query", &parsed.is_loan_query.to_string());
    labeled("Latency", &format!("{} ms", parsed.latency_ms));
    if !parsed.reasoning.is_empty() {
        labeled("Reasoning", &parsed.reasoning);
    }
    for uncertainty in &parsed.uncertainties {
        warning(uncertainty);
    }
}

pub fn diagnostics(report: &Diagnostics) {
    let key = match report.api_key_status {
        ApiKeyStatus::Configured => "configured".bright_green(),
        ApiKeyStatus::InvalidFormat => "invalid format".bright_red(),
        ApiKeyStatus::Missing => "missing".yellow(),
    };
    let connection = match report.connection_status {
        ConnectionStatus::Success => "ok".bright_green(),
        ConnectionStatus::Failed => "failed".bright_red(),
        ConnectionStatus::NotTested => "not tested".bright_black(),
    };
    println!(
        "  {} {}",
        if report.is_healthy() { "●".bright_green() } else { "○".yellow() },
        report.provider.display_name().bright_white().bold()
    );
    kv("Model", &report.model);
    println!("      API key: {}", key);
    println!("      Connection: {}", connection);
    if let Some(err) = &report.error {
        kv("Error", &format!("{} - {}", err.code, err.message));
    }
    for suggestion in &report.suggestions {
        info(suggestion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_grouping() {
        assert_eq!(money(&Money::new(dec!(1234567.891), "TRY").unwrap()), "1.234.567,89 TRY");
        assert_eq!(money(&Money::new(dec!(999), "TRY").unwrap()), "999,00 TRY");
        assert_eq!(money(&Money::zero("EUR").unwrap()), "0,00 EUR");
    }
}
