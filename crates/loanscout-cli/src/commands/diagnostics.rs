//! Provider diagnostics command

use loanscout_llm::QueryParserService;

use crate::display;

pub async fn run_diagnostics(parser: &QueryParserService, all: bool, json: bool) -> anyhow::Result<()> {
    let reports = if all {
        parser.all_diagnostics().await
    } else {
        parser.test_connectivity(parser.current_provider()).await;
        vec![parser.diagnostics().await]
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    display::section("Provider Diagnostics");
    let pair = parser.fallback_pair();
    display::labeled("Current provider", &parser.current_provider().to_string());
    display::labeled("Fallback pair", &format!("{} -> {}", pair.primary, pair.fallback));
    println!();
    for report in &reports {
        display::diagnostics(report);
        println!();
    }
    Ok(())
}
