//! Search and parse commands

use colored::*;
use loanscout_llm::{LanguageContext, ParseOptions, ProviderKind, QueryParserService};
use loanscout_search::{LoanSearchService, SearchRequest, SearchResponse};

use crate::display;

pub async fn run_search(
    service: &LoanSearchService,
    query: &str,
    provider: Option<ProviderKind>,
    context: Option<LanguageContext>,
    json: bool,
) -> anyhow::Result<()> {
    let request = SearchRequest {
        query: query.to_string(),
        provider,
        context,
    };
    let response = service.search_loans(request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match &response {
        SearchResponse::Success(results) => {
            display::section(&format!("Results for \"{}\"", results.query));
            let params = &results.parameters;
            display::labeled("Type", &params.label);
            display::labeled("Amount", &display::money(&params.amount));
            display::labeled(
                "Term",
                &format!("{} months ({} years)", params.term_months, params.term_years),
            );
            display::labeled(
                "Parsed by",
                &format!("{} ({:.0}% confidence)", results.provider, results.confidence * 100.0),
            );
            println!();

            if results.offers.is_empty() {
                display::warning("No loan in the catalog accepts this amount and term.");
                return Ok(());
            }
            for offer in &results.offers {
                display::offer(offer);
                println!();
            }
            display::success(&format!("{} offers found", results.total_found));
            if let Some(savings) = &results.potential_savings {
                display::info(&format!(
                    "Choosing the cheapest offer saves {}",
                    display::money(savings).bright_green()
                ));
            }
        }
        SearchResponse::Failure(failure) => {
            display::section(&format!("Search failed ({})", failure.kind));
            display::error(&failure.message);
            if !failure.missing_fields.is_empty() {
                display::info(&format!(
                    "Try including the {} in your query, e.g. \"2 milyon TL 120 ay konut kredisi\"",
                    failure.missing_fields.join(" and ")
                ));
            }
            if let Some(parsed) = &failure.parsed {
                println!();
                display::parsed_query(parsed);
            }
        }
    }
    Ok(())
}

pub async fn run_parse(
    parser: &QueryParserService,
    query: &str,
    provider: Option<ProviderKind>,
    context: Option<LanguageContext>,
    json: bool,
) -> anyhow::Result<()> {
    let opts = ParseOptions { provider, context };
    let parsed = parser.parse_query_with(query, opts).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    display::section(&format!("Parsed \"{}\"", query));
    display::parsed_query(&parsed);
    if parsed.is_failure() {
        display::error("No provider could interpret the query.");
    } else if !parsed.is_complete() {
        display::warning(&format!("Missing: {}", parsed.missing_fields().join(", ")));
    }
    Ok(())
}
