//! LoanScout CLI - natural-language loan search over a demo catalog
//!
//! # Quick Start
//!
//! ```bash
//! # Works without any API key (keyword heuristic)
//! loanscout search "5 milyon 48 ay konut kredisi"
//!
//! # With OPENAI_API_KEY / ANTHROPIC_API_KEY set
//! loanscout search "I need a car loan of 750k for three years" --context english
//! loanscout parse "2,5 milyon liralık ev 10 yıl vade" --provider anthropic --json
//! loanscout diagnostics --all
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::*;
use loanscout_llm::{LanguageContext, ProviderKind, QueryParserService};
use loanscout_search::LoanSearchService;
use tracing_subscriber::EnvFilter;

mod commands;
mod demo_catalog;
mod display;

/// LoanScout CLI - find the cheapest loan for a query in plain Turkish or English
#[derive(Parser)]
#[command(name = "loanscout")]
#[command(author = "LoanScout Contributors")]
#[command(version)]
#[command(about = "Natural-language loan search with LLM query parsing", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and rank the matching loans
    Search {
        /// Free-text query, e.g. "5 milyon 48 ay konut"
        query: String,

        /// Provider to use (openai, anthropic, deterministic)
        #[arg(short, long)]
        provider: Option<String>,

        /// Language context (turkish, english, complex)
        #[arg(short, long)]
        context: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Parse a query without searching
    Parse {
        query: String,

        #[arg(short, long)]
        provider: Option<String>,

        #[arg(short, long)]
        context: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show provider configuration and connectivity
    Diagnostics {
        /// Probe every provider instead of only the current one
        #[arg(long)]
        all: bool,

        #[arg(long)]
        json: bool,
    },

    /// List the loans in the demo catalog
    Catalog,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn provider_arg(name: Option<&str>) -> anyhow::Result<Option<ProviderKind>> {
    name.map(|n| {
        ProviderKind::from_name(n).ok_or_else(|| {
            anyhow::anyhow!("unknown provider '{}' (expected openai, anthropic or deterministic)", n)
        })
    })
    .transpose()
}

fn context_arg(name: Option<&str>) -> anyhow::Result<Option<LanguageContext>> {
    name.map(|n| {
        LanguageContext::from_name(n).ok_or_else(|| {
            anyhow::anyhow!("unknown context '{}' (expected turkish, english or complex)", n)
        })
    })
    .transpose()
}

fn print_banner() {
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());
    println!(
        "{}{}{}",
        "║  ".bright_cyan(),
        "LoanScout".bright_white().bold(),
        " - Natural-language loan comparison            ║".bright_cyan()
    );
    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Also loads .env if present
    let parser = Arc::new(QueryParserService::from_env());
    let currency = parser.registry().settings().currency.clone();
    let catalog = Arc::new(demo_catalog::demo_catalog(&currency)?);
    tracing::debug!(
        provider = %parser.current_provider(),
        currency = %currency,
        loans = catalog.len(),
        "loanscout ready"
    );

    match cli.command {
        Commands::Search {
            query,
            provider,
            context,
            json,
        } => {
            let provider = provider_arg(provider.as_deref())?;
            let context = context_arg(context.as_deref())?;
            if !json {
                print_banner();
            }
            let service = LoanSearchService::new(parser, catalog);
            commands::search::run_search(&service, &query, provider, context, json).await?;
        }
        Commands::Parse {
            query,
            provider,
            context,
            json,
        } => {
            let provider = provider_arg(provider.as_deref())?;
            let context = context_arg(context.as_deref())?;
            commands::search::run_parse(&parser, &query, provider, context, json).await?;
        }
        Commands::Diagnostics { all, json } => {
            commands::diagnostics::run_diagnostics(&parser, all, json).await?;
        }
        Commands::Catalog => {
            print_banner();
            commands::catalog::list_catalog(catalog.as_ref()).await?;
        }
    }

    Ok(())
}
