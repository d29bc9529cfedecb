// src/main.rs
mod config;
mod extractors;
mod normalizer;
mod pipeline;
mod screener;
mod storage;
mod utils;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use config::{AppConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use extractors::CompanyExtractor;
use normalizer::headlines::build_headlines;
use normalizer::CurrencyNormalizer;
use screener::{rates, ScreenerClient, Variant};
use serde::Serialize;
use storage::CompanyIdTable;
use utils::AppError;

/// Command Line Interface for the Screener.in company page extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Site root used for page fetches and link resolution
    #[arg(long, env = "SCREENER_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// HTTP timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a company page and print the extracted report as JSON
    Company {
        /// Ticker symbol of the company
        #[arg(short, long)]
        symbol: String,

        /// Use the consolidated variant of the page
        #[arg(long)]
        consolidated: bool,

        /// CSV mapping symbols to company ids
        #[arg(long, env = "COMPANY_IDS_CSV", default_value = "company_ids.csv")]
        ids_csv: PathBuf,
    },

    /// Rewrite currency amounts in the given strings into crore form
    Normalize {
        /// Fixed USD→INR rate (skips the rate lookup)
        #[arg(long, env = "USD_INR_RATE")]
        rate: Option<f64>,

        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Fetch market headlines, normalize their amounts and print them as JSON
    Headlines {
        /// Case-insensitive filter on title or related symbol
        #[arg(short, long)]
        query: Option<String>,

        /// Fixed USD→INR rate (skips the rate lookup)
        #[arg(long, env = "USD_INR_RATE")]
        rate: Option<f64>,
    },
}

fn app_config(args: &Args, rate_override: Option<f64>) -> Result<AppConfig, AppError> {
    if args.timeout_secs == 0 {
        return Err(AppError::Config("timeout must be at least one second".to_string()));
    }
    if let Some(rate) = rate_override {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(AppError::Config(format!("invalid USD/INR rate {}", rate)));
        }
    }
    Ok(AppConfig {
        base_url: args.base_url.trim_end_matches('/').to_string(),
        timeout: Duration::from_secs(args.timeout_secs),
        rate_override,
        ..AppConfig::default()
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_company(
    client: &ScreenerClient,
    symbol: &str,
    variant: Variant,
    ids_csv: &Path,
) -> Result<(), AppError> {
    let ids = CompanyIdTable::load_or_empty(ids_csv);

    let doc = match client.fetch_company_page(symbol, variant).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!("Failed to download company page for {}: {}", symbol, e);
            return Err(AppError::NoData(symbol.to_string()));
        }
    };

    let extractor = CompanyExtractor::new(client.config().extractor_config());
    let report = pipeline::build_report(&doc, &extractor, &ids, client).await;
    print_json(&report)
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    let rate_override = match &args.command {
        Command::Normalize { rate, .. } | Command::Headlines { rate, .. } => *rate,
        Command::Company { .. } => None,
    };

    // 3. Initialize the HTTP client
    let client = ScreenerClient::new(app_config(&args, rate_override)?)?;

    match &args.command {
        Command::Company {
            symbol,
            consolidated,
            ids_csv,
        } => {
            let variant = if *consolidated {
                Variant::Consolidated
            } else {
                Variant::Standalone
            };
            run_company(&client, symbol, variant, ids_csv).await?;
        }
        Command::Normalize { text, .. } => {
            let normalizer = CurrencyNormalizer::new(rates::current_usd_inr_rate(&client).await);
            tracing::debug!("Normalizing at USD/INR {}", normalizer.usd_inr_rate());
            for line in text {
                println!("{}", normalizer.normalize(line));
            }
        }
        Command::Headlines { query, .. } => {
            let feed = client.fetch_news().await?;
            if feed.items.is_empty() {
                return Err(AppError::NoData("news feed".to_string()));
            }
            let normalizer = CurrencyNormalizer::new(rates::current_usd_inr_rate(&client).await);
            let headlines = build_headlines(&feed.items, &normalizer, query.as_deref());
            print_json(&headlines)?;
        }
    }

    tracing::info!("Processing finished.");
    Ok(())
}
