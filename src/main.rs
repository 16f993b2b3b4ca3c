mod app;
mod config;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::external::openfigi::OpenFigiResolver;
use crate::external::yahoo::YahooProvider;
use crate::models::HoldingOutcome;
use crate::services::resolution_cache::ResolutionCache;
use crate::services::{csv_ingest_service, portfolio_service};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(logging::LoggingConfig::from_env())?;

    let config = AppConfig::from_env();
    let state = AppState {
        ticker_resolver: Arc::new(OpenFigiResolver::new(config.openfigi_api_key.clone())),
        price_provider: Arc::new(YahooProvider::new()),
        resolution_cache: ResolutionCache::new(),
        config,
    };

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        // One-shot mode: value an export from disk and print the report.
        Some("analyze") => {
            let path = args
                .next()
                .ok_or("usage: gainscope-backend analyze <transactions.csv>")?;
            return analyze_file(&state, &path).await;
        }
        Some(other) => {
            return Err(format!("unknown command: {other} (expected 'analyze' or no arguments)").into())
        }
        None => {}
    }

    let app = app::create_app(state.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = TcpListener::bind(&addr).await?;
    info!("🚀 Gainscope backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn analyze_file(state: &AppState, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    let transactions = csv_ingest_service::parse_transactions(&data)?;
    let report = portfolio_service::analyze_portfolio(
        state.ticker_resolver.as_ref(),
        state.price_provider.as_ref(),
        &state.resolution_cache,
        &state.config,
        transactions,
        Utc::now().date_naive(),
    )
    .await;

    for outcome in &report.results {
        match outcome {
            HoldingOutcome::Valued(holding) => {
                println!("{}", "=".repeat(50));
                println!("{}", holding.stock_name);
                println!("{}", "=".repeat(50));
                println!(
                    "Total Gain: {:.2}% (€{:.2})",
                    holding.total_gain_percent, holding.total_gain_value
                );
                println!("Total Invested: €{:.2}", holding.total_invested);
                println!("Realized Gain: €{:.3}", holding.realized_gain);
                println!("Current Worth: €{:.2}", holding.final_worth);
                println!("Stocks in possession today: {}", holding.stocks_in_possession);
                for (year, gain) in &holding.yearly_gains {
                    println!(
                        "Year {}: {:.2}% (€{:.2})",
                        year, gain.virtual_gain_percentage, gain.virtual_gain_value
                    );
                }
            }
            HoldingOutcome::Failed(failure) => {
                println!("{}", "=".repeat(50));
                println!("{}: {}", failure.stock_name, failure.error);
            }
        }
    }

    let summary = &report.summary;
    println!("{}", "=".repeat(50));
    println!("Portfolio");
    println!("{}", "=".repeat(50));
    println!(
        "Total Gain: {:.2}% (€{:.2})",
        summary.total_gain_percentage, summary.total_gain
    );
    println!("Total Invested: €{:.3}", summary.total_invested);
    println!("Total Realized Gain: €{:.3}", summary.total_realized_gain);
    println!("Total Worth: €{:.2}", summary.total_worth);

    Ok(())
}
