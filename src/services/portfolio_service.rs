use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::external::price_provider::PriceSnapshotProvider;
use crate::external::ticker_resolver::{ResolveError, TickerResolver};
use crate::models::{
    AnalysisResponse, Holding, HoldingFailure, HoldingOutcome, HoldingReport, PortfolioSummary,
    Transaction, YearlyPrices,
};
use crate::services::resolution_cache::ResolutionCache;
use crate::services::valuation::{self, round_to, ValuationOptions};
use crate::services::year_range;

use std::collections::BTreeMap;

/// Values every holding in the ledger and aggregates the portfolio view.
/// Holdings are processed concurrently with a bounded lookup pool; a
/// holding that cannot be valued becomes a failure entry in its slot
/// instead of poisoning the whole analysis.
pub async fn analyze_portfolio(
    resolver: &dyn TickerResolver,
    provider: &dyn PriceSnapshotProvider,
    cache: &ResolutionCache,
    config: &AppConfig,
    transactions: Vec<Transaction>,
    today: NaiveDate,
) -> AnalysisResponse {
    let holdings = Holding::group_all(transactions);
    info!("📊 Valuing {} holdings", holdings.len());
    let options = ValuationOptions {
        today,
        intra_year_checkpoints: config.intra_year_checkpoints,
    };

    let results: Vec<HoldingOutcome> = stream::iter(holdings)
        .map(|holding| evaluate_holding(resolver, provider, cache, config, holding, options))
        .buffered(config.lookup_concurrency.max(1))
        .collect()
        .await;

    let summary = summarize(&results);
    AnalysisResponse { results, summary }
}

async fn evaluate_holding(
    resolver: &dyn TickerResolver,
    provider: &dyn PriceSnapshotProvider,
    cache: &ResolutionCache,
    config: &AppConfig,
    holding: Holding,
    options: ValuationOptions,
) -> HoldingOutcome {
    let ticker = match resolve_cached(resolver, cache, &holding.isin).await {
        Ok(Some(ticker)) => ticker,
        Ok(None) => {
            warn!("⚠️ No ticker mapping for {} ({})", holding.product, holding.isin);
            return failed(&holding, format!("Unable to find data for {}", holding.isin));
        }
        Err(e) => {
            warn!("⚠️ Ticker lookup failed for {}: {}", holding.isin, e);
            return failed(&holding, format!("Ticker lookup failed for {}", holding.isin));
        }
    };

    let years = year_range::evaluation_years(&holding.transactions, options.today);
    let prices = fetch_across_markets(provider, &ticker, &years, &config.market_suffixes).await;
    if prices.is_empty() {
        warn!("⚠️ No price data for {} on any market", ticker);
        return failed(&holding, format!("No price data for {}", ticker));
    }

    match valuation::build_report(&holding.product, &holding.transactions, &prices, &years, &options)
    {
        Some(report) => {
            info!("✓ Valued {} via {}", holding.product, ticker);
            HoldingOutcome::Valued(report)
        }
        // Price data exists but no year has a closing price to anchor on.
        None => failed(&holding, format!("No year-end price data for {}", ticker)),
    }
}

fn failed(holding: &Holding, error: String) -> HoldingOutcome {
    HoldingOutcome::Failed(HoldingFailure {
        stock_name: holding.product.clone(),
        error,
    })
}

async fn resolve_cached(
    resolver: &dyn TickerResolver,
    cache: &ResolutionCache,
    isin: &str,
) -> Result<Option<String>, ResolveError> {
    if let Some(cached) = cache.lookup(isin) {
        return Ok(cached);
    }
    let resolved = resolver.resolve(isin).await?;
    cache.store(isin, resolved.clone());
    Ok(resolved)
}

// European tickers are listed per market; the bare symbol from the mapping
// API needs an exchange suffix before the chart API recognizes it. The
// first market that returns any data wins.
async fn fetch_across_markets(
    provider: &dyn PriceSnapshotProvider,
    ticker: &str,
    years: &[i32],
    suffixes: &[String],
) -> YearlyPrices {
    for suffix in suffixes {
        let symbol = if suffix.is_empty() {
            ticker.to_string()
        } else {
            format!("{ticker}.{suffix}")
        };
        match provider.yearly_checkpoints(&symbol, years).await {
            Ok(prices) if !prices.is_empty() => {
                info!("✓ Found price data for {} as {}", ticker, symbol);
                return prices;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("⚠️ Price lookup failed for {}: {}", symbol, e);
            }
        }
    }
    YearlyPrices::new()
}

/// Portfolio totals over the valued holdings; failure entries contribute
/// nothing. Only positive invested amounts count toward the portfolio
/// cost basis, and the percentage denominator is guarded so an empty or
/// fully-failed portfolio reports 0 instead of dividing by zero.
fn summarize(results: &[HoldingOutcome]) -> PortfolioSummary {
    let valued: Vec<&HoldingReport> = results.iter().filter_map(HoldingOutcome::as_valued).collect();

    let total_worth: f64 = valued.iter().map(|r| r.final_worth).sum();
    let total_gain: f64 = valued.iter().map(|r| r.total_gain_value).sum();
    let total_invested: f64 = valued
        .iter()
        .map(|r| r.total_invested)
        .filter(|invested| *invested > 0.0)
        .sum();
    let total_realized_gain: f64 = valued.iter().map(|r| r.realized_gain).sum();
    let total_gain_percentage = if total_invested != 0.0 {
        round_to(total_gain / total_invested * 100.0, 2)
    } else {
        0.0
    };

    let mut yearly_worths: BTreeMap<i64, i64> = BTreeMap::new();
    for report in &valued {
        for (&timestamp, &worth) in &report.yearly_worth {
            *yearly_worths.entry(timestamp).or_insert(0) += worth;
        }
    }

    PortfolioSummary {
        total_worth: round_to(total_worth, 2),
        total_gain: round_to(total_gain, 2),
        total_gain_percentage,
        total_invested: round_to(total_invested, 3),
        total_realized_gain: round_to(total_realized_gain, 3),
        yearly_worths,
    }
}
