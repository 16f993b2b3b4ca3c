use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::external::price_provider::{PriceProviderError, PriceSnapshotProvider};
use crate::models::{CheckpointKind, YearCheckpoints, YearlyPrices};

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    #[allow(dead_code)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .expect("valid time of day")
        .and_utc()
        .timestamp()
}

/// Collapses an ascending daily close series into per-year checkpoints.
/// Start and end are the first and last closes observed inside the year;
/// the intra-year checkpoints require an exact close on their date and stay
/// empty when the market was shut that day.
pub(crate) fn carve_checkpoints(closes: &[(NaiveDate, f64)], years: &[i32]) -> YearlyPrices {
    let mut prices = YearlyPrices::new();
    for &year in years {
        let from = closes.partition_point(|(date, _)| date.year() < year);
        let to = closes.partition_point(|(date, _)| date.year() <= year);
        let in_year = &closes[from..to];
        if in_year.is_empty() {
            continue;
        }
        prices.insert(
            year,
            YearCheckpoints {
                start: in_year.first().map(|(_, close)| *close),
                q1_end: close_on(in_year, CheckpointKind::Quarter1End.date_in(year)),
                mid: close_on(in_year, CheckpointKind::MidYear.date_in(year)),
                q3_end: close_on(in_year, CheckpointKind::Quarter3End.date_in(year)),
                end: in_year.last().map(|(_, close)| *close),
            },
        );
    }
    prices
}

fn close_on(closes: &[(NaiveDate, f64)], date: NaiveDate) -> Option<f64> {
    closes
        .binary_search_by(|(close_date, _)| close_date.cmp(&date))
        .ok()
        .map(|index| closes[index].1)
}

#[async_trait]
impl PriceSnapshotProvider for YahooProvider {
    async fn yearly_checkpoints(
        &self,
        ticker: &str,
        years: &[i32],
    ) -> Result<YearlyPrices, PriceProviderError> {
        let (Some(&first_year), Some(&last_year)) = (years.first(), years.last()) else {
            return Ok(YearlyPrices::new());
        };

        let period1 = day_start_timestamp(CheckpointKind::YearStart.date_in(first_year));
        // Chart requests must not reach into the future.
        let period2 =
            day_start_timestamp(CheckpointKind::YearStart.date_in(last_year + 1))
                .min(Utc::now().timestamp());

        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{ticker}?period1={period1}&period2={period2}&interval=1d"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        // Unknown symbols come back as 404; the caller tries other markets.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(YearlyPrices::new());
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "chart API returned {}",
                resp.status()
            )));
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        let result = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| PriceProviderError::BadResponse("missing result".into()))?;

        // timestamp aligns with close list by index
        let mut closes = Vec::new();
        for (i, ts) in result.timestamp.iter().enumerate() {
            let close = result
                .indicators
                .quote
                .first()
                .and_then(|quote| quote.close.get(i))
                .and_then(|v| *v);

            // skip missing closes
            let Some(close) = close else { continue };

            let dt = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| PriceProviderError::Parse("bad timestamp".into()))?;

            closes.push((dt.date_naive(), close));
        }

        // Ensure ascending by date
        closes.sort_by_key(|(date, _)| *date);

        Ok(carve_checkpoints(&closes, years))
    }
}
