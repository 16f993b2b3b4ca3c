use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::{CheckpointKind, HoldingReport, Transaction, YearlyGain, YearlyPrices};

/// Knobs the valuation engine needs beyond the ledger itself. `today` is
/// injected so results are reproducible in tests and batch runs.
#[derive(Debug, Clone, Copy)]
pub struct ValuationOptions {
    pub today: NaiveDate,
    /// When false the worth series carries year-end samples only.
    pub intra_year_checkpoints: bool,
}

/// Net shares held over the whole ledger.
pub fn shares_owned_total(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(|tx| tx.quantity).sum()
}

/// Net shares held going into `year` (transactions dated strictly before
/// January 1 of `year`).
pub fn shares_owned_before_year(transactions: &[Transaction], year: i32) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.date.year() < year)
        .map(|tx| tx.quantity)
        .sum()
}

/// Net shares held at the end of `year` (transactions dated through
/// December 31 of `year`).
pub fn shares_owned_through_year(transactions: &[Transaction], year: i32) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.date.year() <= year)
        .map(|tx| tx.quantity)
        .sum()
}

/// Cash put into the holding over its lifetime: the sign-inverted sum of
/// the negative cash deltas. Sells do not reduce this figure.
pub fn total_invested(transactions: &[Transaction]) -> f64 {
    -transactions
        .iter()
        .map(|tx| tx.value)
        .filter(|value| *value < 0.0)
        .sum::<f64>()
}

/// Cash taken out of the holding over its lifetime: the sum of the positive
/// cash deltas, rounded to 3 decimals. This single figure feeds every
/// downstream formula that involves realized proceeds.
pub fn realized_gain(transactions: &[Transaction]) -> f64 {
    round_to(
        transactions
            .iter()
            .map(|tx| tx.value)
            .filter(|value| *value > 0.0)
            .sum(),
        3,
    )
}

/// Net cash that flowed into the holding during `year`, sign-inverted so
/// buys count positive. In-year sells offset in-year buys.
pub fn net_purchases_in_year(transactions: &[Transaction], year: i32) -> f64 {
    -transactions
        .iter()
        .filter(|tx| tx.date.year() == year)
        .map(|tx| tx.value)
        .sum::<f64>()
}

/// Year-end price of the most recent year that has one. Prices fetched for
/// the current year normally carry the latest close as their `end`, so this
/// is usually today's price; when the newest years have no data the walk
/// falls back to the last year that traded.
pub fn latest_end_price(prices: &YearlyPrices) -> Option<f64> {
    prices.values().rev().find_map(|checkpoints| checkpoints.end)
}

pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Per-year gain decomposition. A year is skipped when its checkpoint
/// prices are missing, when either boundary price is absent, or when no
/// shares were held both going into and through it.
pub fn yearly_gains(
    transactions: &[Transaction],
    prices: &YearlyPrices,
    years: &[i32],
) -> BTreeMap<i32, YearlyGain> {
    let mut gains = BTreeMap::new();
    for &year in years {
        let Some(checkpoints) = prices.get(&year) else {
            continue;
        };
        let (Some(start_price), Some(end_price)) = (checkpoints.start, checkpoints.end) else {
            continue;
        };
        let shares_before = shares_owned_before_year(transactions, year);
        let shares_through = shares_owned_through_year(transactions, year);
        if shares_before == 0.0 && shares_through == 0.0 {
            continue;
        }
        let start_worth = shares_before * start_price;
        let net_purchases = net_purchases_in_year(transactions, year);
        let end_worth = shares_through * end_price;
        let virtual_gain_value = end_worth - start_worth - net_purchases;
        let denominator = start_worth + net_purchases;
        let virtual_gain_percentage = if denominator != 0.0 {
            virtual_gain_value / denominator * 100.0
        } else {
            0.0
        };
        gains.insert(
            year,
            YearlyGain {
                virtual_gain_value,
                virtual_gain_percentage,
            },
        );
    }
    gains
}

/// Worth samples over the evaluated years, keyed by epoch seconds at noon
/// UTC and truncated toward zero to whole currency units. Every sample of a
/// year prices the shares held through that year; intra-year samples do not
/// re-slice the ledger at their own date. Checkpoints dated after `today`
/// are not sampled.
pub fn worth_series(
    transactions: &[Transaction],
    prices: &YearlyPrices,
    years: &[i32],
    options: &ValuationOptions,
) -> BTreeMap<i64, i64> {
    let mut series = BTreeMap::new();
    for &year in years {
        let Some(checkpoints) = prices.get(&year) else {
            continue;
        };
        let shares_through = shares_owned_through_year(transactions, year);
        if let Some(end_price) = checkpoints.end {
            series.insert(
                CheckpointKind::YearEnd.sample_timestamp(year),
                (shares_through * end_price) as i64,
            );
        }
        if !options.intra_year_checkpoints {
            continue;
        }
        let intra_year = [
            (CheckpointKind::Quarter1End, checkpoints.q1_end),
            (CheckpointKind::MidYear, checkpoints.mid),
            (CheckpointKind::Quarter3End, checkpoints.q3_end),
        ];
        for (kind, price) in intra_year {
            let Some(price) = price else {
                continue;
            };
            if kind.date_in(year) > options.today {
                continue;
            }
            series.insert(kind.sample_timestamp(year), (shares_through * price) as i64);
        }
    }
    series
}

/// Values one holding against its checkpoint prices. Returns `None` when no
/// evaluated year has a year-end price, which callers surface as an explicit
/// failure instead of a zero-worth report.
pub fn build_report(
    product: &str,
    transactions: &[Transaction],
    prices: &YearlyPrices,
    years: &[i32],
    options: &ValuationOptions,
) -> Option<HoldingReport> {
    let final_price = latest_end_price(prices)?;
    let shares = shares_owned_total(transactions);
    let invested = total_invested(transactions);
    let realized = realized_gain(transactions);
    let final_worth = shares * final_price;
    let total_gain_value = final_worth + realized - invested;
    let total_gain_percent = if invested != 0.0 {
        ((final_worth + realized) / invested - 1.0) * 100.0
    } else {
        0.0
    };
    let currently_invested = if invested - realized > 0.0 && shares > 0.0 {
        invested - realized
    } else {
        0.0
    };
    Some(HoldingReport {
        stock_name: product.to_string(),
        total_gain_percent,
        total_gain_value,
        total_invested: invested,
        currently_invested,
        final_worth,
        stocks_in_possession: shares,
        realized_gain: realized,
        yearly_gains: yearly_gains(transactions, prices, years),
        yearly_worth: worth_series(transactions, prices, years, options),
    })
}
