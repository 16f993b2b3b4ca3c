use chrono::{Datelike, NaiveDate};

use crate::models::Transaction;

/// Calendar years a holding must be evaluated over: every year from the
/// earliest transaction through `today`'s year, with no gaps. Years without
/// any transaction still appear so that held positions keep producing worth
/// samples. Returns just `today`'s year when there are no transactions.
pub fn evaluation_years(transactions: &[Transaction], today: NaiveDate) -> Vec<i32> {
    let current = today.year();
    let mut first = current;
    let mut last = current;
    for tx in transactions {
        let year = tx.date.year();
        first = first.min(year);
        last = last.max(year);
    }
    (first..=last).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_in(year: i32) -> Transaction {
        Transaction {
            product: "VANGUARD S&P 500".to_string(),
            isin: "IE00B3XXRP09".to_string(),
            date: NaiveDate::from_ymd_opt(year, 5, 12).unwrap(),
            quantity: 1.0,
            value: -100.0,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
    }

    #[test]
    fn test_range_fills_gap_years() {
        // Transactions only in 2019 and 2022, evaluated in 2024.
        let years = evaluation_years(&[tx_in(2019), tx_in(2022)], today());
        assert_eq!(years, vec![2019, 2020, 2021, 2022, 2023, 2024]);
    }

    #[test]
    fn test_single_transaction_extends_to_current_year() {
        let years = evaluation_years(&[tx_in(2021)], today());
        assert_eq!(years, vec![2021, 2022, 2023, 2024]);
    }

    #[test]
    fn test_current_year_transactions_yield_one_year() {
        let years = evaluation_years(&[tx_in(2024)], today());
        assert_eq!(years, vec![2024]);
    }

    #[test]
    fn test_no_transactions_yield_current_year() {
        let years = evaluation_years(&[], today());
        assert_eq!(years, vec![2024]);
    }

    #[test]
    fn test_duplicate_years_not_repeated() {
        let years = evaluation_years(&[tx_in(2023), tx_in(2023), tx_in(2024)], today());
        assert_eq!(years, vec![2023, 2024]);
    }
}
