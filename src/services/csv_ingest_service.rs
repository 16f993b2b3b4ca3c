use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::info;

use crate::models::Transaction;

// Header row of the DEGIRO transaction export. Several columns are unnamed
// in the export itself; parsing is positional either way.
const EXPECTED_HEADERS: &str = "Datum,Tijd,Product,ISIN,Beurs,Uitvoeringsplaats,Aantal,Koers,,\
Lokale waarde,,Waarde,,Wisselkoers,Transactiekosten en/of,,Totaal,,Order ID";

const COL_DATE: usize = 0;
const COL_PRODUCT: usize = 2;
const COL_ISIN: usize = 3;
const COL_QUANTITY: usize = 6;
const COL_VALUE: usize = 11;
const COLUMN_COUNT: usize = 19;

const DATE_FORMAT: &str = "%d-%m-%Y";

/// Parses a raw transaction export into the normalized ledger. The whole
/// file is either accepted or rejected; a single malformed row fails the
/// upload with its line number.
pub fn parse_transactions(data: &[u8]) -> Result<Vec<Transaction>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(data);
    let headers = reader
        .headers()
        .context("Transaction export has no readable header row")?
        .clone();
    let header_line = headers.iter().collect::<Vec<_>>().join(",");
    // Renamed or translated headers are tolerated as long as the column
    // layout is intact.
    if header_line != EXPECTED_HEADERS && headers.len() != COLUMN_COUNT {
        bail!(
            "Transaction export has {} columns where {} were expected",
            headers.len(),
            COLUMN_COUNT
        );
    }

    let mut transactions = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2; // header occupies line 1
        let record = record.with_context(|| format!("Line {}: unreadable record", line))?;
        let date_field = record.get(COL_DATE).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(date_field, DATE_FORMAT)
            .with_context(|| format!("Line {}: invalid date '{}'", line, date_field))?;
        let quantity_field = record.get(COL_QUANTITY).unwrap_or("").trim();
        let quantity: f64 = quantity_field
            .parse()
            .with_context(|| format!("Line {}: invalid quantity '{}'", line, quantity_field))?;
        let value_field = record.get(COL_VALUE).unwrap_or("").trim();
        let value: f64 = value_field
            .parse()
            .with_context(|| format!("Line {}: invalid value '{}'", line, value_field))?;
        transactions.push(Transaction {
            product: record.get(COL_PRODUCT).unwrap_or("").to_string(),
            isin: record.get(COL_ISIN).unwrap_or("").to_string(),
            date,
            quantity,
            value,
        });
    }
    info!("📄 Parsed {} transactions from export", transactions.len());
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, product: &str, isin: &str, quantity: &str, value: &str) -> String {
        format!(
            "{date},10:30,{product},{isin},EAM,EAM,{quantity},100.00,,{value},,{value},,1.0,0.00,,{value},,f1e2d3"
        )
    }

    fn export(rows: &[String]) -> Vec<u8> {
        let mut text = EXPECTED_HEADERS.to_string();
        for r in rows {
            text.push('\n');
            text.push_str(r);
        }
        text.into_bytes()
    }

    #[test]
    fn test_parses_buy_and_sell_rows() {
        let data = export(&[
            row("01-02-2021", "VANGUARD S&P 500", "IE00B3XXRP09", "10", "-1000.00"),
            row("15-09-2021", "VANGUARD S&P 500", "IE00B3XXRP09", "-4", "520.00"),
        ]);
        let transactions = parse_transactions(&data).unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].product, "VANGUARD S&P 500");
        assert_eq!(transactions[0].isin, "IE00B3XXRP09");
        assert_eq!(
            transactions[0].date,
            NaiveDate::from_ymd_opt(2021, 2, 1).unwrap()
        );
        assert_eq!(transactions[0].quantity, 10.0);
        assert_eq!(transactions[0].value, -1000.0);
        assert_eq!(transactions[1].quantity, -4.0);
        assert_eq!(transactions[1].value, 520.0);
    }

    #[test]
    fn test_accepts_renamed_headers_with_same_layout() {
        let mut text = String::from(
            "Date,Time,Product,ISIN,Exchange,Venue,Quantity,Price,,Local value,,Value,,FX,Fees,,Total,,Order ID",
        );
        text.push('\n');
        text.push_str(&row("01-02-2021", "ASML HOLDING", "NL0010273215", "2", "-1200.00"));
        let transactions = parse_transactions(text.as_bytes()).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].product, "ASML HOLDING");
    }

    #[test]
    fn test_rejects_wrong_column_count() {
        let data = b"Datum,Product,ISIN,Aantal,Waarde\n01-02-2021,X,Y,1,-10";
        let err = parse_transactions(data).unwrap_err();
        assert!(err.to_string().contains("5 columns"));
    }

    #[test]
    fn test_rejects_invalid_date_with_line_number() {
        let data = export(&[
            row("01-02-2021", "ASML HOLDING", "NL0010273215", "2", "-1200.00"),
            row("2021-02-01", "ASML HOLDING", "NL0010273215", "2", "-1200.00"),
        ]);
        let err = format!("{:#}", parse_transactions(&data).unwrap_err());
        assert!(err.contains("Line 3"));
        assert!(err.contains("2021-02-01"));
    }

    #[test]
    fn test_rejects_non_numeric_quantity() {
        let data = export(&[row("01-02-2021", "ASML HOLDING", "NL0010273215", "two", "-1200.00")]);
        let err = format!("{:#}", parse_transactions(&data).unwrap_err());
        assert!(err.contains("invalid quantity"));
    }

    #[test]
    fn test_empty_export_yields_no_transactions() {
        let data = export(&[]);
        let transactions = parse_transactions(&data).unwrap();
        assert!(transactions.is_empty());
    }
}
