use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// One normalized row of the brokerage transaction export. Quantity is the
// signed share delta (+buy / -sell); value is the signed cash delta in the
// account currency (negative = cash out on a buy, positive = cash in on a
// sell).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub product: String,
    pub isin: String,
    pub date: NaiveDate,
    pub quantity: f64,
    pub value: f64,
}

// All transactions sharing one product name, in export order. The export
// repeats the ISIN on every row; the first row's value is kept.
#[derive(Debug, Clone)]
pub struct Holding {
    pub product: String,
    pub isin: String,
    pub transactions: Vec<Transaction>,
}

impl Holding {
    /// Groups a flat transaction list into holdings, preserving the order
    /// in which products first appear in the export.
    pub fn group_all(transactions: Vec<Transaction>) -> Vec<Holding> {
        let mut holdings: Vec<Holding> = Vec::new();
        for tx in transactions {
            match holdings.iter().position(|h| h.product == tx.product) {
                Some(index) => holdings[index].transactions.push(tx),
                None => holdings.push(Holding {
                    product: tx.product.clone(),
                    isin: tx.isin.clone(),
                    transactions: vec![tx],
                }),
            }
        }
        holdings
    }
}
