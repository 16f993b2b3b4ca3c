use async_trait::async_trait;
use thiserror::Error;

use crate::models::YearlyPrices;

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceSnapshotProvider: Send + Sync {
    /// Checkpoint prices for each of the requested years. Years the market
    /// has no observations for are simply absent from the map; an empty map
    /// is a valid answer for a symbol with no history, not an error.
    async fn yearly_checkpoints(
        &self,
        ticker: &str,
        years: &[i32],
    ) -> Result<YearlyPrices, PriceProviderError>;
}
