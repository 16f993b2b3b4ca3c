use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait TickerResolver: Send + Sync {
    /// Maps an ISIN to its primary ticker symbol. `Ok(None)` means the
    /// identifier has no known mapping; errors are transport failures.
    async fn resolve(&self, isin: &str) -> Result<Option<String>, ResolveError>;
}
