use std::sync::Arc;

use crate::config::AppConfig;
use crate::external::price_provider::PriceSnapshotProvider;
use crate::external::ticker_resolver::TickerResolver;
use crate::services::resolution_cache::ResolutionCache;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub ticker_resolver: Arc<dyn TickerResolver>,
    pub price_provider: Arc<dyn PriceSnapshotProvider>,
    pub resolution_cache: ResolutionCache,
}
