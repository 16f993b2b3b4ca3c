pub mod openfigi;
pub mod price_provider;
pub mod ticker_resolver;
pub mod yahoo;
