pub mod csv_ingest_service;
pub mod portfolio_service;
pub mod resolution_cache;
pub mod valuation;
pub mod year_range;
