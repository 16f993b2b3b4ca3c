mod checkpoints;
mod report;
mod transaction;

pub use checkpoints::{noon_utc_timestamp, CheckpointKind, YearCheckpoints, YearlyPrices};
pub use report::{
    AnalysisResponse, HoldingFailure, HoldingOutcome, HoldingReport, PortfolioSummary, YearlyGain,
};
pub use transaction::{Holding, Transaction};
