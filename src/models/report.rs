use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A fully valued holding as returned to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingReport {
    pub stock_name: String,
    pub total_gain_percent: f64,
    pub total_gain_value: f64,
    pub total_invested: f64,
    pub currently_invested: f64,
    pub final_worth: f64,
    pub stocks_in_possession: f64,
    pub realized_gain: f64,
    pub yearly_gains: BTreeMap<i32, YearlyGain>,
    /// Worth samples keyed by epoch seconds (noon UTC), truncated to whole
    /// currency units.
    pub yearly_worth: BTreeMap<i64, i64>,
}

/// Value change attributed to one calendar year, net of money added or
/// withdrawn during that year.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct YearlyGain {
    pub virtual_gain_value: f64,
    pub virtual_gain_percentage: f64,
}

/// A holding that could not be valued: the product name and the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingFailure {
    pub stock_name: String,
    pub error: String,
}

/// Per-holding outcome. Failures keep their slot in the results list so the
/// frontend can show them next to the valued holdings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoldingOutcome {
    Valued(HoldingReport),
    Failed(HoldingFailure),
}

impl HoldingOutcome {
    pub fn as_valued(&self) -> Option<&HoldingReport> {
        match self {
            HoldingOutcome::Valued(report) => Some(report),
            HoldingOutcome::Failed(_) => None,
        }
    }
}

/// Portfolio-level aggregation over the valued holdings only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_worth: f64,
    pub total_gain: f64,
    pub total_gain_percentage: f64,
    #[serde(rename = "total_invested_all_stocks")]
    pub total_invested: f64,
    pub total_realized_gain: f64,
    #[serde(rename = "yearly_worths_whole_portfolio")]
    pub yearly_worths: BTreeMap<i64, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub results: Vec<HoldingOutcome>,
    pub summary: PortfolioSummary,
}
