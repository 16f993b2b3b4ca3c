use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The five calendar points of a year at which a holding's price is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    YearStart,
    Quarter1End,
    MidYear,
    Quarter3End,
    YearEnd,
}

impl CheckpointKind {
    /// Calendar date of this checkpoint within `year`.
    pub fn date_in(self, year: i32) -> NaiveDate {
        let (month, day) = match self {
            CheckpointKind::YearStart => (1, 1),
            CheckpointKind::Quarter1End => (3, 1),
            CheckpointKind::MidYear => (6, 30),
            CheckpointKind::Quarter3End => (10, 1),
            CheckpointKind::YearEnd => (12, 31),
        };
        NaiveDate::from_ymd_opt(year, month, day).expect("valid checkpoint date")
    }

    /// Epoch key (noon UTC) under which a worth sample taken at this
    /// checkpoint is stored. The year-end sample is keyed at the year's
    /// opening day; the intra-year samples key at their own dates.
    pub fn sample_timestamp(self, year: i32) -> i64 {
        let date = match self {
            CheckpointKind::YearEnd => CheckpointKind::YearStart.date_in(year),
            other => other.date_in(year),
        };
        noon_utc_timestamp(date)
    }
}

/// Seconds since the epoch for `date` at 12:00 UTC.
pub fn noon_utc_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(12, 0, 0)
        .expect("valid time of day")
        .and_utc()
        .timestamp()
}

/// Checkpoint prices observed for one calendar year. A missing field means
/// the market had no close at that checkpoint (date in the future, holiday
/// gap, or the series does not cover it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YearCheckpoints {
    pub start: Option<f64>,
    pub q1_end: Option<f64>,
    pub mid: Option<f64>,
    pub q3_end: Option<f64>,
    pub end: Option<f64>,
}

/// Checkpoint prices per year, ordered by year.
pub type YearlyPrices = BTreeMap<i32, YearCheckpoints>;
