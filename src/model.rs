/// Core data types for the rainfall statistics pipeline.
///
/// This module defines the shared domain model imported by all other modules:
/// raw records, the derived per-station summaries, and the crate error type.
/// It contains no aggregation logic and no I/O.

use serde::Serialize;

use crate::classification::RainfallClass;

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Number of positional columns expected in a source table.
pub const SOURCE_COLUMNS: usize = 9;

/// Positional column names, in source order. Header text in the file is
/// ignored; these names are used for diagnostics only.
pub const SOURCE_COLUMN_NAMES: [&str; SOURCE_COLUMNS] = [
    "ordinal",
    "province_code",
    "province_name",
    "post_name",
    "station",
    "month",
    "amount_mm",
    "unit",
    "year",
];

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// One monthly rainfall observation for a station.
///
/// Corresponds to one row of the source table that carried a numeric
/// amount and an integral year. Rows that fail either parse never become
/// records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainfallRecord {
    pub station: String,
    pub year: i32,
    pub month: String,
    pub amount_mm: f64,
    pub meta: RecordMeta,
}

/// Remaining source columns, carried verbatim. Not used by aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordMeta {
    pub ordinal: String,
    pub province_code: String,
    pub province_name: String,
    pub post_name: String,
    pub unit: String,
}

impl RainfallRecord {
    /// Builds a record with empty metadata.
    pub fn new(station: &str, year: i32, month: &str, amount_mm: f64) -> Self {
        Self {
            station: station.to_string(),
            year,
            month: month.to_string(),
            amount_mm,
            meta: RecordMeta::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived types
// ---------------------------------------------------------------------------

/// Annual total for one station, with its wettest month and band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationYearSummary {
    pub station: String,
    pub year: i32,
    pub total_mm: f64,
    /// Month of the largest single-month amount; first in input order on ties.
    pub peak_month: String,
    pub peak_mm: f64,
    pub classification: RainfallClass,
}

/// Mean annual total for a station over the years present in the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationAverage {
    pub station: String,
    /// Rounded to 2 decimal places.
    pub average_annual_mm: f64,
    pub years: usize,
}

/// A station's share of the rainfall recorded across all stations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationShare {
    pub rank: usize,
    pub station: String,
    pub total_mm: f64,
    /// Percentage of the grand total, rounded to 2 decimal places.
    pub percentage: f64,
}

/// The single wettest month a station ever recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationPeak {
    pub station: String,
    pub peak_mm: f64,
    pub year: i32,
    pub month: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort a rainfall statistics run.
///
/// Bad numeric cells are not errors; the loader drops those rows and counts
/// them instead.
#[derive(Debug, thiserror::Error)]
pub enum RainfallError {
    /// The input could not be opened or read.
    #[error("cannot read data source '{path}': {reason}")]
    DataSource { path: String, reason: String },

    /// The input was readable but its layout is wrong.
    #[error("malformed data source '{path}' at line {line}: {reason}")]
    MalformedSource {
        path: String,
        line: u64,
        reason: String,
    },

    /// The configuration file or a configured value is invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// An output artifact could not be written.
    #[error("cannot write '{path}': {reason}")]
    Output { path: String, reason: String },
}

impl RainfallError {
    /// True for failures of the input itself (missing, unreadable, malformed).
    pub fn is_data_source(&self) -> bool {
        matches!(
            self,
            RainfallError::DataSource { .. } | RainfallError::MalformedSource { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Rounds to 2 decimal places, ties to even on the scaled value.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
