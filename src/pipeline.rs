//! The forward pass: load → filter → aggregate → classify → summarize.
//!
//! `run` performs the only I/O (reading the source table); `process` is the
//! pure remainder and is what tests drive directly.

use std::collections::BTreeMap;

use tracing::info;

use crate::analysis;
use crate::classification::RainfallClass;
use crate::config::RainfallConfig;
use crate::ingest::{load_table, LoadStats, LoadedTable};
use crate::logging;
use crate::model::{RainfallError, StationAverage, StationPeak, StationShare, StationYearSummary};

/// Everything a run produces, ready to be written out.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub load: LoadStats,
    /// Records inside the configured year range.
    pub filtered_records: usize,
    /// Sum of the amounts of the filtered records, in mm.
    pub filtered_total_mm: f64,
    pub summaries: Vec<StationYearSummary>,
    pub averages: Vec<StationAverage>,
    pub shares: Vec<StationShare>,
    pub peaks: Vec<StationPeak>,
    pub class_counts: BTreeMap<RainfallClass, usize>,
}

impl RunOutput {
    /// Sum of all station totals in the share table, in mm.
    pub fn share_total_mm(&self) -> f64 {
        self.shares.iter().map(|s| s.total_mm).sum()
    }
}

/// Loads the configured input and processes it.
pub fn run(config: &RainfallConfig) -> Result<RunOutput, RainfallError> {
    config.validate()?;
    let input = config.input.path.as_deref().ok_or_else(|| RainfallError::Config {
        reason: "no input file configured".to_string(),
    })?;

    let table = load_table(input, &config.load_options()?)?;
    logging::log_load_summary(&input.display().to_string(), &table.stats);

    Ok(process(table, config))
}

/// Runs every aggregation step over an already loaded table.
pub fn process(table: LoadedTable, config: &RainfallConfig) -> RunOutput {
    let LoadedTable { records, stats } = table;
    let filter = &config.filter;

    let filtered = analysis::filter_year_range(&records, filter.min_year, filter.max_year);
    let filtered_total_mm: f64 = filtered.iter().map(|r| r.amount_mm).sum();

    let summaries = analysis::summarize_with(&filtered, &config.classification);
    let class_counts = analysis::count_by_class(&summaries);
    let averages = analysis::average_by_station(&summaries);

    let share_basis = if filter.whole_period_shares { &records } else { &filtered };
    let shares = analysis::station_shares(share_basis);
    let peaks = analysis::station_peaks(share_basis);

    info!(
        stage = "summarize",
        records = filtered.len(),
        station_years = summaries.len(),
        stations = averages.len(),
        low = class_counts[&RainfallClass::Low],
        medium = class_counts[&RainfallClass::Medium],
        high = class_counts[&RainfallClass::High],
        "aggregation complete"
    );

    RunOutput {
        load: stats,
        filtered_records: filtered.len(),
        filtered_total_mm,
        summaries,
        averages,
        shares,
        peaks,
        class_counts,
    }
}
