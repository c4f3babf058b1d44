/// Aggregation over loaded rainfall records.
///
/// Everything here is a pure function of its inputs: no I/O, no state kept
/// between calls, and output ordering fixed by station name (and year).
///
/// Submodules:
/// - `groupings` — year filtering, station/year summaries, station averages,
///   cross-station shares and record peaks.

pub mod groupings;

pub use groupings::{
    average_by_station, count_by_class, filter_year_range, station_peaks, station_shares,
    summarize, summarize_with,
};
