/// Source table ingestion.
///
/// Submodules:
/// - `table` — positional delimited-text loader producing `RainfallRecord`s.

pub mod table;

pub use table::{load_records, load_table, read_table, LoadOptions, LoadStats, LoadedTable};
