//! Descriptive statistics over multi-year, multi-station monthly rainfall
//! tables: annual totals per station, classification into wetness bands,
//! per-station averages, cross-station shares and record peaks.

pub mod analysis;
pub mod classification;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;

pub use classification::{classify, ClassificationBands, RainfallClass};
pub use model::{
    RainfallError, RainfallRecord, StationAverage, StationPeak, StationShare, StationYearSummary,
};
