//! Run Report Module
//!
//! Writes the tabular artifacts of a run, the JSON run report, and the
//! console summary table.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::classification::ClassificationBands;
use crate::config::RainfallConfig;
use crate::ingest::LoadStats;
use crate::model::{RainfallError, StationAverage, StationPeak, StationShare, StationYearSummary};
use crate::pipeline::RunOutput;

pub const CLASSIFICATION_FILE: &str = "classification.csv";
pub const AVERAGES_FILE: &str = "station_averages.csv";
pub const SHARES_FILE: &str = "station_shares.csv";
pub const PEAKS_FILE: &str = "station_peaks.csv";
pub const REPORT_FILE: &str = "report.json";

// ============================================================================
// Table rows
// ============================================================================

#[derive(Debug, Serialize)]
struct ClassificationRow<'a> {
    station: &'a str,
    year: i32,
    classification: String,
    peak_month: &'a str,
    total_mm: f64,
}

#[derive(Debug, Serialize)]
struct AverageRow<'a> {
    station: &'a str,
    average_annual_mm: f64,
}

#[derive(Debug, Serialize)]
struct ShareRow<'a> {
    rank: Option<usize>,
    station: &'a str,
    total_mm: f64,
    percentage: f64,
}

#[derive(Debug, Serialize)]
struct PeakRow<'a> {
    station: &'a str,
    peak_mm: f64,
    year: i32,
    month: &'a str,
}

// ============================================================================
// JSON report
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub generated_at: String,
    pub input: Option<String>,
    pub min_year: i32,
    pub max_year: i32,
    pub whole_period_shares: bool,
    pub bands: ClassificationBands,
    pub load: LoadStats,
    pub filtered_records: usize,
    pub class_counts: BTreeMap<String, usize>,
    pub summaries: &'a [StationYearSummary],
    pub averages: &'a [StationAverage],
    pub shares: &'a [StationShare],
    pub peaks: &'a [StationPeak],
}

impl<'a> RunReport<'a> {
    pub fn new(config: &RainfallConfig, output: &'a RunOutput) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            input: config.input.path.as_ref().map(|p| p.display().to_string()),
            min_year: config.filter.min_year,
            max_year: config.filter.max_year,
            whole_period_shares: config.filter.whole_period_shares,
            bands: config.classification,
            load: output.load,
            filtered_records: output.filtered_records,
            class_counts: output
                .class_counts
                .iter()
                .map(|(class, n)| (class.to_string(), *n))
                .collect(),
            summaries: &output.summaries,
            averages: &output.averages,
            shares: &output.shares,
            peaks: &output.peaks,
        }
    }

    pub fn to_json(&self) -> Result<String, RainfallError> {
        serde_json::to_string_pretty(self).map_err(|e| RainfallError::Output {
            path: REPORT_FILE.to_string(),
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// Writers
// ============================================================================

/// Writes every artifact into `config.output.dir`, creating it if needed.
/// Returns the paths written.
pub fn write_outputs(config: &RainfallConfig, output: &RunOutput) -> Result<Vec<PathBuf>, RainfallError> {
    let dir = &config.output.dir;
    fs::create_dir_all(dir).map_err(|e| output_error(dir, e))?;

    let mut written = vec![
        write_classification(&dir.join(CLASSIFICATION_FILE), &output.summaries)?,
        write_averages(&dir.join(AVERAGES_FILE), &output.averages)?,
        write_shares(&dir.join(SHARES_FILE), &output.shares)?,
        write_peaks(&dir.join(PEAKS_FILE), &output.peaks)?,
    ];

    if config.output.json_report {
        let path = dir.join(REPORT_FILE);
        let json = RunReport::new(config, output).to_json()?;
        fs::write(&path, json).map_err(|e| output_error(&path, e))?;
        written.push(path);
    }

    for path in &written {
        info!(stage = "emit", path = %path.display(), "wrote artifact");
    }
    Ok(written)
}

pub fn write_classification(path: &Path, summaries: &[StationYearSummary]) -> Result<PathBuf, RainfallError> {
    write_rows(
        path,
        summaries.iter().map(|s| ClassificationRow {
            station: &s.station,
            year: s.year,
            classification: s.classification.to_string(),
            peak_month: &s.peak_month,
            total_mm: s.total_mm,
        }),
    )
}

pub fn write_averages(path: &Path, averages: &[StationAverage]) -> Result<PathBuf, RainfallError> {
    write_rows(
        path,
        averages.iter().map(|a| AverageRow {
            station: &a.station,
            average_annual_mm: a.average_annual_mm,
        }),
    )
}

/// Share table followed by a `TOTAL` row carrying the grand total.
pub fn write_shares(path: &Path, shares: &[StationShare]) -> Result<PathBuf, RainfallError> {
    let grand_total: f64 = shares.iter().map(|s| s.total_mm).sum();
    let total_row = ShareRow {
        rank: None,
        station: "TOTAL",
        total_mm: grand_total,
        percentage: 100.0,
    };
    write_rows(
        path,
        shares
            .iter()
            .map(|s| ShareRow {
                rank: Some(s.rank),
                station: &s.station,
                total_mm: s.total_mm,
                percentage: s.percentage,
            })
            .chain(std::iter::once(total_row)),
    )
}

pub fn write_peaks(path: &Path, peaks: &[StationPeak]) -> Result<PathBuf, RainfallError> {
    write_rows(
        path,
        peaks.iter().map(|p| PeakRow {
            station: &p.station,
            peak_mm: p.peak_mm,
            year: p.year,
            month: &p.month,
        }),
    )
}

fn write_rows<T, I>(path: &Path, rows: I) -> Result<PathBuf, RainfallError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let csv_err = |e: csv::Error| RainfallError::Output {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| output_error(path, e))?;
    Ok(path.to_path_buf())
}

fn output_error(path: &Path, err: io::Error) -> RainfallError {
    RainfallError::Output {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

// ============================================================================
// Console summary
// ============================================================================

/// Renders the console summary: station shares, grand total, wettest
/// station and band counts.
pub fn format_summary(output: &RunOutput) -> String {
    let rule = "═".repeat(60);
    let thin = "─".repeat(60);
    let mut out = String::new();

    out.push_str(&format!("{rule}\n"));
    out.push_str("RAINFALL SUMMARY PER STATION\n");
    out.push_str(&format!("{rule}\n"));
    out.push_str(&format!("{:<24} {:>15} {:>12}\n", "Station", "Total (mm)", "Share"));
    out.push_str(&format!("{thin}\n"));
    for share in &output.shares {
        out.push_str(&format!(
            "{:<24} {:>15.1} {:>11.1}%\n",
            share.station, share.total_mm, share.percentage
        ));
    }
    out.push_str(&format!("{thin}\n"));
    out.push_str(&format!(
        "{:<24} {:>15.1} {:>12}\n",
        "TOTAL",
        output.share_total_mm(),
        "100.0%"
    ));

    if let Some(top) = output.shares.first() {
        out.push_str(&format!(
            "\nWettest station: {} ({:.1} mm, {:.1}%)\n",
            top.station, top.total_mm, top.percentage
        ));
    }

    out.push_str("\nStation-years per band:");
    for (class, count) in &output.class_counts {
        out.push_str(&format!("  {class}: {count}"));
    }
    out.push('\n');
    out.push_str(&format!("{rule}\n"));
    out
}

pub fn print_summary(output: &RunOutput) {
    print!("{}", format_summary(output));
}
