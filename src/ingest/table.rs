/// Positional rainfall table loader.
///
/// Reads a delimited text export of the monthly rainfall sheet. Columns are
/// identified by position, never by header text:
///
///   0 ordinal, 1 province code, 2 province name, 3 post name,
///   4 station, 5 month, 6 amount (mm), 7 unit, 8 year
///
/// A row whose amount or year does not parse is dropped and counted. A table
/// with the wrong number of columns is rejected outright.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::model::{RainfallError, RainfallRecord, RecordMeta, SOURCE_COLUMNS, SOURCE_COLUMN_NAMES};

const AMOUNT_COLUMN: usize = 6;
const YEAR_COLUMN: usize = 8;

// ============================================================================
// Options and results
// ============================================================================

/// How to read the source table.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Row counts from a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub rows_read: usize,
    pub rows_used: usize,
    /// Rows dropped because the amount was blank or not a finite number.
    pub dropped_amount: usize,
    /// Rows dropped because the year was not an integer.
    pub dropped_year: usize,
}

impl LoadStats {
    pub fn dropped_rows(&self) -> usize {
        self.dropped_amount + self.dropped_year
    }
}

/// Parsed records plus the counts describing how they were obtained.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub records: Vec<RainfallRecord>,
    pub stats: LoadStats,
}

// ============================================================================
// Entry points
// ============================================================================

/// Loads every usable record from the table at `path`.
pub fn load_records(path: &Path, options: &LoadOptions) -> Result<Vec<RainfallRecord>, RainfallError> {
    load_table(path, options).map(|table| table.records)
}

/// Loads the table at `path`, keeping the row counts.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<LoadedTable, RainfallError> {
    let source = path.display().to_string();
    let file = File::open(path).map_err(|e| RainfallError::DataSource {
        path: source.clone(),
        reason: e.to_string(),
    })?;

    let table = read_table(file, &source, options)?;
    info!(
        stage = "load",
        source = %source,
        rows_read = table.stats.rows_read,
        rows_used = table.stats.rows_used,
        "loaded rainfall table"
    );
    Ok(table)
}

/// Parses a table from any reader. `source` names it in errors.
pub fn read_table<R: Read>(
    reader: R,
    source: &str,
    options: &LoadOptions,
) -> Result<LoadedTable, RainfallError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header_len = reader
        .headers()
        .map_err(|e| csv_error(source, 1, e))?
        .len();
    if header_len != SOURCE_COLUMNS {
        return Err(RainfallError::MalformedSource {
            path: source.to_string(),
            line: 1,
            reason: format!(
                "expected {} columns in header, found {}",
                SOURCE_COLUMNS, header_len
            ),
        });
    }

    let mut records = Vec::new();
    let mut stats = LoadStats::default();

    for (i, row) in reader.records().enumerate() {
        // Header occupies line 1.
        let fallback_line = i as u64 + 2;
        let row = row.map_err(|e| csv_error(source, fallback_line, e))?;
        let line = row.position().map(|p| p.line()).unwrap_or(fallback_line);
        stats.rows_read += 1;

        if row.len() != SOURCE_COLUMNS {
            return Err(RainfallError::MalformedSource {
                path: source.to_string(),
                line,
                reason: format!("expected {} columns, found {}", SOURCE_COLUMNS, row.len()),
            });
        }

        let Some(amount_mm) = parse_amount(&row[AMOUNT_COLUMN]) else {
            debug!(
                stage = "load",
                line,
                column = SOURCE_COLUMN_NAMES[AMOUNT_COLUMN],
                value = &row[AMOUNT_COLUMN],
                "dropping row with non-numeric amount"
            );
            stats.dropped_amount += 1;
            continue;
        };
        let Some(year) = parse_year(&row[YEAR_COLUMN]) else {
            debug!(
                stage = "load",
                line,
                column = SOURCE_COLUMN_NAMES[YEAR_COLUMN],
                value = &row[YEAR_COLUMN],
                "dropping row with invalid year"
            );
            stats.dropped_year += 1;
            continue;
        };

        records.push(RainfallRecord {
            station: row[4].to_string(),
            year,
            month: row[5].to_string(),
            amount_mm,
            meta: RecordMeta {
                ordinal: row[0].to_string(),
                province_code: row[1].to_string(),
                province_name: row[2].to_string(),
                post_name: row[3].to_string(),
                unit: row[7].to_string(),
            },
        });
        stats.rows_used += 1;
    }

    Ok(LoadedTable { records, stats })
}

// ============================================================================
// Cell parsing
// ============================================================================

/// Rainfall amount, or `None` for blank, non-numeric or non-finite cells.
pub(crate) fn parse_amount(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Year as an integer. Spreadsheet exports often write `2021.0`, which is
/// accepted when integral.
pub(crate) fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if let Ok(year) = cell.parse::<i32>() {
        return Some(year);
    }
    let value = cell.parse::<f64>().ok()?;
    if value.is_finite()
        && value.fract() == 0.0
        && value >= i32::MIN as f64
        && value <= i32::MAX as f64
    {
        Some(value as i32)
    } else {
        None
    }
}

fn csv_error(source: &str, fallback_line: u64, err: csv::Error) -> RainfallError {
    let line = err.position().map(|p| p.line()).unwrap_or(fallback_line);
    match err.kind() {
        csv::ErrorKind::Io(io) => RainfallError::DataSource {
            path: source.to_string(),
            reason: io.to_string(),
        },
        _ => RainfallError::MalformedSource {
            path: source.to_string(),
            line,
            reason: err.to_string(),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "No,Kode Provinsi,Nama Provinsi,Nama Pos Hujan,Nama Stasiun Hujan,Bulan,Jumlah Curah Hujan,Satuan,Tahun\n";

    fn read(body: &str) -> Result<LoadedTable, RainfallError> {
        let text = format!("{}{}", HEADER, body);
        read_table(text.as_bytes(), "inline", &LoadOptions::default())
    }

    #[test]
    fn test_parses_positional_columns() {
        let table = read("1,31,DKI Jakarta,Pos A,Kemayoran,Januari,412.5,mm,2021\n").unwrap();
        assert_eq!(table.records.len(), 1);

        let rec = &table.records[0];
        assert_eq!(rec.station, "Kemayoran");
        assert_eq!(rec.month, "Januari");
        assert_eq!(rec.amount_mm, 412.5);
        assert_eq!(rec.year, 2021);
        assert_eq!(rec.meta.province_name, "DKI Jakarta");
        assert_eq!(rec.meta.unit, "mm");
    }

    #[test]
    fn test_header_text_is_ignored() {
        let text = "a,b,c,d,e,f,g,h,i\n1,31,X,P,Station,Feb,10,mm,2020\n";
        let table = read_table(text.as_bytes(), "inline", &LoadOptions::default()).unwrap();
        assert_eq!(table.records[0].station, "Station");
    }

    #[test]
    fn test_non_numeric_amounts_are_dropped_not_errored() {
        let table = read(
            "1,31,X,P,S,Januari,-,mm,2021\n\
             2,31,X,P,S,Februari,,mm,2021\n\
             3,31,X,P,S,Maret,abc,mm,2021\n\
             4,31,X,P,S,April,NaN,mm,2021\n\
             5,31,X,P,S,Mei,120.0,mm,2021\n",
        )
        .unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].month, "Mei");
        assert_eq!(table.stats.rows_read, 5);
        assert_eq!(table.stats.rows_used, 1);
        assert_eq!(table.stats.dropped_amount, 4);
        assert_eq!(table.stats.dropped_rows(), 4);
    }

    #[test]
    fn test_float_formatted_year_is_accepted() {
        let table = read("1,31,X,P,S,Januari,5,mm,2022.0\n2,31,X,P,S,Januari,5,mm,2022.5\n").unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].year, 2022);
        assert_eq!(table.stats.dropped_year, 1);
    }

    #[test]
    fn test_wrong_header_width_is_malformed() {
        let text = "No,Station,Month,Amount\n1,S,Jan,10\n";
        let err = read_table(text.as_bytes(), "inline", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, RainfallError::MalformedSource { line: 1, .. }));
    }

    #[test]
    fn test_short_row_is_malformed() {
        let err = read("1,31,X,P,S,Januari,5,mm,2021\n2,31,X,P,S,Februari,5\n").unwrap_err();
        match err {
            RainfallError::MalformedSource { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("found 7"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let err = read_table("".as_bytes(), "inline", &LoadOptions::default()).unwrap_err();
        assert!(err.is_data_source());
    }

    #[test]
    fn test_header_only_yields_no_records() {
        let table = read("").unwrap();
        assert!(table.records.is_empty());
        assert_eq!(table.stats, LoadStats::default());
    }

    #[test]
    fn test_semicolon_delimiter() {
        let text = "a;b;c;d;e;f;g;h;i\n1;31;X;P;S;Juni;77.7;mm;2023\n";
        let options = LoadOptions { delimiter: b';' };
        let table = read_table(text.as_bytes(), "inline", &options).unwrap();
        assert_eq!(table.records[0].amount_mm, 77.7);
    }

    #[test]
    fn test_missing_file_is_data_source_error() {
        let err = load_table(Path::new("/nonexistent/rainfall.csv"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, RainfallError::DataSource { .. }));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 12.5 "), Some(12.5));
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("12,5"), None);
    }
}
