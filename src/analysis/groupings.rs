/// Grouping and aggregation of rainfall records.
///
/// Grouped outputs are ordered by key (station, then year) ascending, the
/// way a sorted group-by presents them. Within a group, "first" always means
/// first in input order, never first after sorting.

use std::collections::BTreeMap;

use tracing::debug;

use crate::classification::{ClassificationBands, RainfallClass};
use crate::model::{
    round2, RainfallRecord, StationAverage, StationPeak, StationShare, StationYearSummary,
};

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Records whose year lies in `min_year..=max_year`.
pub fn filter_year_range(records: &[RainfallRecord], min_year: i32, max_year: i32) -> Vec<RainfallRecord> {
    let kept: Vec<RainfallRecord> = records
        .iter()
        .filter(|r| r.year >= min_year && r.year <= max_year)
        .cloned()
        .collect();
    debug!(
        stage = "filter",
        min_year,
        max_year,
        kept = kept.len(),
        excluded = records.len() - kept.len(),
        "applied year range"
    );
    kept
}

// ---------------------------------------------------------------------------
// Station/year summaries
// ---------------------------------------------------------------------------

struct YearAccumulator {
    total_mm: f64,
    peak_mm: f64,
    peak_month: String,
}

/// Annual totals per (station, year), classified with the default bands.
pub fn summarize(records: &[RainfallRecord]) -> Vec<StationYearSummary> {
    summarize_with(records, &ClassificationBands::default())
}

/// Annual totals per (station, year), classified with `bands`.
///
/// The peak month is the month of the first record reaching the group's
/// maximum amount.
pub fn summarize_with(records: &[RainfallRecord], bands: &ClassificationBands) -> Vec<StationYearSummary> {
    let mut groups: BTreeMap<(String, i32), YearAccumulator> = BTreeMap::new();

    for record in records {
        groups
            .entry((record.station.clone(), record.year))
            .and_modify(|acc| {
                acc.total_mm += record.amount_mm;
                // Strict: a later equal amount does not displace the first.
                if record.amount_mm > acc.peak_mm {
                    acc.peak_mm = record.amount_mm;
                    acc.peak_month = record.month.clone();
                }
            })
            .or_insert_with(|| YearAccumulator {
                total_mm: record.amount_mm,
                peak_mm: record.amount_mm,
                peak_month: record.month.clone(),
            });
    }

    let summaries: Vec<StationYearSummary> = groups
        .into_iter()
        .map(|((station, year), acc)| StationYearSummary {
            station,
            year,
            total_mm: acc.total_mm,
            peak_month: acc.peak_month,
            peak_mm: acc.peak_mm,
            classification: bands.classify(acc.total_mm),
        })
        .collect();

    debug!(stage = "summarize", groups = summaries.len(), "built station/year summaries");
    summaries
}

/// Number of summaries in each band. Every band is present, possibly at zero.
pub fn count_by_class(summaries: &[StationYearSummary]) -> BTreeMap<RainfallClass, usize> {
    let mut counts: BTreeMap<RainfallClass, usize> =
        RainfallClass::ALL.iter().map(|c| (*c, 0)).collect();
    for summary in summaries {
        *counts.entry(summary.classification).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Station averages
// ---------------------------------------------------------------------------

/// Mean annual total per station over the years present, rounded to 2
/// decimal places. Missing years are not filled with zero.
pub fn average_by_station(summaries: &[StationYearSummary]) -> Vec<StationAverage> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for summary in summaries {
        let entry = sums.entry(summary.station.as_str()).or_insert((0.0, 0));
        entry.0 += summary.total_mm;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(station, (sum, years))| StationAverage {
            station: station.to_string(),
            average_annual_mm: round2(sum / years as f64),
            years,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cross-station views
// ---------------------------------------------------------------------------

/// Each station's share of all recorded rainfall, ranked by total descending.
///
/// Percentages are rounded to 2 decimal places. When the grand total is zero
/// every percentage is zero.
pub fn station_shares(records: &[RainfallRecord]) -> Vec<StationShare> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.station.as_str()).or_insert(0.0) += record.amount_mm;
    }

    let grand_total: f64 = totals.values().sum();

    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (station, total_mm))| StationShare {
            rank: i + 1,
            station: station.to_string(),
            total_mm,
            percentage: if grand_total == 0.0 {
                0.0
            } else {
                round2(total_mm / grand_total * 100.0)
            },
        })
        .collect()
}

/// The wettest single month recorded by each station, wettest station first.
pub fn station_peaks(records: &[RainfallRecord]) -> Vec<StationPeak> {
    let mut peaks: BTreeMap<&str, StationPeak> = BTreeMap::new();
    for record in records {
        match peaks.get_mut(record.station.as_str()) {
            Some(peak) if record.amount_mm > peak.peak_mm => {
                peak.peak_mm = record.amount_mm;
                peak.year = record.year;
                peak.month = record.month.clone();
            }
            Some(_) => {}
            None => {
                peaks.insert(
                    record.station.as_str(),
                    StationPeak {
                        station: record.station.clone(),
                        peak_mm: record.amount_mm,
                        year: record.year,
                        month: record.month.clone(),
                    },
                );
            }
        }
    }

    let mut peaks: Vec<StationPeak> = peaks.into_values().collect();
    peaks.sort_by(|a, b| {
        b.peak_mm
            .total_cmp(&a.peak_mm)
            .then_with(|| a.station.cmp(&b.station))
    });
    peaks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(station: &str, year: i32, month: &str, amount: f64) -> RainfallRecord {
        RainfallRecord::new(station, year, month, amount)
    }

    #[test]
    fn test_filter_is_inclusive() {
        let records = vec![
            rec("A", 2019, "Jan", 1.0),
            rec("A", 2020, "Jan", 2.0),
            rec("A", 2024, "Jan", 3.0),
            rec("A", 2025, "Jan", 4.0),
        ];
        let kept = filter_year_range(&records, 2020, 2024);
        let years: Vec<i32> = kept.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2020, 2024]);
    }

    #[test]
    fn test_summary_total_peak_and_class() {
        let records = vec![rec("StationA", 2020, "Jan", 1000.0), rec("StationA", 2020, "Feb", 2000.0)];
        let summaries = summarize(&records);
        assert_eq!(summaries.len(), 1);

        let s = &summaries[0];
        assert_eq!(s.total_mm, 3000.0);
        assert_eq!(s.peak_month, "Feb");
        assert_eq!(s.peak_mm, 2000.0);
        assert_eq!(s.classification, RainfallClass::High);
    }

    #[test]
    fn test_peak_tie_goes_to_first_in_input_order() {
        // "Mar" sorts before "Oct" but "Oct" comes first in the input.
        let records = vec![
            rec("A", 2021, "Oct", 300.0),
            rec("A", 2021, "Jan", 100.0),
            rec("A", 2021, "Mar", 300.0),
        ];
        let summaries = summarize(&records);
        assert_eq!(summaries[0].peak_month, "Oct");
    }

    #[test]
    fn test_summaries_ordered_by_station_then_year() {
        let records = vec![
            rec("B", 2021, "Jan", 1.0),
            rec("A", 2022, "Jan", 1.0),
            rec("B", 2020, "Jan", 1.0),
            rec("A", 2021, "Jan", 1.0),
        ];
        let keys: Vec<(String, i32)> = summarize(&records)
            .into_iter()
            .map(|s| (s.station, s.year))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A".to_string(), 2021),
                ("A".to_string(), 2022),
                ("B".to_string(), 2020),
                ("B".to_string(), 2021),
            ]
        );
    }

    #[test]
    fn test_summarize_with_custom_bands() {
        let bands = ClassificationBands {
            medium_min_mm: 10.0,
            high_above_mm: 20.0,
        };
        let records = vec![rec("A", 2020, "Jan", 15.0), rec("B", 2020, "Jan", 25.0)];
        let summaries = summarize_with(&records, &bands);
        assert_eq!(summaries[0].classification, RainfallClass::Medium);
        assert_eq!(summaries[1].classification, RainfallClass::High);
    }

    #[test]
    fn test_conservation_of_totals() {
        let records = vec![
            rec("A", 2020, "Jan", 120.5),
            rec("A", 2020, "Feb", 80.25),
            rec("A", 2021, "Jan", 33.0),
            rec("B", 2020, "Jan", 410.75),
            rec("B", 2022, "Dec", 0.0),
        ];
        let input: f64 = records.iter().map(|r| r.amount_mm).sum();
        let summed: f64 = summarize(&records).iter().map(|s| s.total_mm).sum();
        assert!((input - summed).abs() < 1e-9);
    }

    #[test]
    fn test_average_uses_only_years_present() {
        let records = vec![rec("StationA", 2020, "Jan", 1000.0), rec("StationA", 2021, "Jan", 2000.0)];
        let averages = average_by_station(&summarize(&records));
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].average_annual_mm, 1500.0);
        assert_eq!(averages[0].years, 2);
    }

    #[test]
    fn test_average_is_rounded_to_two_places() {
        let records = vec![
            rec("A", 2020, "Jan", 100.0),
            rec("A", 2021, "Jan", 100.0),
            rec("A", 2022, "Jan", 101.0),
        ];
        let averages = average_by_station(&summarize(&records));
        assert_eq!(averages[0].average_annual_mm, 100.33);
    }

    #[test]
    fn test_average_is_order_invariant() {
        let records = vec![
            rec("A", 2020, "Jan", 1250.0),
            rec("A", 2021, "Jan", 875.5),
            rec("A", 2022, "Jan", 2310.25),
            rec("B", 2020, "Jan", 10.0),
        ];
        let mut summaries = summarize(&records);
        let forward = average_by_station(&summaries);
        summaries.reverse();
        let backward = average_by_station(&summaries);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_count_by_class_includes_empty_bands() {
        let records = vec![rec("A", 2020, "Jan", 100.0), rec("B", 2020, "Jan", 200.0)];
        let counts = count_by_class(&summarize(&records));
        assert_eq!(counts[&RainfallClass::Low], 2);
        assert_eq!(counts[&RainfallClass::Medium], 0);
        assert_eq!(counts[&RainfallClass::High], 0);
    }

    #[test]
    fn test_shares_ranked_and_sum_to_hundred() {
        let records = vec![
            rec("Kemayoran", 2020, "Jan", 300.0),
            rec("Tanjung Priok", 2020, "Jan", 600.0),
            rec("Kemayoran", 2021, "Jan", 100.0),
            rec("Halim", 2020, "Jan", 0.0),
        ];
        let shares = station_shares(&records);
        let names: Vec<&str> = shares.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(names, vec!["Tanjung Priok", "Kemayoran", "Halim"]);
        assert_eq!(shares.iter().map(|s| s.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(shares[0].percentage, 60.0);
        assert_eq!(shares[1].percentage, 40.0);
        assert_eq!(shares[2].percentage, 0.0);

        let total: f64 = shares.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_shares_with_zero_grand_total() {
        let records = vec![rec("A", 2020, "Jan", 0.0), rec("B", 2020, "Jan", 0.0)];
        let shares = station_shares(&records);
        assert!(shares.iter().all(|s| s.percentage == 0.0));
        // Equal totals fall back to station name order.
        assert_eq!(shares[0].station, "A");
    }

    #[test]
    fn test_station_peaks() {
        let records = vec![
            rec("A", 2018, "Feb", 250.0),
            rec("B", 2019, "Jan", 90.0),
            rec("A", 2023, "Dec", 410.0),
            rec("A", 2024, "Jan", 410.0),
        ];
        let peaks = station_peaks(&records);
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].station, "A");
        assert_eq!(peaks[0].peak_mm, 410.0);
        assert_eq!(peaks[0].year, 2023);
        assert_eq!(peaks[0].month, "Dec");
        assert_eq!(peaks[1].station, "B");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(summarize(&[]).is_empty());
        assert!(average_by_station(&[]).is_empty());
        assert!(station_shares(&[]).is_empty());
        assert!(station_peaks(&[]).is_empty());
    }
}
