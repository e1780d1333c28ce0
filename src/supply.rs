//! Per-manufacturer supply series and the CSV workbook loader.
//!
//! A "workbook" is a directory of CSV files, one per manufacturer, with the
//! file stem naming the manufacturer. Each file carries a `date` column
//! (`YYYY-MM-DD`) and a `doses` column (non-negative integers); header
//! matching is case-insensitive and `dose` is accepted as a spelling of
//! `doses`. Dates that never appear simply mean no shipment that day — the
//! join in [`crate::timeline`] fills them with zero.
//!
//! Everything downstream of loading works on [`SupplySeries`] values, so
//! callers can also build series programmatically and skip the filesystem.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use csv::ReaderBuilder;
use serde_derive::{Deserialize, Serialize};

use crate::error::VaxlineError;
use crate::log::{info, warn};

/// One shipment: `doses` received on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyRecord {
    pub date: NaiveDate,
    pub doses: u64,
}

/// Every recorded shipment for one manufacturer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplySeries {
    pub manufacturer: String,
    pub records: Vec<SupplyRecord>,
}

impl SupplySeries {
    pub fn new<S: Into<String>>(manufacturer: S, records: Vec<SupplyRecord>) -> Self {
        SupplySeries {
            manufacturer: manufacturer.into(),
            records,
        }
    }
}

/// Doses shipped by one manufacturer within one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySupply {
    pub manufacturer: String,
    pub year: i32,
    pub month: u32,
    pub doses: u64,
}

/// Loads every `*.csv` file in `directory` as one manufacturer's series.
/// Files are visited in file-name order so the manufacturer order of the
/// run is deterministic. Non-CSV entries are ignored.
///
/// # Errors
/// Returns an error if the directory cannot be read or any sheet is
/// malformed (see [`load_supply_csv`]).
pub fn load_supply_dir(directory: &Path) -> Result<Vec<SupplySeries>, VaxlineError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"))
        {
            paths.push(path);
        }
    }
    paths.sort();

    let mut series = Vec::with_capacity(paths.len());
    for path in &paths {
        let Some(manufacturer) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!(
                "skipping supply file with a non-UTF-8 name: {}",
                path.display()
            );
            continue;
        };
        series.push(load_supply_csv(path, manufacturer)?);
    }
    if series.is_empty() {
        warn!("no supply sheets found in {}", directory.display());
    }
    Ok(series)
}

/// Loads one manufacturer's supply sheet.
///
/// # Errors
/// `VaxlineError::InputFormat` naming `manufacturer` when the `date` or
/// `doses` column is missing, a date fails to parse as `YYYY-MM-DD`, or a
/// dose count is negative or not an integer.
pub fn load_supply_csv(path: &Path, manufacturer: &str) -> Result<SupplySeries, VaxlineError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader
        .headers()
        .map_err(|error| {
            VaxlineError::input_format(manufacturer, format!("unreadable headers: {error}"))
        })?
        .clone();

    let date_column = column_index(&headers, &["date"]).ok_or_else(|| {
        VaxlineError::input_format(manufacturer, "missing `date` column")
    })?;
    let dose_column = column_index(&headers, &["doses", "dose"]).ok_or_else(|| {
        VaxlineError::input_format(manufacturer, "missing `doses` column")
    })?;

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = result.map_err(|error| {
            VaxlineError::input_format(manufacturer, format!("data row {row}: {error}"))
        })?;
        let date = parse_date(record.get(date_column).unwrap_or(""), manufacturer, row)?;
        let doses = parse_doses(record.get(dose_column).unwrap_or(""), manufacturer, row)?;
        records.push(SupplyRecord { date, doses });
    }

    info!(
        "loaded {} supply rows for {} from {}",
        records.len(),
        manufacturer,
        path.display()
    );
    Ok(SupplySeries::new(manufacturer, records))
}

/// Sums raw daily doses into calendar-month buckets, per manufacturer.
/// Series keep their input order; months are ascending within a series.
#[must_use]
pub fn monthly_totals(series: &[SupplySeries]) -> Vec<MonthlySupply> {
    let mut rows = Vec::new();
    for one_series in series {
        let mut buckets: BTreeMap<(i32, u32), u64> = BTreeMap::new();
        for record in &one_series.records {
            *buckets
                .entry((record.date.year(), record.date.month()))
                .or_insert(0) += record.doses;
        }
        for ((year, month), doses) in buckets {
            rows.push(MonthlySupply {
                manufacturer: one_series.manufacturer.clone(),
                year,
                month,
                doses,
            });
        }
    }
    rows
}

fn column_index(headers: &csv::StringRecord, accepted: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim();
        accepted.iter().any(|name| header.eq_ignore_ascii_case(name))
    })
}

fn parse_date(field: &str, manufacturer: &str, row: usize) -> Result<NaiveDate, VaxlineError> {
    let trimmed = field.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        VaxlineError::input_format(
            manufacturer,
            format!("data row {row}: invalid date `{trimmed}` (expected YYYY-MM-DD)"),
        )
    })
}

fn parse_doses(field: &str, manufacturer: &str, row: usize) -> Result<u64, VaxlineError> {
    let trimmed = field.trim();
    if let Ok(doses) = trimmed.parse::<u64>() {
        return Ok(doses);
    }
    let message = if trimmed.parse::<i64>().is_ok_and(|value| value < 0) {
        format!("data row {row}: negative dose count {trimmed}")
    } else {
        format!("data row {row}: invalid dose count `{trimmed}`")
    };
    Err(VaxlineError::input_format(manufacturer, message))
}
