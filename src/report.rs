//! CSV output tables.
//!
//! Three writers cover the run's outputs: the wide campaign table (one row
//! per in-window day), the long/melted variant of the same table, and the
//! calendar-month supply summary. Output paths must end in `.csv`; missing
//! parent directories are created.

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;

use crate::error::VaxlineError;
use crate::supply::MonthlySupply;
use crate::timeline::{MergedTimeline, SeriesPoint};

// Checks that the path is a CSV and creates any missing parent directories.
fn create_output_file(path: &Path) -> Result<File, VaxlineError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(VaxlineError::config(format!(
            "output files must be CSVs, got `{}`",
            path.display()
        ))),
    }
}

/// Writes the wide campaign table: `date, eligible, registered`, one
/// cumulative column per manufacturer, then `total_vaccine, first_dose,
/// second_dose`.
///
/// The manufacturer columns depend on the input workbook, so rows are
/// written as records rather than through serde.
///
/// # Errors
/// Returns an error if the path is not a CSV or any write fails.
pub fn write_wide_csv(path: &Path, timeline: &MergedTimeline) -> Result<(), VaxlineError> {
    let mut writer = Writer::from_writer(create_output_file(path)?);

    let mut header: Vec<String> = Vec::with_capacity(timeline.manufacturers.len() + 6);
    header.push("date".to_string());
    header.push("eligible".to_string());
    header.push("registered".to_string());
    header.extend(timeline.manufacturers.iter().cloned());
    header.push("total_vaccine".to_string());
    header.push("first_dose".to_string());
    header.push("second_dose".to_string());
    writer.write_record(&header)?;

    for row in &timeline.rows {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        record.push(row.date.to_string());
        record.push(row.eligible.to_string());
        record.push(row.registered.to_string());
        record.extend(row.cumulative.iter().map(ToString::to_string));
        record.push(row.total_vaccine.to_string());
        record.push(row.first_dose.to_string());
        record.push(row.second_dose.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the long-format table of `(date, series, value)` triples.
///
/// # Errors
/// Returns an error if the path is not a CSV or any write fails.
pub fn write_long_csv(path: &Path, points: &[SeriesPoint]) -> Result<(), VaxlineError> {
    let mut writer = Writer::from_writer(create_output_file(path)?);
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the per-manufacturer calendar-month supply summary.
///
/// # Errors
/// Returns an error if the path is not a CSV or any write fails.
pub fn write_monthly_csv(path: &Path, totals: &[MonthlySupply]) -> Result<(), VaxlineError> {
    let mut writer = Writer::from_writer(create_output_file(path)?);
    for total in totals {
        writer.serialize(total)?;
    }
    writer.flush()?;
    Ok(())
}
