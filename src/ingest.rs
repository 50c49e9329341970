//! Raw series ingest
//!
//! Reads per-sub-series CSV files of `date,value` rows into [`RawSeries`].
//! An empty value field is the missing-data marker; a malformed row is a
//! parse error carrying the series name and row number, never silently
//! dropped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::IndexError;
use crate::types::{RawObservation, RawSeries};

/// Read a raw series from a `date,value` CSV stream.
///
/// Dates are accepted as `YYYY-MM-DD` or `YYYY-MM` (interpreted as the first
/// of the month). A header row is expected and skipped.
pub fn read_series_csv<R: Read>(reader: R, name: &str) -> Result<RawSeries, IndexError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let mut observations = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Row numbers are 1-based and count the header.
        let row_number = row + 2;

        let date_field = record.get(0).unwrap_or("").trim();
        let value_field = record.get(1).unwrap_or("").trim();

        let date = parse_observation_date(date_field).ok_or_else(|| IndexError::Parse {
            context: format!("series `{name}`, row {row_number}"),
            message: format!("unrecognized date `{date_field}`"),
        })?;

        let value = if value_field.is_empty() {
            None
        } else {
            let parsed: f64 = value_field.parse().map_err(|_| IndexError::Parse {
                context: format!("series `{name}`, row {row_number}"),
                message: format!("unrecognized value `{value_field}`"),
            })?;
            Some(parsed)
        };

        observations.push(RawObservation::new(date, value));
    }

    Ok(RawSeries::new(name, observations))
}

/// Read a raw series from a CSV file, naming it after the file stem.
pub fn read_series_file(path: &Path) -> Result<RawSeries, IndexError> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = File::open(path)?;
    read_series_csv(file, &name)
}

/// Parse an observation date: full date first, then year-month shorthand.
pub fn parse_observation_date(field: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(field, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDate::parse_from_str(&format!("{field}-01"), "%Y-%m-%d").ok()
}
