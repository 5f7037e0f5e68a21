//! CSV output formatter for detection results.
//!
//! One row per group member. Because records are ragged, the columns are
//! computed per run: three fixed columns followed by the sorted union of
//! every field name seen in the output.
//!
//! # Columns
//!
//! - `group_id`: 1-based ID of the duplicate group
//! - `match_key`: the group's match key, rendered as text
//! - `is_master`: `true` on exactly one row per group
//! - one column per record field; fields a record lacks stay empty

use std::collections::BTreeSet;
use std::io;

use thiserror::Error;

use crate::detect::Detection;
use crate::record::Value;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    detections: &'a [Detection],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(detections: &'a [Detection]) -> Self {
        Self { detections }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = ::csv::Writer::from_writer(writer);
        let fields = self.field_columns();

        let mut header = vec!["group_id", "match_key", "is_master"];
        header.extend(fields.iter().map(String::as_str));
        csv_writer.write_record(&header)?;

        for (idx, detection) in self.detections.iter().enumerate() {
            let group_id = (idx + 1).to_string();
            let match_key = detection.match_key.to_string();
            // Equal records can tie with the master; flag only the first.
            let mut master_seen = false;

            for record in &detection.duplicates {
                let is_master = !master_seen && *record == detection.master;
                master_seen |= is_master;

                let mut row = vec![
                    group_id.clone(),
                    match_key.clone(),
                    is_master.to_string(),
                ];
                row.extend(fields.iter().map(|field| cell(record.get(field))));
                csv_writer.write_record(&row)?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }

    /// Sorted union of field names across all output records.
    fn field_columns(&self) -> Vec<String> {
        let mut fields: BTreeSet<&str> = BTreeSet::new();
        for detection in self.detections {
            for record in &detection.duplicates {
                fields.extend(record.field_names());
            }
        }
        fields.into_iter().map(String::from).collect()
    }
}

/// A missing field renders as an empty cell.
fn cell(value: &Value) -> String {
    if value.is_missing() {
        String::new()
    } else {
        value.to_string()
    }
}
