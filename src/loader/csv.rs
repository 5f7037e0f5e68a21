//! CSV record parsing.
//!
//! The first row is the header; every following row becomes one record.
//! All values load as text, so `"42"` and an empty cell stay `Text("42")`
//! and `Text("")`. An empty cell is present text, not a missing field;
//! only a column absent from the header can make a field missing.

use super::LoadError;
use crate::record::{Record, Value};

/// Parse CSV bytes into records.
///
/// # Errors
///
/// [`LoadError::Csv`] for malformed input, including rows whose field
/// count does not match the header.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>, LoadError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header, Value::text(value)))
            .collect();
        records.push(record);
    }
    Ok(records)
}
