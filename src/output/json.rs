//! JSON output formatter for detection results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "match_key": ["a@x.io"],
//!       "master": {"email": "a@x.io", "score": 9.0},
//!       "duplicates": [
//!         {"email": "a@x.io", "score": 1.0},
//!         {"email": "a@x.io", "score": 9.0}
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "total_records": 4,
//!     "total_groups": 3,
//!     "duplicate_groups": 1,
//!     "duplicate_records": 2,
//!     "unique_records": 2,
//!     "duplication_rate": 50.0,
//!     "detect_duration_ms": 3,
//!     "exit_code": 0,
//!     "exit_code_name": "DQ000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::detect::{Detection, DetectionSummary};
use crate::error::ExitCode;

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of records processed
    pub total_records: usize,
    /// Number of distinct match keys
    pub total_groups: usize,
    /// Number of groups with 2+ records
    pub duplicate_groups: usize,
    /// Number of records inside duplicate groups (masters included)
    pub duplicate_records: usize,
    /// Number of records in singleton groups
    pub unique_records: usize,
    /// Percentage of records that belong to a duplicate group
    pub duplication_rate: f64,
    /// Time spent grouping and selecting, in milliseconds
    pub detect_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DQ000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a detection summary and an exit code.
    #[must_use]
    pub fn from_summary(summary: &DetectionSummary, exit_code: ExitCode) -> Self {
        Self {
            total_records: summary.total_records,
            total_groups: summary.total_groups,
            duplicate_groups: summary.duplicate_groups,
            duplicate_records: summary.duplicate_records,
            unique_records: summary.unique_records,
            duplication_rate: summary.duplication_rate(),
            detect_duration_ms: summary.detect_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// List of duplicate groups with their masters
    pub duplicates: &'a [Detection],
    /// Run summary statistics
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Create a new JSON output from detections, summary and exit code.
    #[must_use]
    pub fn new(
        detections: &'a [Detection],
        summary: &DetectionSummary,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            duplicates: detections,
            summary: JsonSummary::from_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
