//! Human-readable text output for detection results.
//!
//! One block per duplicate group:
//!
//! ```text
//! Match key: (a@x.io)
//! Master record: {email: a@x.io, score: 9}
//! Duplicates:
//!   {email: a@x.io, score: 1}
//!   {email: a@x.io, score: 9}
//! -
//! ```
//!
//! Colors come from `yansi` and respect the global enable/disable switch,
//! so `--no-color` and `NO_COLOR` turn them off everywhere at once.

use std::io;

use yansi::Paint;

use crate::detect::{Detection, DetectionSummary};

/// Text output formatter.
pub struct TextOutput<'a> {
    detections: &'a [Detection],
    summary: Option<&'a DetectionSummary>,
}

impl<'a> TextOutput<'a> {
    /// Create a new text output formatter.
    #[must_use]
    pub fn new(detections: &'a [Detection]) -> Self {
        Self {
            detections,
            summary: None,
        }
    }

    /// Append a summary line after the groups.
    #[must_use]
    pub fn with_summary(mut self, summary: &'a DetectionSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Write the text output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.detections.is_empty() {
            writeln!(writer, "{}", "No duplicates found.".green())?;
        } else {
            for detection in self.detections {
                writeln!(
                    writer,
                    "{} {}",
                    "Match key:".bold(),
                    detection.match_key.cyan()
                )?;
                writeln!(
                    writer,
                    "{} {}",
                    "Master record:".bold(),
                    detection.master.green()
                )?;
                writeln!(writer, "{}", "Duplicates:".bold())?;
                for record in &detection.duplicates {
                    writeln!(writer, "  {record}")?;
                }
                writeln!(writer, "-")?;
            }
        }

        if let Some(summary) = self.summary {
            writeln!(
                writer,
                "{} record(s) in {} group(s): {} duplicate group(s), {} duplicate record(s) ({:.1}%)",
                summary.total_records,
                summary.total_groups,
                summary.duplicate_groups,
                summary.duplicate_records,
                summary.duplication_rate()
            )?;
        }
        Ok(())
    }

    /// Render the text output as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn to_string(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
