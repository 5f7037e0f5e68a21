//! Output formatters for detection results.
//!
//! This module provides different output formats for detection results:
//! - Text for humans (the default)
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! The core returns structured values; everything here is presentation.
//!
//! # Example
//!
//! ```
//! use recdupe::detect::{DetectionSummary, DuplicateDetector, MasterRule, MatchingRule};
//! use recdupe::error::ExitCode;
//! use recdupe::output::JsonOutput;
//!
//! let detector = DuplicateDetector::new(
//!     MatchingRule::new(["email"])?,
//!     MasterRule::highest("score")?,
//! );
//! let detections = detector.find_duplicates(Vec::new())?;
//!
//! let output = JsonOutput::new(&detections, &DetectionSummary::default(), ExitCode::NoDuplicates);
//! println!("{}", output.to_json_pretty()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod csv;
pub mod json;
pub mod text;

// Re-export main types
pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;
