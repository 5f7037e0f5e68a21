//! Record loaders for the supported input formats.
//!
//! The boundary between files (or uploads) and the detection core. Two
//! formats are supported, dispatched on file extension:
//!
//! - **CSV** with a header row. Every value is loaded as text, empty cells
//!   included; no numeric or boolean coercion happens here.
//! - **JSON** arrays of flat objects. JSON types map onto record values
//!   (`null` becomes the missing marker); nested arrays or objects are
//!   rejected before detection runs.

pub mod csv;
pub mod json;

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::record::Record;

/// Errors raised while loading records from a file or upload.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file extension is not one of the supported formats.
    #[error("unsupported input format '.{extension}' for '{path}', expected .csv or .json")]
    UnsupportedFormat {
        /// The offending path or upload name.
        path: String,
        /// The extension as given (lowercased, may be empty).
        extension: String,
    },

    /// The file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// The offending path.
        path: String,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Malformed CSV input.
    #[error("malformed CSV input: {0}")]
    Csv(#[from] ::csv::Error),

    /// Malformed JSON input.
    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON root was not an array.
    #[error("JSON input must be an array of objects, found {found}")]
    NotAnArray {
        /// JSON type of the root value.
        found: &'static str,
    },

    /// An array element was not an object.
    #[error("record {index}: expected a flat object, found {found}")]
    NotAnObject {
        /// Zero-based position in the input array.
        index: usize,
        /// JSON type of the element.
        found: &'static str,
    },

    /// A field held a nested array or object.
    #[error("record {index}: field '{field}' holds a nested {found}, only scalar values are supported")]
    NonScalar {
        /// Zero-based position in the input array.
        index: usize,
        /// The offending field name.
        field: String,
        /// JSON type of the nested value.
        found: &'static str,
    },
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma-separated values with a header row.
    Csv,
    /// A JSON array of flat objects.
    Json,
}

impl Format {
    /// Determine the format from a path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// [`LoadError::UnsupportedFormat`] for anything other than `.csv` or
    /// `.json`.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match extension.as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            _ => Err(LoadError::UnsupportedFormat {
                path: path.display().to_string(),
                extension,
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Csv => f.write_str("csv"),
            Format::Json => f.write_str("json"),
        }
    }
}

/// Load records from a file, dispatching on its extension.
///
/// # Errors
///
/// Extension, I/O, and parse failures all surface as [`LoadError`];
/// nothing is partially loaded.
pub fn load_path(path: &Path) -> Result<Vec<Record>, LoadError> {
    let format = Format::from_path(path)?;
    log::info!("loading {format} records from {}", path.display());
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let records = load_bytes(format, &bytes)?;
    log::debug!("loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Load records from an in-memory buffer carrying a file name.
///
/// Used for HTTP uploads, where the client sends the original file name
/// alongside the bytes.
///
/// # Errors
///
/// Same failure modes as [`load_path`], minus file I/O.
pub fn load_named(name: &str, bytes: &[u8]) -> Result<Vec<Record>, LoadError> {
    let format = Format::from_path(Path::new(name))?;
    log::debug!("loading {format} records from upload '{name}'");
    load_bytes(format, bytes)
}

/// Parse a buffer in a known format.
///
/// # Errors
///
/// Parse failures surface as [`LoadError`].
pub fn load_bytes(format: Format, bytes: &[u8]) -> Result<Vec<Record>, LoadError> {
    match format {
        Format::Csv => csv::parse_csv(bytes),
        Format::Json => json::parse_json(bytes),
    }
}
