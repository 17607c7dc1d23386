//! Typed errors for the analytics pipeline
//!
//! Bad values inside a table are never errors; they are dropped or treated as
//! unconstrained. Only whole-source and export failures are represented here.

use std::path::PathBuf;
use thiserror::Error;

/// A listing source could not be turned into rows. The loader logs and skips it.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("source is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("malformed ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("no CSV file found in ZIP archive")]
    NoCsvInArchive,

    #[error("malformed workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    EmptyWorkbook,

    #[error("source has no header row")]
    MissingHeader,

    #[error("line {line}: expected at most {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Writing an output table failed
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush output: {0}")]
    Io(#[from] std::io::Error),
}
