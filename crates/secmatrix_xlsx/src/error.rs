//! Top-level error type for collaborator failures.
//!
//! Pivot rendering itself never fails; only reading sources, loading
//! configuration and writing workbooks can.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by source, config and sink stages.
#[derive(Debug, Error)]
pub enum SecMatrixError {
    /// Input or output file could not be accessed.
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Tabular payload could not be parsed.
    #[error("failed to read assignment table: {0}")]
    Source(String),

    /// Configuration file is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Grid does not fit into one worksheet.
    #[error("grid of {rows} rows x {cols} columns exceeds Excel sheet limits")]
    ExcelLimit {
        /// Required row count.
        rows: usize,
        /// Required column count.
        cols: usize,
    },

    /// Workbook writer failed.
    #[error("xlsx write error: {0}")]
    Xlsx(String),
}

impl From<rust_xlsxwriter::XlsxError> for SecMatrixError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for SecMatrixError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Source(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T, E = SecMatrixError> = std::result::Result<T, E>;
