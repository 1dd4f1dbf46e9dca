//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or converting observations.
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// A required column is absent from a frame
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A value required by the record is null
    #[error("Missing value in column {column} at row {row}")]
    MissingValue {
        /// Column that held the null
        column: String,
        /// Zero-based row index
        row: usize,
    },

    /// Two records share an identifier
    #[error("Duplicate observation id: {0}")]
    DuplicateId(String),

    /// Table name rejected before it reaches SQL
    #[error("Invalid table name: {0}")]
    InvalidTable(String),
}
