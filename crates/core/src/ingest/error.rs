//! Error types for per-file ingestion
//!
//! Everything in this module is recoverable at the pipeline level: the
//! executor records the error against the file it belongs to and moves on
//! to the next file.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`LoadBackend`](super::backend::LoadBackend)
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// Could not connect, or the connection dropped
    #[error("Connection error: {0}")]
    Connection(String),

    /// The engine rejected a statement
    #[error("Query error: {0}")]
    Query(String),
}

/// Errors that can occur while ingesting a single CSV file
#[derive(Error, Debug)]
pub enum IngestError {
    /// The catalog has no columns for the table
    #[error("No columns found for table {schema}.{table}")]
    SchemaNotFound { schema: String, table: String },

    /// The CSV header does not line up with the catalog column order
    #[error("Header of {file} does not match table {table}: {reason}")]
    ColumnMismatch {
        file: String,
        table: String,
        reason: String,
    },

    /// Sanitizing the source file failed
    #[error("Failed to sanitize {path}: {reason}")]
    Sanitize { path: PathBuf, reason: String },

    /// The bulk-load statement errored
    #[error("Loading {file} into {table}: {message}")]
    LoadFailed {
        file: String,
        table: String,
        message: String,
    },

    /// The catalog reported no row count for the table after loading
    #[error("Row count unavailable for table {schema}.{table}")]
    RowCountUnavailable { schema: String, table: String },

    /// Catalog or engine error outside of the load statement
    #[error("Database error on table {table}: {source}")]
    Backend {
        table: String,
        #[source]
        source: BackendError,
    },

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Wrap a backend error with the table it was raised for
    pub fn backend(table: impl Into<String>, source: BackendError) -> Self {
        IngestError::Backend {
            table: table.into(),
            source,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            IngestError::SchemaNotFound { schema, table } => {
                format!(
                    "No columns found for table {schema}.{table}.\n\n\
                    Hint: Check that the schema script created the table and that the CSV file name matches it."
                )
            }
            IngestError::ColumnMismatch {
                file,
                table,
                reason,
            } => {
                format!(
                    "Header of {file} does not match table {table}: {reason}\n\n\
                    Hint: Reorder the CSV columns or rerun with --header-check off to load positionally."
                )
            }
            IngestError::LoadFailed {
                file,
                table,
                message,
            } => {
                format!(
                    "Loading {file} into {table} failed: {message}\n\n\
                    Hint: Check that the MySQL server can read files from its secure_file_priv directory."
                )
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(feature = "mysql-backend")]
impl From<mysql_async::Error> for BackendError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Io(_) | mysql_async::Error::Driver(_) => {
                BackendError::Connection(err.to_string())
            }
            _ => BackendError::Query(err.to_string()),
        }
    }
}
