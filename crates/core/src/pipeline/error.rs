//! Error types for pipeline runs
//!
//! Everything here aborts the run before any file is processed. Per-file
//! problems are [`IngestError`](crate::ingest::IngestError)s and end up in
//! the run report instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::ingest::BackendError;

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Pipeline configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Could not reach the database
    #[error("Connection failed: {0}")]
    Connection(#[source] BackendError),

    /// The server has no secure ingestion directory
    #[error("secure_file_priv is not set on the database server")]
    IngestDirNotConfigured,

    /// Source directory is missing
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    /// Schema script could not be read
    #[error("Cannot read schema script {path}: {source}")]
    SchemaScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error with path context
    #[error("IO error with {path}: {message}")]
    IoWithPath {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create an IO error with path context
    pub fn io_with_path(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::IoWithPath {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Config(msg) => {
                format!("Configuration error: {msg}\n\nHint: Check the command line and credentials file.")
            }
            PipelineError::Connection(source) => {
                format!(
                    "Connection failed: {source}\n\nHint: Check user, password, host and port in the credentials file."
                )
            }
            PipelineError::IngestDirNotConfigured => {
                "secure_file_priv is not set on the database server. Aborting.\n\n\
                Hint: Set secure_file_priv in the server configuration to a directory the server may load files from."
                    .to_string()
            }
            PipelineError::SourceNotFound(path) => {
                format!(
                    "Source directory not found: {}\n\nHint: Check that the directory exists and the path is correct.",
                    path.display()
                )
            }
            PipelineError::SchemaScript { path, source } => {
                format!(
                    "Cannot read schema script {}: {source}\n\nHint: Check the --schema path.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}
