//! CLI error types

use menuload_core::{IngestError, PipelineError};
use thiserror::Error;

/// Errors surfaced by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command-line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Run aborted before processing files
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Single-file operation failed
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Could not render output
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            CliError::Pipeline(e) => e.user_message(),
            CliError::Ingest(e) => e.user_message(),
            CliError::InvalidArgument(msg) => {
                format!("Invalid argument: {msg}\n\nHint: Run with --help to see accepted values.")
            }
            CliError::Output(_) => self.to_string(),
        }
    }
}
